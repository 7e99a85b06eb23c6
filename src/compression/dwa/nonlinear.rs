//! Nonlinear transform for perceptually uniform quantization.
//!
//! DWAA/DWAB use a perceptual color space to ensure quantization errors
//! are distributed evenly in terms of human perception rather than
//! linear light values.

use half::f16;

/// Forward nonlinear transform (linear to perceptual space)
/// For compression: converts linear light values to perceptually uniform space
///
/// - For values <= 1.0: Uses power function (gamma 2.2)
/// - For values > 1.0: Uses logarithmic function
/// - Smooth transition at value = 1.0
#[inline]
pub fn to_nonlinear(linear: f32) -> f32 {
    if linear <= 1.0 {
        // Gamma 2.2 for values <= 1.0
        linear.powf(1.0 / 2.2)
    } else {
        // Logarithmic encoding for values > 1.0
        linear.ln() / 2.2f32.ln() + 1.0
    }
}

/// Inverse nonlinear transform (perceptual space to linear)
/// For decompression: converts from perceptual space back to linear light
///
/// - For values <= 1.0: Uses power function (inverse of gamma 2.2)
/// - For values > 1.0: Uses exponential function
#[inline]
pub fn from_nonlinear(nonlinear: f32) -> f32 {
    if nonlinear <= 1.0 {
        // Inverse gamma 2.2
        nonlinear.powf(2.2)
    } else {
        // Exponential (inverse of log)
        (2.2f32.ln() * (nonlinear - 1.0)).exp()
    }
}

/// Apply the nonlinear transform to a half-float bit pattern, preserving sign.
fn to_nonlinear_bits(bits: u16) -> u16 {
    let half = f16::from_bits(bits);
    let value = half.to_f32();

    if value.is_nan() {
        return bits;
    }

    let sign = bits & 0x8000;
    let magnitude = to_nonlinear(value.abs());
    sign | (f16::from_f32(magnitude).to_bits() & 0x7fff)
}

/// Apply the inverse nonlinear transform to a half-float bit pattern, preserving sign.
fn from_nonlinear_bits(bits: u16) -> u16 {
    let half = f16::from_bits(bits);
    let value = half.to_f32();

    if value.is_nan() {
        return bits;
    }

    let sign = bits & 0x8000;
    let magnitude = from_nonlinear(value.abs());
    sign | (f16::from_f32(magnitude).to_bits() & 0x7fff)
}

/// Lookup table for the forward (linear to perceptual) transform, indexed by
/// half-float bit pattern. Used while compressing.
pub struct ToNonlinearLut {
    table: Vec<u16>,
}

impl ToNonlinearLut {
    /// Build the table by applying the transform to every representable half-float.
    pub fn new() -> Self {
        let table = (0..=u16::MAX).map(to_nonlinear_bits).collect();
        Self { table }
    }

    /// Look up the perceptual-space bits for a given linear-space half-float's bits.
    #[inline]
    pub fn lookup(&self, bits: u16) -> u16 {
        self.table[bits as usize]
    }
}

impl Default for ToNonlinearLut {
    fn default() -> Self {
        Self::new()
    }
}

/// Lookup table for the inverse (perceptual to linear) transform, indexed by
/// half-float bit pattern. Used while decompressing.
pub struct ToLinearLut {
    table: Vec<u16>,
}

impl ToLinearLut {
    /// Build the table by applying the inverse transform to every representable half-float.
    pub fn new() -> Self {
        let table = (0..=u16::MAX).map(from_nonlinear_bits).collect();
        Self { table }
    }

    /// Look up the linear-space bits for a given perceptual-space half-float's bits.
    #[inline]
    pub fn lookup(&self, bits: u16) -> u16 {
        self.table[bits as usize]
    }
}

impl Default for ToLinearLut {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonlinear_roundtrip() {
        let test_values = [
            0.0, 0.1, 0.5, 0.9, 1.0, 1.1, 2.0, 5.0, 10.0, 100.0,
        ];

        for &value in &test_values {
            let nonlinear = to_nonlinear(value);
            let recovered = from_nonlinear(nonlinear);

            // Allow small floating point error
            let relative_error = ((recovered - value) / value.max(1e-6)).abs();
            assert!(
                relative_error < 1e-5,
                "Roundtrip failed for {}: got {}, relative error {}",
                value,
                recovered,
                relative_error
            );
        }
    }

    #[test]
    fn test_nonlinear_monotonic() {
        // Verify that the transform is monotonically increasing
        let mut prev_linear = 0.0f32;
        let mut prev_nonlinear = to_nonlinear(prev_linear);

        for i in 1..1000 {
            let linear = i as f32 / 10.0;
            let nonlinear = to_nonlinear(linear);

            assert!(
                nonlinear >= prev_nonlinear,
                "Transform is not monotonic at {}: {} -> {}, {} -> {}",
                linear,
                prev_linear,
                prev_nonlinear,
                linear,
                nonlinear
            );

            prev_linear = linear;
            prev_nonlinear = nonlinear;
        }
    }

    #[test]
    fn test_transition_at_one() {
        // Test smooth transition at value = 1.0
        let below = to_nonlinear(0.999);
        let at = to_nonlinear(1.0);
        let above = to_nonlinear(1.001);

        // All should be close to 1.0
        assert!((at - 1.0).abs() < 1e-6);

        // Differences should be small
        assert!((at - below).abs() < 0.01);
        assert!((above - at).abs() < 0.01);
    }

    #[test]
    fn test_to_nonlinear_to_linear_bit_roundtrip() {
        let to_nonlinear_lut = ToNonlinearLut::new();
        let to_linear_lut = ToLinearLut::new();

        for &linear in &[0.0f32, 0.25, 0.5, 1.0, 2.0, 10.0] {
            let bits = f16::from_f32(linear).to_bits();
            let nonlinear_bits = to_nonlinear_lut.lookup(bits);
            let recovered_bits = to_linear_lut.lookup(nonlinear_bits);

            let recovered = f16::from_bits(recovered_bits).to_f32();
            let error = (recovered - linear).abs();
            assert!(
                error < 0.05,
                "bit roundtrip failed for {}: got {}",
                linear,
                recovered
            );
        }
    }

    #[test]
    fn test_to_linear_lut_handles_negative_values() {
        let lut = ToLinearLut::new();
        let negative_bits = f16::from_f32(-0.5).to_bits();
        let result_bits = lut.lookup(negative_bits);
        let result = f16::from_bits(result_bits).to_f32();
        assert!(result < 0.0, "sign should be preserved, got {}", result);
    }
}
