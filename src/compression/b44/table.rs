//! Bit-pattern reordering used before and after B44 delta packing.
//!
//! Half-float bit patterns are not monotonic with respect to the value they
//! represent: negative numbers sort backwards, and the sign bit splits the
//! range in two. `exp_table` remaps a half bit pattern onto a monotonically
//! increasing 16-bit space so that neighboring pixel values end up as
//! neighboring integers, which is what makes the per-block shared-exponent
//! and 6-bit delta packing effective. `log_table` is its exact inverse.

/// Maps a half-float bit pattern into monotonic order.
pub fn exp_table(bits: u16) -> u16 {
    if bits & 0x8000 != 0 { !bits } else { bits | 0x8000 }
}

/// Inverse of `exp_table`.
pub fn log_table(bits: u16) -> u16 {
    if bits & 0x8000 != 0 { bits & !0x8000 } else { !bits }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_all_bit_patterns() {
        for bits in 0..=u16::MAX {
            assert_eq!(log_table(exp_table(bits)), bits);
        }
    }

    #[test]
    fn is_monotonic_in_value() {
        let a = half::f16::from_f32(-1.0).to_bits();
        let b = half::f16::from_f32(0.0).to_bits();
        let c = half::f16::from_f32(1.0).to_bits();
        assert!(exp_table(a) < exp_table(b));
        assert!(exp_table(b) < exp_table(c));
    }
}
