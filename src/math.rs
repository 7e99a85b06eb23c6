use crate::error::{i32_to_usize, usize_to_i32, Result};
use std::ops::{Add, Div, Mul, Sub};

/// A 2D integer or float vector, used for image positions, sizes, and sampling rates.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Vec2<T>(pub T, pub T);

impl<T: Copy> Vec2<T> {
    /// The first component. Named `x` when this vector represents a position or sampling rate.
    pub fn x(self) -> T { self.0 }

    /// The second component. Named `y` when this vector represents a position or sampling rate.
    pub fn y(self) -> T { self.1 }

    /// The first component. Named `width` when this vector represents a size.
    pub fn width(self) -> T { self.0 }

    /// The second component. Named `height` when this vector represents a size.
    pub fn height(self) -> T { self.1 }
}

impl<T: Copy + Mul<Output = T>> Vec2<T> {
    /// The number of values covered by a rectangle of this size, `width * height`.
    pub fn area(self) -> T { self.0 * self.1 }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self { Vec2(x, y) }
}

impl Vec2<usize> {
    /// Convert to a signed vector. Panics if a component does not fit into an `i32`,
    /// which should never happen for any image dimension this crate can load.
    pub fn to_i32(self) -> Vec2<i32> {
        Vec2(usize_to_i32(self.0), usize_to_i32(self.1))
    }
}

impl Vec2<i32> {
    /// Convert to an unsigned vector, rejecting negative components.
    pub fn to_usize(self, context: &str) -> Result<Vec2<usize>> {
        Ok(Vec2(i32_to_usize(self.0, context)?, i32_to_usize(self.1, context)?))
    }
}

impl<T: Add<Output = T>> Add for Vec2<T> {
    type Output = Vec2<T>;
    fn add(self, other: Vec2<T>) -> Vec2<T> { Vec2(self.0 + other.0, self.1 + other.1) }
}

impl<T: Sub<Output = T>> Sub for Vec2<T> {
    type Output = Vec2<T>;
    fn sub(self, other: Vec2<T>) -> Vec2<T> { Vec2(self.0 - other.0, self.1 - other.1) }
}

impl<T: Div<Output = T>> Div for Vec2<T> {
    type Output = Vec2<T>;
    fn div(self, other: Vec2<T>) -> Vec2<T> { Vec2(self.0 / other.0, self.1 / other.1) }
}

#[cfg(test)]
mod vec2_tests {
    use super::*;

    #[test]
    fn test_area_and_accessors() {
        let size = Vec2(4usize, 5usize);
        assert_eq!(size.width(), 4);
        assert_eq!(size.height(), 5);
        assert_eq!(size.area(), 20);
    }

    #[test]
    fn test_to_i32_and_back() {
        let size = Vec2(4usize, 5usize);
        let signed = size.to_i32();
        assert_eq!(signed, Vec2(4, 5));
        assert_eq!(signed.to_usize("roundtrip").unwrap(), size);
    }

    #[test]
    fn test_to_usize_rejects_negative() {
        let position = Vec2(-1, 2);
        assert!(position.to_usize("negative position").is_err());
    }

    #[test]
    fn test_add_and_sub() {
        assert_eq!(Vec2(1, 2) + Vec2(3, 4), Vec2(4, 6));
        assert_eq!(Vec2(5, 5) - Vec2(1, 2), Vec2(4, 3));
    }

    #[test]
    fn test_div_componentwise() {
        assert_eq!(Vec2(8usize, 9usize) / Vec2(2usize, 3usize), Vec2(4, 3));
    }
}

// calculations inspired by
// https://github.com/AcademySoftwareFoundation/openexr/blob/master/OpenEXR/IlmImf/ImfTiledMisc.cpp


/// computes floor(log(x)/log(2))
pub fn floor_log_2(mut number: u32) -> u32 {
    debug_assert_ne!(number, 0);

    let mut log = 0;

//     TODO check if this unrolls properly?
    while number > 1 {
        log += 1;
        number >>= 1;
    }

    log
}


/// computes ceil(log(x)/log(2))
// taken from https://github.com/openexr/openexr/blob/master/OpenEXR/IlmImf/ImfTiledMisc.cpp
pub fn ceil_log_2(mut number: u32) -> u32 {
    debug_assert_ne!(number, 0);

    let mut log = 0;
    let mut round_up = 0;

    // TODO check if this unrolls properly
    while number > 1 {
        if number & 1 != 0 {
            round_up = 1;
        }

        log +=  1;
        number >>= 1;
    }

    log + round_up
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RoundingMode {
    Down, Up,
}

impl RoundingMode {
    pub fn log2(self, number: u32) -> u32 {
        match self {
            RoundingMode::Down => self::floor_log_2(number),
            RoundingMode::Up => self::ceil_log_2(number),
        }
    }

    pub fn divide(self, dividend: u32, divisor: u32) -> u32 {
        match self {
            RoundingMode::Up => (dividend + divisor - 1) / divisor, // only works for positive numbers
            RoundingMode::Down => dividend / divisor,
        }
    }
}

/// Euclidean modulo: always returns a non-negative result in `0..divisor`, even for negative `x`.
/// Used to determine whether a scan line lies on a subsampled channel's grid.
pub fn mod_p(x: i32, divisor: usize) -> i32 {
    let divisor = divisor as i32;
    x.rem_euclid(divisor)
}

/// Number of samples a subsampled channel has in the inclusive pixel range `min..=max`,
/// for a given sampling rate. A sampling rate of 1 keeps every pixel; a rate of 2 keeps every other one.
pub fn num_samples(sampling: usize, min: i32, max: i32) -> usize {
    let sampling = sampling as i32;
    let min_aligned = if min >= 0 { min } else { min - sampling + 1 };
    let max_aligned = if max >= 0 { max } else { max - sampling + 1 };
    i32_to_usize(max_aligned / sampling - min_aligned / sampling + 1, "sample count")
        .expect("sample count is not negative")
}

pub fn compute_tile_count(full_res: u32, tile_size: u32) -> u32 {
    // round up, because if the image is not evenly divisible by the tiles,
    // we add another tile at the end (which is only partially used)
    RoundingMode::Up.divide(full_res, tile_size)
}

#[cfg(test)]
mod subsampling_tests {
    use super::*;

    #[test]
    fn mod_p_wraps_negative_values() {
        assert_eq!(mod_p(-1, 2), 1);
        assert_eq!(mod_p(0, 2), 0);
        assert_eq!(mod_p(3, 2), 1);
        assert_eq!(mod_p(-4, 2), 0);
    }

    #[test]
    fn num_samples_without_subsampling_counts_every_pixel() {
        assert_eq!(num_samples(1, 0, 9), 10);
        assert_eq!(num_samples(1, -5, 4), 10);
    }

    #[test]
    fn num_samples_with_subsampling_counts_every_other_pixel() {
        assert_eq!(num_samples(2, 0, 9), 5);
        assert_eq!(num_samples(2, 0, 10), 6);
    }
}


// TODO this should be cached? log2 may be very expensive
pub fn compute_level_count(round: RoundingMode, full_res: u32) -> u32 {
    round.log2(full_res) + 1
}

pub fn compute_level_size(round: RoundingMode, full_res: u32, level_index: u32) -> u32 {
    round.divide(full_res,  1 << level_index).max(1)
}

// TODO cache these?
// TODO compute these directly instead of summing up an iterator?
pub fn rip_map_resolutions(round: RoundingMode, max_resolution: (u32, u32)) -> impl Iterator<Item=(u32, u32)> {
    let (w, h) = (compute_level_count(round, max_resolution.0), compute_level_count(round, max_resolution.1));

    (0..w) // TODO test this
        .flat_map(move |x_level|{ // FIXME may swap y and x order?
            (0..h).map(move |y_level| {
                // TODO progressively divide instead??
                let width = compute_level_size(round, max_resolution.0, x_level);
                let height = compute_level_size(round, max_resolution.1, y_level);
                (width, height)
            })
        })
}

// TODO cache all these level values when computing table offset size??
// TODO compute these directly instead of summing up an iterator?
pub fn mip_map_resolutions(round: RoundingMode, max_resolution: (u32, u32)) -> impl Iterator<Item=(u32, u32)> {
    (0..compute_level_count(round, max_resolution.0.max(max_resolution.1)))
        .map(move |level|{
            // TODO progressively divide instead??
            let width = compute_level_size(round, max_resolution.0, level);
            let height = compute_level_size(round, max_resolution.1, level);
            (width, height)
        })
}
