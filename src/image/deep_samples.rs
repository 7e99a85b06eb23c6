//! A vector of deep values (multiple values per pixel per channel).

use half::f16;

/// A vector of deep values (one variable-length list of samples per pixel per channel).
/// The precision of all values in a channel is either `f16`, `f32` or `u32`.
#[derive(Clone, PartialEq)]
pub enum DeepSamples {

    /// A vector of deep `f16` values, one list of samples per pixel.
    F16(Vec<Vec<f16>>),

    /// A vector of deep `f32` values, one list of samples per pixel.
    F32(Vec<Vec<f32>>),

    /// A vector of deep `u32` values, one list of samples per pixel.
    U32(Vec<Vec<u32>>),
}

impl DeepSamples {
    /// The number of pixels in the image. Should be the width times the height.
    pub fn len(&self) -> usize {
        match self {
            DeepSamples::F16(vec) => vec.len(),
            DeepSamples::F32(vec) => vec.len(),
            DeepSamples::U32(vec) => vec.len(),
        }
    }

    /// Is this channel completely empty, containing no pixels at all?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::fmt::*;
impl Debug for DeepSamples {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeepSamples::F16(vec) => write!(formatter, "Deep([f16]; {})", vec.len()),
            DeepSamples::F32(vec) => write!(formatter, "Deep([f32]; {})", vec.len()),
            DeepSamples::U32(vec) => write!(formatter, "Deep([u32]; {})", vec.len()),
        }
    }
}
