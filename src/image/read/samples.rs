//! How to read samples (a grid of `f16`, `f32` or `u32` values).

use crate::block::chunk::TileCoordinates;
use crate::block::lines::LineRef;
use crate::error::{Result, UnitResult};
use crate::image::FlatSamples;
use crate::image::read::any_channels::{ReadSamples, SamplesReader};
use crate::image::read::levels::{ReadAllLevels, ReadLargestLevel, ReadSamplesLevel};
use crate::math::Vec2;
use crate::meta::attribute::{ChannelInfo, SampleType};
use crate::meta::header::Header;
use half::f16;

/// Specify to read only flat samples, no deep data.
/// Use [`ReadFlatSamples::largest_resolution_level`] or [`ReadFlatSamples::all_resolution_levels`]
/// to specify which levels of the image should be loaded.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReadFlatSamples;

impl ReadFlatSamples {
    /// Read only the largest resolution level, skipping all smaller copies of the image.
    /// The `FlatSamples` will then be placed directly inside the channels, without any indirection.
    pub fn largest_resolution_level(self) -> ReadLargestLevel<Self> {
        ReadLargestLevel { read_samples: self }
    }

    /// Read all contained resolution levels from the image, if any.
    pub fn all_resolution_levels(self) -> ReadAllLevels<Self> {
        ReadAllLevels { read_samples: self }
    }
}

/// Specify to read deep samples, allowing multiple values per pixel.
/// Currently, deep data is read using the block-level API; see [`crate::image::read::deep`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReadDeepSamples;

impl ReadDeepSamples {
    /// Read only the largest resolution level, skipping all smaller copies of the image.
    pub fn largest_resolution_level(self) -> ReadLargestLevel<Self> {
        ReadLargestLevel { read_samples: self }
    }

    /// Read all contained resolution levels from the image, if any.
    pub fn all_resolution_levels(self) -> ReadAllLevels<Self> {
        ReadAllLevels { read_samples: self }
    }
}

// Reading the largest level directly places the `FlatSamples` inside the channels,
// without any `Levels<>` indirection, mirroring `ReadLargestLevel::all_channels`.
impl ReadSamples for ReadFlatSamples {
    type Reader = FlatSamplesReader;

    fn create_sample_reader(&self, header: &Header, channel: &ChannelInfo) -> Result<Self::Reader> {
        self.create_samples_level_reader(header, channel, Vec2(0, 0), header.data_size / channel.sampling)
    }
}

impl ReadSamplesLevel for ReadFlatSamples {
    type Reader = FlatSamplesReader;

    fn create_samples_level_reader(
        &self, _header: &Header, channel: &ChannelInfo, level: Vec2<usize>, resolution: Vec2<usize>
    ) -> Result<Self::Reader> {
        let samples = match channel.sample_type {
            SampleType::F16 => FlatSamples::F16(vec![f16::ZERO; resolution.area()]),
            SampleType::F32 => FlatSamples::F32(vec![0.0; resolution.area()]),
            SampleType::U32 => FlatSamples::U32(vec![0; resolution.area()]),
        };

        Ok(FlatSamplesReader { level, resolution, samples })
    }
}

/// Accumulates a single channel of non-deep sample values for one resolution level.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSamplesReader {
    level: Vec2<usize>,
    resolution: Vec2<usize>,
    samples: FlatSamples,
}

impl SamplesReader for FlatSamplesReader {
    type Samples = FlatSamples;

    fn is_block_desired(&self, tile: TileCoordinates) -> bool {
        tile.level_index == self.level
    }

    fn read_line(&mut self, line: LineRef<'_>) -> UnitResult {
        let index = line.location.position.y() * self.resolution.width() + line.location.position.x();
        let end_index = index + line.location.sample_count;

        debug_assert!(
            index < end_index && end_index <= self.samples.len(),
            "for resolution {:?}, this is an invalid line: {:?}",
            self.resolution, line.location
        );

        match &mut self.samples {
            FlatSamples::F16(samples) => line.read_samples_into_slice(&mut samples[index .. end_index]),
            FlatSamples::F32(samples) => line.read_samples_into_slice(&mut samples[index .. end_index]),
            FlatSamples::U32(samples) => line.read_samples_into_slice(&mut samples[index .. end_index]),
        }
    }

    fn into_samples(self) -> FlatSamples { self.samples }
}
