//! Per-channel classification for DWAA/DWAB compression.
//!
//! Each channel is assigned a compression scheme (lossy DCT, lossless RLE, or
//! stored raw) and, for channels that take part in a color space conversion,
//! its role within the R/G/B triplet. Channels are grouped into CSC triplets
//! by matching the "R", "G", "B" layer suffix convention.

use crate::meta::attribute::{ChannelList, SampleType};

/// How a single channel is compressed within a DWAA/DWAB chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompressionScheme {
    /// Stored as raw data, deflate-compressed alongside the other unknown channels.
    Unknown,
    /// Compressed with the DCT + quantization pipeline.
    LossyDct,
    /// Compressed with run-length encoding only, losslessly.
    Rle,
}

/// Classification of a single channel.
#[derive(Copy, Clone, Debug)]
pub struct ChannelClassification {
    pub scheme: CompressionScheme,

    /// `Some(0)` for the luminance (Y) member of a CSC group, `Some(_)` for
    /// either chroma member, `None` if this channel is not part of a group.
    pub csc_channel_role: Option<u8>,
}

/// Indices, into the channel list, of the three channels forming one CSC group.
#[derive(Copy, Clone, Debug)]
pub struct CscGroup {
    pub r_index: usize,
    pub g_index: usize,
    pub b_index: usize,
}

/// Result of classifying every channel in a header's channel list.
#[derive(Clone, Debug)]
pub struct ClassificationResult {
    pub channel_classifications: Vec<ChannelClassification>,
    pub csc_groups: Vec<CscGroup>,
}

/// Classify every channel in `channels`, grouping R/G/B triplets for CSC treatment.
///
/// Channels are grouped by the portion of their name preceding a trailing
/// `.R`/`.G`/`.B` (or bare `R`/`G`/`B`) suffix; a prefix with all three
/// members present, all half-float, and sharing the same sampling rate forms
/// a CSC group. Ungrouped half-float channels are still compressed with the
/// lossy DCT, just without a color transform. Integer channels always take
/// the lossless RLE path since the DCT pipeline is inherently lossy; full
/// float channels fall back to the raw/deflate path since they carry more
/// dynamic range than the perceptual quantizer is designed for.
pub fn classify_channels(channels: &ChannelList) -> ClassificationResult {
    let mut channel_classifications: Vec<ChannelClassification> = channels
        .list
        .iter()
        .map(|channel| {
            let scheme = match channel.sample_type {
                SampleType::F16 => CompressionScheme::LossyDct,
                SampleType::F32 => CompressionScheme::Unknown,
                SampleType::U32 => CompressionScheme::Rle,
            };

            ChannelClassification {
                scheme,
                csc_channel_role: None,
            }
        })
        .collect();

    let mut csc_groups = Vec::new();

    for (prefix, r, g, b) in find_rgb_triplets(channels) {
        let _ = prefix;
        let all_half = [r, g, b]
            .iter()
            .all(|&idx| channels.list[idx].sample_type == SampleType::F16);
        let same_sampling = channels.list[r].sampling == channels.list[g].sampling
            && channels.list[g].sampling == channels.list[b].sampling;

        if !all_half || !same_sampling {
            continue;
        }

        channel_classifications[r].csc_channel_role = Some(0);
        channel_classifications[g].csc_channel_role = Some(1);
        channel_classifications[b].csc_channel_role = Some(2);

        csc_groups.push(CscGroup {
            r_index: r,
            g_index: g,
            b_index: b,
        });
    }

    ClassificationResult {
        channel_classifications,
        csc_groups,
    }
}

/// Find channel index triplets whose names share a prefix and end in
/// "R"/"G"/"B" (optionally separated by a dot, as in `diffuse.R`).
fn find_rgb_triplets(channels: &ChannelList) -> Vec<(String, usize, usize, usize)> {
    let mut triplets = Vec::new();
    let names: Vec<String> = channels.list.iter().map(|ch| ch.name.to_string()).collect();

    let mut seen_prefixes = std::collections::HashSet::new();

    for (idx, name) in names.iter().enumerate() {
        let Some((prefix, suffix)) = split_channel_suffix(name) else {
            continue;
        };

        if suffix != "R" || !seen_prefixes.insert(prefix.clone()) {
            continue;
        }

        let g_name = join_channel_suffix(&prefix, "G");
        let b_name = join_channel_suffix(&prefix, "B");

        let g_idx = names.iter().position(|n| *n == g_name);
        let b_idx = names.iter().position(|n| *n == b_name);

        if let (Some(g_idx), Some(b_idx)) = (g_idx, b_idx) {
            triplets.push((prefix, idx, g_idx, b_idx));
        }
    }

    triplets
}

/// Split a channel name into `(prefix, suffix)` where suffix is the trailing
/// "R", "G", or "B" layer name. Bare "R" splits into an empty prefix.
fn split_channel_suffix(name: &str) -> Option<(String, &str)> {
    if name == "R" || name == "G" || name == "B" {
        return Some((String::new(), name));
    }

    let suffix = &name[name.len() - 1..];
    if suffix != "R" && suffix != "G" && suffix != "B" {
        return None;
    }

    let rest = &name[..name.len() - 1];
    let prefix = rest.strip_suffix('.')?;
    Some((prefix.to_string(), suffix))
}

fn join_channel_suffix(prefix: &str, suffix: &str) -> String {
    if prefix.is_empty() {
        suffix.to_string()
    } else {
        format!("{}.{}", prefix, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::attribute::ChannelInfo;
    use crate::math::Vec2;
    fn channel(name: &str, sample_type: SampleType) -> ChannelInfo {
        ChannelInfo {
            name: crate::meta::attribute::Text::from(name).unwrap(),
            sample_type,
            quantize_linearly: false,
            sampling: Vec2(1, 1),
        }
    }

    fn channel_list(channels: Vec<ChannelInfo>) -> ChannelList {
        let bytes_per_pixel = channels
            .iter()
            .map(|c| c.sample_type.bytes_per_sample())
            .sum();

        ChannelList {
            list: smallvec::SmallVec::from_vec(channels),
            bytes_per_pixel,
            uniform_sample_type: None,
        }
    }

    #[test]
    fn test_bare_rgb_forms_one_csc_group() {
        let channels = channel_list(vec![
            channel("R", SampleType::F16),
            channel("G", SampleType::F16),
            channel("B", SampleType::F16),
        ]);

        let result = classify_channels(&channels);
        assert_eq!(result.csc_groups.len(), 1);
        let group = result.csc_groups[0];
        assert_eq!((group.r_index, group.g_index, group.b_index), (0, 1, 2));

        assert_eq!(result.channel_classifications[0].csc_channel_role, Some(0));
        assert_eq!(result.channel_classifications[1].csc_channel_role, Some(1));
        assert_eq!(result.channel_classifications[2].csc_channel_role, Some(2));
    }

    #[test]
    fn test_prefixed_rgb_forms_csc_group() {
        let channels = channel_list(vec![
            channel("diffuse.R", SampleType::F16),
            channel("diffuse.G", SampleType::F16),
            channel("diffuse.B", SampleType::F16),
            channel("A", SampleType::F16),
        ]);

        let result = classify_channels(&channels);
        assert_eq!(result.csc_groups.len(), 1);

        // the lone alpha channel is still lossy DCT, just ungrouped
        assert_eq!(
            result.channel_classifications[3].scheme,
            CompressionScheme::LossyDct
        );
        assert_eq!(result.channel_classifications[3].csc_channel_role, None);
    }

    #[test]
    fn test_incomplete_triplet_is_not_grouped() {
        let channels = channel_list(vec![
            channel("R", SampleType::F16),
            channel("G", SampleType::F16),
        ]);

        let result = classify_channels(&channels);
        assert!(result.csc_groups.is_empty());
        assert_eq!(result.channel_classifications[0].csc_channel_role, None);
    }

    #[test]
    fn test_uint_channel_is_rle() {
        let channels = channel_list(vec![channel("Id", SampleType::U32)]);
        let result = classify_channels(&channels);
        assert_eq!(
            result.channel_classifications[0].scheme,
            CompressionScheme::Rle
        );
    }

    #[test]
    fn test_float_channel_is_unknown_scheme() {
        let channels = channel_list(vec![channel("Z", SampleType::F32)]);
        let result = classify_channels(&channels);
        assert_eq!(
            result.channel_classifications[0].scheme,
            CompressionScheme::Unknown
        );
    }
}
