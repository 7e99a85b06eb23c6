
// see https://github.com/AcademySoftwareFoundation/openexr/blob/master/OpenEXR/IlmImf/ImfPxr24Compressor.cpp


//! Lossy compression for F32 data, but lossless compression for U32 and F16 data.

// This compressor is based on source code that was contributed to
// OpenEXR by Pixar Animation Studios. The compression method was
// developed by Loren Carpenter.


//  The compressor preprocesses the pixel data to reduce entropy, and then calls zlib.
//	Compression of HALF and UINT channels is lossless, but compressing
//	FLOAT channels is lossy: 32-bit floating-point numbers are converted
//	to 24 bits by rounding the significand to 15 bits.
//
//	When the compressor is invoked, the caller has already arranged
//	the pixel data so that the values for each channel appear in a
//	contiguous block of memory.  The compressor converts the pixel
//	values to unsigned integers: For UINT, this is a no-op.  HALF
//	values are simply re-interpreted as 16-bit integers.  FLOAT
//	values are converted to 24 bits, and the resulting bit patterns
//	are interpreted as integers.  The compressor then replaces each
//	value with the difference between the value and its left neighbor.
//	This turns flat fields in the image into zeroes, and ramps into
//	strings of similar values.  Next, each difference is split into
//	2, 3 or 4 bytes, and the bytes are transposed so that all the
//	most significant bytes end up in a contiguous block, followed
//	by the second most significant bytes, and so on.  The resulting
//	string of bytes is compressed with zlib.

use super::*;

use miniz_oxide::deflate::compress_to_vec_zlib;
use zune_inflate::DeflateDecoder;

const COMPRESSION_LEVEL: u8 = 4;

pub fn compress(channels: &ChannelList, mut remaining_bytes: Bytes<'_>, area: IntegerBounds) -> Result<ByteVec> {
    if remaining_bytes.is_empty() { return Ok(Vec::new()); }

    let mut raw = vec![0_u8; channels.bytes_per_pixel * area.size.area()];
    let mut write_index = 0;

    for y in area.position.y() .. area.end().y() {
        for channel in &channels.list {
            if mod_p(y, usize_to_i32(channel.sampling.y())) != 0 { continue; }
            let sample_count_x = channel.subsampled_resolution(area.size).x();

            let mut indices = [0_usize; 4];
            let mut previous_pixel: u32 = 0;

            match channel.sample_type {
                SampleType::F16 => {
                    indices[0] = write_index;
                    indices[1] = indices[0] + sample_count_x;
                    write_index = indices[1] + sample_count_x;

                    for _ in 0..sample_count_x {
                        let pixel = u16::read(&mut remaining_bytes)? as u32;
                        let difference = pixel.wrapping_sub(previous_pixel);
                        previous_pixel = pixel;

                        raw[indices[0]] = (difference >> 8) as u8;
                        raw[indices[1]] = difference as u8;

                        indices[0] += 1;
                        indices[1] += 1;
                    }
                },

                SampleType::U32 => {
                    indices[0] = write_index;
                    indices[1] = indices[0] + sample_count_x;
                    indices[2] = indices[1] + sample_count_x;
                    indices[3] = indices[2] + sample_count_x;
                    write_index = indices[3] + sample_count_x;

                    for _ in 0..sample_count_x {
                        let pixel = u32::read(&mut remaining_bytes)?;
                        let difference = pixel.wrapping_sub(previous_pixel);
                        previous_pixel = pixel;

                        raw[indices[0]] = (difference >> 24) as u8;
                        raw[indices[1]] = (difference >> 16) as u8;
                        raw[indices[2]] = (difference >> 8) as u8;
                        raw[indices[3]] = difference as u8;

                        indices[0] += 1;
                        indices[1] += 1;
                        indices[2] += 1;
                        indices[3] += 1;
                    }
                },

                SampleType::F32 => {
                    indices[0] = write_index;
                    indices[1] = indices[0] + sample_count_x;
                    indices[2] = indices[1] + sample_count_x;
                    write_index = indices[2] + sample_count_x;

                    for _ in 0..sample_count_x {
                        let pixel = f32::read(&mut remaining_bytes)?;
                        let pixel = f32_to_f24(pixel);

                        let difference = pixel.wrapping_sub(previous_pixel);
                        previous_pixel = pixel;

                        raw[indices[0]] = (difference >> 16) as u8;
                        raw[indices[1]] = (difference >> 8) as u8;
                        raw[indices[2]] = difference as u8;

                        indices[0] += 1;
                        indices[1] += 1;
                        indices[2] += 1;
                    }
                },
            }
        }
    }

    Ok(compress_to_vec_zlib(&raw, COMPRESSION_LEVEL))
}

pub fn decompress(channels: &ChannelList, bytes: Bytes<'_>, area: IntegerBounds, expected_byte_size: usize, pedantic: bool) -> Result<ByteVec> {
    if bytes.is_empty() { return Ok(Vec::new()) }

    let mut decoder = DeflateDecoder::new(bytes);
    let raw = decoder.decode_zlib()
        .map_err(|error| Error::invalid(format!("pxr24 decompression failed: {:?}", error)))?;

    let mut read_index = 0;
    let mut write = Vec::with_capacity(expected_byte_size.min(2048*4));

    for y in area.position.y() .. area.end().y() {
        for channel in &channels.list {
            if mod_p(y, usize_to_i32(channel.sampling.y())) != 0 { continue; }

            let sample_count_x = channel.subsampled_resolution(area.size).x();

            let mut indices = [0_usize; 4];
            let mut pixel_accumulation: u32 = 0;

            match channel.sample_type {
                SampleType::F16 => {
                    indices[0] = read_index;
                    indices[1] = indices[0] + sample_count_x;
                    read_index = indices[1] + sample_count_x;

                    if read_index > raw.len() {
                        return Err(Error::invalid("not enough data"));
                    }

                    for _ in 0..sample_count_x {
                        let difference: u32 = ((raw[indices[0]] as u32) << 8) | (raw[indices[1]] as u32);
                        indices[0] += 1;
                        indices[1] += 1;

                        pixel_accumulation = pixel_accumulation.wrapping_add(difference);

                        let value = pixel_accumulation as u16;
                        write.extend_from_slice(&value.to_ne_bytes());
                    }
                },

                SampleType::U32 => {
                    indices[0] = read_index;
                    indices[1] = indices[0] + sample_count_x;
                    indices[2] = indices[1] + sample_count_x;
                    indices[3] = indices[2] + sample_count_x;
                    read_index = indices[3] + sample_count_x;

                    if read_index > raw.len() {
                        return Err(Error::invalid("not enough data"));
                    }

                    for _ in 0..sample_count_x {
                        let diff: u32 = ((raw[indices[0]] as u32) << 24)
                            | ((raw[indices[1]] as u32) << 16)
                            | ((raw[indices[2]] as u32) << 8)
                            | (raw[indices[3]] as u32);

                        indices[0] += 1;
                        indices[1] += 1;
                        indices[2] += 1;
                        indices[3] += 1;

                        pixel_accumulation = pixel_accumulation.wrapping_add(diff);

                        write.extend_from_slice(&pixel_accumulation.to_ne_bytes());
                    }
                },

                SampleType::F32 => {
                    indices[0] = read_index;
                    indices[1] = indices[0] + sample_count_x;
                    indices[2] = indices[1] + sample_count_x;
                    read_index = indices[2] + sample_count_x;

                    if read_index > raw.len() {
                        return Err(Error::invalid("not enough data"));
                    }

                    for _ in 0..sample_count_x {
                        let diff: u32 = ((raw[indices[0]] as u32) << 24)
                            | ((raw[indices[1]] as u32) << 16)
                            | ((raw[indices[2]] as u32) << 8);

                        indices[0] += 1;
                        indices[1] += 1;
                        indices[2] += 1;

                        pixel_accumulation = pixel_accumulation.wrapping_add(diff);

                        write.extend_from_slice(&pixel_accumulation.to_ne_bytes());
                    }
                }
            }
        }
    }

    if pedantic && read_index != raw.len() {
        return Err(Error::invalid("too much data"));
    }

    Ok(write)
}


// TODO share code with piz?
fn mod_p(x: i32, y: i32) -> i32 {
    x - y * div_p(x, y)
}

// TODO share code with piz?
fn div_p (x: i32, y: i32) -> i32 {
    if x >= 0 {
        if y >= 0 { x  / y }
        else { -(x  / -y) }
    }
    else {
        if y >= 0 { -((y-1-x) / y) }
        else { (-y-1-x) / -y }
    }
}


/// Conversion from 32-bit to 24-bit floating-point numbers.
/// Reverse conversion is just a simple 8-bit left shift.
pub fn f32_to_f24(float: f32) -> u32 {
    let bits = float.to_bits();

    let sign = bits & 0x80000000;
    let exponent = bits & 0x7f800000;
    let mantissa = bits & 0x007fffff;

    let result = if exponent == 0x7f800000 {
        if mantissa != 0 {
            // F is a NAN; we preserve the sign bit and
            // the 15 leftmost bits of the significand,
            // with one exception: If the 15 leftmost
            // bits are all zero, the NAN would turn
            // into an infinity, so we have to set at
            // least one bit in the significand.

            let mantissa = mantissa >> 8;
            (exponent >> 8) | mantissa | if mantissa == 0 { 1 } else { 0 }
        }
        else { // F is an infinity.
            exponent >> 8
        }
    }
    else { // F is finite, round the significand to 15 bits.
        let result = ((exponent | mantissa) + (mantissa & 0x00000080)) >> 8;

        if result >= 0x7f8000 {
            // F was close to FLT_MAX, and the significand was
            // rounded up, resulting in an exponent overflow.
            // Avoid the overflow by truncating the significand
            // instead of rounding it.

            (exponent | mantissa) >> 8
        }
        else {
            result
        }
    };

    return (sign >> 8) | result;
}
