
// see https://github.com/openexr/openexr/blob/master/OpenEXR/IlmImf/ImfCompressor.cpp


//! compresses 16 scan lines at once or
//! compresses 1 single scan line at once

use super::*;
use super::optimize_bytes::*;

use miniz_oxide::deflate::compress_to_vec_zlib;
use zune_inflate::DeflateDecoder;

// scanline decompression routine, see https://github.com/openexr/openexr/blob/master/OpenEXR/IlmImf/ImfScanLineInputFile.cpp
// 1. Uncompress the data, if necessary (If the line is uncompressed, it's in XDR format, regardless of the compressor's output format.)
// 3. Convert one scan line's worth of pixel data back from the machine-independent representation
// 4. Fill the frame buffer with pixel data, respective to sampling and whatnot

const COMPRESSION_LEVEL: u8 = 4;

pub fn decompress_bytes(data: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = decoder.decode_zlib()
        .map_err(|error| Error::invalid(format!("zip decompression failed: {:?}", error)))?;

    if decompressed.len() != expected_byte_size {
        return Err(Error::invalid("zip decompressed size"));
    }

    differences_to_samples(&mut decompressed);
    interleave_byte_blocks(&mut decompressed);
    Ok(decompressed)
}

pub fn compress_bytes(packed: Bytes<'_>) -> Result<ByteVec> {
    let mut packed = Vec::from(packed); // TODO no alloc
    separate_bytes_fragments(&mut packed);
    samples_to_differences(&mut packed);

    Ok(compress_to_vec_zlib(&packed, COMPRESSION_LEVEL))
}
