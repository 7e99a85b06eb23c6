//! 16-bit canonical Huffman compression and decompression.
//! Used by the PIZ compression method to entropy-code the wavelet-transformed samples.
// inspired by https://github.com/AcademySoftwareFoundation/openexr/blob/main/src/lib/OpenEXRCore/internal_huf.c

use crate::error::{Error, Result};
use crate::io::Data;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::io::{Read, Write};

/// No canonical Huffman code produced by this module is ever longer than this.
/// A code this long would require billions of samples with a near-singular
/// frequency distribution, far beyond what a single chunk of pixel data could contain.
const MAX_CODE_LENGTH: u8 = 58;

// c <<= nBits; c |= bits; then emit whole bytes once 8 or more bits have accumulated.
fn write_bits(count: i64, bits: i64, c: &mut i64, lc: &mut i64, mut out: impl Write) -> Result<()> {
    *c <<= count;
    *lc += count;
    *c |= bits;

    while *lc >= 8 {
        *lc -= 8;
        out.write_all(&[(*c >> *lc) as u8])?;
    }

    Ok(())
}

fn read_bits(count: i64, c: &mut i64, lc: &mut i64, mut read: impl Read) -> Result<i64> {
    while *lc < count {
        *c = (*c << 8) | (u8::read(&mut read)? as i64);
        *lc += 8;
    }

    *lc -= count;
    Ok((*c >> *lc) & ((1 << count) - 1))
}

fn flush_bits(c: &mut i64, lc: &mut i64, mut out: impl Write) -> Result<()> {
    if *lc > 0 {
        *c <<= 8 - *lc;
        out.write_all(&[*c as u8])?;
        *lc = 0;
    }

    Ok(())
}

/// A node in the Huffman tree built while computing code lengths. Leaves hold the
/// original 16-bit sample value; branches are indices into the same node array.
enum Node {
    Leaf(u16),
    Branch(usize, usize),
}

/// Min-heap entry ordered by ascending frequency. Ties are broken by insertion order,
/// which keeps the resulting tree (and thus the compressed size) deterministic.
struct HeapEntry {
    frequency: u64,
    tie_breaker: u32,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool { self.frequency == other.frequency && self.tie_breaker == other.tie_breaker }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.frequency.cmp(&self.frequency)
            .then_with(|| other.tie_breaker.cmp(&self.tie_breaker))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

/// Computes a `(symbol, code length)` pair for every distinct value in `data`,
/// by building a Huffman tree over their frequencies.
fn code_lengths(data: &[u16]) -> Vec<(u16, u8)> {
    let mut frequencies: HashMap<u16, u64> = HashMap::new();
    for &value in data {
        *frequencies.entry(value).or_insert(0) += 1;
    }

    if frequencies.len() <= 1 {
        return frequencies.into_keys().map(|symbol| (symbol, 1)).collect();
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(frequencies.len() * 2);
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(frequencies.len());

    for (tie_breaker, (&symbol, &frequency)) in frequencies.iter().enumerate() {
        let node = nodes.len();
        nodes.push(Node::Leaf(symbol));
        heap.push(HeapEntry { frequency, tie_breaker: tie_breaker as u32, node });
    }

    let mut next_tie_breaker = nodes.len() as u32;

    while heap.len() > 1 {
        let a = heap.pop().expect("heap has at least two entries");
        let b = heap.pop().expect("heap has at least two entries");

        let branch = nodes.len();
        nodes.push(Node::Branch(a.node, b.node));

        heap.push(HeapEntry { frequency: a.frequency + b.frequency, tie_breaker: next_tie_breaker, node: branch });
        next_tie_breaker += 1;
    }

    let root = heap.pop().expect("huffman tree has a root").node;

    let mut lengths = Vec::with_capacity(frequencies.len());
    let mut stack = vec![(root, 0_u8)];

    while let Some((index, depth)) = stack.pop() {
        match nodes[index] {
            Node::Leaf(symbol) => lengths.push((symbol, depth.max(1))),
            Node::Branch(left, right) => {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
    }

    lengths
}

/// Assigns canonical codes to a set of `(symbol, length)` pairs: shorter codes
/// sort first, and codes of the same length increase with the symbol's value.
fn canonical_codes(mut lengths: Vec<(u16, u8)>) -> Vec<(u16, u8, u32)> {
    lengths.sort_unstable_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut code = 0_u32;
    let mut previous_length = 0_u8;
    let mut result = Vec::with_capacity(lengths.len());

    for (symbol, length) in lengths {
        code <<= length - previous_length;
        result.push((symbol, length, code));
        code += 1;
        previous_length = length;
    }

    result
}

/// Huffman-compresses a buffer of 16-bit samples. The returned bytes start with a
/// small table of `(symbol, code length)` pairs, immediately followed by the
/// bit-packed, canonically-coded payload.
pub fn compress(uncompressed: &[u16]) -> Result<Vec<u8>> {
    if uncompressed.is_empty() {
        return Ok(Vec::new());
    }

    let code_table = canonical_codes(code_lengths(uncompressed));
    let codes: HashMap<u16, (u8, u32)> = code_table.iter().map(|&(symbol, length, code)| (symbol, (length, code))).collect();

    let mut out = Vec::with_capacity(uncompressed.len());

    (code_table.len() as u32).write(&mut out)?;
    for &(symbol, length, _) in &code_table {
        symbol.write(&mut out)?;
        length.write(&mut out)?;
    }

    let mut accumulator = 0_i64;
    let mut accumulated_bits = 0_i64;

    for &value in uncompressed {
        let &(length, code) = codes.get(&value).expect("every sample has an assigned huffman code");
        write_bits(length as i64, code as i64, &mut accumulator, &mut accumulated_bits, &mut out)?;
    }

    flush_bits(&mut accumulator, &mut accumulated_bits, &mut out)?;

    Ok(out)
}

/// Reverses [`compress`], reading exactly `expected_symbol_count` samples back out.
pub fn decompress(mut compressed: &[u8], expected_symbol_count: usize) -> Result<Vec<u16>> {
    if expected_symbol_count == 0 {
        return Ok(Vec::new());
    }

    if compressed.is_empty() {
        return Err(Error::invalid("huffman table"));
    }

    let entry_count = u32::read(&mut compressed)? as usize;
    if entry_count == 0 || entry_count > 1 + u16::MAX as usize {
        return Err(Error::invalid("huffman table"));
    }

    let mut lengths = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let symbol = u16::read(&mut compressed)?;
        let length = u8::read(&mut compressed)?;

        if length == 0 || length > MAX_CODE_LENGTH {
            return Err(Error::invalid("huffman table"));
        }

        lengths.push((symbol, length));
    }

    let mut decode_table: HashMap<(u8, u32), u16> = HashMap::with_capacity(entry_count);
    for (symbol, length, code) in canonical_codes(lengths) {
        decode_table.insert((length, code), symbol);
    }

    let mut accumulator = 0_i64;
    let mut accumulated_bits = 0_i64;
    let mut result = Vec::with_capacity(expected_symbol_count);

    while result.len() < expected_symbol_count {
        let mut code = 0_u32;
        let mut length = 0_u8;

        loop {
            if length > MAX_CODE_LENGTH {
                return Err(Error::invalid("huffman code"));
            }

            let bit = read_bits(1, &mut accumulator, &mut accumulated_bits, &mut compressed)?;
            code = (code << 1) | bit as u32;
            length += 1;

            if let Some(&symbol) = decode_table.get(&(length, code)) {
                result.push(symbol);
                break;
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_varied_data() {
        let data: Vec<u16> = (0..2000_u32).map(|i| ((i * 37) % 500) as u16).collect();
        let compressed = compress(&data).unwrap();
        let decompressed = decompress(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn round_trips_uniform_data() {
        let data = vec![42_u16; 300];
        let compressed = compress(&data).unwrap();
        let decompressed = decompress(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }

    #[test]
    fn round_trips_empty_data() {
        let data: Vec<u16> = Vec::new();
        let compressed = compress(&data).unwrap();
        assert!(compressed.is_empty());
        let decompressed = decompress(&compressed, 0).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn round_trips_two_distinct_values() {
        let data: Vec<u16> = (0..100).map(|i| if i % 3 == 0 { 1 } else { 65000 }).collect();
        let compressed = compress(&data).unwrap();
        let decompressed = decompress(&compressed, data.len()).unwrap();
        assert_eq!(data, decompressed);
    }
}
