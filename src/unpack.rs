// cortexgraph: Colored de Bruijn graph binary format, index, and navigation.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use crate::GraphRecord;
use crate::headers::file::FormatError;
use crate::kmer::BinaryKmer;
use crate::nucleotide::decode_base;

type E = Box<dyn std::error::Error>;

/// Unpack `kmer_size` bases from a packed k-mer.
///
/// Inverse of [pack_kmer_with_bits](crate::pack::pack_kmer_with_bits) for
/// any word count that can hold the k-mer.
///
/// ## Errors and panics
///
/// Panics if `kmer.words` is too short to hold `kmer_size` bases.
///
/// ## Usage
/// ```rust
/// use cortexgraph::pack::pack_kmer;
/// use cortexgraph::unpack::unpack_kmer;
///
/// let packed = pack_kmer(b"GATTACA").unwrap();
/// assert_eq!(unpack_kmer(&packed, 7), b"GATTACA".to_vec());
/// ```
///
pub fn unpack_kmer(
    kmer: &BinaryKmer,
    kmer_size: usize,
) -> Vec<u8> {
    unpack_codes(kmer, kmer_size).into_iter().map(decode_base).collect()
}

// 2-bit codes of the first `kmer_size` bases, first base first.
pub(crate) fn unpack_codes(
    kmer: &BinaryKmer,
    kmer_size: usize,
) -> Vec<u8> {
    let kmer_bits = kmer.words.len();
    assert!(2 * kmer_size <= 64 * kmer_bits);

    (0..kmer_size).map(|idx| {
        let bit = 2 * (kmer_size - 1 - idx);
        let word = kmer.words[kmer_bits - 1 - bit / 64];
        ((word >> (bit % 64)) & 0b11) as u8
    }).collect()
}

/// Read the big-endian k-mer words at the start of an encoded record.
pub fn unpack_binary_kmer(
    bytes: &[u8],
    kmer_bits: usize,
) -> Result<BinaryKmer, E> {
    if bytes.len() < 8 * kmer_bits {
        return Err(Box::new(FormatError::new(format!("record holds {} bytes, k-mer needs {}", bytes.len(), 8 * kmer_bits))));
    }
    Ok(BinaryKmer{ words: words_from_slice(&bytes[0..(8 * kmer_bits)]) })
}

/// Deserialize one fixed-size record.
///
/// `bytes` must hold exactly one record as written by
/// [pack_record](crate::pack::pack_record).
pub fn unpack_record(
    bytes: &[u8],
    kmer_size: usize,
    kmer_bits: usize,
    num_colors: usize,
) -> Result<GraphRecord, E> {
    let expected_len = GraphRecord::encoded_len(kmer_bits, num_colors);
    if bytes.len() != expected_len {
        return Err(Box::new(FormatError::new(format!("record holds {} bytes, expected {}", bytes.len(), expected_len))));
    }

    Ok(record_from_slice(bytes, kmer_size, kmer_bits, num_colors))
}

/// Decode a record from a slice already known to hold one record.
///
/// Panics if `bytes` is shorter than the record.
pub(crate) fn record_from_slice(
    bytes: &[u8],
    kmer_size: usize,
    kmer_bits: usize,
    num_colors: usize,
) -> GraphRecord {
    let coverage_start = 8 * kmer_bits;
    let edges_start = coverage_start + 4 * num_colors;
    let edges_end = edges_start + num_colors;

    let words = words_from_slice(&bytes[0..coverage_start]);
    let coverages = bytes[coverage_start..edges_start].chunks_exact(4).map(|chunk| {
        let mut arr: [u8; 4] = [0; 4];
        arr.copy_from_slice(chunk);
        u32::from_le_bytes(arr)
    }).collect();
    let edges = bytes[edges_start..edges_end].to_vec();

    GraphRecord{ kmer: BinaryKmer{ words }, kmer_size, coverages, edges }
}

pub(crate) fn words_from_slice(
    bytes: &[u8],
) -> Vec<u64> {
    bytes.chunks_exact(8).map(|chunk| {
        let mut arr: [u8; 8] = [0; 8];
        arr.copy_from_slice(chunk);
        u64::from_be_bytes(arr)
    }).collect()
}
