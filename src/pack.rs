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
use crate::kmer::BinaryKmer;
use crate::kmer::InvalidKmerLength;
use crate::kmer::kmer_bits_for;
use crate::nucleotide::encode_base;

type E = Box<dyn std::error::Error>;

/// Pack a k-mer into the minimum number of 64-bit words.
///
/// The bases are packed as given, callers that need the canonical packing
/// should canonicalize first (see [Kmer::to_binary](crate::kmer::Kmer::to_binary)).
///
/// ## Usage
/// ```rust
/// use cortexgraph::pack::pack_kmer;
///
/// // C=01 G=10 T=11 in the lowest six bits
/// let packed = pack_kmer(b"CGT").unwrap();
/// assert_eq!(packed.words, vec![0b01_10_11]);
/// ```
///
pub fn pack_kmer(
    bases: &[u8],
) -> Result<BinaryKmer, E> {
    pack_kmer_with_bits(bases, kmer_bits_for(bases.len()))
}

/// Pack a k-mer into exactly `kmer_bits` words.
///
/// Unused high bits of the leading word (and any leading words beyond
/// what the k-mer needs) are zero. The first base ends up in the most
/// significant occupied position.
///
/// ## Errors
///
/// Returns [InvalidBase](crate::nucleotide::InvalidBase) for symbols
/// outside {A,C,G,T} and [InvalidKmerLength] if `kmer_bits` words cannot hold
/// the k-mer.
///
pub fn pack_kmer_with_bits(
    bases: &[u8],
    kmer_bits: usize,
) -> Result<BinaryKmer, E> {
    let kmer_size = bases.len();
    if kmer_bits_for(kmer_size) > kmer_bits {
        return Err(Box::new(InvalidKmerLength{ expected: 32 * kmer_bits, got: kmer_size }));
    }

    let mut words: Vec<u64> = vec![0; kmer_bits];
    for (idx, base) in bases.iter().enumerate() {
        let code = encode_base(*base)? as u64;
        let bit = 2 * (kmer_size - 1 - idx);
        words[kmer_bits - 1 - bit / 64] |= code << (bit % 64);
    }

    Ok(BinaryKmer{ words })
}

/// Serialize a record into its fixed-size on-disk layout.
///
/// Appends `8 * kmer_bits + 5 * num_colors` bytes to `out`: the k-mer words
/// big-endian, the coverages little-endian, then one edge byte per color.
pub fn pack_record(
    record: &GraphRecord,
    out: &mut Vec<u8>,
) {
    out.reserve(GraphRecord::encoded_len(record.kmer.kmer_bits(), record.num_colors()));
    record.kmer.words.iter().for_each(|word| out.extend_from_slice(&word.to_be_bytes()));
    record.coverages.iter().for_each(|coverage| out.extend_from_slice(&coverage.to_le_bytes()));
    out.extend_from_slice(&record.edges);
}
