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

//! Canonical k-mers and their packed representation.
//!
//! A [Kmer] is always stored in canonical orientation: the lexicographically
//! smaller of the input sequence and its reverse complement. Equality,
//! ordering and hashing only look at the canonical bases, so `ACGTT` and
//! `AACGT` are the same node.
//!
//! A [BinaryKmer] is the 2-bit packing of a canonical k-mer into 64-bit words
//! as it appears in a graph record. See [pack](crate::pack) and
//! [unpack](crate::unpack).

use crate::nucleotide::InvalidBase;
use crate::nucleotide::complement_code;
use crate::nucleotide::decode_base;
use crate::nucleotide::normalize;
use crate::nucleotide::reverse_complement;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKmerLength {
    pub expected: usize,
    pub got: usize,
}

impl std::fmt::Display for InvalidKmerLength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "k-mer length {} does not match expected length {}", self.got, self.expected)
    }
}

impl std::error::Error for InvalidKmerLength {}

/// Number of 64-bit words needed to hold a k-mer of `kmer_size` bases.
///
/// ## Usage
/// ```rust
/// use cortexgraph::kmer::kmer_bits_for;
///
/// assert_eq!(kmer_bits_for(31), 1);
/// assert_eq!(kmer_bits_for(32), 1);
/// assert_eq!(kmer_bits_for(33), 2);
/// assert_eq!(kmer_bits_for(63), 2);
/// ```
///
pub fn kmer_bits_for(
    kmer_size: usize,
) -> usize {
    (2 * kmer_size).div_ceil(64)
}

/// Packed 2-bit encoding of a canonical k-mer.
///
/// `words[0]` holds the most significant bits. The k-mer occupies the low
/// `2 * k` bits of the word array, so numeric order of the words equals
/// lexicographic order of the sequences for a fixed word count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinaryKmer {
    pub words: Vec<u64>,
}

impl BinaryKmer {
    pub fn kmer_bits(&self) -> usize {
        self.words.len()
    }
}

/// A k-mer in canonical orientation.
#[derive(Debug, Clone)]
pub struct Kmer {
    bases: Vec<u8>,
    flipped: bool,
}

/// Canonicalize `seq`.
///
/// Returns the smaller of `seq` and its reverse complement, and records
/// whether the reverse complement was kept. Palindromes keep the forward
/// orientation.
///
/// ## Usage
/// ```rust
/// use cortexgraph::kmer::canonicalize;
///
/// let kmer = canonicalize(b"TTTG").unwrap();
/// assert_eq!(kmer.as_str(), "CAAA");
/// assert!(kmer.is_flipped());
///
/// let kmer = canonicalize(b"ACGT").unwrap();
/// assert_eq!(kmer.as_str(), "ACGT");
/// assert!(!kmer.is_flipped());
/// ```
///
pub fn canonicalize(
    seq: &[u8],
) -> Result<Kmer, InvalidBase> {
    let fwd = normalize(seq)?;
    let rc = reverse_complement(&fwd)?;
    Ok(choose_canonical(fwd, rc))
}

// Ties keep `fwd`.
fn choose_canonical(
    fwd: Vec<u8>,
    rc: Vec<u8>,
) -> Kmer {
    if rc < fwd {
        Kmer{ bases: rc, flipped: true }
    } else {
        Kmer{ bases: fwd, flipped: false }
    }
}

impl Kmer {
    /// Canonicalize a k-mer given as text.
    pub fn new(
        seq: &str,
    ) -> Result<Self, InvalidBase> {
        canonicalize(seq.as_bytes())
    }

    /// Decode a packed k-mer of `kmer_size` bases.
    pub fn from_binary(
        kmer: &BinaryKmer,
        kmer_size: usize,
    ) -> Self {
        let codes = crate::unpack::unpack_codes(kmer, kmer_size);
        let fwd: Vec<u8> = codes.iter().map(|code| decode_base(*code)).collect();
        let rc: Vec<u8> = codes.iter().rev().map(|code| decode_base(complement_code(*code))).collect();
        choose_canonical(fwd, rc)
    }

    /// Canonical bases (uppercase ASCII).
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    pub fn as_str(&self) -> &str {
        // Bases are normalized to ASCII ACGT on construction.
        std::str::from_utf8(&self.bases).unwrap_or_default()
    }

    /// True if the canonical form is the reverse complement of the input.
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Pack the canonical bases into `kmer_bits` words.
    pub fn to_binary(
        &self,
        kmer_bits: usize,
    ) -> Result<BinaryKmer, E> {
        crate::pack::pack_kmer_with_bits(&self.bases, kmer_bits)
    }
}

impl std::fmt::Display for Kmer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq for Kmer {
    fn eq(&self, other: &Self) -> bool {
        self.bases == other.bases
    }
}

impl Eq for Kmer {}

impl Hash for Kmer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bases.hash(state);
    }
}

impl PartialOrd for Kmer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kmer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bases.cmp(&other.bases)
    }
}
