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

//! Per-color edge bytes.
//!
//! Each color of a record stores one byte describing the single-base
//! extensions of the k-mer in its canonical orientation:
//!
//! ```text
//!  bit   7 6 5 4 | 3 2 1 0
//!        T G C A | T G C A
//!      predecessors | successors
//! ```
//!
//! A set bit `i` in the low nibble means `kmer[1..] + BASES[i]` is in the
//! graph, a set bit `4 + i` means `BASES[i] + kmer[..k-1]` is.
//!
//! When the caller's k-mer is the reverse complement of the stored one, the
//! roles swap: the query's successors are the complements of the stored
//! predecessors and vice versa. The `*_complement` accessors return exactly
//! those sets.

use crate::nucleotide::BASES;
use crate::nucleotide::InvalidBase;
use crate::nucleotide::encode_base;

/// Text that is not the 8-character form of an [EdgeSet].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEdges {
    pub text: String,
    pub message: String,
}

impl std::fmt::Display for InvalidEdges {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid edge string '{}': {}", self.text, self.message)
    }
}

impl std::error::Error for InvalidEdges {}

/// Edges of one color of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdgeSet(pub u8);

#[inline]
fn nibble_to_bases(
    nibble: u8,
) -> Vec<u8> {
    (0..4).filter(|idx| nibble & (1 << idx) != 0).map(|idx| BASES[idx]).collect()
}

#[inline]
fn nibble_to_complement_bases(
    nibble: u8,
) -> Vec<u8> {
    // Complement of code i is 3 - i, walk downwards to keep ACGT order.
    (0..4).rev().filter(|idx| nibble & (1 << idx) != 0).map(|idx| BASES[3 - idx]).collect()
}

fn bases_to_nibble(
    bases: &[u8],
) -> Result<u8, InvalidBase> {
    bases.iter().try_fold(0_u8, |acc, base| -> Result<u8, InvalidBase> { Ok(acc | (1 << encode_base(*base)?)) })
}

impl EdgeSet {
    /// Build an edge byte from predecessor and successor bases.
    ///
    /// ## Usage
    /// ```rust
    /// use cortexgraph::edges::EdgeSet;
    ///
    /// let edges = EdgeSet::new(b"C", b"AG").unwrap();
    /// assert_eq!(edges.0, 0b0010_0101);
    /// assert_eq!(edges.predecessors(), b"C".to_vec());
    /// assert_eq!(edges.successors(), b"AG".to_vec());
    /// ```
    ///
    pub fn new(
        predecessors: &[u8],
        successors: &[u8],
    ) -> Result<Self, InvalidBase> {
        Ok(EdgeSet((bases_to_nibble(predecessors)? << 4) | bases_to_nibble(successors)?))
    }

    pub fn successors(&self) -> Vec<u8> {
        nibble_to_bases(self.0 & 0x0F)
    }

    pub fn predecessors(&self) -> Vec<u8> {
        nibble_to_bases(self.0 >> 4)
    }

    /// Complements of the successor bases, in ACGT order.
    pub fn successors_complement(&self) -> Vec<u8> {
        nibble_to_complement_bases(self.0 & 0x0F)
    }

    /// Complements of the predecessor bases, in ACGT order.
    pub fn predecessors_complement(&self) -> Vec<u8> {
        nibble_to_complement_bases(self.0 >> 4)
    }

    pub fn has_successor(
        &self,
        base: u8,
    ) -> Result<bool, InvalidBase> {
        Ok(self.0 & (1 << encode_base(base)?) != 0)
    }

    pub fn has_predecessor(
        &self,
        base: u8,
    ) -> Result<bool, InvalidBase> {
        Ok(self.0 & (1 << (4 + encode_base(base)?)) != 0)
    }

    pub fn out_degree(&self) -> u32 {
        (self.0 & 0x0F).count_ones()
    }

    pub fn in_degree(&self) -> u32 {
        (self.0 >> 4).count_ones()
    }

    pub fn union(
        &self,
        other: &EdgeSet,
    ) -> EdgeSet {
        EdgeSet(self.0 | other.0)
    }

    /// Edges of the same node seen from the reverse complement strand.
    pub fn flip(&self) -> EdgeSet {
        let predecessors = self.0 >> 4;
        let successors = self.0 & 0x0F;
        EdgeSet((reverse_nibble(successors) << 4) | reverse_nibble(predecessors))
    }

    /// Parse the 8-character text form produced by [Display](std::fmt::Display).
    ///
    /// ## Usage
    /// ```rust
    /// use cortexgraph::edges::EdgeSet;
    ///
    /// let edges = EdgeSet::parse(".c..A..T").unwrap();
    /// assert_eq!(edges, EdgeSet::new(b"C", b"AT").unwrap());
    /// assert_eq!(edges.to_string(), ".c..A..T");
    /// ```
    ///
    pub fn parse(
        text: &str,
    ) -> Result<EdgeSet, InvalidEdges> {
        let invalid = |message: String| InvalidEdges{ text: text.to_string(), message };
        let bytes = text.as_bytes();
        if bytes.len() != 8 {
            return Err(invalid(format!("expected 8 characters, got {}", bytes.len())));
        }
        let mut byte = 0_u8;
        for (idx, symbol) in bytes.iter().enumerate() {
            if *symbol == b'.' {
                continue;
            }
            let code = encode_base(*symbol).map_err(|err| invalid(format!("position {}: {}", idx, err)))?;
            if code as usize != idx % 4 {
                return Err(invalid(format!("'{}' at position {}", *symbol as char, idx)));
            }
            byte |= if idx < 4 { 1 << (4 + code) } else { 1 << code };
        }
        Ok(EdgeSet(byte))
    }
}

// Swapping bit i with bit 3 - i complements every base in the nibble.
#[inline]
fn reverse_nibble(
    nibble: u8,
) -> u8 {
    ((nibble & 0b0001) << 3) | ((nibble & 0b0010) << 1) | ((nibble & 0b0100) >> 1) | ((nibble & 0b1000) >> 3)
}

impl std::fmt::Display for EdgeSet {
    /// Lowercase predecessors then uppercase successors, `.` marks a missing edge.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut text = String::with_capacity(8);
        for idx in 0..4 {
            text.push(if self.0 & (1 << (4 + idx)) != 0 { BASES[idx].to_ascii_lowercase() as char } else { '.' });
        }
        for idx in 0..4 {
            text.push(if self.0 & (1 << idx) != 0 { BASES[idx] as char } else { '.' });
        }
        write!(f, "{}", text)
    }
}
