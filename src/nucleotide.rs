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

//! Two-bit nucleotide codes.
//!
//! Bases are coded in alphabetical order, which makes the numeric order of
//! packed k-mers agree with the lexicographic order of their sequences:
//!
//! | base | code |
//! |------|------|
//! | A    | 0b00 |
//! | C    | 0b01 |
//! | G    | 0b10 |
//! | T    | 0b11 |
//!
//! The complement of a code is `3 - code`.

/// The four bases in code order.
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBase {
    pub base: u8,
}

impl std::fmt::Display for InvalidBase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid nucleotide '{}' (byte {})", self.base.escape_ascii(), self.base)
    }
}

impl std::error::Error for InvalidBase {}

/// Encode a base into its 2-bit code.
///
/// Lowercase input is accepted.
///
/// ## Usage
/// ```rust
/// use cortexgraph::nucleotide::encode_base;
///
/// assert_eq!(encode_base(b'G').unwrap(), 2);
/// assert_eq!(encode_base(b'g').unwrap(), 2);
/// assert!(encode_base(b'N').is_err());
/// ```
///
#[inline]
pub fn encode_base(
    base: u8,
) -> Result<u8, InvalidBase> {
    match base {
        b'A' | b'a' => Ok(0),
        b'C' | b'c' => Ok(1),
        b'G' | b'g' => Ok(2),
        b'T' | b't' => Ok(3),
        _ => Err(InvalidBase{ base }),
    }
}

/// Decode a 2-bit code into an uppercase base.
///
/// Only the two lowest bits of `code` are used.
#[inline]
pub fn decode_base(
    code: u8,
) -> u8 {
    BASES[(code & 0b11) as usize]
}

/// Complement of a 2-bit code.
///
/// Only the two lowest bits of `code` are used.
#[inline]
pub fn complement_code(
    code: u8,
) -> u8 {
    3 - (code & 0b11)
}

/// Complement of a base, normalized to uppercase.
#[inline]
pub fn complement_base(
    base: u8,
) -> Result<u8, InvalidBase> {
    Ok(decode_base(complement_code(encode_base(base)?)))
}

/// Uppercase `seq`, failing on anything outside {A,C,G,T}.
pub fn normalize(
    seq: &[u8],
) -> Result<Vec<u8>, InvalidBase> {
    seq.iter().map(|base| encode_base(*base).map(decode_base)).collect()
}

/// Reverse complement of `seq`, normalized to uppercase.
///
/// ## Usage
/// ```rust
/// use cortexgraph::nucleotide::reverse_complement;
///
/// assert_eq!(reverse_complement(b"AACG").unwrap(), b"CGTT".to_vec());
/// ```
///
pub fn reverse_complement(
    seq: &[u8],
) -> Result<Vec<u8>, InvalidBase> {
    seq.iter().rev().map(|base| complement_base(*base)).collect()
}

#[cfg(test)]
mod tests {

    #[test]
    fn encode_decode_all_bases() {
        use super::{encode_base, decode_base};

        let got: Vec<u8> = b"ACGTacgt".iter().map(|x| decode_base(encode_base(*x).unwrap())).collect();
        assert_eq!(got, b"ACGTACGT".to_vec());
    }

    #[test]
    fn encode_invalid_base() {
        use super::{encode_base, InvalidBase};

        assert_eq!(encode_base(b'N'), Err(InvalidBase{ base: b'N' }));
        assert_eq!(encode_base(b'-'), Err(InvalidBase{ base: b'-' }));
    }

    #[test]
    fn complement_codes() {
        use super::{complement_code, decode_base};

        let got: Vec<u8> = (0..4).map(|code| decode_base(complement_code(code))).collect();
        assert_eq!(got, b"TGCA".to_vec());
        assert_eq!(complement_code(0b111), 0);
    }

    #[test]
    fn complement_pairs() {
        use super::complement_base;

        assert_eq!(complement_base(b'A').unwrap(), b'T');
        assert_eq!(complement_base(b'c').unwrap(), b'G');
        assert_eq!(complement_base(b'G').unwrap(), b'C');
        assert_eq!(complement_base(b'T').unwrap(), b'A');
    }

    #[test]
    fn reverse_complement_mixed_case() {
        use super::reverse_complement;

        assert_eq!(reverse_complement(b"acgTTg").unwrap(), b"CAACGT".to_vec());
        assert!(reverse_complement(b"ACNT").is_err());
    }

    #[test]
    fn normalize_uppercases() {
        use super::normalize;

        assert_eq!(normalize(b"gatTaca").unwrap(), b"GATTACA".to_vec());
    }
}
