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
use crate::headers::file::FormatError;

use std::io::Read;

use bincode::{Encode, Decode};
use bincode::encode_into_std_write;
use bincode::decode_from_std_read;

type E = Box<dyn std::error::Error>;

/// Bytes per color excluding the two variable-length names.
pub const COLOR_FIXED_LEN: usize = 4 + 8 + 4 + ERROR_RATE_LEN + 4 + 8 + 4;

/// Reserved per-color block that is skipped on read and zeroed on write.
const ERROR_RATE_LEN: usize = 16;

/// Sample and cleaning information of one color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMetadata {
    pub mean_read_length: u32,
    pub total_sequence: u64,
    pub sample_name: String,
    pub tip_clipping_applied: bool,
    pub low_coverage_supernodes_removed: bool,
    pub low_coverage_kmers_removed: bool,
    pub cleaned_against_graph: bool,
    pub low_coverage_supernode_threshold: u32,
    pub low_coverage_kmer_threshold: u32,
    pub cleaned_against_graph_name: String,
}

/// Cleaning block of one color without the trailing graph name.
#[derive(Encode, Decode)]
struct CleaningFields {
    tip_clipping_applied: bool,
    low_coverage_supernodes_removed: bool,
    low_coverage_kmers_removed: bool,
    cleaned_against_graph: bool,
    low_coverage_supernode_threshold: u32,
    low_coverage_kmer_threshold: u32,
}

fn truncated(err: impl std::fmt::Display) -> FormatError {
    FormatError::new(format!("truncated color information: {}", err))
}

fn encode_name(
    name: &str,
    bytes: &mut Vec<u8>,
) -> Result<(), E> {
    encode_into_std_write(
        name.len() as u32,
        bytes,
        bincode::config::standard().with_fixed_int_encoding(),
    )?;
    bytes.extend_from_slice(name.as_bytes());
    Ok(())
}

// Some producers count a null terminator in the name length, drop those bytes.
fn read_name<R: Read>(
    conn: &mut R,
) -> Result<String, E> {
    let len: u32 = decode_from_std_read(
        conn,
        bincode::config::standard().with_fixed_int_encoding(),
    ).map_err(truncated)?;

    let mut name: Vec<u8> = Vec::new();
    conn.by_ref().take(len as u64).read_to_end(&mut name)?;
    if name.len() != len as usize {
        return Err(Box::new(truncated(format!("name of {} bytes ends after {}", len, name.len()))));
    }
    name.retain(|byte| *byte != 0);

    Ok(String::from_utf8_lossy(&name).to_string())
}

/// Serialize the per-color blocks.
///
/// Each field is written for every color before moving on to the next
/// field: all mean read lengths, then all sequence totals (big-endian), then
/// all sample names, then the reserved error rate blocks, and last the
/// cleaning information of each color.
pub fn encode_color_blocks(
    colors: &[ColorMetadata],
    bytes: &mut Vec<u8>,
) -> Result<(), E> {
    let little = bincode::config::standard().with_fixed_int_encoding();
    let big = bincode::config::standard().with_fixed_int_encoding().with_big_endian();

    for color in colors {
        encode_into_std_write(color.mean_read_length, bytes, little)?;
    }
    for color in colors {
        encode_into_std_write(color.total_sequence, bytes, big)?;
    }
    for color in colors {
        encode_name(&color.sample_name, bytes)?;
    }
    bytes.resize(bytes.len() + colors.len() * ERROR_RATE_LEN, 0);
    for color in colors {
        let cleaning = CleaningFields{
            tip_clipping_applied: color.tip_clipping_applied,
            low_coverage_supernodes_removed: color.low_coverage_supernodes_removed,
            low_coverage_kmers_removed: color.low_coverage_kmers_removed,
            cleaned_against_graph: color.cleaned_against_graph,
            low_coverage_supernode_threshold: color.low_coverage_supernode_threshold,
            low_coverage_kmer_threshold: color.low_coverage_kmer_threshold,
        };
        let nbytes = encode_into_std_write(&cleaning, bytes, little)?;
        assert_eq!(nbytes, 12);
        encode_name(&color.cleaned_against_graph_name, bytes)?;
    }

    Ok(())
}

/// Read `num_colors` per-color blocks in the layout of [encode_color_blocks].
pub fn read_color_blocks<R: Read>(
    num_colors: usize,
    conn: &mut R,
) -> Result<Vec<ColorMetadata>, E> {
    let little = bincode::config::standard().with_fixed_int_encoding();
    let big = bincode::config::standard().with_fixed_int_encoding().with_big_endian();

    let mut colors: Vec<ColorMetadata> = Vec::new();
    for _ in 0..num_colors {
        let mean_read_length: u32 = decode_from_std_read(conn, little).map_err(truncated)?;
        colors.push(ColorMetadata{ mean_read_length, ..Default::default() });
    }
    for color in colors.iter_mut() {
        color.total_sequence = decode_from_std_read(conn, big).map_err(truncated)?;
    }
    for color in colors.iter_mut() {
        color.sample_name = read_name(conn)?;
    }
    for _ in 0..num_colors {
        let mut error_rate: [u8; ERROR_RATE_LEN] = [0; ERROR_RATE_LEN];
        conn.read_exact(&mut error_rate).map_err(truncated)?;
    }
    for color in colors.iter_mut() {
        let cleaning: CleaningFields = decode_from_std_read(conn, little).map_err(truncated)?;
        color.tip_clipping_applied = cleaning.tip_clipping_applied;
        color.low_coverage_supernodes_removed = cleaning.low_coverage_supernodes_removed;
        color.low_coverage_kmers_removed = cleaning.low_coverage_kmers_removed;
        color.cleaned_against_graph = cleaning.cleaned_against_graph;
        color.low_coverage_supernode_threshold = cleaning.low_coverage_supernode_threshold;
        color.low_coverage_kmer_threshold = cleaning.low_coverage_kmer_threshold;
        color.cleaned_against_graph_name = read_name(conn)?;
    }

    Ok(colors)
}

#[cfg(test)]
mod tests {

    #[test]
    fn encode_color_blocks_column_order() {
        use super::{ColorMetadata, encode_color_blocks};

        let colors = vec![
            ColorMetadata{ mean_read_length: 1, total_sequence: 2, sample_name: "a".to_string(), ..Default::default() },
            ColorMetadata{ mean_read_length: 3, total_sequence: 4, sample_name: "bc".to_string(), low_coverage_kmers_removed: true, low_coverage_kmer_threshold: 5, ..Default::default() },
        ];
        let mut got: Vec<u8> = Vec::new();
        encode_color_blocks(&colors, &mut got).unwrap();

        let mut expected: Vec<u8> = vec![1, 0, 0, 0, 3, 0, 0, 0];
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 4]);
        expected.extend_from_slice(&[1, 0, 0, 0, b'a', 2, 0, 0, 0, b'b', b'c']);
        expected.extend_from_slice(&[0; 32]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0, 0, 1, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0]);

        assert_eq!(got, expected);
    }

    #[test]
    fn read_color_blocks_trims_null_bytes() {
        use super::{ColorMetadata, encode_color_blocks, read_color_blocks};
        use std::io::Cursor;

        let colors = vec![ColorMetadata{ sample_name: "sample\0".to_string(), cleaned_against_graph_name: "\0".to_string(), ..Default::default() }];
        let mut bytes: Vec<u8> = Vec::new();
        encode_color_blocks(&colors, &mut bytes).unwrap();

        let got = read_color_blocks(1, &mut Cursor::new(bytes)).unwrap();
        assert_eq!(got[0].sample_name, "sample");
        assert_eq!(got[0].cleaned_against_graph_name, "");
    }

    #[test]
    fn read_color_blocks_name_past_end() {
        use super::{ColorMetadata, encode_color_blocks, read_color_blocks};
        use crate::headers::file::FormatError;
        use std::io::Cursor;

        let colors = vec![ColorMetadata{ sample_name: "sample".to_string(), ..Default::default() }];
        let mut bytes: Vec<u8> = Vec::new();
        encode_color_blocks(&colors, &mut bytes).unwrap();
        // Claim a name far longer than the data.
        bytes[12] = 0xFF;
        bytes[13] = 0xFF;

        let err = read_color_blocks(1, &mut Cursor::new(bytes)).unwrap_err();
        assert!(err.downcast_ref::<FormatError>().is_some());
    }
}
