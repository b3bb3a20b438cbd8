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

//! Printer for outputting [GraphRecord] records as plain text.
//!
//! Can be used to convert any iterator over [GraphRecord] data to their plain
//! text representation: the k-mer, its coverage in each color, and its edges
//! in each color, separated by spaces.
//!
//! Returns 1 line at a time using next().
//!
//! If the printer was given a [GraphHeader], the header lines from
//! [format_header] are returned together with the first line.
//!
//! ## Usage
//!
//! ### Print GraphRecord records stored in memory
//!
//! ```rust
//! use cortexgraph::GraphRecord;
//! use cortexgraph::printer::Printer;
//! use std::io::{Cursor, Write};
//!
//! let data = vec![
//!     GraphRecord::new("AAC", vec![2, 0], vec![0b0001_0010, 0]).unwrap(),
//!     GraphRecord::new("ACA", vec![1, 8], vec![0, 0b1000_0001]).unwrap(),
//! ];
//!
//! let mut iter = data.into_iter();
//! let mut printer = Printer::new(&mut iter);
//!
//! let mut output: Cursor<Vec<u8>> = Cursor::new(Vec::new());
//! for line in printer.by_ref() {
//!     output.write_all(&line).unwrap()
//! }
//!
//! let mut expected: Vec<u8> = Vec::new();
//! expected.append(&mut b"AAC 2 0 a....C.. ........\n".to_vec());
//! expected.append(&mut b"ACA 1 8 ........ ...tA...\n".to_vec());
//!
//! assert_eq!(output.get_ref(), &expected);
//! ```
//!

use crate::GraphRecord;
use crate::headers::file::GraphHeader;

use std::io::Write;

/// Format one record as a newline-terminated line.
pub fn format_record_line(
    record: &GraphRecord,
    out: &mut Vec<u8>,
) {
    // Writing into a Vec<u8> cannot fail.
    let _ = writeln!(out, "{}", record);
}

/// Format the header as `##`-prefixed lines.
///
/// One line for each of the fixed fields, then one line per color with its
/// metadata as tab-separated `key=value` pairs.
///
/// ## Usage
/// ```rust
/// use cortexgraph::headers::color::ColorMetadata;
/// use cortexgraph::headers::file::GraphHeader;
/// use cortexgraph::printer::format_header;
///
/// let header = GraphHeader::new(31, vec![ColorMetadata{ sample_name: "sample_1".to_string(), ..Default::default() }]);
/// let text = String::from_utf8(format_header(&header)).unwrap();
///
/// assert!(text.starts_with("##version=6\n##kmer_size=31\n##kmer_bits=1\n##num_colors=1\n##color=0\tsample_name=sample_1\t"));
/// ```
///
pub fn format_header(
    header: &GraphHeader,
) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let _ = writeln!(out, "##version={}", header.version);
    let _ = writeln!(out, "##kmer_size={}", header.kmer_size);
    let _ = writeln!(out, "##kmer_bits={}", header.kmer_bits);
    let _ = writeln!(out, "##num_colors={}", header.num_colors);
    for (idx, color) in header.colors.iter().enumerate() {
        let _ = writeln!(out,
            "##color={}\tsample_name={}\tmean_read_length={}\ttotal_sequence={}\ttip_clipping_applied={}\tlow_coverage_supernodes_removed={}\tlow_coverage_kmers_removed={}\tcleaned_against_graph={}\tlow_coverage_supernode_threshold={}\tlow_coverage_kmer_threshold={}\tcleaned_against_graph_name={}",
            idx,
            color.sample_name,
            color.mean_read_length,
            color.total_sequence,
            color.tip_clipping_applied,
            color.low_coverage_supernodes_removed,
            color.low_coverage_kmers_removed,
            color.cleaned_against_graph,
            color.low_coverage_supernode_threshold,
            color.low_coverage_kmer_threshold,
            color.cleaned_against_graph_name,
        );
    }
    out
}

pub struct Printer<'a, I: Iterator> where I: Iterator<Item=GraphRecord> {
    // Inputs
    records: &'a mut I,

    header: Option<GraphHeader>,

    header_printed: bool,
    index: usize,
}

impl<'a, I: Iterator> Printer<'a, I> where I: Iterator<Item=GraphRecord> {
    pub fn new(
        records: &'a mut I,
    ) -> Self {
        Printer{
            records,
            header: None,
            header_printed: false, index: 0,
        }
    }

    pub fn new_with_header(
        records: &'a mut I,
        header: GraphHeader,
    ) -> Self {
        Printer{
            records,
            header: Some(header),
            header_printed: false, index: 0,
        }
    }

    pub fn print_header(
        &self,
    ) -> Option<Vec<u8>> {
        self.header.as_ref().map(format_header)
    }

    /// Number of records printed so far.
    pub fn records_printed(&self) -> usize {
        self.index
    }
}

impl<I: Iterator> Iterator for Printer<'_, I> where I: Iterator<Item=GraphRecord> {
    type Item = Vec<u8>;

    fn next(
        &mut self,
    ) -> Option<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        if !self.header_printed {
            if let Some(mut header) = self.print_header() {
                out.append(&mut header);
            }
            self.header_printed = true;
        }

        if let Some(record) = self.records.next() {
            format_record_line(&record, &mut out);
            self.index += 1;
        }

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}
