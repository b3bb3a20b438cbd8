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

//! cortexgraph is a library and a command-line client for:
//!
//!   - Reading and writing colored de Bruijn graphs in the binary Cortex format.
//!   - Looking up k-mers in a graph, optionally narrowed by a sorted index.
//!   - Finding the predecessors and successors of a k-mer across one or more graphs.
//!
//! A graph stores a set of canonical k-mers. Every k-mer carries one coverage
//! count and one edge byte per color (sample). A k-mer and its reverse
//! complement are the same node, the node is stored under the
//! lexicographically smaller of the two, see [kmer::canonicalize].
//!
//! ## Usage
//!
//! ### Command line
//!
//! The cortexgraph CLI supports the following subcommands:
//!   - `cortexgraph view` print the header and records of a graph as text.
//!   - `cortexgraph find` look up k-mers given on the command line or read from a fastX file.
//!   - `cortexgraph links` print the predecessors and successors of k-mers.
//!
//! ### Rust API
//!
//! The API provides several functions for operating on structs that implement
//! [Read] and/or [Write]. These are meant for use cases where an entire stream
//! should be processed.
//!
//! For use cases requiring access to a single record at a time, the following
//! structs are provided:
//!
//!   - [Decoder](decoder::Decoder): takes a [Read] containing the encoded bytes and decodes them into [GraphRecord].
//!   - [Encoder](encoder::Encoder): takes [GraphRecord] records and writes them to a [Write].
//!   - [GraphFile](graph::GraphFile): memory-maps a graph on disk for iteration and k-mer lookups.
//!   - [GraphIndex](index::GraphIndex): narrows lookups in a [GraphFile](graph::GraphFile) to a range of records.
//!   - [GraphNavigator](navigator::GraphNavigator): finds adjacent k-mers in one or more graphs.
//!   - [Printer](printer::Printer): takes an iterator over [GraphRecord] records and formats them into plain text.
//!
//! See documentation for the appropriate functions or structs for usage examples.
//!
//! ## File format specification
//!
//! All integers are little-endian unless noted otherwise.
//!
//! ```text
//! header
//!   6 bytes      "CORTEX"
//!   u32          version, always 6
//!   u32          k-mer size k
//!   u32          kmer_bits, number of 64-bit words per k-mer
//!   u32          number of colors N
//!   N x u32      mean read length
//!   N x u64      total sequence length (big-endian)
//!   N x (u32 + bytes)  sample name
//!   N x 16 bytes reserved
//!   N x          4 x bool cleaning flags, u32 supernode threshold,
//!                u32 k-mer threshold, u32 + bytes cleaned against graph name
//!   6 bytes      "CORTEX"
//! records, repeated until the end of the file
//!   kmer_bits x u64 (big-endian)  packed k-mer
//!   N x u32                       coverage
//!   N x u8                        edges
//! ```
//!
//! The k-mer is packed 2 bits per base (A=0, C=1, G=2, T=3) into the low
//! `2k` bits of the word array, first base in the most significant position.
//! The high nibble of an edge byte holds the predecessors and the low nibble
//! the successors, see [edges].
//!
//! Records are sorted by k-mer. A companion text index can map k-mers to
//! ranges of records, see [index].
//!

use crate::edges::EdgeSet;
use crate::headers::file::GraphHeader;
use crate::kmer::BinaryKmer;
use crate::kmer::Kmer;
use crate::kmer::kmer_bits_for;

use std::cmp::Ordering;
use std::io::Read;
use std::io::Write;

pub mod decoder;
pub mod edges;
pub mod encoder;
pub mod graph;
pub mod headers;
pub mod index;
pub mod kmer;
pub mod navigator;
pub mod nucleotide;
pub mod pack;
pub mod printer;
pub mod unpack;

type E = Box<dyn std::error::Error>;

/// A single node of the graph.
///
/// The k-mer is stored packed and in canonical orientation. Equality and
/// ordering only consider the k-mer.
///
#[derive(Clone, Debug, Default)]
pub struct GraphRecord {
    /// Packed canonical k-mer.
    pub kmer: BinaryKmer,
    /// Number of bases in `kmer`.
    pub kmer_size: usize,
    /// Coverage in each color.
    pub coverages: Vec<u32>,
    /// Edge byte of each color, see [EdgeSet].
    pub edges: Vec<u8>,
}

impl GraphRecord {
    /// Build a record from a k-mer as text.
    ///
    /// The k-mer is canonicalized. If the reverse complement was kept, the
    /// edges are flipped so that they describe the stored orientation.
    ///
    /// ## Usage
    /// ```rust
    /// use cortexgraph::GraphRecord;
    /// use cortexgraph::edges::EdgeSet;
    ///
    /// // TTTG has successor T, stored as CAAA with predecessor A.
    /// let edges = EdgeSet::new(b"", b"T").unwrap();
    /// let record = GraphRecord::new("TTTG", vec![7], vec![edges.0]).unwrap();
    ///
    /// assert_eq!(record.kmer_as_string(), "CAAA");
    /// assert_eq!(record.edge_set(0), EdgeSet::new(b"A", b"").unwrap());
    /// assert_eq!(record.to_string(), "CAAA 7 a.......");
    /// ```
    ///
    pub fn new(
        kmer: &str,
        coverages: Vec<u32>,
        edges: Vec<u8>,
    ) -> Result<Self, E> {
        if coverages.len() != edges.len() {
            return Err(Box::new(crate::encoder::EncodeError::new(format!("{} coverages and {} edges for k-mer {}", coverages.len(), edges.len(), kmer))));
        }
        let canonical = Kmer::new(kmer)?;
        let edges = if canonical.is_flipped() {
            edges.iter().map(|edge| EdgeSet(*edge).flip().0).collect()
        } else {
            edges
        };

        Ok(GraphRecord{
            kmer: canonical.to_binary(kmer_bits_for(canonical.len()))?,
            kmer_size: canonical.len(),
            coverages,
            edges,
        })
    }

    /// Size of one encoded record in bytes.
    pub fn encoded_len(
        kmer_bits: usize,
        num_colors: usize,
    ) -> usize {
        8 * kmer_bits + 4 * num_colors + num_colors
    }

    pub fn num_colors(&self) -> usize {
        self.coverages.len()
    }

    /// Panics if `color` is out of range.
    pub fn coverage(
        &self,
        color: usize,
    ) -> u32 {
        self.coverages[color]
    }

    /// Panics if `color` is out of range.
    pub fn edges(
        &self,
        color: usize,
    ) -> u8 {
        self.edges[color]
    }

    pub fn edge_set(
        &self,
        color: usize,
    ) -> EdgeSet {
        EdgeSet(self.edges[color])
    }

    /// Union of the edges in all colors.
    pub fn merged_edges(&self) -> EdgeSet {
        self.edges.iter().fold(EdgeSet::default(), |acc, edge| acc.union(&EdgeSet(*edge)))
    }

    pub fn kmer(&self) -> Kmer {
        Kmer::from_binary(&self.kmer, self.kmer_size)
    }

    pub fn kmer_as_string(&self) -> String {
        self.kmer().to_string()
    }

    pub fn in_degree(
        &self,
        color: usize,
    ) -> u32 {
        self.edge_set(color).in_degree()
    }

    pub fn out_degree(
        &self,
        color: usize,
    ) -> u32 {
        self.edge_set(color).out_degree()
    }

    pub fn total_coverage(&self) -> u64 {
        self.coverages.iter().map(|coverage| *coverage as u64).sum()
    }
}

impl std::fmt::Display for GraphRecord {
    /// The k-mer, then the coverages, then the edges of each color.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.kmer_as_string())?;
        for coverage in self.coverages.iter() {
            write!(f, " {}", coverage)?;
        }
        for edge in self.edges.iter() {
            write!(f, " {}", EdgeSet(*edge))?;
        }
        Ok(())
    }
}

impl PartialEq for GraphRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GraphRecord {}

impl PartialOrd for GraphRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.kmer_size == other.kmer_size && self.kmer.kmer_bits() == other.kmer.kmer_bits() {
            self.kmer.cmp(&other.kmer)
        } else {
            self.kmer().cmp(&other.kmer())
        }
    }
}

/// Encode a header and records to something that implements [Write](std::io::Write).
///
/// Returns the number of records written.
///
/// ## Usage
/// ```rust
/// use cortexgraph::{encode_to_write, decode_from_read};
/// use cortexgraph::GraphRecord;
/// use cortexgraph::headers::color::ColorMetadata;
/// use cortexgraph::headers::file::GraphHeader;
/// use std::io::{Cursor, Seek};
///
/// let colors = vec![ColorMetadata{ sample_name: "sample_1".to_string(), ..Default::default() }];
/// let header = GraphHeader::new(3, colors);
/// let records = vec![
///     GraphRecord::new("AAC", vec![2], vec![0b0000_0010]).unwrap(),
///     GraphRecord::new("ACA", vec![1], vec![0b0001_0000]).unwrap(),
/// ];
///
/// let mut output: Cursor<Vec<u8>> = Cursor::new(Vec::new());
/// encode_to_write(&header, &records, &mut output).unwrap();
///
/// output.rewind().unwrap();
/// let (got_header, got_records) = decode_from_read(&mut output).unwrap();
///
/// assert_eq!(got_header, header);
/// assert_eq!(got_records, records);
/// ```
///
pub fn encode_to_write<W: Write>(
    header: &GraphHeader,
    records: &[GraphRecord],
    conn_out: &mut W,
) -> Result<usize, E> {
    let mut encoder = encoder::Encoder::new_from_header(conn_out, header.clone())?;
    for record in records {
        encoder.write_record(record)?;
    }
    encoder.finish()
}

/// Decode a header and all records from [Read](std::io::Read) to memory.
pub fn decode_from_read<R: Read>(
    conn_in: &mut R,
) -> Result<(GraphHeader, Vec<GraphRecord>), E> {
    let decoder = decoder::Decoder::new(conn_in)?;
    let header = decoder.file_header().clone();

    let records = decoder.collect::<Result<Vec<GraphRecord>, E>>()?;

    Ok((header, records))
}

/// Decode from [Read](std::io::Read) and format as text to [Write](std::io::Write).
///
/// Writes the header lines from [format_header](printer::format_header)
/// followed by one line per record.
///
/// ## Usage
/// ```rust
/// use cortexgraph::{encode_to_write, decode_from_read_to_write};
/// use cortexgraph::GraphRecord;
/// use cortexgraph::headers::color::ColorMetadata;
/// use cortexgraph::headers::file::GraphHeader;
/// use std::io::{Cursor, Seek};
///
/// let header = GraphHeader::new(3, vec![ColorMetadata::default()]);
/// let records = vec![GraphRecord::new("AAC", vec![2], vec![0b0001_0010]).unwrap()];
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(Vec::new());
/// encode_to_write(&header, &records, &mut input).unwrap();
/// input.rewind().unwrap();
///
/// let mut output: Vec<u8> = Vec::new();
/// decode_from_read_to_write(&mut input, &mut output).unwrap();
///
/// let text = String::from_utf8(output).unwrap();
/// assert!(text.ends_with("AAC 2 a....C..\n"));
/// ```
///
pub fn decode_from_read_to_write<R: Read, W: Write>(
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<(), E> {
    let decoder = decoder::Decoder::new(conn_in)?;

    conn_out.write_all(&printer::format_header(decoder.file_header()))?;
    let mut line: Vec<u8> = Vec::new();
    for record in decoder {
        line.clear();
        printer::format_record_line(&record?, &mut line);
        conn_out.write_all(&line)?;
    }

    conn_out.flush()?;
    Ok(())
}
