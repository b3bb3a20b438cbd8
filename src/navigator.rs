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

//! Adjacent k-mers from edge bytes.
//!
//! The successors of a query `q` are the k-mers `q[1..] + b` and its
//! predecessors the k-mers `b + q[..k-1]` for each base `b` in the edge set
//! of the record storing `q`. Results are returned in the orientation of the
//! query, not in canonical orientation.
//!
//! If the query is the reverse complement of the stored k-mer, the stored
//! predecessors complemented are the query's successors and the stored
//! successors complemented are its predecessors.
//!
//! ## Usage
//!
//! ```rust
//! use cortexgraph::GraphRecord;
//! use cortexgraph::edges::EdgeSet;
//! use cortexgraph::graph::{GraphFile, GraphWriter};
//! use cortexgraph::headers::color::ColorMetadata;
//! use cortexgraph::navigator::{predecessors, successors};
//! use std::collections::BTreeSet;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("sample.ctx");
//!
//! let mut writer = GraphWriter::create(&path, vec![ColorMetadata::default()]).unwrap();
//! writer.append(&GraphRecord::new("AAAA", vec![3], vec![EdgeSet::new(b"", b"C").unwrap().0]).unwrap()).unwrap();
//! writer.close().unwrap();
//!
//! let graph = GraphFile::open(&path).unwrap();
//! assert_eq!(successors(&graph, None, "AAAA").unwrap(), BTreeSet::from(["AAAC".to_string()]));
//! assert_eq!(predecessors(&graph, None, "TTTT").unwrap(), BTreeSet::from(["GTTT".to_string()]));
//! ```
//!

use crate::GraphRecord;
use crate::edges::EdgeSet;
use crate::graph::GraphFile;
use crate::index::GraphIndex;
use crate::kmer::Kmer;
use crate::nucleotide::normalize;

use std::collections::BTreeSet;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColor {
    pub color: usize,
    pub num_colors: usize,
}

impl std::fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "color {} is out of range for a graph with {} colors", self.color, self.num_colors)
    }
}

impl std::error::Error for InvalidColor {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Successors,
    Predecessors,
}

// Bases extending `query` in `direction`, in the query's orientation.
fn extension_bases(
    edges: EdgeSet,
    flipped: bool,
    direction: Direction,
) -> Vec<u8> {
    match (direction, flipped) {
        (Direction::Successors, false) => edges.successors(),
        (Direction::Successors, true) => edges.predecessors_complement(),
        (Direction::Predecessors, false) => edges.predecessors(),
        (Direction::Predecessors, true) => edges.successors_complement(),
    }
}

fn extend(
    query: &[u8],
    base: u8,
    direction: Direction,
) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(query.len());
    match direction {
        Direction::Successors => {
            out.extend_from_slice(&query[1..]);
            out.push(base);
        },
        Direction::Predecessors => {
            out.push(base);
            out.extend_from_slice(&query[..(query.len() - 1)]);
        },
    }
    // Both parts are ACGT.
    String::from_utf8_lossy(&out).into_owned()
}

fn edges_of(
    record: &GraphRecord,
    color: Option<usize>,
) -> Result<EdgeSet, E> {
    match color {
        Some(color) if color >= record.num_colors() => Err(Box::new(InvalidColor{ color, num_colors: record.num_colors() })),
        Some(color) => Ok(record.edge_set(color)),
        None => Ok(record.merged_edges()),
    }
}

/// Finds adjacent k-mers across one or more graphs.
///
/// Each source is a graph with an optional index. Results are the union over
/// all sources, and over all colors unless a color is set with
/// [with_color](GraphNavigator::with_color).
///
/// ## Usage
/// ```rust
/// use cortexgraph::GraphRecord;
/// use cortexgraph::edges::EdgeSet;
/// use cortexgraph::graph::{GraphFile, GraphWriter};
/// use cortexgraph::headers::color::ColorMetadata;
/// use cortexgraph::navigator::GraphNavigator;
/// use std::collections::BTreeSet;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("sample.ctx");
///
/// let edges = vec![EdgeSet::new(b"", b"G").unwrap().0, EdgeSet::new(b"T", b"A").unwrap().0];
/// let mut writer = GraphWriter::create(&path, vec![ColorMetadata::default(); 2]).unwrap();
/// writer.append(&GraphRecord::new("ACGT", vec![1, 1], edges).unwrap()).unwrap();
/// writer.close().unwrap();
///
/// let graph = GraphFile::open(&path).unwrap();
/// let navigator = GraphNavigator::new().with_source(&graph, None).with_color(0);
///
/// assert_eq!(navigator.successors("ACGT").unwrap(), BTreeSet::from(["CGTG".to_string()]));
/// assert!(navigator.predecessors("ACGT").unwrap().is_empty());
/// ```
///
#[derive(Default)]
pub struct GraphNavigator<'a> {
    sources: Vec<(&'a GraphFile, Option<&'a GraphIndex>)>,
    color: Option<usize>,
}

impl<'a> GraphNavigator<'a> {
    pub fn new() -> Self {
        GraphNavigator{ sources: Vec::new(), color: None }
    }

    pub fn add_source(
        &mut self,
        graph: &'a GraphFile,
        index: Option<&'a GraphIndex>,
    ) {
        self.sources.push((graph, index));
    }

    pub fn with_source(
        mut self,
        graph: &'a GraphFile,
        index: Option<&'a GraphIndex>,
    ) -> Self {
        self.add_source(graph, index);
        self
    }

    /// Only follow edges present in `color`.
    pub fn with_color(
        mut self,
        color: usize,
    ) -> Self {
        self.color = Some(color);
        self
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    fn neighbours(
        &self,
        kmer: &str,
        direction: Direction,
    ) -> Result<BTreeSet<String>, E> {
        let query = normalize(kmer.as_bytes())?;
        let canonical = Kmer::new(kmer)?;

        let mut found: BTreeSet<String> = BTreeSet::new();
        for (graph, index) in self.sources.iter() {
            let Some(record) = graph.find_kmer(*index, &canonical)? else {
                continue;
            };
            let edges = edges_of(&record, self.color)?;
            for base in extension_bases(edges, canonical.is_flipped(), direction) {
                found.insert(extend(&query, base, direction));
            }
        }

        log::debug!("{} has {} {}", kmer, found.len(), if direction == Direction::Successors { "successors" } else { "predecessors" });
        Ok(found)
    }

    /// K-mers following `kmer`, in the orientation of `kmer`.
    ///
    /// ## Errors
    ///
    /// Returns an error if `kmer` contains a base outside ACGT, its length
    /// does not match a graph, or the color filter is out of range for a
    /// graph containing `kmer`.
    ///
    pub fn successors(
        &self,
        kmer: &str,
    ) -> Result<BTreeSet<String>, E> {
        self.neighbours(kmer, Direction::Successors)
    }

    /// K-mers preceding `kmer`, in the orientation of `kmer`.
    pub fn predecessors(
        &self,
        kmer: &str,
    ) -> Result<BTreeSet<String>, E> {
        self.neighbours(kmer, Direction::Predecessors)
    }
}

/// Successors of `kmer` in a single graph, over all colors.
pub fn successors(
    graph: &GraphFile,
    index: Option<&GraphIndex>,
    kmer: &str,
) -> Result<BTreeSet<String>, E> {
    GraphNavigator::new().with_source(graph, index).successors(kmer)
}

/// Predecessors of `kmer` in a single graph, over all colors.
pub fn predecessors(
    graph: &GraphFile,
    index: Option<&GraphIndex>,
    kmer: &str,
) -> Result<BTreeSet<String>, E> {
    GraphNavigator::new().with_source(graph, index).predecessors(kmer)
}

// Tests
#[cfg(test)]
mod tests {
    use crate::GraphRecord;
    use crate::graph::{GraphFile, GraphWriter};
    use crate::headers::color::ColorMetadata;

    use std::path::Path;

    fn write_graph(
        path: &Path,
        num_colors: usize,
        mut records: Vec<GraphRecord>,
    ) -> GraphFile {
        records.sort();
        let mut writer = GraphWriter::create(path, vec![ColorMetadata::default(); num_colors]).unwrap();
        for record in records.iter() {
            writer.append(record).unwrap();
        }
        writer.close().unwrap();
        GraphFile::open(path).unwrap()
    }

    fn set(kmers: &[&str]) -> std::collections::BTreeSet<String> {
        kmers.iter().map(|kmer| kmer.to_string()).collect()
    }

    #[test]
    fn successor_g_only() {
        use super::{predecessors, successors};
        use crate::edges::EdgeSet;

        let dir = tempfile::tempdir().unwrap();
        let graph = write_graph(&dir.path().join("g.ctx"), 1, vec![
            GraphRecord::new("ACGT", vec![5], vec![EdgeSet::new(b"", b"G").unwrap().0]).unwrap(),
        ]);

        assert_eq!(successors(&graph, None, "ACGT").unwrap(), set(&["CGTG"]));
        assert!(predecessors(&graph, None, "ACGT").unwrap().is_empty());
    }

    #[test]
    fn flipped_query() {
        use super::{predecessors, successors};
        use crate::edges::EdgeSet;

        let dir = tempfile::tempdir().unwrap();
        let graph = write_graph(&dir.path().join("g.ctx"), 1, vec![
            GraphRecord::new("AAAA", vec![5], vec![EdgeSet::new(b"", b"C").unwrap().0]).unwrap(),
        ]);

        assert_eq!(predecessors(&graph, None, "TTTT").unwrap(), set(&["GTTT"]));
        assert!(successors(&graph, None, "TTTT").unwrap().is_empty());
        assert_eq!(successors(&graph, None, "AAAA").unwrap(), set(&["AAAC"]));
        assert_eq!(successors(&graph, None, "aaaa").unwrap(), set(&["AAAC"]));
    }

    #[test]
    fn flipped_both_directions() {
        use super::{predecessors, successors};
        use crate::edges::EdgeSet;

        // Stored AACG: predecessors {C, T}, successors {A}.
        // Query CGTT: successors {G, A} = complements of {C, T}, predecessors {T}.
        let dir = tempfile::tempdir().unwrap();
        let graph = write_graph(&dir.path().join("g.ctx"), 1, vec![
            GraphRecord::new("AACG", vec![1], vec![EdgeSet::new(b"CT", b"A").unwrap().0]).unwrap(),
        ]);

        assert_eq!(successors(&graph, None, "AACG").unwrap(), set(&["ACGA"]));
        assert_eq!(predecessors(&graph, None, "AACG").unwrap(), set(&["CAAC", "TAAC"]));
        assert_eq!(successors(&graph, None, "CGTT").unwrap(), set(&["GTTA", "GTTG"]));
        assert_eq!(predecessors(&graph, None, "CGTT").unwrap(), set(&["TCGT"]));
    }

    #[test]
    fn absent_kmer_has_no_neighbours() {
        use super::{predecessors, successors};
        use crate::edges::EdgeSet;

        let dir = tempfile::tempdir().unwrap();
        let graph = write_graph(&dir.path().join("g.ctx"), 1, vec![
            GraphRecord::new("ACGT", vec![5], vec![0xFF]).unwrap(),
        ]);

        assert!(successors(&graph, None, "CCCC").unwrap().is_empty());
        assert!(predecessors(&graph, None, "CCCC").unwrap().is_empty());
        assert!(successors(&graph, None, "CCC").is_err());
        assert!(successors(&graph, None, "CCNC").is_err());
    }

    #[test]
    fn union_over_sources_and_colors() {
        use super::GraphNavigator;
        use crate::edges::EdgeSet;

        let dir = tempfile::tempdir().unwrap();
        let first = write_graph(&dir.path().join("a.ctx"), 2, vec![
            GraphRecord::new("ACGT", vec![1, 1], vec![EdgeSet::new(b"", b"A").unwrap().0, EdgeSet::new(b"", b"C").unwrap().0]).unwrap(),
        ]);
        let second = write_graph(&dir.path().join("b.ctx"), 1, vec![
            GraphRecord::new("AAAA", vec![1], vec![0]).unwrap(),
            GraphRecord::new("ACGT", vec![1], vec![EdgeSet::new(b"G", b"T").unwrap().0]).unwrap(),
        ]);

        let navigator = GraphNavigator::new().with_source(&first, None).with_source(&second, None);
        assert_eq!(navigator.num_sources(), 2);
        assert_eq!(navigator.successors("ACGT").unwrap(), set(&["CGTA", "CGTC", "CGTT"]));
        assert_eq!(navigator.predecessors("ACGT").unwrap(), set(&["GACG"]));

        let only_first_color = GraphNavigator::new().with_source(&first, None).with_color(0);
        assert_eq!(only_first_color.successors("ACGT").unwrap(), set(&["CGTA"]));
        let second_color = GraphNavigator::new().with_source(&first, None).with_color(1);
        assert_eq!(second_color.successors("ACGT").unwrap(), set(&["CGTC"]));
    }

    #[test]
    fn color_out_of_range() {
        use super::{GraphNavigator, InvalidColor};
        use crate::edges::EdgeSet;

        let dir = tempfile::tempdir().unwrap();
        let graph = write_graph(&dir.path().join("g.ctx"), 1, vec![
            GraphRecord::new("ACGT", vec![1], vec![EdgeSet::new(b"", b"A").unwrap().0]).unwrap(),
        ]);

        let navigator = GraphNavigator::new().with_source(&graph, None).with_color(3);
        let err = navigator.successors("ACGT").unwrap_err();
        assert_eq!(err.downcast_ref::<InvalidColor>(), Some(&InvalidColor{ color: 3, num_colors: 1 }));
    }

    #[test]
    fn navigate_with_index() {
        use super::successors;
        use crate::edges::EdgeSet;
        use crate::index::GraphIndex;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.ctx");
        let graph = write_graph(&path, 1, vec![
            GraphRecord::new("AAAC", vec![1], vec![EdgeSet::new(b"", b"A").unwrap().0]).unwrap(),
            GraphRecord::new("AACA", vec![1], vec![EdgeSet::new(b"A", b"").unwrap().0]).unwrap(),
            GraphRecord::new("ACGT", vec![1], vec![EdgeSet::new(b"", b"G").unwrap().0]).unwrap(),
        ]);
        std::fs::write(GraphIndex::default_path(&path), b"0\t2\tAAAC\t0\t1\n1\t1\tACGT\t1\t1\n").unwrap();
        let index = GraphIndex::load_for(&graph).unwrap();

        assert_eq!(successors(&graph, Some(&index), "AAAC").unwrap(), set(&["AACA"]));
        assert_eq!(successors(&graph, Some(&index), "ACGT").unwrap(), set(&["CGTG"]));
        assert!(successors(&graph, Some(&index), "AAAA").unwrap().is_empty());
    }
}
