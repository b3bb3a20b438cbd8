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

//! Sorted index over the records of a graph.
//!
//! An index is a tab-separated text file. Lines starting with `#` are
//! comments. Every other line describes one block of records: column 3 holds
//! the first k-mer of the block, columns 4 and 5 the inclusive positions of
//! its first and last record. Other columns are ignored.
//!
//! ```text
//! #block  n   kmer    start   stop
//! 0       2   AAC     0       1
//! 1       3   AGA     1       3
//! ```
//!
//! The tool writing these files counts every block after the first one
//! position short. Entry `i` (counting from 0) is corrected by adding
//! `i * INDEX_OFFSET_CORRECTION` to both positions on load. The corrected
//! index is checked against the graph before it is used.
//!
//! When no index file exists, a single entry spanning the whole graph is used
//! and lookups fall back to a binary search over all records.
//!

use crate::graph::GraphFile;
use crate::headers::file::FormatError;
use crate::kmer::Kmer;
use crate::nucleotide::normalize;

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

type E = Box<dyn std::error::Error>;

/// Per-entry correction applied to the positions in an index file.
pub const INDEX_OFFSET_CORRECTION: u64 = 1;

/// Extension appended to a graph path to find its index.
pub const INDEX_EXTENSION: &str = "idx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMismatchError {
    pub path: PathBuf,
    pub offset: u64,
    pub expected: String,
    pub found: String,
}

impl std::fmt::Display for IndexMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "index {} does not match the graph at record {}: expected {}, found {}", self.path.display(), self.offset, self.expected, self.found)
    }
}

impl std::error::Error for IndexMismatchError {}

/// Half-open range `start..end` of record positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RecordRange {
    pub start: u64,
    pub end: u64,
}

impl RecordRange {
    pub fn new(
        start: u64,
        end: u64,
    ) -> Self {
        RecordRange{ start, end }
    }

    /// Range from inclusive `start` and `stop`.
    ///
    /// Returns `None` if `stop` is `u64::MAX`.
    pub fn inclusive(
        start: u64,
        stop: u64,
    ) -> Option<Self> {
        Some(RecordRange{ start, end: stop.checked_add(1)? })
    }

    /// Last position in the range, `None` if it is empty.
    pub fn stop(&self) -> Option<u64> {
        if self.is_empty() { None } else { Some(self.end - 1) }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(
        &self,
        idx: u64,
    ) -> bool {
        self.start <= idx && idx < self.end
    }
}

impl std::fmt::Display for RecordRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// First k-mer of the range, uppercase.
    pub kmer: String,
    pub range: RecordRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphIndex {
    path: Option<PathBuf>,
    entries: Vec<IndexEntry>,
}

fn parse_position(
    field: &str,
    line_no: usize,
) -> Result<u64, FormatError> {
    field.trim().parse::<u64>().map_err(|_| FormatError::new(format!("index line {}: '{}' is not a record position", line_no, field)))
}

impl GraphIndex {
    /// Path of the index belonging to `graph_path`: `<graph_path>.idx`.
    pub fn default_path(
        graph_path: &Path,
    ) -> PathBuf {
        let mut path = graph_path.as_os_str().to_os_string();
        path.push(".");
        path.push(INDEX_EXTENSION);
        PathBuf::from(path)
    }

    /// Parse index lines from `conn` and apply the offset correction.
    ///
    /// ## Errors
    ///
    /// Returns [FormatError] if a line has fewer than 5 columns, a position
    /// is not a number, a range ends before it starts, the k-mers are not in
    /// ascending order, or there are no entries at all.
    ///
    /// ## Usage
    /// ```rust
    /// use cortexgraph::index::{GraphIndex, RecordRange};
    /// use std::io::Cursor;
    ///
    /// let mut input = Cursor::new(b"#comment\n0\t2\tAAC\t0\t1\n1\t3\tAGA\t1\t3\n".to_vec());
    /// let index = GraphIndex::from_read(&mut input).unwrap();
    ///
    /// assert_eq!(index.entries()[0].range, RecordRange::new(0, 2));
    /// assert_eq!(index.entries()[1].range, RecordRange::new(2, 5));
    /// ```
    ///
    pub fn from_read<R: Read>(
        conn: &mut R,
    ) -> Result<Self, E> {
        let mut entries: Vec<IndexEntry> = Vec::new();
        for (line_no, line) in BufReader::new(conn).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 5 {
                return Err(Box::new(FormatError::new(format!("index line {} has {} columns, expected at least 5", line_no + 1, fields.len()))));
            }

            let kmer = String::from_utf8(normalize(fields[2].trim().as_bytes())?)?;
            let correction = entries.len() as u64 * INDEX_OFFSET_CORRECTION;
            let overflow = || FormatError::new(format!("index line {}: record position out of range", line_no + 1));
            let start = parse_position(fields[3], line_no + 1)?.checked_add(correction).ok_or_else(overflow)?;
            let stop = parse_position(fields[4], line_no + 1)?.checked_add(correction).ok_or_else(overflow)?;
            if stop < start {
                return Err(Box::new(FormatError::new(format!("index line {}: range {}..={} ends before it starts", line_no + 1, start, stop))));
            }
            let range = RecordRange::inclusive(start, stop).ok_or_else(overflow)?;
            if let Some(previous) = entries.last() {
                if previous.kmer >= kmer {
                    return Err(Box::new(FormatError::new(format!("index line {}: {} does not sort after {}", line_no + 1, kmer, previous.kmer))));
                }
            }

            entries.push(IndexEntry{ kmer, range });
        }

        if entries.is_empty() {
            return Err(Box::new(FormatError::new("index has no entries".to_string())));
        }

        Ok(GraphIndex{ path: None, entries })
    }

    /// Single entry spanning all of `graph`.
    ///
    /// Keyed by the first k-mer of the graph, or by k `A`s if it has no
    /// records.
    pub fn whole_graph(
        graph: &GraphFile,
    ) -> Self {
        let kmer = match graph.record(0) {
            Some(record) => record.kmer_as_string(),
            None => "A".repeat(graph.kmer_size()),
        };
        GraphIndex{ path: None, entries: vec![IndexEntry{ kmer, range: graph.whole_range() }] }
    }

    /// Load and validate the index at `path`.
    ///
    /// Falls back to [whole_graph](GraphIndex::whole_graph) if `path` does
    /// not exist.
    pub fn load<P: AsRef<Path>>(
        path: P,
        graph: &GraphFile,
    ) -> Result<Self, E> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no index at {}, searching all of {}", path.display(), graph.path().display());
            return Ok(GraphIndex::whole_graph(graph));
        }
        GraphIndex::load_existing(path, graph)
    }

    /// Load and validate the index at `path`, which must exist.
    pub fn load_existing<P: AsRef<Path>>(
        path: P,
        graph: &GraphFile,
    ) -> Result<Self, E> {
        let path = path.as_ref();
        let mut conn = File::open(path).map_err(|err| format!("{}: {}", path.display(), err))?;
        let mut index = GraphIndex::from_read(&mut conn).map_err(|err| format!("{}: {}", path.display(), err))?;
        index.path = Some(path.to_path_buf());
        index.validate(graph)?;

        log::info!("loaded {} index entries from {}", index.entries.len(), path.display());
        Ok(index)
    }

    /// Load the index at the [default path](GraphIndex::default_path) of `graph`.
    pub fn load_for(
        graph: &GraphFile,
    ) -> Result<Self, E> {
        GraphIndex::load(GraphIndex::default_path(graph.path()), graph)
    }

    /// Check that every entry's first record holds the entry's k-mer and
    /// that no entry extends past the last record.
    ///
    /// ## Errors
    ///
    /// Returns [IndexMismatchError] for the first entry whose k-mer disagrees
    /// and [FormatError] for the first entry ending past the graph.
    ///
    pub fn validate(
        &self,
        graph: &GraphFile,
    ) -> Result<(), E> {
        for entry in self.entries.iter().filter(|entry| !entry.range.is_empty()) {
            let found = match graph.record(entry.range.start) {
                Some(record) => record.kmer_as_string(),
                None => format!("end of graph ({} records)", graph.record_count()),
            };
            if found != entry.kmer {
                return Err(Box::new(IndexMismatchError{
                    path: self.path.clone().unwrap_or_else(|| graph.path().to_path_buf()),
                    offset: entry.range.start,
                    expected: entry.kmer.clone(),
                    found,
                }));
            }
        }
        if let Some(entry) = self.entries.iter().find(|entry| entry.range.end > graph.record_count()) {
            let path = self.path.as_deref().unwrap_or(graph.path());
            return Err(Box::new(FormatError::new(format!("index {}: range {} of {} ends past the {} records of the graph", path.display(), entry.range, entry.kmer, graph.record_count()))));
        }
        Ok(())
    }

    /// Range of records that may contain `kmer`.
    ///
    /// Returns `None` if `kmer` sorts before the first entry. An index with a
    /// single entry always returns that entry's range.
    ///
    pub fn bounds_for(
        &self,
        kmer: &Kmer,
    ) -> Option<RecordRange> {
        if self.entries.len() == 1 {
            return Some(self.entries[0].range);
        }
        let idx = self.entries.partition_point(|entry| entry.kmer.as_bytes() <= kmer.bases());
        if idx == 0 {
            None
        } else {
            Some(self.entries[idx - 1].range)
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Path the index was loaded from, `None` if it was synthesized.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// Tests
#[cfg(test)]
mod tests {
    use crate::GraphRecord;
    use crate::graph::GraphWriter;
    use crate::headers::color::ColorMetadata;

    use std::path::Path;

    fn write_test_graph(path: &Path) {
        let records = vec![
            GraphRecord::new("AAC", vec![1], vec![0]).unwrap(),
            GraphRecord::new("ACA", vec![2], vec![0]).unwrap(),
            GraphRecord::new("AGA", vec![3], vec![0]).unwrap(),
            GraphRecord::new("CAA", vec![4], vec![0]).unwrap(),
            GraphRecord::new("CCG", vec![5], vec![0]).unwrap(),
        ];
        let mut writer = GraphWriter::create(path, vec![ColorMetadata::default()]).unwrap();
        for record in records.iter() {
            writer.append(record).unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn record_range_inclusive() {
        use super::RecordRange;

        let range = RecordRange::inclusive(2, 4).unwrap();
        assert_eq!(range, RecordRange::new(2, 5));
        assert_eq!(range.stop(), Some(4));
        assert_eq!(range.len(), 3);
        assert!(range.contains(4));
        assert!(!range.contains(5));

        let empty = RecordRange::new(0, 0);
        assert!(empty.is_empty());
        assert_eq!(empty.stop(), None);
        assert_eq!(empty.len(), 0);
        assert_eq!(RecordRange::inclusive(0, u64::MAX), None);
    }

    #[test]
    fn default_path_appends_extension() {
        use super::GraphIndex;
        use std::path::PathBuf;

        assert_eq!(GraphIndex::default_path(Path::new("/data/sample.ctx")), PathBuf::from("/data/sample.ctx.idx"));
    }

    #[test]
    fn from_read_applies_correction() {
        use super::{GraphIndex, RecordRange};
        use std::io::Cursor;

        let text = b"# blocks\n0\t2\tAAC\t0\t1\n\n1\t1\tAGA\t1\t1\n2\t2\tcaa\t1\t2\n".to_vec();
        let index = GraphIndex::from_read(&mut Cursor::new(text)).unwrap();

        let entries = index.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].range, RecordRange::new(0, 2));
        assert_eq!(entries[1].range, RecordRange::new(2, 3));
        assert_eq!(entries[2].kmer, "CAA");
        assert_eq!(entries[2].range, RecordRange::new(3, 5));
        assert!(index.path().is_none());
    }

    #[test]
    fn from_read_malformed() {
        use super::GraphIndex;
        use crate::headers::file::FormatError;
        use std::io::Cursor;

        for text in ["0\t2\tAAC\t0\n", "0\t2\tAAC\tx\t1\n", "0\t2\tAAC\t3\t1\n", "0\t1\tCAA\t0\t0\n1\t1\tAAC\t0\t0\n", "# nothing\n"] {
            let err = GraphIndex::from_read(&mut Cursor::new(text.as_bytes().to_vec())).unwrap_err();
            assert!(err.downcast_ref::<FormatError>().is_some(), "{}", text);
        }
        assert!(GraphIndex::from_read(&mut Cursor::new(b"0\t1\tANC\t0\t0\n".to_vec())).is_err());
    }

    #[test]
    fn load_and_lookup() {
        use super::{GraphIndex, RecordRange};
        use crate::graph::GraphFile;
        use crate::kmer::{InvalidKmerLength, Kmer};

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.ctx");
        write_test_graph(&graph_path);
        let graph = GraphFile::open(&graph_path).unwrap();

        // Blocks [AAC, ACA], [AGA, CAA], [CCG] as written with the offset quirk.
        std::fs::write(GraphIndex::default_path(&graph_path), b"0\t2\tAAC\t0\t1\n1\t2\tAGA\t1\t2\n2\t1\tCCG\t2\t2\n").unwrap();
        let index = GraphIndex::load_for(&graph).unwrap();
        assert_eq!(index.path(), Some(GraphIndex::default_path(&graph_path).as_path()));

        assert_eq!(index.bounds_for(&Kmer::new("AAA").unwrap()), None);
        assert_eq!(index.bounds_for(&Kmer::new("AAC").unwrap()), Some(RecordRange::new(0, 2)));
        assert_eq!(index.bounds_for(&Kmer::new("ACA").unwrap()), Some(RecordRange::new(0, 2)));
        assert_eq!(index.bounds_for(&Kmer::new("CAA").unwrap()), Some(RecordRange::new(2, 4)));
        assert_eq!(index.bounds_for(&Kmer::new("CGG").unwrap()), Some(RecordRange::new(4, 5)));

        for kmer in ["AAC", "ACA", "AGA", "CAA", "CCG"] {
            let record = graph.find_with(Some(&index), kmer).unwrap().unwrap();
            assert_eq!(record.kmer_as_string(), kmer);
        }
        assert!(graph.find_with(Some(&index), "AAA").unwrap().is_none());
        assert!(graph.find_with(Some(&index), "ACC").unwrap().is_none());

        // Sorts before the first entry but has the wrong length.
        let err = graph.find_with(Some(&index), "AAAA").unwrap_err();
        assert_eq!(err.downcast_ref::<InvalidKmerLength>(), Some(&InvalidKmerLength{ expected: 3, got: 4 }));
    }

    #[test]
    fn load_mismatched_index() {
        use super::{GraphIndex, IndexMismatchError};
        use crate::graph::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.ctx");
        write_test_graph(&graph_path);
        let graph = GraphFile::open(&graph_path).unwrap();

        let index_path = dir.path().join("graph.idx");
        std::fs::write(&index_path, b"0\t2\tACA\t0\t1\n1\t3\tAGA\t1\t3\n").unwrap();
        let err = GraphIndex::load(&index_path, &graph).unwrap_err();

        let mismatch = err.downcast_ref::<IndexMismatchError>().unwrap();
        assert_eq!(mismatch.path, index_path);
        assert_eq!(mismatch.offset, 0);
        assert_eq!(mismatch.expected, "ACA");
        assert_eq!(mismatch.found, "AAC");
    }

    #[test]
    fn load_index_without_correction_fails() {
        use super::{GraphIndex, IndexMismatchError};
        use crate::graph::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.ctx");
        write_test_graph(&graph_path);
        let graph = GraphFile::open(&graph_path).unwrap();

        // Positions already correct, the correction moves AGA to record 3.
        let index_path = dir.path().join("graph.idx");
        std::fs::write(&index_path, b"0\t2\tAAC\t0\t1\n1\t3\tAGA\t2\t4\n").unwrap();
        let err = GraphIndex::load(&index_path, &graph).unwrap_err();

        let mismatch = err.downcast_ref::<IndexMismatchError>().unwrap();
        assert_eq!(mismatch.offset, 3);
        assert_eq!(mismatch.found, "CAA");
    }

    #[test]
    fn from_read_position_overflow() {
        use super::GraphIndex;
        use crate::headers::file::FormatError;
        use std::io::Cursor;

        let max = u64::MAX;
        let texts = [
            format!("0\t2\tAAC\t0\t{}\n", max),
            format!("0\t2\tAAC\t0\t1\n1\t2\tAGA\t{}\t{}\n", max, max),
            format!("0\t2\tAAC\t0\t1\n1\t2\tAGA\t1\t{}\n", max),
        ];
        for text in texts.iter() {
            let err = GraphIndex::from_read(&mut Cursor::new(text.as_bytes().to_vec())).unwrap_err();
            assert!(err.downcast_ref::<FormatError>().unwrap().message.contains("out of range"), "{}", text);
        }
    }

    #[test]
    fn load_range_past_end_of_graph() {
        use super::GraphIndex;
        use crate::graph::GraphFile;
        use crate::headers::file::FormatError;

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.ctx");
        write_test_graph(&graph_path);
        let graph = GraphFile::open(&graph_path).unwrap();

        let index_path = dir.path().join("graph.idx");
        std::fs::write(&index_path, format!("0\t2\tAAC\t0\t{}\n", u64::MAX - 1)).unwrap();
        let err = GraphIndex::load(&index_path, &graph).unwrap_err();
        assert!(err.downcast_ref::<FormatError>().is_some());

        std::fs::write(&index_path, b"0\t2\tAAC\t0\t1\n1\t3\tCCG\t3\t4\n").unwrap();
        let err = GraphIndex::load(&index_path, &graph).unwrap_err();
        assert!(err.downcast_ref::<FormatError>().unwrap().message.contains("ends past"));
    }

    #[test]
    fn load_existing_requires_file() {
        use super::GraphIndex;
        use crate::graph::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.ctx");
        write_test_graph(&graph_path);
        let graph = GraphFile::open(&graph_path).unwrap();

        let missing = dir.path().join("missing.idx");
        let err = GraphIndex::load_existing(&missing, &graph).unwrap_err();
        assert!(err.to_string().contains("missing.idx"));
        assert!(GraphIndex::load(&missing, &graph).is_ok());
    }

    #[test]
    fn missing_index_spans_whole_graph() {
        use super::{GraphIndex, RecordRange};
        use crate::graph::GraphFile;
        use crate::kmer::Kmer;

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.ctx");
        write_test_graph(&graph_path);
        let graph = GraphFile::open(&graph_path).unwrap();

        let index = GraphIndex::load_for(&graph).unwrap();
        assert!(index.path().is_none());
        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.entries()[0].kmer, "AAC");
        assert_eq!(index.bounds_for(&Kmer::new("AAA").unwrap()), Some(RecordRange::new(0, 5)));
        assert_eq!(graph.find_with(Some(&index), "CCG").unwrap().unwrap().coverage(0), 5);
    }

    #[test]
    fn empty_graph_index() {
        use super::{GraphIndex, RecordRange};
        use crate::graph::{GraphFile, GraphWriter};
        use crate::headers::file::GraphHeader;
        use crate::kmer::Kmer;

        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("empty.ctx");
        GraphWriter::create_with_header(&graph_path, GraphHeader::new(4, vec![ColorMetadata::default()])).unwrap().close().unwrap();
        let graph = GraphFile::open(&graph_path).unwrap();

        let index = GraphIndex::whole_graph(&graph);
        assert_eq!(index.entries()[0].kmer, "AAAA");
        assert_eq!(index.entries()[0].range, RecordRange::new(0, 0));
        assert_eq!(index.entries()[0].range.stop(), None);

        let bounds = index.bounds_for(&Kmer::new("GATT").unwrap()).unwrap();
        assert!(bounds.is_empty());
        assert!(index.validate(&graph).is_ok());
        assert!(graph.find_with(Some(&index), "GATT").unwrap().is_none());
    }
}
