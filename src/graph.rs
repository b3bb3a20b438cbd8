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

//! Graph files on disk.
//!
//! [GraphFile] maps a graph read-only into memory. Records are fixed-size,
//! so record `i` is a positioned read at `data_offset + i * record_size` and
//! lookups are a binary search over the sorted records. All lookups take
//! `&self` and a `GraphFile` is [Sync], so one handle can serve many threads.
//!
//! Sequential iteration with the handle itself (it implements [Iterator])
//! uses a cursor owned by the handle. Use [records](GraphFile::records) for
//! independent iterators.
//!
//! [GraphWriter] writes a graph to a path with an [Encoder].
//!
//! ## Usage
//!
//! ```rust
//! use cortexgraph::GraphRecord;
//! use cortexgraph::graph::{GraphFile, GraphWriter};
//! use cortexgraph::headers::color::ColorMetadata;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("sample.ctx");
//!
//! let mut writer = GraphWriter::create(&path, vec![ColorMetadata::default()]).unwrap();
//! writer.append(&GraphRecord::new("AAC", vec![4], vec![0b0000_0001]).unwrap()).unwrap();
//! writer.append(&GraphRecord::new("ACA", vec![1], vec![0b0001_0000]).unwrap()).unwrap();
//! writer.close().unwrap();
//!
//! let graph = GraphFile::open(&path).unwrap();
//! assert_eq!(graph.record_count(), 2);
//!
//! // GTT is the reverse complement of AAC
//! let record = graph.find("GTT").unwrap().unwrap();
//! assert_eq!(record.kmer_as_string(), "AAC");
//! assert_eq!(record.coverage(0), 4);
//!
//! assert!(graph.find("CCC").unwrap().is_none());
//! ```
//!

use crate::GraphRecord;
use crate::encoder::Encoder;
use crate::headers::color::ColorMetadata;
use crate::headers::file::FormatError;
use crate::headers::file::GraphHeader;
use crate::headers::file::read_file_header_with_len;
use crate::index::GraphIndex;
use crate::index::RecordRange;
use crate::kmer::InvalidKmerLength;
use crate::kmer::Kmer;
use crate::unpack::record_from_slice;

use std::cmp::Ordering;
use std::fs::File;
use std::io::BufWriter;
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;

use memmap2::Mmap;
use memmap2::MmapOptions;

type E = Box<dyn std::error::Error>;

/// A graph file opened for reading.
pub struct GraphFile {
    path: PathBuf,
    header: GraphHeader,

    data: Mmap,
    data_offset: usize,
    record_size: usize,
    record_count: u64,

    cursor: u64,
}

impl GraphFile {
    /// Map `path` and parse its header.
    ///
    /// ## Errors
    ///
    /// Returns [FormatError] if the header is malformed or the bytes after
    /// the header are not a whole number of records.
    ///
    pub fn open<P: AsRef<Path>>(
        path: P,
    ) -> Result<Self, E> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        if file.metadata()?.len() == 0 {
            return Err(Box::new(FormatError::new(format!("{} is empty", path.display()))));
        }

        // The map is read-only, the file must not be modified while it is open.
        let data = unsafe { MmapOptions::new().map(&file)? };

        let (header, data_offset) = read_file_header_with_len(&mut Cursor::new(&data[..]))?;
        let record_size = header.record_size();
        let data_len = data.len() - data_offset;
        if data_len % record_size != 0 {
            return Err(Box::new(FormatError::new(format!("{} has {} bytes of records, not a multiple of the record size {}", path.display(), data_len, record_size))));
        }
        let record_count = (data_len / record_size) as u64;

        log::info!("opened {}: k = {}, {} colors, {} records", path.display(), header.kmer_size, header.num_colors, record_count);

        Ok(GraphFile{
            path, header,
            data, data_offset, record_size, record_count,
            cursor: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &GraphHeader {
        &self.header
    }

    pub fn colors(&self) -> &[ColorMetadata] {
        &self.header.colors
    }

    pub fn kmer_size(&self) -> usize {
        self.header.kmer_size as usize
    }

    pub fn num_colors(&self) -> usize {
        self.header.num_colors as usize
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Byte offset of the first record.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// Range covering every record.
    pub fn whole_range(&self) -> RecordRange {
        RecordRange::new(0, self.record_count)
    }

    fn record_bytes(
        &self,
        idx: u64,
    ) -> &[u8] {
        let start = self.data_offset + idx as usize * self.record_size;
        &self.data[start..(start + self.record_size)]
    }

    /// Read the record at position `idx`.
    pub fn record(
        &self,
        idx: u64,
    ) -> Option<GraphRecord> {
        if idx >= self.record_count {
            return None;
        }
        Some(record_from_slice(self.record_bytes(idx), self.header.kmer_size as usize, self.header.kmer_bits as usize, self.header.num_colors as usize))
    }

    /// Iterate over all records without touching the cursor.
    pub fn records(&self) -> Records<'_> {
        self.records_in(self.whole_range())
    }

    /// Iterate over the records in `range`, clamped to the file.
    pub fn records_in(
        &self,
        range: RecordRange,
    ) -> Records<'_> {
        let end = range.end.min(self.record_count);
        Records{ graph: self, next: range.start.min(end), end }
    }

    /// Move the cursor back to the first record.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Find a k-mer given in either orientation.
    pub fn find(
        &self,
        kmer: &str,
    ) -> Result<Option<GraphRecord>, E> {
        self.find_with(None, kmer)
    }

    /// Find a k-mer, searching only the range `index` gives for it.
    pub fn find_with(
        &self,
        index: Option<&GraphIndex>,
        kmer: &str,
    ) -> Result<Option<GraphRecord>, E> {
        let kmer = Kmer::new(kmer)?;
        self.find_kmer(index, &kmer)
    }

    /// Find a canonical k-mer, searching only the range `index` gives for it.
    ///
    /// ## Errors
    ///
    /// Returns [InvalidKmerLength] if `kmer` is not of the graph's k-mer size,
    /// whether or not `index` has a range for it.
    ///
    pub fn find_kmer(
        &self,
        index: Option<&GraphIndex>,
        kmer: &Kmer,
    ) -> Result<Option<GraphRecord>, E> {
        if kmer.len() != self.kmer_size() {
            return Err(Box::new(InvalidKmerLength{ expected: self.kmer_size(), got: kmer.len() }));
        }
        let range = match index {
            Some(index) => match index.bounds_for(kmer) {
                Some(range) => range,
                None => return Ok(None),
            },
            None => self.whole_range(),
        };
        self.find_in(kmer, range)
    }

    /// Binary search for `kmer` within `range`.
    ///
    /// ## Errors
    ///
    /// Returns [InvalidKmerLength] if `kmer` is not of the graph's k-mer size.
    ///
    pub fn find_in(
        &self,
        kmer: &Kmer,
        range: RecordRange,
    ) -> Result<Option<GraphRecord>, E> {
        if kmer.len() != self.kmer_size() {
            return Err(Box::new(InvalidKmerLength{ expected: self.kmer_size(), got: kmer.len() }));
        }

        // Big-endian words compare bytewise in the same order as numerically.
        let target: Vec<u8> = kmer.to_binary(self.header.kmer_bits as usize)?.words.iter().flat_map(|word| word.to_be_bytes()).collect();
        let kmer_len = target.len();

        let mut lo = range.start.min(self.record_count);
        let mut hi = range.end.min(self.record_count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.record_bytes(mid)[0..kmer_len].cmp(&target[..]) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(self.record(mid)),
            }
        }

        Ok(None)
    }
}

impl Iterator for GraphFile {
    type Item = GraphRecord;

    fn next(
        &mut self,
    ) -> Option<GraphRecord> {
        let record = self.record(self.cursor)?;
        self.cursor += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.record_count.saturating_sub(self.cursor) as usize;
        (remaining, Some(remaining))
    }
}

/// Iterator over a range of records of a [GraphFile].
pub struct Records<'a> {
    graph: &'a GraphFile,
    next: u64,
    end: u64,
}

impl Iterator for Records<'_> {
    type Item = GraphRecord;

    fn next(
        &mut self,
    ) -> Option<GraphRecord> {
        if self.next >= self.end {
            return None;
        }
        let record = self.graph.record(self.next);
        self.next += 1;
        record
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

/// Append-only writer for a graph file.
///
/// The file is complete only after [close](GraphWriter::close) returns.
pub struct GraphWriter {
    path: PathBuf,
    encoder: Encoder<BufWriter<File>>,
}

impl GraphWriter {
    /// Create `path`, writing the header when the first record arrives.
    pub fn create<P: AsRef<Path>>(
        path: P,
        colors: Vec<ColorMetadata>,
    ) -> Result<Self, E> {
        let path = path.as_ref().to_path_buf();
        let conn = BufWriter::new(File::create(&path)?);
        Ok(GraphWriter{ path, encoder: Encoder::new(conn, colors) })
    }

    /// Create `path` and write `header` immediately.
    pub fn create_with_header<P: AsRef<Path>>(
        path: P,
        header: GraphHeader,
    ) -> Result<Self, E> {
        let path = path.as_ref().to_path_buf();
        let conn = BufWriter::new(File::create(&path)?);
        Ok(GraphWriter{ path, encoder: Encoder::new_from_header(conn, header)? })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(
        &mut self,
        record: &GraphRecord,
    ) -> Result<(), E> {
        self.encoder.write_record(record)
    }

    /// Flush and close the file, returning the number of records written.
    pub fn close(
        self,
    ) -> Result<usize, E> {
        let n_records = self.encoder.finish()?;
        log::info!("wrote {} records to {}", n_records, self.path.display());
        Ok(n_records)
    }
}

// Tests
#[cfg(test)]
mod tests {
    use crate::GraphRecord;
    use crate::graph::GraphWriter;
    use crate::headers::color::ColorMetadata;

    use std::path::Path;

    // Sorted 3-mers with two colors.
    fn write_test_graph(path: &Path) -> Vec<GraphRecord> {
        let mut records = vec![
            GraphRecord::new("AAC", vec![4, 0], vec![0b0000_0001, 0]).unwrap(),
            GraphRecord::new("ACA", vec![1, 1], vec![0b0001_0000, 0b0000_0100]).unwrap(),
            GraphRecord::new("AGA", vec![0, 3], vec![0, 0b1000_0000]).unwrap(),
            GraphRecord::new("CAA", vec![7, 7], vec![0b0010_0000, 0b0010_0001]).unwrap(),
            GraphRecord::new("CCG", vec![2, 0], vec![0, 0]).unwrap(),
        ];
        records.sort();

        let colors = vec![ColorMetadata{ sample_name: "a".to_string(), ..Default::default() }, ColorMetadata{ sample_name: "b".to_string(), ..Default::default() }];
        let mut writer = GraphWriter::create(path, colors).unwrap();
        for record in records.iter() {
            writer.append(record).unwrap();
        }
        assert_eq!(writer.close().unwrap(), records.len());

        records
    }

    #[test]
    fn open_and_iterate() {
        use super::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        let expected = write_test_graph(&path);

        let mut graph = GraphFile::open(&path).unwrap();
        assert_eq!(graph.kmer_size(), 3);
        assert_eq!(graph.num_colors(), 2);
        assert_eq!(graph.colors()[1].sample_name, "b");
        assert_eq!(graph.record_count(), 5);
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, graph.data_offset() + 5 * 18);

        let got: Vec<GraphRecord> = graph.by_ref().collect();
        assert_eq!(got, expected);
        assert_eq!(got[3].coverages, vec![7, 7]);
        assert_eq!(got[3].edges, vec![0b0010_0000, 0b0010_0001]);
        assert!(graph.next().is_none());

        graph.reset();
        assert_eq!(graph.next().unwrap().kmer_as_string(), "AAC");
        assert_eq!(graph.records().count(), 5);
    }

    #[test]
    fn records_in_range() {
        use super::GraphFile;
        use crate::index::RecordRange;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        write_test_graph(&path);
        let graph = GraphFile::open(&path).unwrap();

        let got: Vec<String> = graph.records_in(RecordRange::new(1, 3)).map(|record| record.kmer_as_string()).collect();
        assert_eq!(got, vec!["ACA".to_string(), "AGA".to_string()]);
        assert_eq!(graph.records_in(RecordRange::new(4, 100)).count(), 1);
        assert_eq!(graph.records_in(RecordRange::new(9, 100)).count(), 0);
        assert!(graph.record(5).is_none());
    }

    #[test]
    fn find_both_orientations() {
        use super::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        write_test_graph(&path);
        let graph = GraphFile::open(&path).unwrap();

        for kmer in ["AAC", "ACA", "AGA", "CAA", "CCG"] {
            assert_eq!(graph.find(kmer).unwrap().unwrap().kmer_as_string(), kmer);
        }
        // Reverse complements of CAA and AGA
        assert_eq!(graph.find("TTG").unwrap().unwrap().kmer_as_string(), "CAA");
        assert_eq!(graph.find("tct").unwrap().unwrap().coverage(1), 3);

        assert!(graph.find("AAA").unwrap().is_none());
        assert!(graph.find("CCC").unwrap().is_none());
        assert!(graph.find("GGG").unwrap().is_none());
    }

    #[test]
    fn find_wrong_length() {
        use super::GraphFile;
        use crate::kmer::InvalidKmerLength;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        write_test_graph(&path);
        let graph = GraphFile::open(&path).unwrap();

        let err = graph.find("AACG").unwrap_err();
        assert_eq!(err.downcast_ref::<InvalidKmerLength>(), Some(&InvalidKmerLength{ expected: 3, got: 4 }));
        assert!(graph.find("ANC").is_err());
    }

    #[test]
    fn find_concurrently() {
        use super::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        let expected = write_test_graph(&path);
        let graph = GraphFile::open(&path).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for record in expected.iter() {
                        let got = graph.find(&record.kmer_as_string()).unwrap().unwrap();
                        assert_eq!(got.coverages, record.coverages);
                    }
                });
            }
        });
    }

    #[test]
    fn open_empty_graph() {
        use super::{GraphFile, GraphWriter};
        use crate::headers::file::GraphHeader;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.ctx");
        let writer = GraphWriter::create_with_header(&path, GraphHeader::new(5, vec![ColorMetadata::default()])).unwrap();
        assert_eq!(writer.close().unwrap(), 0);

        let mut graph = GraphFile::open(&path).unwrap();
        assert_eq!(graph.record_count(), 0);
        assert!(graph.next().is_none());
        assert!(graph.find("ACGTA").unwrap().is_none());
    }

    #[test]
    fn open_misaligned() {
        use super::GraphFile;
        use crate::headers::file::FormatError;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        write_test_graph(&path);
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0, 1, 2]).unwrap();
        drop(file);

        let err = GraphFile::open(&path).err().unwrap();
        assert!(err.downcast_ref::<FormatError>().is_some());
    }

    #[test]
    fn open_empty_file() {
        use super::GraphFile;
        use crate::headers::file::FormatError;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.ctx");
        std::fs::write(&path, b"").unwrap();

        let err = GraphFile::open(&path).err().unwrap();
        assert!(err.downcast_ref::<FormatError>().is_some());
    }

    #[test]
    fn open_missing_file() {
        use super::GraphFile;

        let dir = tempfile::tempdir().unwrap();
        assert!(GraphFile::open(dir.path().join("missing.ctx")).is_err());
    }
}
