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

//! Decoder for reading [GraphRecord] records from any [Read].
//!
//! Reads the header on construction and then returns one record at a time
//! using next(). Nothing beyond the current record is kept in memory, so the
//! input can be a pipe or a decompressing reader.
//!
//! For random access to a graph stored on disk use
//! [GraphFile](crate::graph::GraphFile) instead.
//!
//! ## Usage
//!
//! ```rust
//! use cortexgraph::GraphRecord;
//! use cortexgraph::decoder::Decoder;
//! use cortexgraph::encoder::Encoder;
//! use cortexgraph::headers::color::ColorMetadata;
//!
//! let records = vec![
//!     GraphRecord::new("AAAC", vec![3], vec![0b0000_0001]).unwrap(),
//!     GraphRecord::new("AACA", vec![1], vec![0b0001_0000]).unwrap(),
//! ];
//!
//! let mut bytes: Vec<u8> = Vec::new();
//! let mut encoder = Encoder::new(&mut bytes, vec![ColorMetadata::default()]);
//! for record in records.iter() {
//!     encoder.write_record(record).unwrap();
//! }
//! encoder.finish().unwrap();
//!
//! let mut input = std::io::Cursor::new(bytes);
//! let mut decoder = Decoder::new(&mut input).unwrap();
//! assert_eq!(decoder.file_header().kmer_size, 4);
//!
//! let got: Vec<GraphRecord> = decoder.by_ref().map(|record| record.unwrap()).collect();
//! assert_eq!(got, records);
//! ```
//!

use crate::GraphRecord;
use crate::headers::file::FormatError;
use crate::headers::file::GraphHeader;
use crate::headers::file::read_file_header;
use crate::unpack::unpack_record;

use std::io::ErrorKind;
use std::io::Read;

type E = Box<dyn std::error::Error>;

pub struct Decoder<'a, R: Read> {
    // Inputs
    conn: &'a mut R,

    header: GraphHeader,

    // Internals
    buf: Vec<u8>,
    records_read: usize,
    finished: bool,
}

impl<'a, R: Read> Decoder<'a, R> {
    pub fn new(
        conn: &'a mut R,
    ) -> Result<Self, E> {
        let header = read_file_header(conn)?;
        let buf: Vec<u8> = vec![0; header.record_size()];

        Ok(Decoder{
            conn,
            header,
            buf, records_read: 0, finished: false,
        })
    }
}

impl<R: Read> Decoder<'_, R> {
    pub fn file_header(&self) -> &GraphHeader {
        &self.header
    }

    /// Number of records returned so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    // Fills `buf` with the next record. Returns false on a clean end of input.
    fn fill_record(
        &mut self,
    ) -> Result<bool, E> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.conn.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Box::new(err)),
            }
        }

        if filled == 0 {
            Ok(false)
        } else if filled < self.buf.len() {
            Err(Box::new(FormatError::new(format!("record {} is truncated to {} of {} bytes", self.records_read, filled, self.buf.len()))))
        } else {
            Ok(true)
        }
    }
}

impl<R: Read> Iterator for Decoder<'_, R> {
    type Item = Result<GraphRecord, E>;

    fn next(
        &mut self,
    ) -> Option<Result<GraphRecord, E>> {
        if self.finished {
            return None;
        }

        match self.fill_record() {
            Ok(true) => {
                self.records_read += 1;
                Some(unpack_record(&self.buf, self.header.kmer_size as usize, self.header.kmer_bits as usize, self.header.num_colors as usize))
            },
            Ok(false) => {
                self.finished = true;
                None
            },
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            },
        }
    }
}
