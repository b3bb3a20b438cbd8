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

//! Encoder for writing [GraphRecord] records to any [Write].
//!
//! The encoder is record-driven: with [Encoder::new] the header is written
//! when the first record arrives, and the k-mer size and word count are
//! taken from that record. Use [Encoder::new_from_header] when the header is
//! known up front, eg. to write a graph with no records.
//!
//! Records must be supplied in ascending k-mer order. The encoder does not
//! sort, it only logs a warning when the order is violated.
//!

use crate::GraphRecord;
use crate::headers::color::ColorMetadata;
use crate::headers::file::GraphHeader;
use crate::headers::file::encode_file_header;
use crate::kmer::BinaryKmer;
use crate::pack::pack_record;

use std::io::Write;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    pub message: String,
}

impl EncodeError {
    pub fn new(message: String) -> Self {
        EncodeError{ message }
    }
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "cannot encode graph: {}", self.message)
    }
}

impl std::error::Error for EncodeError {}

pub struct Encoder<W: Write> {
    // Inputs
    conn: W,
    colors: Vec<ColorMetadata>,

    header: Option<GraphHeader>,

    // Internals
    buf: Vec<u8>,
    previous: Option<BinaryKmer>,
    records_written: usize,
}

impl<W: Write> Encoder<W> {
    /// Encoder that writes the header from the first record.
    pub fn new(
        conn: W,
        colors: Vec<ColorMetadata>,
    ) -> Self {
        Encoder{
            conn, colors,
            header: None,
            buf: Vec::new(), previous: None, records_written: 0,
        }
    }

    /// Encoder that writes `header` immediately.
    ///
    /// ## Usage
    /// ```rust
    /// use cortexgraph::encoder::Encoder;
    /// use cortexgraph::headers::color::ColorMetadata;
    /// use cortexgraph::headers::file::GraphHeader;
    ///
    /// let header = GraphHeader::new(31, vec![ColorMetadata::default()]);
    ///
    /// let mut bytes: Vec<u8> = Vec::new();
    /// let encoder = Encoder::new_from_header(&mut bytes, header.clone()).unwrap();
    /// assert_eq!(encoder.finish().unwrap(), 0);
    ///
    /// assert_eq!(bytes.len(), header.encoded_len());
    /// ```
    ///
    pub fn new_from_header(
        mut conn: W,
        header: GraphHeader,
    ) -> Result<Self, E> {
        conn.write_all(&encode_file_header(&header)?)?;
        Ok(Encoder{
            conn, colors: header.colors.clone(),
            header: Some(header),
            buf: Vec::new(), previous: None, records_written: 0,
        })
    }

    pub fn file_header(&self) -> Option<&GraphHeader> {
        self.header.as_ref()
    }

    fn check_record(
        &self,
        header: &GraphHeader,
        record: &GraphRecord,
    ) -> Result<(), EncodeError> {
        if record.coverages.len() != header.num_colors as usize || record.edges.len() != header.num_colors as usize {
            return Err(EncodeError::new(format!("record {} has {} coverages and {} edges, header has {} colors", self.records_written, record.coverages.len(), record.edges.len(), header.num_colors)));
        }
        if record.kmer_size != header.kmer_size as usize {
            return Err(EncodeError::new(format!("record {} has k = {}, header has k = {}", self.records_written, record.kmer_size, header.kmer_size)));
        }
        Ok(())
    }

    /// Append one record.
    ///
    /// ## Errors
    ///
    /// Returns [EncodeError] if the record does not match the header in
    /// number of colors or k-mer size. The first record determines both when
    /// the encoder was created with [Encoder::new].
    ///
    pub fn write_record(
        &mut self,
        record: &GraphRecord,
    ) -> Result<(), E> {
        let header = match self.header.take() {
            Some(header) => header,
            None => {
                let header = GraphHeader::from_record(record, self.colors.clone());
                self.check_record(&header, record)?;
                self.conn.write_all(&encode_file_header(&header)?)?;
                header
            },
        };
        let res = self.write_checked(&header, record);
        self.header = Some(header);
        res
    }

    fn write_checked(
        &mut self,
        header: &GraphHeader,
        record: &GraphRecord,
    ) -> Result<(), E> {
        self.check_record(header, record)?;

        // Producers built for a larger maximum k store more words than needed.
        let resized: GraphRecord;
        let record = if record.kmer.kmer_bits() == header.kmer_bits as usize {
            record
        } else {
            resized = GraphRecord{ kmer: record.kmer().to_binary(header.kmer_bits as usize)?, ..record.clone() };
            &resized
        };

        if let Some(previous) = self.previous.as_ref() {
            if *previous >= record.kmer {
                log::warn!("record {} ({}) is not greater than the previous record, graph is not sorted", self.records_written, record.kmer_as_string());
            }
        }

        self.buf.clear();
        pack_record(record, &mut self.buf);
        self.conn.write_all(&self.buf)?;

        self.previous = Some(record.kmer.clone());
        self.records_written += 1;
        Ok(())
    }

    /// Flush the output and return the number of records written.
    ///
    /// ## Errors
    ///
    /// Returns [EncodeError] if no header could be written, which happens
    /// when an encoder created with [Encoder::new] received no records.
    ///
    pub fn finish(
        mut self,
    ) -> Result<usize, E> {
        if self.header.is_none() {
            return Err(Box::new(EncodeError::new("no records were written and the k-mer size is unknown, use Encoder::new_from_header".to_string())));
        }
        self.conn.flush()?;
        log::debug!("wrote {} records", self.records_written);
        Ok(self.records_written)
    }
}
