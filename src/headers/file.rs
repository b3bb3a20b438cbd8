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
use crate::GraphRecord;
use crate::headers::color::ColorMetadata;
use crate::headers::color::encode_color_blocks;
use crate::headers::color::read_color_blocks;
use crate::kmer::kmer_bits_for;

use std::io::Read;

use bincode::{Encode, Decode};
use bincode::encode_into_std_write;
use bincode::decode_from_std_read;

type E = Box<dyn std::error::Error>;

/// Literal at the start and at the end of a graph header.
pub const MAGIC: &[u8; 6] = b"CORTEX";

/// The only format version this crate reads and writes.
pub const SUPPORTED_VERSION: u32 = 6;

/// Widest k-mer field accepted, in 64-bit words (k-mers up to 1024 bases).
pub const MAX_KMER_BITS: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub message: String,
}

impl FormatError {
    pub fn new(message: String) -> Self {
        FormatError{ message }
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "malformed graph data: {}", self.message)
    }
}

impl std::error::Error for FormatError {}

/// Fixed-width fields following the leading magic literal.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
struct FixedFields {
    version: u32,
    kmer_size: u32,
    kmer_bits: u32,
    num_colors: u32,
}

/// Parsed graph file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphHeader {
    pub version: u32,
    pub kmer_size: u32,
    pub kmer_bits: u32,
    pub num_colors: u32,
    pub colors: Vec<ColorMetadata>,
}

impl GraphHeader {
    /// Header for `kmer_size` with the minimum word count.
    pub fn new(
        kmer_size: usize,
        colors: Vec<ColorMetadata>,
    ) -> Self {
        GraphHeader{
            version: SUPPORTED_VERSION,
            kmer_size: kmer_size as u32,
            kmer_bits: kmer_bits_for(kmer_size) as u32,
            num_colors: colors.len() as u32,
            colors,
        }
    }

    /// Header matching the shape of `record`.
    pub fn from_record(
        record: &GraphRecord,
        colors: Vec<ColorMetadata>,
    ) -> Self {
        GraphHeader{
            version: SUPPORTED_VERSION,
            kmer_size: record.kmer_size as u32,
            kmer_bits: record.kmer.kmer_bits() as u32,
            num_colors: colors.len() as u32,
            colors,
        }
    }

    /// Size of one record in bytes.
    pub fn record_size(&self) -> usize {
        GraphRecord::encoded_len(self.kmer_bits as usize, self.num_colors as usize)
    }

    /// Size of the encoded header in bytes.
    ///
    /// Matches the number of bytes consumed by [read_file_header] unless the
    /// producer padded names with null bytes.
    pub fn encoded_len(&self) -> usize {
        let names: usize = self.colors.iter().map(|color| color.sample_name.len() + color.cleaned_against_graph_name.len()).sum();
        2 * MAGIC.len() + 16 + self.colors.len() * crate::headers::color::COLOR_FIXED_LEN + names
    }

    fn validate(&self) -> Result<(), FormatError> {
        if self.version != SUPPORTED_VERSION {
            return Err(FormatError::new(format!("unsupported version {}, expected {}", self.version, SUPPORTED_VERSION)));
        }
        if self.kmer_size == 0 {
            return Err(FormatError::new("k-mer size is 0".to_string()));
        }
        check_kmer_bits(self.kmer_bits)?;
        if (self.kmer_bits as usize) < kmer_bits_for(self.kmer_size as usize) {
            return Err(FormatError::new(format!("{} words cannot hold a k-mer of size {}", self.kmer_bits, self.kmer_size)));
        }
        if self.colors.len() != self.num_colors as usize {
            return Err(FormatError::new(format!("header declares {} colors but has metadata for {}", self.num_colors, self.colors.len())));
        }
        Ok(())
    }
}

fn check_kmer_bits(
    kmer_bits: u32,
) -> Result<(), FormatError> {
    if kmer_bits > MAX_KMER_BITS {
        return Err(FormatError::new(format!("k-mer field of {} words exceeds the maximum of {}", kmer_bits, MAX_KMER_BITS)));
    }
    Ok(())
}

/// Serialize a header.
///
/// ## Usage
/// ```rust
/// use cortexgraph::headers::color::ColorMetadata;
/// use cortexgraph::headers::file::{GraphHeader, encode_file_header, read_file_header};
/// use std::io::Cursor;
///
/// let colors = vec![ColorMetadata{ sample_name: "sample_1".to_string(), ..Default::default() }];
/// let header = GraphHeader::new(31, colors);
///
/// let bytes = encode_file_header(&header).unwrap();
/// assert_eq!(bytes.len(), header.encoded_len());
///
/// let got = read_file_header(&mut Cursor::new(bytes)).unwrap();
/// assert_eq!(got, header);
/// ```
///
pub fn encode_file_header(
    header: &GraphHeader,
) -> Result<Vec<u8>, E> {
    header.validate()?;

    let mut bytes: Vec<u8> = Vec::new();
    bytes.extend_from_slice(MAGIC);

    let fixed = FixedFields{ version: header.version, kmer_size: header.kmer_size, kmer_bits: header.kmer_bits, num_colors: header.num_colors };
    let nbytes = encode_into_std_write(
        &fixed,
        &mut bytes,
        bincode::config::standard().with_fixed_int_encoding(),
    )?;
    assert_eq!(nbytes, 16);

    encode_color_blocks(&header.colors, &mut bytes)?;
    bytes.extend_from_slice(MAGIC);

    Ok(bytes)
}

fn read_magic<R: Read>(
    conn: &mut R,
    position: &str,
) -> Result<(), E> {
    let mut magic: [u8; 6] = [0; 6];
    conn.read_exact(&mut magic).map_err(|_| FormatError::new(format!("file ends before the {} magic literal", position)))?;
    if &magic != MAGIC {
        return Err(Box::new(FormatError::new(format!("bad {} magic literal {:?}", position, magic.escape_ascii().to_string()))));
    }
    Ok(())
}

/// Read and validate a header from the start of `conn`.
///
/// Leaves `conn` positioned at the first record.
pub fn read_file_header<R: Read>(
    conn: &mut R,
) -> Result<GraphHeader, E> {
    read_magic(conn, "leading")?;

    let fixed: FixedFields = decode_from_std_read(
        conn,
        bincode::config::standard().with_fixed_int_encoding(),
    ).map_err(|err| FormatError::new(format!("truncated header: {}", err)))?;

    // Version is checked before anything version dependent is read.
    if fixed.version != SUPPORTED_VERSION {
        return Err(Box::new(FormatError::new(format!("unsupported version {}, expected {}", fixed.version, SUPPORTED_VERSION))));
    }
    check_kmer_bits(fixed.kmer_bits)?;

    let colors = read_color_blocks(fixed.num_colors as usize, conn)?;
    read_magic(conn, "trailing")?;

    let header = GraphHeader{ version: fixed.version, kmer_size: fixed.kmer_size, kmer_bits: fixed.kmer_bits, num_colors: fixed.num_colors, colors };
    header.validate()?;

    Ok(header)
}

/// Counts the bytes pulled through a reader.
pub(crate) struct CountingReader<'a, R: Read> {
    inner: &'a mut R,
    pub count: usize,
}

impl<'a, R: Read> CountingReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        CountingReader{ inner, count: 0 }
    }
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n;
        Ok(n)
    }
}

/// Read a header and report how many bytes it occupied.
pub fn read_file_header_with_len<R: Read>(
    conn: &mut R,
) -> Result<(GraphHeader, usize), E> {
    let mut counting = CountingReader::new(conn);
    let header = read_file_header(&mut counting)?;
    Ok((header, counting.count))
}
