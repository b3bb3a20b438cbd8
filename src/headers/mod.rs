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

//! Graph file header.
//!
//! Consists of the [GraphHeader](file::GraphHeader), which holds the fixed
//! fields describing the shape of every record, and one
//! [ColorMetadata](color::ColorMetadata) per color.
//!
//! ## GraphHeader
//!
//! The header must contain this information:
//!
//! - Format version, always 6.
//! - Size of the k-mers.
//! - Number of 64-bit words used to store one k-mer.
//! - Number of colors.
//!
//! These are preceded and followed by the literal `CORTEX`. The header is
//! followed directly by the records, whose size is
//! [record_size](file::GraphHeader::record_size).
//!
//! ## ColorMetadata
//!
//! Each color carries the name of the sample it was built from, its mean
//! read length and total sequence length, and information about the
//! cleaning steps applied to it. The per-color fields are stored column-wise,
//! see [encode_color_blocks](color::encode_color_blocks).
//!
//! Names are length-prefixed. Some producers include null terminators in the
//! names, these are removed on read.
//!

pub mod color;
pub mod file;
