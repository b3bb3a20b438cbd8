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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Print a graph as text
    View {
        // Input graph
        #[arg(group = "input", required = true, help = "Input graph")]
        input_file: PathBuf,

        // Only print the header
        #[arg(long = "header-only", default_value_t = false)]
        header_only: bool,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Look up k-mers in a graph
    Find {
        // Input graph
        #[arg(group = "input", required = true, help = "Input graph")]
        input_file: PathBuf,

        // K-mers to look up
        #[arg(required = false, help = "K-mers to look up")]
        kmers: Vec<String>,

        // Index file, defaults to <input_file>.idx
        #[arg(short = 'i', long = "index", required = false)]
        index_file: Option<PathBuf>,

        // FastX file to take all k-mers from
        #[arg(short = 'f', long = "fasta", required = false)]
        fasta_file: Option<PathBuf>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Print the predecessors and successors of k-mers
    Links {
        // Input graph
        #[arg(group = "input", required = true, help = "Input graph")]
        input_file: PathBuf,

        // K-mers to navigate from
        #[arg(required = true, help = "K-mers to navigate from")]
        kmers: Vec<String>,

        // Index file, defaults to <input_file>.idx
        #[arg(short = 'i', long = "index", required = false)]
        index_file: Option<PathBuf>,

        // Only follow edges in this color
        #[arg(short = 'c', long = "color", required = false)]
        color: Option<usize>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
