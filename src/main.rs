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
use std::collections::BTreeSet;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use needletail::Sequence;

use cortexgraph::graph::GraphFile;
use cortexgraph::index::GraphIndex;
use cortexgraph::navigator::GraphNavigator;
use cortexgraph::printer::Printer;
use cortexgraph::printer::format_header;

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    let res = stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init();
    if let Err(err) = res {
        eprintln!("cortexgraph: could not initialize logging: {}", err);
    }
}

fn open_graph(
    path: &Path,
) -> Result<GraphFile, E> {
    GraphFile::open(path).map_err(|err| format!("{}: {}", path.display(), err).into())
}

fn load_index(
    graph: &GraphFile,
    index_file: &Option<PathBuf>,
) -> Result<GraphIndex, E> {
    match index_file {
        Some(path) => GraphIndex::load_existing(path, graph),
        None => {
            let path = GraphIndex::default_path(graph.path());
            GraphIndex::load(&path, graph).map_err(|err| format!("{}: {}", path.display(), err).into())
        },
    }
}

// Every k-mer of every sequence in `path`, skipping k-mers with other bases than ACGT.
fn read_fastx_kmers(
    path: &Path,
    kmer_size: usize,
) -> Result<Vec<String>, E> {
    let mut kmers: Vec<String> = Vec::new();
    let mut reader = needletail::parse_fastx_file(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    while let Some(record) = reader.next() {
        let record = record.map_err(|err| format!("{}: {}", path.display(), err))?;
        let seq = record.normalize(false);
        for window in seq.sequence().windows(kmer_size) {
            if window.iter().all(|base| matches!(base, b'A' | b'C' | b'G' | b'T')) {
                kmers.push(String::from_utf8_lossy(window).into_owned());
            }
        }
    }
    log::info!("read {} k-mers from {}", kmers.len(), path.display());
    Ok(kmers)
}

fn format_set(
    kmers: &BTreeSet<String>,
) -> String {
    if kmers.is_empty() {
        ".".to_string()
    } else {
        kmers.iter().cloned().collect::<Vec<String>>().join(",")
    }
}

fn view(
    input_file: &Path,
    header_only: bool,
) -> Result<(), E> {
    let graph = open_graph(input_file)?;
    let mut conn_out = BufWriter::new(std::io::stdout().lock());

    if header_only {
        conn_out.write_all(&format_header(graph.header()))?;
    } else {
        let mut records = graph.records();
        let printer = Printer::new_with_header(&mut records, graph.header().clone());
        for line in printer {
            conn_out.write_all(&line)?;
        }
    }

    conn_out.flush()?;
    Ok(())
}

fn find(
    input_file: &Path,
    kmers: &[String],
    index_file: &Option<PathBuf>,
    fasta_file: &Option<PathBuf>,
) -> Result<(), E> {
    let graph = open_graph(input_file)?;
    let index = load_index(&graph, index_file)?;

    let mut queries: Vec<String> = kmers.to_vec();
    if let Some(path) = fasta_file {
        queries.append(&mut read_fastx_kmers(path, graph.kmer_size())?);
    }

    let mut conn_out = BufWriter::new(std::io::stdout().lock());
    let mut n_found = 0;
    for kmer in queries.iter() {
        match graph.find_with(Some(&index), kmer).map_err(|err| format!("{}: {}", kmer, err))? {
            Some(record) => {
                writeln!(conn_out, "{}\t{}", kmer, record)?;
                n_found += 1;
            },
            None => writeln!(conn_out, "{}\tabsent", kmer)?,
        }
    }
    conn_out.flush()?;

    log::info!("found {} of {} k-mers in {}", n_found, queries.len(), input_file.display());
    Ok(())
}

fn links(
    input_file: &Path,
    kmers: &[String],
    index_file: &Option<PathBuf>,
    color: Option<usize>,
) -> Result<(), E> {
    let graph = open_graph(input_file)?;
    let index = load_index(&graph, index_file)?;

    let mut navigator = GraphNavigator::new().with_source(&graph, Some(&index));
    if let Some(color) = color {
        navigator = navigator.with_color(color);
    }

    let mut conn_out = BufWriter::new(std::io::stdout().lock());
    for kmer in kmers.iter() {
        let predecessors = navigator.predecessors(kmer).map_err(|err| format!("{}: {}", kmer, err))?;
        let successors = navigator.successors(kmer).map_err(|err| format!("{}: {}", kmer, err))?;
        writeln!(conn_out, "{}\t{}\t{}", kmer, format_set(&predecessors), format_set(&successors))?;
    }
    conn_out.flush()?;

    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    let res = match &cli.command {
        // View
        Some(cli::Commands::View {
            input_file,
            header_only,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });
            view(input_file, *header_only)
        },

        // Find
        Some(cli::Commands::Find {
            input_file,
            kmers,
            index_file,
            fasta_file,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });
            find(input_file, kmers, index_file, fasta_file)
        },

        // Links
        Some(cli::Commands::Links {
            input_file,
            kmers,
            index_file,
            color,
            verbose,
        }) => {
            init_log(if *verbose { 2 } else { 1 });
            links(input_file, kmers, index_file, *color)
        },
        None => {
            let _ = cli::Cli::command().print_help();
            Ok(())
        },
    };

    if let Err(err) = res {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
