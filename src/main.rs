#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Assembles reads into contigs over a de Bruijn multigraph.
mod cli;

use log::info;
use rustycontig::fasta::{read_sequences, write_contigs};
use rustycontig::{export, Assembler, AssemblyConfig, ErrorCorrector, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use structopt::StructOpt;

fn main() -> Result<()> {
    let opt = cli::RustyContig::from_args();
    opt.set_logging();

    let mut reads = Vec::new();
    for path in &opt.reads {
        reads.extend(read_sequences(path)?);
    }
    info!("Number of reads = {}", reads.len());

    let (reads, suspect, derived) = if opt.no_correction {
        (reads, Vec::new(), 0.0)
    } else {
        let correction = ErrorCorrector::new(opt.k).correct(&reads);
        (correction.reads, correction.suspect, correction.threshold)
    };
    let threshold = opt.threshold.unwrap_or(derived);

    let assembler = Assembler::new(AssemblyConfig {
        k: opt.k,
        min_contig_len: opt.min_contig_len,
        tie_break: opt.tie_break,
    });
    let assembly = assembler.run(&opt.name, &reads, &suspect, threshold);

    if let Some(ref path) = opt.dot {
        export::write_dot(&assembly.graph, &opt.name, BufWriter::new(File::create(path)?))?;
    }
    if let Some(ref path) = opt.edges {
        export::write_edge_table(&assembly.graph, BufWriter::new(File::create(path)?))?;
    }

    match opt.output_path() {
        Some(path) => {
            info!("Writing {} contigs to {}", assembly.contigs.len(), path.display());
            write_contigs(&assembly.contigs, BufWriter::new(File::create(path)?))?;
        }
        None => write_contigs(&assembly.contigs, io::stdout().lock())?,
    }
    Ok(())
}
