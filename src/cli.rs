use log::LevelFilter;
use rustycontig::{TieBreak, DEFAULT_KMER_SIZE, DEFAULT_MIN_CONTIG_LEN};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "Greedy de Bruijn graph contig assembler")]
pub(crate) struct RustyContig {
    #[structopt(
        help = "FASTA files with reads, optionally compressed",
        required = true,
        parse(from_os_str)
    )]
    pub reads: Vec<PathBuf>,
    #[structopt(short, help = "k-mer length", default_value = "31")]
    pub k: usize,
    #[structopt(
        short,
        long,
        help = "Name of the run, used for default output paths",
        default_value = "assembly"
    )]
    pub name: String,
    #[structopt(
        short,
        long,
        help = "Contig FASTA output, `-` for stdout [default: <name>_contigs.fasta]",
        parse(from_os_str)
    )]
    pub output: Option<PathBuf>,
    #[structopt(
        long,
        help = "Shortest contig that is reported",
        default_value = "300"
    )]
    pub min_contig_len: usize,
    #[structopt(
        long,
        help = "Edges supported at most this many times are cut [default: derived from the k-mer spectrum]"
    )]
    pub threshold: Option<f64>,
    #[structopt(
        long,
        help = "Assemble the reads as they are, without k-mer spectrum correction"
    )]
    pub no_correction: bool,
    #[structopt(
        long,
        help = "Ranking of equally scored contigs: first or lexicographic",
        default_value = "first"
    )]
    pub tie_break: TieBreak,
    #[structopt(long, help = "Write the merged graph in DOT format", parse(from_os_str))]
    pub dot: Option<PathBuf>,
    #[structopt(
        long,
        help = "Write the merged graph as a tab separated edge table",
        parse(from_os_str)
    )]
    pub edges: Option<PathBuf>,
    #[structopt(
        short,
        long,
        help = "Verbosity, repeat for more detail",
        parse(from_occurrences)
    )]
    pub verbose: u8,
    #[structopt(short, long, help = "Only report errors")]
    pub quiet: bool,
}

impl RustyContig {
    pub fn set_logging(&self) {
        let level = if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        };
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .init();
    }

    /// Where contigs go, `None` meaning stdout
    pub fn output_path(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) if path.as_os_str() == "-" => None,
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(format!("{}_contigs.fasta", self.name))),
        }
    }
}
