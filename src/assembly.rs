//! End to end assembly pipeline.
use crate::contig::{Contig, ContigExtractor, TieBreak};
use crate::graph::Graph;
use crate::select::ContigSelector;
use crate::{DEFAULT_KMER_SIZE, DEFAULT_MIN_CONTIG_LEN};
use log::{info, warn};

/// Parameters of a single assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyConfig {
    /// k-mer length, nodes are `(k-1)`-mers
    pub k: usize,
    /// Shortest contig that is reported
    pub min_contig_len: usize,
    /// How equally scored contigs are ranked
    pub tie_break: TieBreak,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_KMER_SIZE,
            min_contig_len: DEFAULT_MIN_CONTIG_LEN,
            tie_break: TieBreak::default(),
        }
    }
}

/// Counters collected along the pipeline
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyStats {
    /// k-mers inserted into the raw graph
    pub kmers: usize,
    /// Nodes of the raw graph
    pub raw_nodes: usize,
    /// Nodes removed because they derive from suspect k-mers
    pub suspect_removed: usize,
    /// Edges cut for weak support
    pub edges_cut: usize,
    /// Nodes removed for having no edges left
    pub isolated_removed: usize,
    /// Nodes left after chain contraction
    pub merged_nodes: usize,
    /// Pairs of nodes contracted during merging
    pub fusions: usize,
    /// Selection iterations that needed source-like heads
    pub fallbacks: usize,
    /// Contigs reported
    pub contigs: usize,
    /// Nodes that ended up in no contig
    pub residual_nodes: usize,
}

/// Result of [`Assembler::run`]
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Run identifier
    pub name: String,
    /// Graph after filtering and chain contraction
    pub graph: Graph,
    /// Contigs in selection order
    pub contigs: Vec<Contig>,
    /// Merged graph minus the nodes of every contig
    pub residual: Graph,
    /// Pipeline counters
    pub stats: AssemblyStats,
}

impl Assembly {
    /// Mean number of merged nodes per contig, 0 without contigs
    pub fn mean_nodes_per_contig(&self) -> f64 {
        if self.contigs.is_empty() {
            return 0.0;
        }
        let nodes: usize = self.contigs.iter().map(|c| c.path().len()).sum();
        nodes as f64 / self.contigs.len() as f64
    }
}

/// Runs build, filtering, merging and selection in order
#[derive(Debug, Clone)]
pub struct Assembler {
    config: AssemblyConfig,
}

impl Assembler {
    /// Creates an assembler with `config`
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Assembles `reads`. Nodes derived from the `suspect` k-mers are dropped and edges
    /// supported at most `threshold` times are cut before chains are contracted and
    /// contigs selected.
    pub fn run<S, T>(&self, name: &str, reads: &[S], suspect: &[T], threshold: f64) -> Assembly
    where
        S: AsRef<[u8]>,
        T: AsRef<[u8]>,
    {
        let k = self.config.k;
        let mut stats = AssemblyStats::default();
        if reads.is_empty() {
            warn!("{}: no reads to assemble", name);
        }

        let mut graph = Graph::new(k);
        for read in reads {
            stats.kmers += graph.add_read(read.as_ref());
        }
        stats.raw_nodes = graph.len();
        info!("Number of nodes in the raw graph = {}", stats.raw_nodes);

        stats.suspect_removed = graph.remove_suspect_nodes(suspect);
        stats.edges_cut = graph.prune_weak_edges(threshold);
        stats.isolated_removed = graph.remove_isolated();

        let report = graph.merge_chains();
        stats.merged_nodes = graph.len();
        stats.fusions = report.fusions;
        info!("Number of heads = {}", graph.heads().len());

        let extractor = ContigExtractor::new(self.config.min_contig_len, self.config.tie_break);
        let selection = ContigSelector::new(extractor).select(&graph);
        stats.fallbacks = selection.fallbacks;
        stats.contigs = selection.contigs.len();
        stats.residual_nodes = selection.residual.len();

        let assembly = Assembly {
            name: name.to_string(),
            graph,
            contigs: selection.contigs,
            residual: selection.residual,
            stats,
        };
        info!(
            "{}: mean number of nodes per contig = {:.2}",
            name,
            assembly.mean_nodes_per_contig()
        );
        assembly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random genome
    fn genome(len: usize, mut state: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                crate::NUCLEOTIDES[(state >> 62) as usize]
            })
            .collect()
    }

    fn tiled(genome: &[u8], read_len: usize, step: usize) -> Vec<Vec<u8>> {
        (0..=genome.len() - read_len)
            .step_by(step)
            .map(|start| genome[start..start + read_len].to_vec())
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = AssemblyConfig::default();
        assert_eq!(config.k, 31);
        assert_eq!(config.min_contig_len, 300);
        assert_eq!(config.tie_break, TieBreak::FirstSeen);
    }

    #[test]
    fn test_tiled_genome_is_reassembled() {
        let genome = genome(600, 7);
        let reads = tiled(&genome, 100, 10);
        let assembler = Assembler::new(AssemblyConfig {
            k: 21,
            ..AssemblyConfig::default()
        });
        let no_suspects: &[&[u8]] = &[];
        let assembly = assembler.run("tiled", &reads, no_suspects, 1.0);

        // the first and last 10 bases are covered by a single read only
        assert_eq!(assembly.contigs.len(), 1);
        assert_eq!(assembly.contigs[0].seq(), &genome[10..590]);
        assert_eq!(assembly.stats.kmers, 51 * 80);
        assert_eq!(assembly.stats.contigs, 1);
        assert!(assembly.stats.edges_cut > 0);
        assert_eq!(assembly.graph.len(), 1);
        assert!(assembly.residual.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let assembler = Assembler::new(AssemblyConfig::default());
        let reads: &[&str] = &[];
        let assembly = assembler.run("empty", reads, reads, 0.0);
        assert!(assembly.contigs.is_empty());
        assert_eq!(assembly.stats, AssemblyStats::default());
        assert_eq!(assembly.mean_nodes_per_contig(), 0.0);
    }

    #[test]
    fn test_short_contigs_stay_in_residual() {
        let assembler = Assembler::new(AssemblyConfig {
            k: 4,
            ..AssemblyConfig::default()
        });
        let reads = vec!["AACGTAAGG"; 3];
        let no_suspects: &[&str] = &[];
        let assembly = assembler.run("short", &reads, no_suspects, 1.0);
        assert!(assembly.contigs.is_empty());
        assert_eq!(assembly.stats.merged_nodes, 1);
        assert_eq!(assembly.stats.residual_nodes, 1);
    }
}
