//! Greedy, graph-wide contig selection.
use crate::contig::{Contig, ContigExtractor};
use crate::graph::{Graph, NodeId};
use log::{debug, info};

/// Outcome of greedy contig selection
#[derive(Debug, Clone)]
pub struct Selection {
    /// Contigs in the order they were selected
    pub contigs: Vec<Contig>,
    /// Working copy of the graph with the nodes of every selected contig removed
    pub residual: Graph,
    /// Iterations that produced a contig
    pub iterations: usize,
    /// Iterations that had to fall back to source-like heads
    pub fallbacks: usize,
}

/// Greedily picks the best contig graph-wide, consumes its nodes and repeats
#[derive(Debug, Clone)]
pub struct ContigSelector {
    extractor: ContigExtractor,
}

impl ContigSelector {
    /// Creates a selector extracting candidates with `extractor`
    pub fn new(extractor: ContigExtractor) -> Self {
        Self { extractor }
    }

    /// Selects contigs from a copy of `graph`, which is left untouched. Candidates are
    /// extracted from every head; when there are no heads, or the heads yielded nothing,
    /// the most source-like nodes are used instead. The winner maximises length times
    /// weight. Selection stops when the working copy is empty or the fallback heads yield
    /// nothing either. Every selected contig removes at least one node, so this ends.
    pub fn select(&self, graph: &Graph) -> Selection {
        let mut work = graph.clone();
        let mut contigs = Vec::new();
        let mut fallbacks = 0;
        let mut fallback = false;

        while !work.is_empty() {
            let mut heads = if fallback { Vec::new() } else { work.heads() };
            if heads.is_empty() {
                fallback = true;
                heads = work.source_like();
            }
            let candidates = self.candidates(&work, &heads);
            debug!(
                "Iteration {}: {} heads ({}), {} candidates",
                contigs.len() + 1,
                heads.len(),
                if fallback { "source-like" } else { "real" },
                candidates.len()
            );

            let best = self
                .extractor
                .tie_break()
                .pick(candidates, Contig::score);
            match best {
                Some(contig) => {
                    if fallback {
                        fallbacks += 1;
                    }
                    for &id in contig.path() {
                        work.remove_node(id);
                    }
                    debug!(
                        "Selected contig of {} bases over {} nodes, weight {:.2}",
                        contig.len(),
                        contig.path().len(),
                        contig.weight()
                    );
                    contigs.push(contig);
                    fallback = false;
                }
                None if !fallback => {
                    debug!(
                        "No contig of at least {} bases from real heads",
                        self.extractor.min_len()
                    );
                    fallback = true;
                }
                None => break,
            }
        }

        info!("Number of contigs = {}", contigs.len());
        info!("Number of nodes out of any contig = {}", work.len());
        Selection {
            iterations: contigs.len(),
            contigs,
            residual: work,
            fallbacks,
        }
    }

    fn candidates(&self, graph: &Graph, heads: &[NodeId]) -> Vec<Contig> {
        heads
            .iter()
            .filter_map(|&head| self.extractor.extract(graph, head))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contig::TieBreak;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn selector(min_len: usize) -> ContigSelector {
        ContigSelector::new(ContigExtractor::new(min_len, TieBreak::FirstSeen))
    }

    #[test]
    fn test_selects_by_length_times_weight() {
        let mut graph = Graph::from_reads(vec!["AACGTAAGG", "AACGTCC", "AACGTCC"], 4);
        graph.merge_chains();
        let selection = selector(0).select(&graph);
        let seqs = selection
            .contigs
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        // AACGTAAGG: 9 * mean(3,3,1,1,1) = 16.2, AACGTCC: 7 * mean(3,3,2) = 18.67
        assert_eq!(seqs[0], "AACGTCC");
        // the stem is consumed, the other branch stands alone afterwards
        assert_eq!(seqs[1], "GTAAGG");
        assert_eq!(selection.contigs.len(), 2);
        assert!(selection.residual.is_empty());
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_short_contigs_are_left_behind() {
        let mut graph = Graph::from_reads(vec!["AACGTAA"], 4);
        graph.merge_chains();
        let selection = selector(300).select(&graph);
        assert!(selection.contigs.is_empty());
        assert_eq!(selection.residual.len(), 1);
    }

    #[test]
    fn test_cycle_without_heads_uses_fallback() {
        let mut graph = Graph::from_reads(vec!["ACGTACG"], 3);
        graph.merge_chains();
        assert!(graph.heads().is_empty());
        let selection = selector(0).select(&graph);
        assert_eq!(selection.contigs.len(), 1);
        assert_eq!(selection.fallbacks, 1);
        assert_eq!(selection.contigs[0].len(), 5);
        assert!(selection.residual.is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::new(31);
        let selection = selector(0).select(&graph);
        assert!(selection.contigs.is_empty());
        assert_eq!(selection.iterations, 0);
    }

    proptest! {
        #[test]
        fn proptest_contigs_share_no_nodes(
            reads in proptest::collection::vec("[ACGT]{4,40}", 1..12),
            k in 3usize..6,
            min_len in 0usize..12,
        ) {
            let mut graph = Graph::from_reads(&reads, k);
            graph.merge_chains();
            let selection = selector(min_len).select(&graph);

            let mut seen = HashSet::new();
            for contig in &selection.contigs {
                prop_assert!(contig.len() >= min_len);
                for &id in contig.path() {
                    prop_assert!(seen.insert(id));
                }
            }
            prop_assert_eq!(seen.len() + selection.residual.len(), graph.len());
            prop_assert!(selection.residual.check_invariants().is_ok());
        }

        #[test]
        fn proptest_cyclic_inputs_terminate(unit in "[ACGT]{3,12}", repeats in 2usize..6, k in 3usize..5) {
            // a read made of a repeated unit only spells cycles
            let read = unit.repeat(repeats);
            let mut graph = Graph::from_reads(vec![read.as_str()], k);
            graph.merge_chains();
            let selection = selector(0).select(&graph);
            prop_assert!(selection.contigs.len() <= graph.len());
        }
    }
}
