//! Structural filtering of a freshly built graph.
use crate::graph::{Graph, NodeId};
use log::{debug, info};
use std::collections::HashSet;

impl Graph {
    /// Removes the nodes derived from suspect k-mers. The left `(k-1)`-mer of a suspect is
    /// only removed when it has a parent and the right one only when it has a child, so a
    /// true head or tail is never cut off. Left-derived nodes are processed before
    /// right-derived ones, both in first-seen order. Missing nodes are skipped.
    pub fn remove_suspect_nodes<I, S>(&mut self, kmers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut seen_left = HashSet::new();
        let mut seen_right = HashSet::new();
        for kmer in kmers {
            let kmer = kmer.as_ref();
            if kmer.len() != self.k || self.k < 2 {
                continue;
            }
            let (l, r) = (&kmer[..kmer.len() - 1], &kmer[1..]);
            if seen_left.insert(l.to_vec()) {
                left.push(l.to_vec());
            }
            if seen_right.insert(r.to_vec()) {
                right.push(r.to_vec());
            }
        }

        let mut removed = 0;
        for seq in &left {
            if let Some(id) = self.find(seq) {
                if self.node(id).map_or(false, |node| !node.is_head()) {
                    self.remove_node(id);
                    removed += 1;
                }
            }
        }
        for seq in &right {
            if let Some(id) = self.find(seq) {
                if self.node(id).map_or(false, |node| !node.is_tail()) {
                    self.remove_node(id);
                    removed += 1;
                }
            }
        }
        info!("Number of removed rare k-mer nodes = {}", removed);
        removed
    }

    /// Cuts every edge whose weight is at or below `threshold` (clamped to at least 1).
    /// Nodes stay in place even when left without edges.
    pub fn prune_weak_edges(&mut self, threshold: f64) -> usize {
        let threshold = threshold.max(1.0);
        self.threshold = threshold;

        let weak = self
            .edges()
            .filter(|&(_, _, weight)| f64::from(weight) <= threshold)
            .map(|(from, to, _)| (from, to))
            .collect::<Vec<(NodeId, NodeId)>>();
        for &(from, to) in &weak {
            self.cut_edge(from, to);
        }
        info!(
            "Number of cut edges = {} (threshold {})",
            weak.len(),
            threshold
        );
        weak.len()
    }

    /// Deletes every node that has neither parents nor children
    pub fn remove_isolated(&mut self) -> usize {
        let isolated = self
            .nodes()
            .filter(|(_, node)| node.is_isolated())
            .map(|(id, _)| id)
            .collect::<Vec<NodeId>>();
        for &id in &isolated {
            self.remove_node(id);
        }
        debug!("{} nodes left after isolated node cleanup", self.len());
        info!("Number of removed, not connected nodes = {}", isolated.len());
        isolated.len()
    }
}
