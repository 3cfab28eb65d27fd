//! Weighted de Bruijn multigraph over `(k-1)`-mers.
use crate::error::Error;
use crate::Result;
use log::{debug, warn};
use std::collections::HashMap;

/// Stable handle of a node inside the [`Graph`] arena. Handles are never reused while the
/// graph lives, only [`Graph::compact`] renumbers them.
pub type NodeId = usize;

/// Side of a node that is considered downstream during a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Parents to children
    Down,
    /// Children to parents
    Up,
}

impl Direction {
    /// Returns the opposite direction
    pub fn flip(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }
}

/// A `(k-1)`-mer, or after chain contraction an arbitrary sequence of at least `k-1` bases.
/// Neighbours are `(id, weight)` pairs kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) seq: Vec<u8>,
    pub(crate) children: Vec<(NodeId, u32)>,
    pub(crate) parents: Vec<(NodeId, u32)>,
    pub(crate) weights: Vec<u32>,
}

impl Node {
    pub(crate) fn new(seq: Vec<u8>) -> Self {
        Self {
            seq,
            children: Vec::new(),
            parents: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Sequence currently labelling the node
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    /// Outgoing edges with their weights
    pub fn children(&self) -> &[(NodeId, u32)] {
        &self.children
    }

    /// Incoming edges with their weights
    pub fn parents(&self) -> &[(NodeId, u32)] {
        &self.parents
    }

    /// Edge weights consumed by chain contraction, in path order
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Neighbours on the downstream side of `direction`
    pub fn side(&self, direction: Direction) -> &[(NodeId, u32)] {
        match direction {
            Direction::Down => &self.children,
            Direction::Up => &self.parents,
        }
    }

    /// Weight of the edge to `child`
    pub fn child_weight(&self, child: NodeId) -> Option<u32> {
        weight_of(&self.children, child)
    }

    /// Weight of the edge from `parent`
    pub fn parent_weight(&self, parent: NodeId) -> Option<u32> {
        weight_of(&self.parents, parent)
    }

    /// Node without parents
    pub fn is_head(&self) -> bool {
        self.parents.is_empty()
    }

    /// Node without children
    pub fn is_tail(&self) -> bool {
        self.children.is_empty()
    }

    /// Node without any edge
    pub fn is_isolated(&self) -> bool {
        self.is_head() && self.is_tail()
    }

    /// Label as text, replacing invalid UTF-8
    pub fn label(&self) -> String {
        String::from_utf8_lossy(&self.seq).into_owned()
    }
}

fn weight_of(links: &[(NodeId, u32)], id: NodeId) -> Option<u32> {
    links.iter().find(|(n, _)| *n == id).map(|(_, w)| *w)
}

fn bump(links: &mut Vec<(NodeId, u32)>, id: NodeId, weight: u32) {
    match links.iter_mut().find(|(n, _)| *n == id) {
        Some(link) => link.1 += weight,
        None => links.push((id, weight)),
    }
}

fn unlink(links: &mut Vec<(NodeId, u32)>, id: NodeId) -> Option<u32> {
    let pos = links.iter().position(|(n, _)| *n == id)?;
    Some(links.remove(pos).1)
}

/// Leading `(k-1)`-mer of a sequence, the key nodes are indexed under
fn anchor(seq: &[u8], k: usize) -> &[u8] {
    &seq[..seq.len().min(k.saturating_sub(1))]
}

/// Splits a read into its k-mers, each returned with its left and right `(k-1)`-mer.
/// Reads shorter than `k`, or `k < 2`, produce nothing.
pub fn chop<'a>(
    read: &'a [u8],
    k: usize,
) -> impl Iterator<Item = (&'a [u8], &'a [u8], &'a [u8])> + 'a {
    let windows = if k >= 2 {
        read.windows(k)
    } else {
        read[..0].windows(1)
    };
    windows.map(|kmer| (kmer, &kmer[..kmer.len() - 1], &kmer[1..]))
}

/// De Bruijn multigraph owning all of its nodes in an arena. Deleted nodes leave an empty
/// slot behind so that outstanding ids never point at a different node.
///
/// Sequence lookups go through buckets keyed by the leading `(k-1)`-mer of each node.
/// Every `(k-1)`-mer of the reads belongs to exactly one node, so buckets stay tiny even
/// once chains have been contracted into long sequences, and re-keying a fused node costs
/// `O(k)` instead of rehashing its whole sequence.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) k: usize,
    pub(crate) threshold: f64,
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) index: HashMap<Vec<u8>, Vec<NodeId>>,
    pub(crate) live: usize,
}

impl Graph {
    /// Creates an empty graph for k-mers of length `k`
    pub fn new(k: usize) -> Self {
        if k < 2 {
            warn!("k = {} is too small, no edges will be created", k);
        }
        Self {
            k,
            threshold: 1.0,
            nodes: Vec::new(),
            index: HashMap::new(),
            live: 0,
        }
    }

    /// Builds the multigraph from `reads`: every k-mer adds one to the weight of the edge
    /// joining its left and right `(k-1)`-mer.
    pub fn from_reads<I, S>(reads: I, k: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut graph = Self::new(k);
        let mut kmers = 0;
        let mut count = 0;
        for read in reads {
            kmers += graph.add_read(read.as_ref());
            count += 1;
        }
        debug!(
            "Inserted {} k-mers from {} reads into {} nodes",
            kmers, count, graph.live
        );
        graph
    }

    /// Adds the k-mers of a single read, returning how many were added
    pub fn add_read(&mut self, read: &[u8]) -> usize {
        let mut added = 0;
        for (_, left, right) in chop(read, self.k) {
            let left = self.intern(left);
            let right = self.intern(right);
            self.add_edge(left, right, 1);
            added += 1;
        }
        added
    }

    /// Length of the k-mers the graph was built from
    pub fn k(&self) -> usize {
        self.k
    }

    /// Support threshold used by the last edge pruning
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    /// Checks if there are no live nodes
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the node if it is still live
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    /// Looks up a live node by its current sequence
    pub fn find(&self, seq: &[u8]) -> Option<NodeId> {
        self.index
            .get(anchor(seq, self.k))?
            .iter()
            .copied()
            .find(|&id| self.node(id).map_or(false, |node| node.seq == seq))
    }

    fn index_insert(&mut self, id: NodeId, seq: &[u8]) {
        let key = anchor(seq, self.k).to_vec();
        self.index.entry(key).or_insert_with(Vec::new).push(id);
    }

    fn index_remove(&mut self, id: NodeId, seq: &[u8]) {
        let key = anchor(seq, self.k);
        let emptied = match self.index.get_mut(key) {
            Some(bucket) => {
                bucket.retain(|&n| n != id);
                bucket.is_empty()
            }
            None => false,
        };
        if emptied {
            self.index.remove(key);
        }
    }

    /// Live nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| node.as_ref().map(|node| (id, node)))
    }

    /// Live node ids in id order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().map(|(id, _)| id)
    }

    /// Every live edge as `(source, target, weight)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, u32)> + '_ {
        self.nodes().flat_map(|(id, node)| {
            node.children
                .iter()
                .map(move |&(child, weight)| (id, child, weight))
        })
    }

    /// Number of live edges
    pub fn edge_count(&self) -> usize {
        self.nodes().map(|(_, node)| node.children.len()).sum()
    }

    /// Sum of all live edge weights
    pub fn total_weight(&self) -> u64 {
        self.edges().map(|(_, _, weight)| u64::from(weight)).sum()
    }

    /// Nodes without parents, including isolated ones
    pub fn heads(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.is_head())
            .map(|(id, _)| id)
            .collect()
    }

    /// Nodes without children, including isolated ones
    pub fn tails(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.is_tail())
            .map(|(id, _)| id)
            .collect()
    }

    /// Nodes maximising `children - parents`, i.e. the most source-like nodes of a graph
    /// that may have no heads left.
    pub fn source_like(&self) -> Vec<NodeId> {
        let balance = |node: &Node| node.children.len() as isize - node.parents.len() as isize;
        match self.nodes().map(|(_, node)| balance(node)).max() {
            Some(best) => self
                .nodes()
                .filter(|(_, node)| balance(node) == best)
                .map(|(id, _)| id)
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn intern(&mut self, seq: &[u8]) -> NodeId {
        match self.find(seq) {
            Some(id) => id,
            None => self.insert_node(Node::new(seq.to_vec())),
        }
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.index_insert(id, &node.seq);
        self.nodes.push(Some(node));
        self.live += 1;
        id
    }

    /// Adds `weight` to the edge `from -> to` on both of its ends
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId, weight: u32) {
        if let Some(node) = self.node_mut(from) {
            bump(&mut node.children, to, weight);
        }
        if let Some(node) = self.node_mut(to) {
            bump(&mut node.parents, from, weight);
        }
    }

    /// Removes the edge `from -> to` from both of its ends, returning its weight
    pub fn cut_edge(&mut self, from: NodeId, to: NodeId) -> Option<u32> {
        let weight = self.node_mut(from).and_then(|node| unlink(&mut node.children, to));
        if let Some(node) = self.node_mut(to) {
            unlink(&mut node.parents, from);
        }
        weight
    }

    /// Deletes a node and scrubs it from the neighbour lists of all of its neighbours
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.get_mut(id)?.take()?;
        for &(child, _) in &node.children {
            if let Some(child) = self.node_mut(child) {
                unlink(&mut child.parents, id);
            }
        }
        for &(parent, _) in &node.parents {
            if let Some(parent) = self.node_mut(parent) {
                unlink(&mut parent.children, id);
            }
        }
        self.index_remove(id, &node.seq);
        self.live -= 1;
        Some(node)
    }

    /// Renumbers live nodes densely and rebuilds the sequence index. Previously handed out
    /// ids are invalidated.
    pub fn compact(&mut self) {
        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0;
        for (id, slot) in self.nodes.iter().enumerate() {
            if slot.is_some() {
                remap[id] = Some(next);
                next += 1;
            }
        }
        let relink = |links: Vec<(NodeId, u32)>| -> Vec<(NodeId, u32)> {
            links
                .into_iter()
                .filter_map(|(id, weight)| remap[id].map(|id| (id, weight)))
                .collect()
        };
        let nodes = std::mem::replace(&mut self.nodes, Vec::new());
        self.nodes = nodes
            .into_iter()
            .flatten()
            .map(|mut node| {
                node.children = relink(std::mem::replace(&mut node.children, Vec::new()));
                node.parents = relink(std::mem::replace(&mut node.parents, Vec::new()));
                Some(node)
            })
            .collect();
        self.rebuild_index();
    }

    /// Rebuilds the sequence to id lookup from the live nodes
    pub fn rebuild_index(&mut self) {
        let mut index: HashMap<Vec<u8>, Vec<NodeId>> = HashMap::new();
        for (id, node) in self.nodes() {
            index
                .entry(anchor(&node.seq, self.k).to_vec())
                .or_insert_with(Vec::new)
                .push(id);
        }
        self.index = index;
        self.live = self.nodes.iter().filter(|slot| slot.is_some()).count();
    }

    /// Verifies that every edge is recorded identically on both of its ends, that no
    /// reference dangles and that the sequence index agrees with the live nodes.
    pub fn check_invariants(&self) -> Result<()> {
        for (id, node) in self.nodes() {
            for &(child, weight) in &node.children {
                if node.children.iter().filter(|(n, _)| *n == child).count() > 1 {
                    return Err(Error::Inconsistent(format!(
                        "{} lists child {} twice",
                        id, child
                    )));
                }
                match self.node(child) {
                    Some(other) if other.parent_weight(id) == Some(weight) => {}
                    Some(_) => {
                        return Err(Error::Inconsistent(format!(
                            "edge {} -> {} ({}) is missing on the child",
                            id, child, weight
                        )))
                    }
                    None => {
                        return Err(Error::Inconsistent(format!(
                            "{} points at removed child {}",
                            id, child
                        )))
                    }
                }
            }
            for &(parent, weight) in &node.parents {
                if node.parents.iter().filter(|(n, _)| *n == parent).count() > 1 {
                    return Err(Error::Inconsistent(format!(
                        "{} lists parent {} twice",
                        id, parent
                    )));
                }
                match self.node(parent) {
                    Some(other) if other.child_weight(id) == Some(weight) => {}
                    Some(_) => {
                        return Err(Error::Inconsistent(format!(
                            "edge {} -> {} ({}) is missing on the parent",
                            parent, id, weight
                        )))
                    }
                    None => {
                        return Err(Error::Inconsistent(format!(
                            "{} points at removed parent {}",
                            id, parent
                        )))
                    }
                }
            }
            if self.find(&node.seq) != Some(id) {
                return Err(Error::Inconsistent(format!(
                    "{} is not indexed under {}",
                    id,
                    node.label()
                )));
            }
        }
        let indexed: usize = self.index.values().map(Vec::len).sum();
        if indexed != self.live {
            return Err(Error::Inconsistent(format!(
                "{} indexed sequences for {} live nodes",
                indexed, self.live
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn edge(graph: &Graph, from: &str, to: &str) -> Option<u32> {
        let from = graph.find(from.as_bytes())?;
        let to = graph.find(to.as_bytes())?;
        graph.node(from)?.child_weight(to)
    }

    /// Rejoins consecutive sequences overlapping by `overlap` bases
    pub(crate) fn rejoin(parts: &[&[u8]], overlap: usize) -> Vec<u8> {
        let mut joined = parts[0].to_vec();
        for part in &parts[1..] {
            joined.extend_from_slice(&part[overlap..]);
        }
        joined
    }

    #[test]
    fn test_acgtacgt_edges() {
        let graph = Graph::from_reads(vec!["ACGTACGT"], 3);
        let mut labels = graph
            .nodes()
            .map(|(_, node)| node.label())
            .collect::<Vec<String>>();
        labels.sort();
        assert_eq!(labels, vec!["AC", "CG", "GT", "TA"]);

        assert_eq!(edge(&graph, "AC", "CG"), Some(2));
        assert_eq!(edge(&graph, "CG", "GT"), Some(2));
        assert_eq!(edge(&graph, "GT", "TA"), Some(1));
        assert_eq!(edge(&graph, "TA", "AC"), Some(1));
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.total_weight(), 6);
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_short_reads_and_small_k() {
        let graph = Graph::from_reads(vec!["AC", "ACG"], 4);
        assert!(graph.is_empty());

        let graph = Graph::from_reads(vec!["ACGTTT"], 1);
        assert!(graph.is_empty());
        assert_eq!(chop(b"ACGT", 0).count(), 0);
    }

    #[test]
    fn test_self_loop() {
        let graph = Graph::from_reads(vec!["AAAA"], 3);
        let aa = graph.find(b"AA").unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node(aa).unwrap().child_weight(aa), Some(2));
        assert_eq!(graph.node(aa).unwrap().parent_weight(aa), Some(2));
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_node_scrubs_neighbours() {
        let mut graph = Graph::from_reads(vec!["ACGTACGT"], 3);
        let cg = graph.find(b"CG").unwrap();
        let removed = graph.remove_node(cg).unwrap();
        assert_eq!(removed.seq(), b"CG");
        assert_eq!(graph.find(b"CG"), None);
        assert_eq!(edge(&graph, "AC", "CG"), None);
        assert_eq!(graph.len(), 3);
        assert!(graph.remove_node(cg).is_none());
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_compact_renumbers() {
        let mut graph = Graph::from_reads(vec!["ACGTACGT"], 3);
        let ac = graph.find(b"AC").unwrap();
        graph.remove_node(ac);
        graph.compact();
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(edge(&graph, "CG", "GT"), Some(2));
        assert_eq!(edge(&graph, "GT", "TA"), Some(1));
        graph.check_invariants().unwrap();
    }

    #[test]
    fn test_source_like() {
        let graph = Graph::from_reads(vec!["ACGTACGT", "CGA"], 3);
        // CG gains a second child through "CGA"
        let cg = graph.find(b"CG").unwrap();
        assert_eq!(graph.source_like(), vec![cg]);
    }

    proptest! {
        #[test]
        fn proptest_chop_rejoins_read(read in "[ACGT]{2,80}", k in 2usize..12) {
            let read = read.into_bytes();
            prop_assume!(k <= read.len());
            let windows = chop(&read, k).collect::<Vec<_>>();
            prop_assert_eq!(windows.len(), read.len() - k + 1);

            let mut parts = vec![windows[0].1];
            parts.extend(windows.iter().map(|(_, _, right)| *right));
            prop_assert_eq!(rejoin(&parts, k - 2), read);
        }

        #[test]
        fn proptest_symmetry_and_conservation(
            reads in proptest::collection::vec("[ACGT]{0,40}", 1..12),
            k in 2usize..7,
        ) {
            let graph = Graph::from_reads(&reads, k);
            prop_assert!(graph.check_invariants().is_ok());
            let kmers: usize = reads.iter().map(|r| (r.len() + 1).saturating_sub(k)).sum();
            prop_assert_eq!(graph.total_weight(), kmers as u64);

            let mut reversed = reads.clone();
            reversed.reverse();
            let other = Graph::from_reads(&reversed, k);
            for (from, to, weight) in graph.edges() {
                let from = other.find(graph.node(from).unwrap().seq()).unwrap();
                let to = other.find(graph.node(to).unwrap().seq()).unwrap();
                prop_assert_eq!(other.node(from).unwrap().child_weight(to), Some(weight));
            }
        }
    }
}
