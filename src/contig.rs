//! Contigs and their extraction from a single head.
use crate::error::Error;
use crate::graph::{Graph, NodeId};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Path of nodes together with the sequence it spells and its mean coverage weight
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
    path: Vec<NodeId>,
    seq: Vec<u8>,
    weight: f64,
}

impl Contig {
    /// Spells `path`, consecutive node sequences overlapping by `k-2` bases. The weight is
    /// the mean of the weight histories of all nodes on the path, 0 when there are none.
    pub fn from_path(graph: &Graph, path: Vec<NodeId>) -> Self {
        let overlap = graph.k().saturating_sub(2);
        let mut seq = Vec::new();
        let mut total = 0u64;
        let mut count = 0usize;
        for node in path.iter().filter_map(|&id| graph.node(id)) {
            if seq.is_empty() {
                seq.extend_from_slice(node.seq());
            } else {
                seq.extend_from_slice(&node.seq()[overlap.min(node.seq().len())..]);
            }
            total += node.weights().iter().map(|&w| u64::from(w)).sum::<u64>();
            count += node.weights().len();
        }
        let weight = if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        };
        Self { path, seq, weight }
    }

    /// Nodes of the contig in path order
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    /// Assembled sequence
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    /// Length of the assembled sequence
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    /// Checks if the contig spells nothing
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Mean coverage weight
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Length multiplied by weight, used to rank contigs across heads
    pub fn score(&self) -> f64 {
        self.len() as f64 * self.weight
    }
}

impl fmt::Display for Contig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

/// How to choose between candidates with equal score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Keep the candidate met first, which depends on neighbour order
    FirstSeen,
    /// Keep the lexicographically smallest sequence, independent of traversal order
    Lexicographic,
}

impl TieBreak {
    fn prefers(self, challenger: &Contig, incumbent: &Contig) -> bool {
        match self {
            TieBreak::FirstSeen => false,
            TieBreak::Lexicographic => challenger.seq() < incumbent.seq(),
        }
    }

    /// Picks the candidate with the highest `score`, resolving ties with `self`
    pub fn pick<I, F>(self, candidates: I, score: F) -> Option<Contig>
    where
        I: IntoIterator<Item = Contig>,
        F: Fn(&Contig) -> f64,
    {
        let mut best: Option<(f64, Contig)> = None;
        for contig in candidates {
            let value = score(&contig);
            let better = match &best {
                None => true,
                Some((top, current)) => {
                    value > *top || (value == *top && self.prefers(&contig, current))
                }
            };
            if better {
                best = Some((value, contig));
            }
        }
        best.map(|(_, contig)| contig)
    }
}

impl Default for TieBreak {
    fn default() -> Self {
        TieBreak::FirstSeen
    }
}

impl FromStr for TieBreak {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first-seen" => Ok(TieBreak::FirstSeen),
            "lexicographic" | "lex" => Ok(TieBreak::Lexicographic),
            _ => Err(Error::UnknownTieBreak(s.to_string())),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::FirstSeen => write!(f, "first"),
            TieBreak::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

/// Enumerates paths leaving a head and keeps the best sufficiently long one
#[derive(Debug, Clone)]
pub struct ContigExtractor {
    min_len: usize,
    tie_break: TieBreak,
}

impl ContigExtractor {
    /// Creates an extractor keeping contigs of at least `min_len` bases
    pub fn new(min_len: usize, tie_break: TieBreak) -> Self {
        Self { min_len, tie_break }
    }

    /// Minimum contig length
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Tie-break policy
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Walks forward from `head`, following every child at branches. A path ends at a
    /// node without children or when it reaches a node already walked from this head, so
    /// nodes shared by several branches end up on the first path that reaches them.
    pub fn paths(&self, graph: &Graph, head: NodeId) -> Vec<Vec<NodeId>> {
        let mut visited = HashSet::new();
        // (node, index of the previous step); paths are read back from their last step
        let mut steps: Vec<(NodeId, Option<usize>)> = Vec::new();
        let mut ends = Vec::new();
        let mut stack = vec![(head, None)];

        while let Some((id, prev)) = stack.pop() {
            let node = match graph.node(id) {
                Some(node) => node,
                None => continue,
            };
            if !visited.insert(id) {
                if let Some(prev) = prev {
                    ends.push(prev);
                }
                continue;
            }
            steps.push((id, prev));
            let step = steps.len() - 1;
            if node.is_tail() {
                ends.push(step);
            } else {
                stack.extend(node.children().iter().rev().map(|&(child, _)| (child, Some(step))));
            }
        }

        ends.into_iter()
            .map(|end| {
                let mut path = Vec::new();
                let mut cursor = Some(end);
                while let Some(step) = cursor {
                    let (id, prev) = steps[step];
                    path.push(id);
                    cursor = prev;
                }
                path.reverse();
                path
            })
            .collect()
    }

    /// Contigs from `head` that are long enough
    pub fn candidates(&self, graph: &Graph, head: NodeId) -> Vec<Contig> {
        self.paths(graph, head)
            .into_iter()
            .map(|path| Contig::from_path(graph, path))
            .filter(|contig| contig.len() >= self.min_len)
            .collect()
    }

    /// Best contig from `head` by weight, if any is long enough
    pub fn extract(&self, graph: &Graph, head: NodeId) -> Option<Contig> {
        self.tie_break
            .pick(self.candidates(graph, head), Contig::weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(graph: &Graph, paths: &[Vec<NodeId>]) -> Vec<String> {
        paths
            .iter()
            .map(|path| Contig::from_path(graph, path.clone()).to_string())
            .collect()
    }

    #[test]
    fn test_contig_sequence_and_weight() {
        let mut graph = Graph::from_reads(vec!["AACGTAA", "AACGTCC", "AACGTCC"], 4);
        graph.merge_chains();
        let stem = graph.find(b"AACGT").unwrap();
        let right = graph.find(b"GTCC").unwrap();
        let contig = Contig::from_path(&graph, vec![stem, right]);
        assert_eq!(contig.to_string(), "AACGTCC");
        // stem weights [3, 3], right weights [2]
        assert!((contig.weight() - 8.0 / 3.0).abs() < 1e-9);
        assert!((contig.score() - 7.0 * 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_contig_weight() {
        let graph = Graph::from_reads(vec!["ACGT"], 3);
        let contig = Contig::from_path(&graph, vec![graph.find(b"AC").unwrap()]);
        assert_eq!(contig.weight(), 0.0);
        assert_eq!(contig.seq(), b"AC");
        assert!(Contig::from_path(&graph, Vec::new()).is_empty());
    }

    #[test]
    fn test_paths_follow_every_branch() {
        let mut graph = Graph::from_reads(vec!["AACGTAA", "AACGTCC"], 4);
        graph.merge_chains();
        let head = graph.find(b"AACGT").unwrap();
        let extractor = ContigExtractor::new(0, TieBreak::FirstSeen);
        let paths = extractor.paths(&graph, head);
        assert_eq!(seqs(&graph, &paths), vec!["AACGTAA", "AACGTCC"]);
    }

    #[test]
    fn test_paths_stop_at_visited_nodes() {
        // both branches of CG rejoin at TA, the second branch stops right before it
        let graph = Graph::from_reads(vec!["ACGATA", "CGCTA"], 3);
        let head = graph.find(b"AC").unwrap();
        let extractor = ContigExtractor::new(0, TieBreak::FirstSeen);
        let paths = extractor.paths(&graph, head);
        assert_eq!(seqs(&graph, &paths), vec!["ACGATA", "ACGCT"]);
    }

    #[test]
    fn test_paths_survive_cycles() {
        let graph = Graph::from_reads(vec!["ACGTACGTT"], 3);
        let head = graph.find(b"AC").unwrap();
        let extractor = ContigExtractor::new(0, TieBreak::FirstSeen);
        let paths = extractor.paths(&graph, head);
        assert_eq!(seqs(&graph, &paths), vec!["ACGTA", "ACGTT"]);
    }

    #[test]
    fn test_extract_filters_by_length() {
        let mut graph = Graph::from_reads(vec!["AACGTAA", "AACGTCCGG"], 4);
        graph.merge_chains();
        let head = graph.find(b"AACGT").unwrap();
        let extractor = ContigExtractor::new(8, TieBreak::FirstSeen);
        let contig = extractor.extract(&graph, head).unwrap();
        assert_eq!(contig.to_string(), "AACGTCCGG");
        assert!(ContigExtractor::new(10, TieBreak::FirstSeen)
            .extract(&graph, head)
            .is_none());
    }

    #[test]
    fn test_extract_prefers_weight_then_policy() {
        let mut graph = Graph::from_reads(vec!["AACGTCC", "AACGTAA"], 4);
        graph.merge_chains();
        let head = graph.find(b"AACGT").unwrap();

        let first = ContigExtractor::new(0, TieBreak::FirstSeen);
        assert_eq!(first.extract(&graph, head).unwrap().to_string(), "AACGTCC");
        let lex = ContigExtractor::new(0, TieBreak::Lexicographic);
        assert_eq!(lex.extract(&graph, head).unwrap().to_string(), "AACGTAA");

        let mut graph = Graph::from_reads(vec!["AACGTCC", "AACGTAA", "CGTAA"], 4);
        graph.merge_chains();
        let head = graph.find(b"AACGT").unwrap();
        assert_eq!(first.extract(&graph, head).unwrap().to_string(), "AACGTAA");
    }

    #[test]
    fn test_tie_break_parsing() {
        assert_eq!("first".parse::<TieBreak>().unwrap(), TieBreak::FirstSeen);
        assert_eq!(
            "Lexicographic".parse::<TieBreak>().unwrap(),
            TieBreak::Lexicographic
        );
        assert!("random".parse::<TieBreak>().is_err());
        assert_eq!(TieBreak::Lexicographic.to_string(), "lexicographic");
    }
}
