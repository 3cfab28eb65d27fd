#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Assembly of short, overlapping reads into contigs using a de Bruijn multigraph.
//! Reads are chopped into k-mers whose `(k-1)`-mer ends become nodes, the graph is
//! filtered of suspect nodes and weakly supported edges, unary chains are contracted
//! and finally non-overlapping contigs are greedily picked by length and coverage.
//!
//! Traversals use explicit work stacks so that deep unary chains do not grow the call
//! stack. Neighbour lists are kept in insertion order which makes every tie-break
//! reproducible between runs on the same input.

pub mod assembly;
pub mod contig;
pub mod correction;
pub mod error;
pub mod export;
pub mod fasta;
pub mod filter;
pub mod graph;
pub mod merge;
pub mod select;

pub use crate::assembly::{Assembler, Assembly, AssemblyConfig, AssemblyStats};
pub use crate::contig::{Contig, ContigExtractor, TieBreak};
pub use crate::correction::{Correction, ErrorCorrector};
pub use crate::error::Error;
pub use crate::graph::{chop, Direction, Graph, Node, NodeId};
pub use crate::merge::{MergeContext, MergeReport};
pub use crate::select::{ContigSelector, Selection};

/// Nucleotide alphabet used
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];
/// Default k-mer length
pub const DEFAULT_KMER_SIZE: usize = 31;
/// Minimum sequence length of a contig candidate
pub const DEFAULT_MIN_CONTIG_LEN: usize = 300;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, crate::error::Error>;
