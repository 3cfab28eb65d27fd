//! Contraction of unary chains.
use crate::graph::{Direction, Graph, Node, NodeId};
use log::{debug, info};

/// Traversal state of a single merge pass. Every node is expanded at most once per
/// context, which bounds the work on cyclic graphs.
#[derive(Debug, Default)]
pub struct MergeContext {
    visited: Vec<bool>,
    stack: Vec<(NodeId, Direction)>,
    fusions: usize,
    collisions: usize,
}

impl MergeContext {
    /// Creates a context with nothing visited
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as visited, returning `false` if it already was
    fn visit(&mut self, id: NodeId) -> bool {
        if id >= self.visited.len() {
            self.visited.resize(id + 1, false);
        }
        !std::mem::replace(&mut self.visited[id], true)
    }

    /// Checks if `id` has been expanded in this context
    pub fn is_visited(&self, id: NodeId) -> bool {
        self.visited.get(id).copied().unwrap_or(false)
    }

    /// Fusions performed so far
    pub fn fusions(&self) -> usize {
        self.fusions
    }

    /// Fusions whose sequence already labelled another node
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

/// Summary of [`Graph::merge_chains`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Passes run, including the final one without fusions
    pub passes: usize,
    /// Pairs of nodes contracted into one
    pub fusions: usize,
    /// Fusions folded into an existing node with the same sequence
    pub collisions: usize,
}

impl Graph {
    /// Contracts unary chains until a pass no longer fuses anything. Each pass starts from
    /// the heads going down, then from the tails going up and finally from every node not
    /// reached yet, which covers cycles without heads. Ids are renumbered afterwards.
    pub fn merge_chains(&mut self) -> MergeReport {
        let mut report = MergeReport::default();
        loop {
            let mut ctx = MergeContext::new();
            let heads = self
                .nodes()
                .filter(|(_, node)| node.is_head() && !node.is_tail())
                .map(|(id, _)| id)
                .collect::<Vec<NodeId>>();
            let tails = self
                .nodes()
                .filter(|(_, node)| node.is_tail() && !node.is_head())
                .map(|(id, _)| id)
                .collect::<Vec<NodeId>>();
            for head in heads {
                self.merge(&mut ctx, head, Direction::Down);
            }
            for tail in tails {
                self.merge(&mut ctx, tail, Direction::Up);
            }
            let mut id = 0;
            while id < self.nodes.len() {
                if self.node(id).is_some() && !ctx.is_visited(id) {
                    self.merge(&mut ctx, id, Direction::Down);
                }
                id += 1;
            }

            report.passes += 1;
            report.fusions += ctx.fusions;
            report.collisions += ctx.collisions;
            debug!(
                "Merge pass {} fused {} pairs, {} nodes left",
                report.passes,
                ctx.fusions,
                self.len()
            );
            if ctx.fusions == 0 {
                break;
            }
        }
        self.compact();
        info!("Number of nodes after merging = {}", self.len());
        report
    }

    /// Contracts the unary chain reachable from `start` in `direction`. Branch points are
    /// never fused themselves but the walk continues through all of their neighbours,
    /// flipping direction when it turns towards the branch's other side.
    pub fn merge(&mut self, ctx: &mut MergeContext, start: NodeId, direction: Direction) {
        ctx.stack.push((start, direction));
        while let Some((id, direction)) = ctx.stack.pop() {
            if self.node(id).is_none() || !ctx.visit(id) {
                continue;
            }
            let next = self.merge_step(ctx, id, direction);
            ctx.stack.extend(next.into_iter().rev());
        }
    }

    /// Expands one node and returns the nodes to expand next, in visiting order
    fn merge_step(
        &mut self,
        ctx: &mut MergeContext,
        id: NodeId,
        direction: Direction,
    ) -> Vec<(NodeId, Direction)> {
        let node = match self.node(id) {
            Some(node) => node,
            None => return Vec::new(),
        };
        let upstream = node.side(direction.flip());
        let downstream = node.side(direction);

        if upstream.len() > 1 {
            return upstream
                .iter()
                .map(|&(n, _)| (n, direction.flip()))
                .chain(downstream.iter().map(|&(n, _)| (n, direction)))
                .collect();
        }
        if downstream.len() != 1 {
            return downstream.iter().map(|&(n, _)| (n, direction)).collect();
        }

        let (next, _) = downstream[0];
        if next == id {
            return Vec::new();
        }
        let next_upstream = match self.node(next) {
            Some(node) => node.side(direction.flip()),
            None => return Vec::new(),
        };
        if next_upstream.len() != 1 {
            let mut calls = next_upstream
                .iter()
                .filter(|&&(n, _)| n != id)
                .map(|&(n, _)| (n, direction.flip()))
                .collect::<Vec<_>>();
            calls.push((next, direction));
            return calls;
        }

        let fused = match direction {
            Direction::Down => self.fuse(ctx, id, next),
            Direction::Up => self.fuse(ctx, next, id),
        };
        match fused {
            Some(fused) => vec![(fused, direction)],
            None => Vec::new(),
        }
    }

    /// Replaces `first -> second`, where `first` has no other child and `second` no other
    /// parent, with a single node spelling both sequences. The new node takes the parents
    /// of `first` and the children of `second`; if its sequence already labels a node the
    /// edges and weights are added to that node instead.
    fn fuse(&mut self, ctx: &mut MergeContext, first: NodeId, second: NodeId) -> Option<NodeId> {
        let cycle = self.node(second)?.child_weight(first);
        if self.node(first).is_none() {
            return None;
        }
        let head = self.remove_node(first)?;
        let tail = self.remove_node(second)?;
        let link = head.child_weight(second).unwrap_or(0);

        let overlap = self.k.saturating_sub(2).min(tail.seq.len());
        let mut seq = head.seq;
        seq.extend_from_slice(&tail.seq[overlap..]);

        let mut weights = head.weights;
        weights.push(link);
        weights.extend(tail.weights);

        let parents = head
            .parents
            .into_iter()
            .filter(|&(parent, _)| parent != second)
            .collect::<Vec<_>>();
        let children = tail
            .children
            .into_iter()
            .filter(|&(child, _)| child != first)
            .collect::<Vec<_>>();

        let target = match self.find(&seq) {
            Some(existing) => {
                debug!(
                    "Fused sequence of {} and {} already labels node {}",
                    first, second, existing
                );
                ctx.collisions += 1;
                existing
            }
            None => self.insert_node(Node::new(seq)),
        };
        for (parent, weight) in parents {
            self.add_edge(parent, target, weight);
        }
        for (child, weight) in children {
            self.add_edge(target, child, weight);
        }
        // second -> first closed a cycle, it survives as a self-loop
        if let Some(weight) = cycle {
            self.add_edge(target, target, weight);
        }
        if let Some(node) = self.node_mut(target) {
            node.weights.extend(weights);
        }
        ctx.fusions += 1;
        Some(target)
    }
}
