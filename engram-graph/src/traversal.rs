//! In-memory traversal over a user's stored edges.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use uuid::Uuid;

use engram_core::constants::MAX_TRAVERSAL_DEPTH;
use engram_core::graph::{EdgeType, KnowledgeEdge};

/// A memory reached during traversal.
#[derive(Debug, Clone)]
pub struct TraversalNode {
    pub memory_id: Uuid,
    pub depth: usize,
    pub edge_type: EdgeType,
    pub strength: f64,
}

/// A user's edges loaded into a petgraph for traversal. Nodes are memory
/// ids; edge weights index into the owned edge list.
pub struct IndexedGraph {
    graph: DiGraph<Uuid, usize>,
    index: HashMap<Uuid, NodeIndex>,
    edges: Vec<KnowledgeEdge>,
}

impl IndexedGraph {
    pub fn build(edges: Vec<KnowledgeEdge>) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<Uuid, NodeIndex> = HashMap::new();

        for (position, edge) in edges.iter().enumerate() {
            let from = *index
                .entry(edge.from_id)
                .or_insert_with(|| graph.add_node(edge.from_id));
            let to = *index
                .entry(edge.to_id)
                .or_insert_with(|| graph.add_node(edge.to_id));
            graph.add_edge(from, to, position);
        }

        Self {
            graph,
            index,
            edges,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Memories reachable from `origin` within `depth` hops, following
    /// outgoing edges at or above `min_strength`. Visited nodes are never
    /// re-entered, which bounds cyclic graphs.
    pub fn related(&self, origin: Uuid, depth: usize, min_strength: f64) -> Vec<TraversalNode> {
        let depth = depth.min(MAX_TRAVERSAL_DEPTH);
        let Some(&start) = self.index.get(&origin) else {
            return vec![];
        };

        let mut visited: HashMap<NodeIndex, usize> = HashMap::from([(start, 0)]);
        let mut frontier = vec![start];
        let mut result = Vec::new();

        for current_depth in 1..=depth {
            let mut next_frontier = Vec::new();
            for node in frontier {
                for edge_ref in self.graph.edges(node) {
                    let edge = &self.edges[*edge_ref.weight()];
                    if edge.strength < min_strength {
                        continue;
                    }
                    let target = edge_ref.target();
                    if visited.contains_key(&target) {
                        continue;
                    }
                    visited.insert(target, current_depth);
                    result.push(TraversalNode {
                        memory_id: self.graph[target],
                        depth: current_depth,
                        edge_type: edge.edge_type,
                        strength: edge.strength,
                    });
                    next_frontier.push(target);
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        result
    }

    /// Shortest edge path from `from` to `to` within `max_depth` hops.
    /// Depth-first with per-path visited pruning; the shortest complete
    /// path wins.
    pub fn find_path(&self, from: Uuid, to: Uuid, max_depth: usize) -> Vec<KnowledgeEdge> {
        let max_depth = max_depth.min(MAX_TRAVERSAL_DEPTH);
        let (Some(&start), Some(&goal)) = (self.index.get(&from), self.index.get(&to)) else {
            return vec![];
        };

        let mut best: Option<Vec<usize>> = None;
        let mut path: Vec<usize> = Vec::new();
        let mut visited: Vec<NodeIndex> = vec![start];
        self.dfs_path(start, goal, max_depth, &mut path, &mut visited, &mut best);

        best.map(|edge_indices| {
            edge_indices
                .into_iter()
                .map(|i| self.edges[i].clone())
                .collect()
        })
        .unwrap_or_default()
    }

    fn dfs_path(
        &self,
        node: NodeIndex,
        goal: NodeIndex,
        budget: usize,
        path: &mut Vec<usize>,
        visited: &mut Vec<NodeIndex>,
        best: &mut Option<Vec<usize>>,
    ) {
        if budget == 0 {
            return;
        }
        // A longer partial path than the best complete one cannot win.
        if let Some(current_best) = best {
            if path.len() + 1 >= current_best.len() {
                return;
            }
        }

        for edge_ref in self.graph.edges(node) {
            let target = edge_ref.target();
            if visited.contains(&target) {
                continue;
            }
            path.push(*edge_ref.weight());
            if target == goal {
                let better = best
                    .as_ref()
                    .map(|b| path.len() < b.len())
                    .unwrap_or(true);
                if better {
                    *best = Some(path.clone());
                }
            } else {
                visited.push(target);
                self.dfs_path(target, goal, budget - 1, path, visited, best);
                visited.pop();
            }
            path.pop();
        }
    }
}
