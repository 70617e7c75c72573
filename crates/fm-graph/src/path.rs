//! Path search trait and the default breadth-first implementation.
//!
//! # Pluggability
//!
//! `fm-fleet` plans through the [`PathFinder`] trait, so an application can
//! swap in a weighted or traffic-aware search without touching the fleet
//! manager.  The default [`BfsPathFinder`] minimises hop count over the
//! undirected lane graph.

use std::collections::VecDeque;

use fm_core::VertexId;

use crate::{GraphError, NavGraph};

// ── Path ──────────────────────────────────────────────────────────────────────

/// Vertex sequence from start to target, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub vertices: Vec<VertexId>,
}

impl Path {
    /// Number of lanes the path crosses.
    pub fn hops(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// `true` if start and target are the same vertex.
    pub fn is_trivial(&self) -> bool {
        self.vertices.len() <= 1
    }

    pub fn start(&self) -> Option<VertexId> {
        self.vertices.first().copied()
    }

    pub fn target(&self) -> Option<VertexId> {
        self.vertices.last().copied()
    }

    /// Consecutive `(from, to)` pairs, i.e. the lanes in travel order.
    pub fn legs(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable path search.
///
/// Implementations must be `Send + Sync`; the fleet manager is shared with
/// presentation threads.
pub trait PathFinder: Send + Sync {
    /// Compute a path from `from` to `to`.
    ///
    /// `from == to` yields the single-vertex path.  Unknown vertices fail
    /// with [`GraphError::VertexNotFound`], unreachable targets with
    /// [`GraphError::NoPath`].
    fn find_path(&self, graph: &NavGraph, from: VertexId, to: VertexId) -> Result<Path, GraphError>;
}

// ── BfsPathFinder ─────────────────────────────────────────────────────────────

/// Unweighted breadth-first search.
///
/// Vertices are marked visited when first discovered and the search stops as
/// soon as the target is discovered, so the returned path has the minimum
/// hop count.  Among equally short paths the one whose lanes were declared
/// first wins.
pub struct BfsPathFinder;

impl PathFinder for BfsPathFinder {
    fn find_path(&self, graph: &NavGraph, from: VertexId, to: VertexId) -> Result<Path, GraphError> {
        bfs(graph, from, to)
    }
}

fn bfs(graph: &NavGraph, from: VertexId, to: VertexId) -> Result<Path, GraphError> {
    for v in [from, to] {
        if !graph.contains(v) {
            return Err(GraphError::VertexNotFound(v));
        }
    }
    if from == to {
        return Ok(Path { vertices: vec![from] });
    }

    // parent[v] = vertex that discovered v; INVALID for undiscovered.
    let mut parent = vec![VertexId::INVALID; graph.vertex_count()];
    let mut visited = vec![false; graph.vertex_count()];
    let mut queue = VecDeque::new();

    visited[from.index()] = true;
    queue.push_back(from);

    while let Some(node) = queue.pop_front() {
        for &next in graph.neighbors(node) {
            if visited[next.index()] {
                continue;
            }
            visited[next.index()] = true;
            parent[next.index()] = node;
            if next == to {
                return Ok(reconstruct(&parent, from, to));
            }
            queue.push_back(next);
        }
    }

    Err(GraphError::NoPath { from, to })
}

fn reconstruct(parent: &[VertexId], from: VertexId, to: VertexId) -> Path {
    let mut vertices = vec![to];
    let mut cur = to;
    while cur != from {
        cur = parent[cur.index()];
        vertices.push(cur);
    }
    vertices.reverse();
    Path { vertices }
}

// ── NavGraph convenience ──────────────────────────────────────────────────────

impl NavGraph {
    /// Hop-count shortest path via [`BfsPathFinder`].  `None` when either
    /// vertex is unknown or the two are disconnected.
    pub fn find_path(&self, from: VertexId, to: VertexId) -> Option<Path> {
        BfsPathFinder.find_path(self, from, to).ok()
    }
}
