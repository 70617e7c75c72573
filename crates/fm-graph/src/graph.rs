//! Navigation graph representation and builder.
//!
//! # Data layout
//!
//! Lanes are stored once, in declaration order, as the caller wrote them.
//! Traversal ignores the declared direction: each lane contributes both
//! endpoints to each other's neighbour list.  Neighbour lists are packed in
//! **Compressed Sparse Row (CSR)** form:
//!
//! ```text
//! adjacency[ adj_start[v] .. adj_start[v+1] ]
//! ```
//!
//! Within one vertex the neighbours keep lane-declaration order, which makes
//! BFS tie-breaking deterministic.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) answers the tolerance-window hit test used to
//! translate pointer coordinates into a vertex.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use fm_core::{Point, VertexId};

use crate::{GraphError, GraphResult};

// ── Vertex / Lane ─────────────────────────────────────────────────────────────

/// A navigable point.  Immutable once the graph is built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vertex {
    pub id: VertexId,
    pub pos: Point,
    pub name: String,
    pub is_charger: bool,
}

/// A corridor between two vertices, as declared in the graph definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Lane {
    pub start: VertexId,
    pub end: VertexId,
}

// ── R-tree vertex entry ───────────────────────────────────────────────────────

#[derive(Clone)]
struct VertexEntry {
    point: [f64; 2],
    id: VertexId,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── NavGraph ──────────────────────────────────────────────────────────────────

/// Undirected navigation graph in CSR format plus a spatial index.
///
/// Do not construct directly; use [`NavGraphBuilder`] or the
/// [`loader`](crate::loader).
pub struct NavGraph {
    vertices: Vec<Vertex>,
    lanes: Vec<Lane>,

    /// CSR row pointer, length = `vertex_count + 1`.
    adj_start: Vec<u32>,
    /// Packed neighbour lists, deduplicated per vertex.
    adjacency: Vec<VertexId>,

    spatial_idx: RTree<VertexEntry>,
}

impl NavGraph {
    /// Construct an empty graph with no vertices or lanes.
    pub fn empty() -> Self {
        NavGraphBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertices in insertion order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All lanes in declaration order.
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// Exact lookup.  Unknown ids return `None`.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        id.index() < self.vertices.len()
    }

    /// Position of `id`, or `None` if unknown.
    #[inline]
    pub fn position(&self, id: VertexId) -> Option<Point> {
        self.vertex(id).map(|v| v.pos)
    }

    /// Every vertex connected to `id` by a lane declared in either direction.
    ///
    /// Unknown ids have no neighbours.
    #[inline]
    pub fn neighbors(&self, id: VertexId) -> &[VertexId] {
        if !self.contains(id) {
            return &[];
        }
        let start = self.adj_start[id.index()] as usize;
        let end = self.adj_start[id.index() + 1] as usize;
        &self.adjacency[start..end]
    }

    /// `true` if a lane joins `a` and `b` in either declared direction.
    pub fn is_adjacent(&self, a: VertexId, b: VertexId) -> bool {
        self.neighbors(a).contains(&b)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// First vertex (in insertion order) whose position lies within
    /// `tolerance` of `(x, y)` on both axes independently.
    ///
    /// Overlapping windows resolve to the lowest `VertexId`.
    pub fn vertex_near(&self, x: f64, y: f64, tolerance: f64) -> Option<&Vertex> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return None;
        }
        let window = AABB::from_corners([x - tolerance, y - tolerance], [x + tolerance, y + tolerance]);
        self.spatial_idx
            .locate_in_envelope(&window)
            .map(|e| e.id)
            .min()
            .and_then(|id| self.vertex(id))
    }
}

// ── NavGraphBuilder ───────────────────────────────────────────────────────────

/// Construct a [`NavGraph`] incrementally, then call [`build`](Self::build).
///
/// Lanes are validated as they are added, so a built graph never holds a
/// lane with an unknown endpoint.
///
/// # Example
///
/// ```
/// use fm_core::Point;
/// use fm_graph::NavGraphBuilder;
///
/// let mut b = NavGraphBuilder::new();
/// let a = b.add_vertex(Point::new(0.0, 0.0), "A", false);
/// let c = b.add_vertex(Point::new(100.0, 0.0), "C", true);
/// b.add_lane(a, c).unwrap();
/// let graph = b.build();
/// assert_eq!(graph.vertex_count(), 2);
/// assert_eq!(graph.neighbors(c), &[a]);
/// ```
pub struct NavGraphBuilder {
    vertices: Vec<Vertex>,
    lanes: Vec<Lane>,
}

impl NavGraphBuilder {
    pub fn new() -> Self {
        Self { vertices: Vec::new(), lanes: Vec::new() }
    }

    pub fn with_capacity(vertices: usize, lanes: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            lanes: Vec::with_capacity(lanes),
        }
    }

    /// Add a vertex and return its `VertexId` (sequential from 0).
    pub fn add_vertex(&mut self, pos: Point, name: impl Into<String>, is_charger: bool) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex { id, pos, name: name.into(), is_charger });
        id
    }

    /// Declare a lane between two previously added vertices.
    ///
    /// # Errors
    ///
    /// [`GraphError::DanglingLane`] if either endpoint is unknown,
    /// [`GraphError::SelfLoop`] if both endpoints are the same vertex.
    pub fn add_lane(&mut self, start: VertexId, end: VertexId) -> GraphResult<()> {
        let index = self.lanes.len();
        for vertex in [start, end] {
            if vertex.index() >= self.vertices.len() {
                return Err(GraphError::DanglingLane { index, vertex });
            }
        }
        if start == end {
            return Err(GraphError::SelfLoop { index, vertex: start });
        }
        self.lanes.push(Lane { start, end });
        Ok(())
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn lane_count(&self) -> usize { self.lanes.len() }

    /// Consume the builder and produce a [`NavGraph`].
    pub fn build(self) -> NavGraph {
        let n = self.vertices.len();

        // Both directions of every lane, in declaration order.  The sort is
        // stable so each vertex keeps its neighbours in that order.
        let mut half_edges: Vec<(VertexId, VertexId)> = Vec::with_capacity(self.lanes.len() * 2);
        for lane in &self.lanes {
            half_edges.push((lane.start, lane.end));
            half_edges.push((lane.end, lane.start));
        }
        half_edges.sort_by_key(|&(from, _)| from.0);

        let mut adj_start = vec![0u32; n + 1];
        let mut adjacency: Vec<VertexId> = Vec::with_capacity(half_edges.len());
        let mut cursor = 0;
        for v in 0..n {
            adj_start[v] = adjacency.len() as u32;
            let row_begin = adjacency.len();
            while cursor < half_edges.len() && half_edges[cursor].0.index() == v {
                let to = half_edges[cursor].1;
                // Parallel lanes (A,B) and (B,A) collapse to one neighbour.
                if !adjacency[row_begin..].contains(&to) {
                    adjacency.push(to);
                }
                cursor += 1;
            }
        }
        adj_start[n] = adjacency.len() as u32;

        let entries: Vec<VertexEntry> = self
            .vertices
            .iter()
            .map(|v| VertexEntry { point: [v.pos.x, v.pos.y], id: v.id })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        NavGraph {
            vertices: self.vertices,
            lanes: self.lanes,
            adj_start,
            adjacency,
            spatial_idx,
        }
    }
}

impl Default for NavGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
