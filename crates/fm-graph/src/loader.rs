//! JSON graph-definition loader.
//!
//! # Format
//!
//! ```json
//! {
//!   "vertices": [[x, y, {"name": "dock", "is_charger": true}], ...],
//!   "lanes":    [[start_index, end_index], ...]
//! }
//! ```
//!
//! Vertex ids are the positions in the `vertices` array.  A vertex without a
//! `name` is called `V<index>`; a missing `is_charger` means `false`.  Every
//! lane is validated against the vertex list, so loading fails instead of
//! producing a graph with dangling lanes.

use std::fs::File;
use std::io::{BufReader, Read};

use serde::Deserialize;

use fm_core::{Point, VertexId};

use crate::{GraphError, GraphResult, NavGraph, NavGraphBuilder};

/// Raw deserialized graph definition.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDefinition {
    pub vertices: Vec<VertexRecord>,
    #[serde(default)]
    pub lanes: Vec<(u32, u32)>,
}

/// One `[x, y, attrs]` vertex descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct VertexRecord(pub f64, pub f64, pub VertexAttrs);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VertexAttrs {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_charger: bool,
}

impl GraphDefinition {
    /// Validate and build the immutable [`NavGraph`].
    pub fn into_graph(self) -> GraphResult<NavGraph> {
        if self.vertices.len() >= u32::MAX as usize {
            return Err(GraphError::TooManyVertices);
        }
        let mut b = NavGraphBuilder::with_capacity(self.vertices.len(), self.lanes.len());
        for (idx, VertexRecord(x, y, attrs)) in self.vertices.into_iter().enumerate() {
            let name = attrs.name.unwrap_or_else(|| format!("V{idx}"));
            b.add_vertex(Point::new(x, y), name, attrs.is_charger);
        }
        for (start, end) in self.lanes {
            b.add_lane(VertexId(start), VertexId(end))?;
        }
        let graph = b.build();
        tracing::debug!(
            vertices = graph.vertex_count(),
            lanes = graph.lane_count(),
            "navigation graph loaded"
        );
        Ok(graph)
    }
}

/// Parse and build a graph from a JSON string.
pub fn load_from_str(json: &str) -> GraphResult<NavGraph> {
    let def: GraphDefinition = serde_json::from_str(json)?;
    def.into_graph()
}

/// Parse and build a graph from any reader.
pub fn load_from_reader<R: Read>(reader: R) -> GraphResult<NavGraph> {
    let def: GraphDefinition = serde_json::from_reader(reader)?;
    def.into_graph()
}

/// Parse and build a graph from a JSON file.
pub fn load_from_path(path: impl AsRef<std::path::Path>) -> GraphResult<NavGraph> {
    let file = File::open(path)?;
    load_from_reader(BufReader::new(file))
}
