//! Graph-subsystem error type.

use thiserror::Error;

use fm_core::VertexId;

/// Errors produced by `fm-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no path from {from} to {to}")]
    NoPath { from: VertexId, to: VertexId },

    #[error("vertex {0} not found in graph")]
    VertexNotFound(VertexId),

    #[error("lane {index} references unknown vertex {vertex}")]
    DanglingLane { index: usize, vertex: VertexId },

    #[error("lane {index} connects {vertex} to itself")]
    SelfLoop { index: usize, vertex: VertexId },

    #[error("graph definition has more vertices than a VertexId can address")]
    TooManyVertices,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("graph definition parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
