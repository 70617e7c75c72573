//! `fm-graph`: navigation graph, hit-testing, and path search.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`graph`]  | `NavGraph` (CSR adjacency + R-tree), `NavGraphBuilder`, `Vertex`, `Lane` |
//! | [`path`]   | `PathFinder` trait, `Path`, `BfsPathFinder`                  |
//! | [`loader`] | JSON graph definitions (`GraphDefinition`, `load_from_path`) |
//! | [`error`]  | `GraphError`, `GraphResult<T>`                               |
//!
//! The graph is built once and is read-only afterwards, so it is shared
//! between movement workers behind a plain `Arc<NavGraph>`.

pub mod error;
pub mod graph;
pub mod loader;
pub mod path;


pub use error::{GraphError, GraphResult};
pub use graph::{Lane, NavGraph, NavGraphBuilder, Vertex};
pub use loader::{GraphDefinition, load_from_path, load_from_reader, load_from_str};
pub use path::{BfsPathFinder, Path, PathFinder};
