//! `fm-core`: foundational types for the fleet coordination engine.
//!
//! This crate is a dependency of every other `fm-*` crate.  It has no `fm-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RobotId`, `VertexId`                                 |
//! | [`geo`]         | `Point`, Euclidean distance, lerp, tolerance window  |
//! | [`config`]      | `FleetConfig`, default colour palette                 |
//! | [`rng`]         | `RetryRng` (per-robot backoff jitter)                 |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DEFAULT_PALETTE, FleetConfig};
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::{RobotId, VertexId};
pub use rng::RetryRng;
