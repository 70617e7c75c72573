//! `fm-fleet`: fleet manager for the fleet coordination engine.
//!
//! # Task assignment
//!
//! ```text
//! assign_task(robot, target):
//!   ① Robot    : unknown robot                → Err(UnknownRobot)
//!   ② Busy     : robot moving or waiting      → Err(AgentBusy), nothing changes
//!   ③ Route    : unknown target → Err(UnknownVertex); no path → Err(NoPathFound)
//!   ④ Hand-off : Robot::assign spawns the movement worker and returns Ok(())
//! ```
//!
//! Everything after the hand-off happens on the robot's own thread; the
//! manager only reads robot state from then on.  Each step above, and each
//! arrival, completion, and stop reported by the workers, is emitted as a
//! [`FleetEvent`] to every registered [`EventSink`].
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fm_core::VertexId;
//! use fm_fleet::{FleetManagerBuilder, TracingSink};
//!
//! let graph = fm_graph::load_from_path("nav_graph.json")?;
//! let mut fleet = FleetManagerBuilder::new(graph)
//!     .sink(Arc::new(TracingSink))
//!     .build()?;
//! let robot = fleet.spawn(VertexId(0)).expect("vertex exists");
//! fleet.assign_task(robot.id(), VertexId(4))?;
//! fleet.wait_all_idle(std::time::Duration::from_secs(10));
//! ```

pub mod builder;
pub mod error;
pub mod manager;
pub mod observer;

#[cfg(test)]
mod tests;

pub use builder::FleetManagerBuilder;
pub use error::{FleetError, FleetResult, TaskRejection};
pub use manager::FleetManager;
pub use observer::{EventSink, FleetEvent, MemorySink, TracingSink};
