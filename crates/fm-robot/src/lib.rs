//! `fm-robot`: robot movement state machine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`state`]    | `RobotStatus`, `RobotSnapshot`                                  |
//! | [`robot`]    | `Robot`: task acceptance, stop signal, read access              |
//! | [`motion`]   | `MotionContext` and the per-task movement worker                |
//! | [`observer`] | `RobotObserver` callbacks, `NoopObserver`                       |
//! | [`error`]    | `RobotError`, `RobotResult<T>`                                  |
//!
//! # Movement model
//!
//! ```text
//! idle/charging ──assign──▶ moving ◀──granted── waiting
//!                             │  └──denied──────▶ │
//!                             └─path done─▶ idle/charging
//! any state ──stop──▶ idle
//! ```
//!
//! 1. [`Robot::assign`] records the target and path, sets `moving`, and
//!    spawns one worker thread for the task.
//! 2. For each leg the worker claims the lane from the
//!    [`TrafficArbitrator`][fm_traffic::TrafficArbitrator].  On denial it
//!    turns `waiting` and blocks until promoted, the corridor frees, the
//!    retry interval passes, or the robot is stopped.
//! 3. With the lane held the position is interpolated linearly between the
//!    two vertices over `distance / speed` seconds at `animation_hz`.  On
//!    arrival the lane is released and the robot's vertex advances.
//! 4. After the last leg the robot is `charging` on a charger vertex and
//!    `idle` anywhere else.

pub mod error;
pub mod motion;
pub mod observer;
pub mod robot;
pub mod state;


pub use error::{RobotError, RobotResult};
pub use motion::MotionContext;
pub use observer::{NoopObserver, RobotObserver};
pub use robot::Robot;
pub use state::{RobotSnapshot, RobotStatus};
