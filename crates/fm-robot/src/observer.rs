//! Callbacks fired by movement workers.

use fm_core::{Point, RobotId};
use fm_graph::Vertex;
use fm_traffic::LaneKey;

use crate::RobotStatus;

/// Hooks invoked from a robot's movement worker thread.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Implementations are shared by every
/// worker, hence `Send + Sync` and `&self`.
pub trait RobotObserver: Send + Sync {
    /// A lane request was denied and the robot is now waiting for it.
    fn on_waiting(&self, _robot: RobotId, _lane: LaneKey) {}

    /// The robot holds `lane` and is about to enter it.
    fn on_lane_granted(&self, _robot: RobotId, _lane: LaneKey) {}

    /// One interpolation step.  Fired `animation_hz` times per second of
    /// travel.
    fn on_position(&self, _robot: RobotId, _position: Point) {}

    /// The robot reached `vertex` and released the lane behind it.
    fn on_arrival(&self, _robot: RobotId, _vertex: &Vertex) {}

    /// The last vertex of the path was reached.
    fn on_task_complete(&self, _robot: RobotId, _vertex: &Vertex, _status: RobotStatus) {}

    /// The worker exited after a stop signal.  `released` lists lanes that
    /// were given back on the robot's behalf.
    fn on_stopped(&self, _robot: RobotId, _released: &[LaneKey]) {}
}

/// A [`RobotObserver`] that does nothing.
pub struct NoopObserver;

impl RobotObserver for NoopObserver {}
