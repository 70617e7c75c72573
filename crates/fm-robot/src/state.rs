//! Per-robot movement state.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use fm_core::{Point, RobotId, VertexId};
use fm_traffic::LaneKey;

/// Where a robot is in its task lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RobotStatus {
    /// No active path.
    Idle,
    /// Holding a lane and travelling along it.
    Moving,
    /// Denied a lane; retrying.
    Waiting,
    /// Finished a task on a charger vertex.
    Charging,
}

impl RobotStatus {
    /// `true` while a task is in progress.  Busy robots reject new tasks.
    #[inline]
    pub fn is_busy(self) -> bool {
        matches!(self, RobotStatus::Moving | RobotStatus::Waiting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RobotStatus::Idle     => "idle",
            RobotStatus::Moving   => "moving",
            RobotStatus::Waiting  => "waiting",
            RobotStatus::Charging => "charging",
        }
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state shared between a [`Robot`](crate::Robot) handle and its
/// movement worker.  Always accessed under the robot's mutex.
#[derive(Debug)]
pub(crate) struct RobotState {
    pub status: RobotStatus,
    /// Last vertex the robot confirmed arriving at.
    pub current_vertex: VertexId,
    /// Present only while a task is active.
    pub target_vertex: Option<VertexId>,
    /// Vertices still to visit, excluding `current_vertex`.
    pub remaining: Vec<VertexId>,
    /// Lane reserved for the leg in progress.
    pub current_lane: Option<LaneKey>,
    /// Interpolated position.
    pub position: Point,
    /// Cancel token of the task in progress.
    pub cancel: Option<Arc<AtomicBool>>,
    /// `true` from task acceptance until the worker has finished cleanup.
    pub running: bool,
}

impl RobotState {
    pub fn parked(vertex: VertexId, position: Point) -> Self {
        Self {
            status:         RobotStatus::Idle,
            current_vertex: vertex,
            target_vertex:  None,
            remaining:      Vec::new(),
            current_lane:   None,
            position,
            cancel:         None,
            running:        false,
        }
    }
}

/// Read-only copy of a robot for presentation layers and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotSnapshot {
    pub id:             RobotId,
    pub color:          String,
    pub position:       Point,
    pub status:         RobotStatus,
    pub current_vertex: VertexId,
    pub target_vertex:  Option<VertexId>,
    pub current_lane:   Option<LaneKey>,
    pub remaining:      Vec<VertexId>,
}
