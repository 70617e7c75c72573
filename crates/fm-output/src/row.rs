//! Plain data row written by the CSV backend.

use fm_robot::{RobotSnapshot, RobotStatus};

/// One robot's state in one captured frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotRow {
    /// Zero-based index of the capture call that produced this row.
    pub frame:          u64,
    pub robot_id:       u32,
    pub x:              f64,
    pub y:              f64,
    pub status:         RobotStatus,
    pub current_vertex: u32,
    /// `None` while the robot has no task.
    pub target_vertex:  Option<u32>,
}

impl SnapshotRow {
    pub fn from_snapshot(frame: u64, snap: &RobotSnapshot) -> Self {
        Self {
            frame,
            robot_id:       snap.id.0,
            x:              snap.position.x,
            y:              snap.position.y,
            status:         snap.status,
            current_vertex: snap.current_vertex.0,
            target_vertex:  snap.target_vertex.map(|v| v.0),
        }
    }

    pub(crate) fn record(&self) -> [String; 7] {
        [
            self.frame.to_string(),
            self.robot_id.to_string(),
            format!("{:.3}", self.x),
            format!("{:.3}", self.y),
            self.status.as_str().to_owned(),
            self.current_vertex.to_string(),
            self.target_vertex.map(|v| v.to_string()).unwrap_or_default(),
        ]
    }
}
