use fm_core::{RobotId, VertexId};
use thiserror::Error;

use crate::RobotStatus;

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("robot {0:?} is {1} and cannot take a new task")]
    Busy(RobotId, RobotStatus),

    #[error("path is empty")]
    EmptyPath,

    #[error("path starts at {got:?} but robot is at {expected:?}")]
    PathMismatch { expected: VertexId, got: VertexId },

    #[error("could not start movement worker: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type RobotResult<T> = Result<T, RobotError>;
