use fm_core::{CoreError, RobotId};
use thiserror::Error;

/// Why a task assignment was refused.  None of these are faults: the
/// robot's state is left exactly as it was.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum TaskRejection {
    #[error("Robot is already moving or waiting")]
    AgentBusy,

    #[error("No path found")]
    NoPathFound,

    #[error("Unknown robot")]
    UnknownRobot,

    #[error("Unknown vertex")]
    UnknownVertex,

    #[error("Could not start movement worker")]
    WorkerUnavailable,
}

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("fleet configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("no robot with id {0}")]
    UnknownRobot(RobotId),
}

pub type FleetResult<T> = Result<T, FleetError>;
