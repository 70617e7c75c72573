//! Fleet events and the sinks that receive them.
//!
//! Every state change worth telling a human about becomes a [`FleetEvent`].
//! Its `Display` impl is the log line; where that line ends up is the
//! business of the registered [`EventSink`]s.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use fm_core::RobotId;
use fm_graph::Vertex;
use fm_robot::{RobotObserver, RobotStatus};
use fm_traffic::LaneKey;

use crate::TaskRejection;

// ── Events ────────────────────────────────────────────────────────────────────

/// Something that happened in the fleet.  Vertex names are carried as
/// strings so events outlive the graph borrow they were built from.
#[derive(Clone, Debug, PartialEq)]
pub enum FleetEvent {
    Spawned { robot: RobotId, vertex: String },
    TaskAssigned { robot: RobotId, from: String, to: String },
    Busy { robot: RobotId },
    NoPath { robot: RobotId, from: String, to: String },
    Rejected { robot: RobotId, reason: TaskRejection },
    Waiting { robot: RobotId, lane: LaneKey },
    Moved { robot: RobotId, vertex: String },
    TaskCompleted { robot: RobotId, vertex: String, status: RobotStatus },
    Stopped { robot: RobotId, released: usize },
    AllStopped,
    Selected { robot: RobotId },
}

impl FleetEvent {
    /// The robot the event is about, if any.
    pub fn robot(&self) -> Option<RobotId> {
        match *self {
            FleetEvent::Spawned { robot, .. }
            | FleetEvent::TaskAssigned { robot, .. }
            | FleetEvent::Busy { robot }
            | FleetEvent::NoPath { robot, .. }
            | FleetEvent::Rejected { robot, .. }
            | FleetEvent::Waiting { robot, .. }
            | FleetEvent::Moved { robot, .. }
            | FleetEvent::TaskCompleted { robot, .. }
            | FleetEvent::Stopped { robot, .. }
            | FleetEvent::Selected { robot } => Some(robot),
            FleetEvent::AllStopped => None,
        }
    }
}

impl fmt::Display for FleetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetEvent::Spawned { robot, vertex } => {
                write!(f, "Robot {} spawned at vertex {vertex}", robot.0)
            }
            FleetEvent::TaskAssigned { robot, from, to } => {
                write!(f, "Assigning task to Robot {}: Move from {from} to {to}", robot.0)
            }
            FleetEvent::Busy { robot } => {
                write!(f, "Robot {} is already moving or waiting. Cannot assign new task.", robot.0)
            }
            FleetEvent::NoPath { from, to, .. } => write!(f, "No path found from {from} to {to}"),
            FleetEvent::Rejected { robot, reason } => {
                write!(f, "Task for Robot {} rejected: {reason}", robot.0)
            }
            FleetEvent::Waiting { robot, lane } => {
                write!(f, "Robot {} waiting for lane {lane}", robot.0)
            }
            FleetEvent::Moved { robot, vertex } => write!(f, "Robot {} moved to {vertex}", robot.0),
            FleetEvent::TaskCompleted { robot, vertex, status } => {
                write!(f, "Robot {} completed task at {vertex}", robot.0)?;
                if *status == RobotStatus::Charging {
                    f.write_str(" and started charging")?;
                }
                Ok(())
            }
            FleetEvent::Stopped { robot, released: 0 } => write!(f, "Robot {} stopped", robot.0),
            FleetEvent::Stopped { robot, released } => {
                write!(f, "Robot {} stopped, released {released} lane(s)", robot.0)
            }
            FleetEvent::AllStopped => f.write_str("All robots stopped"),
            FleetEvent::Selected { robot } => write!(f, "Selected Robot {}", robot.0),
        }
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Receiver of fleet events.
///
/// Called from the fleet manager's thread and from every movement worker,
/// so implementations take `&self` and handle their own synchronisation.
///
/// # Example: stdout printer
///
/// ```rust,ignore
/// struct Printer;
///
/// impl EventSink for Printer {
///     fn record(&self, event: &FleetEvent) {
///         println!("{event}");
///     }
/// }
/// ```
pub trait EventSink: Send + Sync {
    fn record(&self, event: &FleetEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn record(&self, event: &FleetEvent) {
        (**self).record(event);
    }
}

/// Forwards each event line to `tracing` at `INFO`.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &FleetEvent) {
        tracing::info!(target: "fleet", robot = event.robot().map(|r| r.0), "{event}");
    }
}

/// Keeps every event in memory.  Handy for tests and for replaying a session
/// in a UI log panel.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<FleetEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FleetEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The events rendered as log lines.
    pub fn lines(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &FleetEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}

// ── Relay ─────────────────────────────────────────────────────────────────────

/// Fans events out to every sink and turns movement-worker callbacks into
/// events.
pub(crate) struct EventRelay {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventRelay {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn emit(&self, event: FleetEvent) {
        for sink in &self.sinks {
            sink.record(&event);
        }
    }
}

impl RobotObserver for EventRelay {
    fn on_waiting(&self, robot: RobotId, lane: LaneKey) {
        self.emit(FleetEvent::Waiting { robot, lane });
    }

    fn on_arrival(&self, robot: RobotId, vertex: &Vertex) {
        self.emit(FleetEvent::Moved { robot, vertex: vertex.name.clone() });
    }

    fn on_task_complete(&self, robot: RobotId, vertex: &Vertex, status: RobotStatus) {
        self.emit(FleetEvent::TaskCompleted { robot, vertex: vertex.name.clone(), status });
    }

    fn on_stopped(&self, robot: RobotId, released: &[LaneKey]) {
        self.emit(FleetEvent::Stopped { robot, released: released.len() });
    }
}
