//! The `Robot` handle: task acceptance, stop signal, and read access.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use fm_core::{Point, RobotId, VertexId};
use fm_graph::{Path, Vertex};
use fm_traffic::LaneKey;

use crate::motion::{MotionContext, Shared, Worker};
use crate::state::RobotState;
use crate::{RobotError, RobotResult, RobotSnapshot, RobotStatus};

/// One robot and, while a task runs, its movement worker thread.
///
/// The handle is `Sync`: the fleet manager, presentation threads, and the
/// worker itself all read the state concurrently.  Only [`assign`] starts a
/// worker and only [`stop`] cancels one.
///
/// [`assign`]: Robot::assign
/// [`stop`]: Robot::stop
pub struct Robot {
    id:     RobotId,
    color:  String,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    ctx:    MotionContext,
}

impl Robot {
    /// Create an idle robot parked on `start`.
    pub fn new(id: RobotId, color: impl Into<String>, start: &Vertex, ctx: MotionContext) -> Self {
        Self {
            id,
            color: color.into(),
            shared: Arc::new(Shared {
                id,
                state:   Mutex::new(RobotState::parked(start.id, start.pos)),
                settled: Condvar::new(),
            }),
            worker: Mutex::new(None),
            ctx,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> RobotId {
        self.id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn status(&self) -> RobotStatus {
        self.shared.lock().status
    }

    pub fn position(&self) -> Point {
        self.shared.lock().position
    }

    pub fn current_vertex(&self) -> VertexId {
        self.shared.lock().current_vertex
    }

    pub fn target_vertex(&self) -> Option<VertexId> {
        self.shared.lock().target_vertex
    }

    pub fn current_lane(&self) -> Option<LaneKey> {
        self.shared.lock().current_lane
    }

    /// Vertices still to visit, in order.
    pub fn remaining_path(&self) -> Vec<VertexId> {
        self.shared.lock().remaining.clone()
    }

    /// `true` from task acceptance until the worker has fully exited.
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Consistent copy of everything a renderer needs.
    pub fn snapshot(&self) -> RobotSnapshot {
        let s = self.shared.lock();
        RobotSnapshot {
            id:             self.id,
            color:          self.color.clone(),
            position:       s.position,
            status:         s.status,
            current_vertex: s.current_vertex,
            target_vertex:  s.target_vertex,
            current_lane:   s.current_lane,
            remaining:      s.remaining.clone(),
        }
    }

    // ── Task control ──────────────────────────────────────────────────────

    /// Accept a task and start the movement worker.
    ///
    /// `path` must begin at the robot's current vertex.  The call returns as
    /// soon as the worker is running.
    ///
    /// # Errors
    ///
    /// [`RobotError::Busy`] while the robot is moving or waiting; the
    /// current task is left untouched.
    pub fn assign(&self, target: VertexId, path: Path) -> RobotResult<()> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        {
            let state = self.shared.lock();
            if state.status.is_busy() {
                return Err(RobotError::Busy(self.id, state.status));
            }
            let start = path.start().ok_or(RobotError::EmptyPath)?;
            if start != state.current_vertex {
                return Err(RobotError::PathMismatch { expected: state.current_vertex, got: start });
            }
        }

        // A previous worker is either done or was told to stop; it exits
        // within one animation frame.
        if let Some(previous) = slot.take() {
            if previous.join().is_err() {
                tracing::warn!(robot = self.id.0, "previous movement worker panicked");
            }
        }

        let cancel = Arc::new(AtomicBool::new(false));
        {
            let mut state = self.shared.lock();
            state.status = RobotStatus::Moving;
            state.target_vertex = Some(target);
            state.remaining = path.vertices[1..].to_vec();
            state.current_lane = None;
            state.cancel = Some(Arc::clone(&cancel));
            state.running = true;
        }

        let worker = Worker {
            shared: Arc::clone(&self.shared),
            ctx: self.ctx.clone(),
            path,
            cancel,
        };
        let spawned = thread::Builder::new()
            .name(format!("robot-{}", self.id.0))
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                Ok(())
            }
            Err(e) => {
                let mut state = self.shared.lock();
                state.status = RobotStatus::Idle;
                state.target_vertex = None;
                state.remaining.clear();
                state.cancel = None;
                state.running = false;
                Err(RobotError::Spawn(e))
            }
        }
    }

    /// Force the robot to `Idle`, abandoning the rest of its path.
    ///
    /// The worker notices within one animation frame or lane-retry wake-up.
    /// Waits up to `config.stop_join_timeout` for it to exit and returns
    /// whether it did.
    pub fn stop(&self) -> bool {
        {
            let mut state = self.shared.lock();
            if let Some(cancel) = &state.cancel {
                cancel.store(true, Ordering::SeqCst);
            }
            state.status = RobotStatus::Idle;
        }
        self.ctx.traffic.notify_all();

        let settled = self.wait_idle(self.ctx.config.stop_join_timeout);
        if settled {
            let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(handle) = slot.take() {
                if handle.join().is_err() {
                    tracing::warn!(robot = self.id.0, "movement worker panicked");
                }
            }
        }
        settled
    }

    /// Block until no worker is running or `timeout` elapses.  Returns
    /// `true` if the robot settled.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .settled
            .wait_timeout_while(state, timeout, |s| s.running)
            .unwrap_or_else(PoisonError::into_inner);
        !state.running
    }
}

impl Drop for Robot {
    fn drop(&mut self) {
        // Detach the worker but make sure it winds down.
        if let Some(cancel) = &self.shared.lock().cancel {
            cancel.store(true, Ordering::SeqCst);
        }
        self.ctx.traffic.notify_all();
    }
}
