//! The movement worker: walks one path, lane by lane, on its own thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use fm_core::{FleetConfig, Point, RetryRng, RobotId, VertexId};
use fm_graph::{NavGraph, Path};
use fm_traffic::{LaneKey, TrafficArbitrator};

use crate::state::RobotState;
use crate::{RobotObserver, RobotStatus};

/// Longest uninterrupted sleep inside a traversal frame.
const PAUSE_SLICE: Duration = Duration::from_millis(20);

// ── Shared handles ────────────────────────────────────────────────────────────

/// Everything a worker needs from the outside world.  Cloned into each
/// robot; all members are shared.
#[derive(Clone)]
pub struct MotionContext {
    pub graph:    Arc<NavGraph>,
    pub traffic:  Arc<TrafficArbitrator>,
    pub config:   Arc<FleetConfig>,
    pub observer: Arc<dyn RobotObserver>,
}

/// State shared by a robot handle and its worker.
pub(crate) struct Shared {
    pub id:      RobotId,
    pub state:   Mutex<RobotState>,
    /// Notified when a worker finishes its cleanup.
    pub settled: Condvar,
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, RobotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` unless the task was cancelled.  The stop path sets the
    /// cancel flag under the same lock, so a stopped robot never has its
    /// status overwritten by a late worker update.
    fn update_live<F>(&self, cancel: &AtomicBool, f: F) -> bool
    where
        F: FnOnce(&mut RobotState),
    {
        let mut state = self.lock();
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        f(&mut state);
        true
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

enum Leg {
    Arrived,
    Cancelled,
}

pub(crate) struct Worker {
    pub shared: Arc<Shared>,
    pub ctx:    MotionContext,
    pub path:   Path,
    pub cancel: Arc<AtomicBool>,
}

impl Worker {
    #[inline]
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn run(self) {
        let id = self.shared.id;
        let config = Arc::clone(&self.ctx.config);
        let mut rng = RetryRng::new(config.seed, id);
        let mut cursor = 0;
        let mut waiting = false;

        while cursor + 1 < self.path.vertices.len() && !self.cancelled() {
            let from = self.path.vertices[cursor];
            let to = self.path.vertices[cursor + 1];
            let lane = LaneKey::new(from, to);

            if !self.ctx.traffic.claim(id, lane) {
                if !waiting {
                    waiting = true;
                    if self.shared.update_live(&self.cancel, |s| s.status = RobotStatus::Waiting) {
                        tracing::debug!(robot = id.0, %lane, "waiting for lane");
                        self.ctx.observer.on_waiting(id, lane);
                    }
                }
                let backoff = rng.backoff(config.lane_retry, config.retry_jitter);
                self.ctx.traffic.wait_for_grant(id, lane, backoff, || self.cancelled());
                continue;
            }
            waiting = false;

            let live = self.shared.update_live(&self.cancel, |s| {
                s.status = RobotStatus::Moving;
                s.current_lane = Some(lane);
            });
            if !live {
                break;
            }
            self.ctx.observer.on_lane_granted(id, lane);

            let (Some(a), Some(b)) = (self.ctx.graph.position(from), self.ctx.graph.position(to)) else {
                tracing::warn!(robot = id.0, %lane, "path references an unknown vertex, abandoning task");
                self.ctx.traffic.release(id, lane);
                self.shared.update_live(&self.cancel, |s| s.current_lane = None);
                break;
            };

            match self.traverse(a, b) {
                Leg::Cancelled => break,
                Leg::Arrived => {}
            }

            self.ctx.traffic.release(id, lane);
            let live = self.shared.update_live(&self.cancel, |s| {
                s.current_vertex = to;
                s.position = b;
                s.current_lane = None;
                s.remaining = self.path.vertices[cursor + 2..].to_vec();
            });
            cursor += 1;
            if let Some(vertex) = self.ctx.graph.vertex(to) {
                tracing::info!(robot = id.0, vertex = %vertex.name, "robot moved");
                self.ctx.observer.on_arrival(id, vertex);
            }
            if !live {
                break;
            }
        }

        if self.cancelled() {
            self.finish_stopped();
        } else {
            self.finish_task();
        }
    }

    /// Interpolate from `a` to `b` at the configured speed and frame rate.
    fn traverse(&self, a: Point, b: Point) -> Leg {
        let config = &self.ctx.config;
        let travel = config.travel_time(a.distance(b));
        let steps = config.animation_steps(travel);
        let frame = travel / steps;

        for step in 1..=steps {
            let pos = a.lerp(b, step as f64 / steps as f64);
            if !self.shared.update_live(&self.cancel, |s| s.position = pos) {
                return Leg::Cancelled;
            }
            self.ctx.observer.on_position(self.shared.id, pos);
            if !self.pause(frame) {
                return Leg::Cancelled;
            }
        }
        if self.cancelled() { Leg::Cancelled } else { Leg::Arrived }
    }

    /// Sleep for `frame` in short slices.  Returns `false` as soon as the
    /// task is cancelled.
    fn pause(&self, frame: Duration) -> bool {
        let mut left = frame;
        while !left.is_zero() {
            if self.cancelled() {
                return false;
            }
            let slice = left.min(PAUSE_SLICE);
            thread::sleep(slice);
            left -= slice;
        }
        true
    }

    fn finish_task(&self) {
        let id = self.shared.id;
        let mut state = self.shared.lock();
        let at: VertexId = state.current_vertex;
        let vertex = self.ctx.graph.vertex(at);
        let status = match vertex {
            Some(v) if v.is_charger => RobotStatus::Charging,
            _ => RobotStatus::Idle,
        };
        state.status = status;
        state.target_vertex = None;
        state.remaining.clear();
        state.current_lane = None;
        state.cancel = None;
        drop(state);

        if let Some(v) = vertex {
            tracing::info!(robot = id.0, vertex = %v.name, %status, "task complete");
            self.ctx.observer.on_task_complete(id, v, status);
        }
        self.settle();
    }

    fn finish_stopped(&self) {
        let id = self.shared.id;
        let released = if self.ctx.config.release_on_stop {
            self.ctx.traffic.withdraw(id)
        } else {
            Vec::new()
        };

        let mut state = self.shared.lock();
        state.status = RobotStatus::Idle;
        state.target_vertex = None;
        state.remaining.clear();
        if self.ctx.config.release_on_stop {
            state.current_lane = None;
        }
        state.cancel = None;
        drop(state);

        tracing::info!(robot = id.0, released = released.len(), "robot stopped");
        self.ctx.observer.on_stopped(id, &released);
        self.settle();
    }

    /// Last act of every worker: observers have seen the outcome, so
    /// waiters may now proceed.
    fn settle(&self) {
        self.shared.lock().running = false;
        self.shared.settled.notify_all();
    }
}
