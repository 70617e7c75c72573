//! The `FleetManager`: robot registry and the task-assignment entry point.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fm_core::{FleetConfig, RobotId, VertexId};
use fm_graph::{NavGraph, PathFinder};
use fm_robot::{MotionContext, Robot, RobotError, RobotSnapshot};
use fm_traffic::TrafficArbitrator;

use crate::observer::EventRelay;
use crate::{FleetError, FleetEvent, FleetResult, TaskRejection};

/// Owns every robot and hands out tasks.
///
/// Spawning and selection take `&mut self`; everything a presentation layer
/// or a task dispatcher needs while robots are moving takes `&self`.
///
/// Create via [`FleetManagerBuilder`][crate::FleetManagerBuilder].
pub struct FleetManager {
    pub(crate) ctx:      MotionContext,
    pub(crate) relay:    Arc<EventRelay>,
    pub(crate) finder:   Box<dyn PathFinder>,
    pub(crate) robots:   BTreeMap<RobotId, Arc<Robot>>,
    pub(crate) next_id:  u32,
    pub(crate) selected: Option<RobotId>,
}

impl FleetManager {
    // ── Spawning ──────────────────────────────────────────────────────────

    /// Create an idle robot on `vertex`.
    ///
    /// Ids start at 1 and colours cycle through the configured palette.
    /// Returns `None` if the vertex does not exist.
    pub fn spawn(&mut self, vertex: VertexId) -> Option<Arc<Robot>> {
        let start = self.ctx.graph.vertex(vertex)?;
        let id = RobotId(self.next_id);
        self.next_id += 1;

        let color = self.ctx.config.color_for(self.robots.len()).to_owned();
        let robot = Arc::new(Robot::new(id, color, start, self.ctx.clone()));
        self.robots.insert(id, Arc::clone(&robot));

        tracing::debug!(robot = id.0, vertex = vertex.0, color = robot.color(), "spawned robot");
        self.relay.emit(FleetEvent::Spawned { robot: id, vertex: start.name.clone() });
        Some(robot)
    }

    /// Spawn on the vertex under `(x, y)`, using the configured vertex
    /// tolerance.
    pub fn spawn_near(&mut self, x: f64, y: f64) -> Option<Arc<Robot>> {
        let vertex = self.ctx.graph.vertex_near(x, y, self.ctx.config.vertex_tolerance)?.id;
        self.spawn(vertex)
    }

    // ── Tasks ─────────────────────────────────────────────────────────────

    /// Send `robot` to `target`.
    ///
    /// Returns as soon as the movement worker is running.  On rejection the
    /// robot is untouched and the reason is also emitted as an event.
    pub fn assign_task(&self, robot: RobotId, target: VertexId) -> Result<(), TaskRejection> {
        let Some(bot) = self.robots.get(&robot) else {
            return Err(self.reject(robot, TaskRejection::UnknownRobot));
        };
        if bot.status().is_busy() {
            tracing::debug!(robot = robot.0, status = %bot.status(), "task rejected, robot busy");
            self.relay.emit(FleetEvent::Busy { robot });
            return Err(TaskRejection::AgentBusy);
        }
        let graph = &self.ctx.graph;
        let Some(to) = graph.vertex(target) else {
            return Err(self.reject(robot, TaskRejection::UnknownVertex));
        };

        let start = bot.current_vertex();
        let from_name = graph.vertex(start).map_or_else(|| start.to_string(), |v| v.name.clone());
        let path = match self.finder.find_path(graph, start, target) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(robot = robot.0, error = %e, "task rejected");
                self.relay.emit(FleetEvent::NoPath { robot, from: from_name, to: to.name.clone() });
                return Err(TaskRejection::NoPathFound);
            }
        };

        tracing::info!(robot = robot.0, from = %from_name, to = %to.name, hops = path.hops(), "assigning task");
        // Announced first so the worker's own events always follow it.
        self.relay.emit(FleetEvent::TaskAssigned { robot, from: from_name, to: to.name.clone() });

        match bot.assign(target, path) {
            Ok(()) => Ok(()),
            // Another caller got in between the status check and the hand-off.
            Err(RobotError::Busy(..) | RobotError::PathMismatch { .. }) => {
                Err(self.reject(robot, TaskRejection::AgentBusy))
            }
            Err(RobotError::EmptyPath) => Err(self.reject(robot, TaskRejection::NoPathFound)),
            Err(RobotError::Spawn(e)) => {
                tracing::error!(robot = robot.0, error = %e, "could not start movement worker");
                Err(self.reject(robot, TaskRejection::WorkerUnavailable))
            }
        }
    }

    fn reject(&self, robot: RobotId, reason: TaskRejection) -> TaskRejection {
        tracing::debug!(robot = robot.0, %reason, "task rejected");
        self.relay.emit(FleetEvent::Rejected { robot, reason });
        reason
    }

    /// Stop every robot.  Returns `true` if all workers exited within the
    /// configured join timeout.
    pub fn stop_all(&self) -> bool {
        let mut settled = true;
        for robot in self.robots.values() {
            settled &= robot.stop();
        }
        tracing::info!(robots = self.robots.len(), settled, "stopped all robots");
        self.relay.emit(FleetEvent::AllStopped);
        settled
    }

    /// Block until every robot has finished its task or `timeout` elapses.
    pub fn wait_all_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.robots
            .values()
            .all(|r| r.wait_idle(deadline.saturating_duration_since(Instant::now())))
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Mark `robot` as the selected one, replacing any previous selection.
    ///
    /// # Errors
    ///
    /// [`FleetError::UnknownRobot`]; the selection is left unchanged.
    pub fn select(&mut self, robot: RobotId) -> FleetResult<()> {
        if !self.robots.contains_key(&robot) {
            return Err(FleetError::UnknownRobot(robot));
        }
        self.selected = Some(robot);
        self.relay.emit(FleetEvent::Selected { robot });
        Ok(())
    }

    pub fn selected(&self) -> Option<&Arc<Robot>> {
        self.selected.and_then(|id| self.robots.get(&id))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn robot(&self, id: RobotId) -> Option<&Arc<Robot>> {
        self.robots.get(&id)
    }

    /// All robots in ascending id order.
    pub fn robots(&self) -> impl Iterator<Item = &Arc<Robot>> + '_ {
        self.robots.values()
    }

    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    /// First robot, by ascending id, whose current position lies within
    /// `tolerance` of `(x, y)` on both axes.
    pub fn robot_at(&self, x: f64, y: f64, tolerance: f64) -> Option<&Arc<Robot>> {
        self.robots.values().find(|r| r.position().within(x, y, tolerance))
    }

    /// [`robot_at`](Self::robot_at) with the configured robot tolerance.
    pub fn robot_under(&self, x: f64, y: f64) -> Option<&Arc<Robot>> {
        self.robot_at(x, y, self.ctx.config.robot_tolerance)
    }

    pub fn snapshots(&self) -> Vec<RobotSnapshot> {
        self.robots.values().map(|r| r.snapshot()).collect()
    }

    pub fn graph(&self) -> &NavGraph {
        &self.ctx.graph
    }

    pub fn traffic(&self) -> &TrafficArbitrator {
        &self.ctx.traffic
    }

    pub fn config(&self) -> &FleetConfig {
        &self.ctx.config
    }
}

impl Drop for FleetManager {
    fn drop(&mut self) {
        for robot in self.robots.values() {
            if robot.status().is_busy() {
                robot.stop();
            }
        }
    }
}
