//! Integration tests for fm-fleet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fm_core::{FleetConfig, Point, RobotId, VertexId};
use fm_graph::{NavGraph, NavGraphBuilder};
use fm_robot::RobotStatus;
use fm_traffic::LaneKey;

use crate::{FleetEvent, FleetManager, FleetManagerBuilder, MemorySink};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// V0(0,0) ↔ V1(100,0) ↔ V2(200,0), plus an unconnected V3(0,300).
/// V2 is a charger when `charger_end`.
fn line_graph(charger_end: bool) -> NavGraph {
    let mut b = NavGraphBuilder::new();
    let v0 = b.add_vertex(Point::new(0.0, 0.0), "V0", false);
    let v1 = b.add_vertex(Point::new(100.0, 0.0), "V1", false);
    let v2 = b.add_vertex(Point::new(200.0, 0.0), "V2", charger_end);
    b.add_vertex(Point::new(0.0, 300.0), "V3", false);
    b.add_lane(v0, v1).unwrap();
    b.add_lane(v1, v2).unwrap();
    b.build()
}

/// 100 units take 50 ms.
fn fast_config() -> FleetConfig {
    FleetConfig::default()
        .with_speed(2_000.0)
        .with_animation_hz(100)
        .with_lane_retry(Duration::from_millis(20))
}

/// 100 units take 10 s.
fn slow_config() -> FleetConfig {
    FleetConfig::default().with_speed(10.0).with_lane_retry(Duration::from_millis(20))
}

fn fleet_with(graph: NavGraph, config: FleetConfig) -> (FleetManager, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let fleet = FleetManagerBuilder::new(graph)
        .config(config)
        .sink(sink.clone())
        .build()
        .unwrap();
    (fleet, sink)
}

fn lane(a: u32, b: u32) -> LaneKey {
    LaneKey::new(VertexId(a), VertexId(b))
}

fn eventually<F: Fn() -> bool>(timeout: Duration, cond: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// ── FleetManagerBuilder ───────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::FleetError;

    #[test]
    fn builds_empty_fleet() {
        let fleet = FleetManagerBuilder::new(line_graph(false)).build().unwrap();
        assert_eq!(fleet.robot_count(), 0);
        assert_eq!(fleet.graph().vertex_count(), 4);
        assert!(fleet.selected().is_none());
        assert_eq!(fleet.config(), &FleetConfig::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = FleetManagerBuilder::new(line_graph(false))
            .config(FleetConfig::default().with_speed(0.0))
            .build();
        assert!(matches!(result, Err(FleetError::Config(_))));
    }

    #[test]
    fn shares_supplied_arbitrator() {
        let traffic = Arc::new(fm_traffic::TrafficArbitrator::new());
        assert!(traffic.request(RobotId(42), lane(0, 1)));
        let fleet = FleetManagerBuilder::new(line_graph(false))
            .traffic(Arc::clone(&traffic))
            .build()
            .unwrap();
        assert_eq!(fleet.traffic().holder(lane(1, 0)), Some(RobotId(42)));
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod spawning {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        let a = fleet.spawn(VertexId(0)).unwrap();
        let b = fleet.spawn(VertexId(2)).unwrap();
        assert_eq!(a.id(), RobotId(1));
        assert_eq!(b.id(), RobotId(2));
        assert_eq!(b.status(), RobotStatus::Idle);
        assert_eq!(b.position(), Point::new(200.0, 0.0));
    }

    #[test]
    fn colours_cycle_through_palette() {
        let config = fast_config().with_palette(["#111111", "#222222"]);
        let (mut fleet, _) = fleet_with(line_graph(false), config);
        let colours: Vec<String> = (0..3)
            .map(|_| fleet.spawn(VertexId(0)).unwrap().color().to_owned())
            .collect();
        assert_eq!(colours, ["#111111", "#222222", "#111111"]);
    }

    #[test]
    fn unknown_vertex_spawns_nothing() {
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config());
        assert!(fleet.spawn(VertexId(99)).is_none());
        assert_eq!(fleet.robot_count(), 0);
        assert!(sink.is_empty());
        // The failed attempt does not consume an id.
        assert_eq!(fleet.spawn(VertexId(0)).unwrap().id(), RobotId(1));
    }

    #[test]
    fn spawn_near_snaps_to_vertex() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        let r = fleet.spawn_near(103.0, -4.0).unwrap();
        assert_eq!(r.current_vertex(), VertexId(1));
        assert!(fleet.spawn_near(50.0, 0.0).is_none());
    }

    #[test]
    fn spawn_is_logged() {
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config());
        fleet.spawn(VertexId(1)).unwrap();
        assert_eq!(sink.lines(), ["Robot 1 spawned at vertex V1"]);
    }
}

// ── Task assignment ───────────────────────────────────────────────────────────

#[cfg(test)]
mod assignment {
    use super::*;
    use crate::TaskRejection;

    #[test]
    fn unknown_robot_and_vertex_are_rejected() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        assert_eq!(fleet.assign_task(RobotId(7), VertexId(0)), Err(TaskRejection::UnknownRobot));
        let r = fleet.spawn(VertexId(0)).unwrap();
        assert_eq!(fleet.assign_task(r.id(), VertexId(40)), Err(TaskRejection::UnknownVertex));
        assert_eq!(r.status(), RobotStatus::Idle);
    }

    #[test]
    fn unreachable_target_is_rejected() {
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config());
        let r = fleet.spawn(VertexId(0)).unwrap();
        assert_eq!(fleet.assign_task(r.id(), VertexId(3)), Err(TaskRejection::NoPathFound));
        assert_eq!(r.status(), RobotStatus::Idle);
        assert_eq!(r.target_vertex(), None);
        assert_eq!(sink.lines().last().unwrap(), "No path found from V0 to V3");
    }

    #[test]
    fn busy_robot_is_rejected_and_keeps_its_task() {
        let (mut fleet, sink) = fleet_with(line_graph(false), slow_config());
        let r = fleet.spawn(VertexId(0)).unwrap();
        fleet.assign_task(r.id(), VertexId(2)).unwrap();
        let before = (r.target_vertex(), r.remaining_path());

        assert_eq!(fleet.assign_task(r.id(), VertexId(0)), Err(TaskRejection::AgentBusy));
        assert_eq!((r.target_vertex(), r.remaining_path()), before);
        assert_eq!(
            sink.lines().last().unwrap(),
            "Robot 1 is already moving or waiting. Cannot assign new task."
        );
        fleet.stop_all();
    }

    #[test]
    fn busy_check_comes_before_target_lookup() {
        let (mut fleet, sink) = fleet_with(line_graph(false), slow_config());
        let r = fleet.spawn(VertexId(0)).unwrap();
        fleet.assign_task(r.id(), VertexId(2)).unwrap();

        assert_eq!(fleet.assign_task(r.id(), VertexId(99)), Err(TaskRejection::AgentBusy));
        assert_eq!(r.target_vertex(), Some(VertexId(2)));
        assert_eq!(
            sink.lines().last().unwrap(),
            "Robot 1 is already moving or waiting. Cannot assign new task."
        );
        fleet.stop_all();
    }

    #[test]
    fn rejection_reasons_read_well() {
        assert_eq!(TaskRejection::AgentBusy.to_string(), "Robot is already moving or waiting");
        assert_eq!(TaskRejection::NoPathFound.to_string(), "No path found");
    }
}

// ── End-to-end ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod end_to_end {
    use super::*;

    #[test]
    fn robot_crosses_line_and_goes_idle() {
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config());
        let r = fleet.spawn(VertexId(0)).unwrap();

        fleet.assign_task(r.id(), VertexId(2)).unwrap();
        assert!(r.status().is_busy());
        assert!(fleet.wait_all_idle(Duration::from_secs(5)));

        let snap = r.snapshot();
        assert_eq!(snap.status, RobotStatus::Idle);
        assert_eq!(snap.current_vertex, VertexId(2));
        assert_eq!(snap.position, Point::new(200.0, 0.0));
        assert_eq!(snap.target_vertex, None);
        assert!(fleet.traffic().snapshot().held.is_empty());

        assert_eq!(
            sink.lines(),
            [
                "Robot 1 spawned at vertex V0",
                "Assigning task to Robot 1: Move from V0 to V2",
                "Robot 1 moved to V1",
                "Robot 1 moved to V2",
                "Robot 1 completed task at V2",
            ]
        );
    }

    #[test]
    fn robot_ends_charging_on_charger() {
        let (mut fleet, sink) = fleet_with(line_graph(true), fast_config());
        let r = fleet.spawn(VertexId(0)).unwrap();
        fleet.assign_task(r.id(), VertexId(2)).unwrap();
        assert!(fleet.wait_all_idle(Duration::from_secs(5)));
        assert_eq!(r.status(), RobotStatus::Charging);
        assert_eq!(
            sink.events().last(),
            Some(&FleetEvent::TaskCompleted {
                robot:  r.id(),
                vertex: "V2".into(),
                status: RobotStatus::Charging,
            })
        );

        // Charging is not busy: the robot can be sent off again.
        fleet.assign_task(r.id(), VertexId(0)).unwrap();
        assert!(fleet.wait_all_idle(Duration::from_secs(5)));
        assert_eq!(r.status(), RobotStatus::Idle);
    }

    #[test]
    fn task_to_own_vertex_completes_in_place() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        let r = fleet.spawn(VertexId(1)).unwrap();
        fleet.assign_task(r.id(), VertexId(1)).unwrap();
        assert!(fleet.wait_all_idle(Duration::from_secs(1)));
        assert_eq!(r.current_vertex(), VertexId(1));
        assert_eq!(r.status(), RobotStatus::Idle);
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod contention {
    use super::*;

    #[test]
    fn second_robot_waits_for_shared_corridor() {
        // 200 ms per lane leaves room to observe the wait.
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config().with_speed(500.0));
        let a = fleet.spawn(VertexId(0)).unwrap();
        let b = fleet.spawn(VertexId(1)).unwrap();

        fleet.assign_task(a.id(), VertexId(1)).unwrap();
        assert!(eventually(Duration::from_secs(2), || a.current_lane() == Some(lane(0, 1))));

        fleet.assign_task(b.id(), VertexId(0)).unwrap();
        assert!(eventually(Duration::from_secs(2), || b.status() == RobotStatus::Waiting));
        assert_eq!(fleet.traffic().holder(lane(1, 0)), Some(a.id()));
        assert_eq!(fleet.traffic().waiters(lane(1, 0)), vec![b.id()]);

        assert!(fleet.wait_all_idle(Duration::from_secs(5)));
        assert_eq!(a.current_vertex(), VertexId(1));
        assert_eq!(b.current_vertex(), VertexId(0));

        let events = sink.events();
        let pos = |e: &FleetEvent| events.iter().position(|x| x == e).unwrap();
        let a_arrived = pos(&FleetEvent::Moved { robot: a.id(), vertex: "V1".into() });
        let b_arrived = pos(&FleetEvent::Moved { robot: b.id(), vertex: "V0".into() });
        assert!(pos(&FleetEvent::Waiting { robot: b.id(), lane: lane(1, 0) }) < a_arrived);
        assert!(a_arrived < b_arrived);
    }

    #[test]
    fn opposing_robots_swap_ends() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        let a = fleet.spawn(VertexId(0)).unwrap();
        let b = fleet.spawn(VertexId(2)).unwrap();
        fleet.assign_task(a.id(), VertexId(2)).unwrap();
        fleet.assign_task(b.id(), VertexId(0)).unwrap();

        assert!(fleet.wait_all_idle(Duration::from_secs(5)));
        assert_eq!(a.current_vertex(), VertexId(2));
        assert_eq!(b.current_vertex(), VertexId(0));
        let traffic = fleet.traffic().snapshot();
        assert!(traffic.held.is_empty());
        assert!(traffic.queued.is_empty());
    }
}

// ── Stop ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stopping {
    use super::*;

    #[test]
    fn stop_all_idles_every_robot_and_frees_lanes() {
        let (mut fleet, sink) = fleet_with(line_graph(false), slow_config());
        let a = fleet.spawn(VertexId(0)).unwrap();
        let b = fleet.spawn(VertexId(2)).unwrap();
        fleet.assign_task(a.id(), VertexId(2)).unwrap();
        fleet.assign_task(b.id(), VertexId(1)).unwrap();
        assert!(eventually(Duration::from_secs(2), || {
            a.current_lane().is_some() && b.current_lane().is_some()
        }));

        assert!(fleet.stop_all());
        for snap in fleet.snapshots() {
            assert_eq!(snap.status, RobotStatus::Idle);
            assert_eq!(snap.target_vertex, None);
        }
        assert!(fleet.traffic().snapshot().held.is_empty());

        let lines = sink.lines();
        assert_eq!(lines.last().unwrap(), "All robots stopped");
        assert!(lines.contains(&"Robot 1 stopped, released 1 lane(s)".to_owned()));
        assert!(lines.contains(&"Robot 2 stopped, released 1 lane(s)".to_owned()));
    }

    #[test]
    fn stop_all_on_idle_fleet() {
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config());
        fleet.spawn(VertexId(0)).unwrap();
        assert!(fleet.stop_all());
        assert_eq!(sink.lines().last().unwrap(), "All robots stopped");
    }
}

// ── Selection & hit-testing ───────────────────────────────────────────────────

#[cfg(test)]
mod selection {
    use super::*;
    use crate::FleetError;

    #[test]
    fn select_and_clear() {
        let (mut fleet, sink) = fleet_with(line_graph(false), fast_config());
        fleet.spawn(VertexId(0)).unwrap();
        fleet.spawn(VertexId(1)).unwrap();

        fleet.select(RobotId(2)).unwrap();
        assert_eq!(fleet.selected().map(|r| r.id()), Some(RobotId(2)));
        assert_eq!(sink.lines().last().unwrap(), "Selected Robot 2");

        assert!(matches!(fleet.select(RobotId(9)), Err(FleetError::UnknownRobot(RobotId(9)))));
        assert_eq!(fleet.selected().map(|r| r.id()), Some(RobotId(2)));

        fleet.clear_selection();
        assert!(fleet.selected().is_none());
    }

    #[test]
    fn robot_at_prefers_lowest_id() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        fleet.spawn(VertexId(1)).unwrap();
        fleet.spawn(VertexId(1)).unwrap();
        fleet.spawn(VertexId(0)).unwrap();

        assert_eq!(fleet.robot_at(110.0, 10.0, 15.0).map(|r| r.id()), Some(RobotId(1)));
        assert_eq!(fleet.robot_at(-14.0, 14.0, 15.0).map(|r| r.id()), Some(RobotId(3)));
        assert!(fleet.robot_at(50.0, 0.0, 15.0).is_none());
        assert!(fleet.robot_at(0.0, 16.0, 15.0).is_none());
    }

    #[test]
    fn robot_under_uses_configured_tolerance() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        fleet.spawn(VertexId(1)).unwrap();
        assert_eq!(fleet.robot_under(114.0, -14.0).map(|r| r.id()), Some(RobotId(1)));
        assert!(fleet.robot_under(116.0, 0.0).is_none());

        let narrow = FleetConfig { robot_tolerance: 2.0, ..fast_config() };
        let (mut fleet, _) = fleet_with(line_graph(false), narrow);
        fleet.spawn(VertexId(1)).unwrap();
        assert!(fleet.robot_under(103.0, 0.0).is_none());
        assert!(fleet.robot_under(101.5, 1.5).is_some());
    }

    #[test]
    fn snapshots_are_in_id_order() {
        let (mut fleet, _) = fleet_with(line_graph(false), fast_config());
        fleet.spawn(VertexId(2)).unwrap();
        fleet.spawn(VertexId(0)).unwrap();
        let snaps = fleet.snapshots();
        let ids: Vec<RobotId> = snaps.iter().map(|s| s.id).collect();
        assert_eq!(ids, [RobotId(1), RobotId(2)]);
        assert_eq!(snaps[0].color, "#FF0000");
        assert_eq!(snaps[1].color, "#00FF00");
        assert_eq!(snaps[1].current_vertex, VertexId(0));
    }
}

// ── Event text ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod events {
    use super::*;
    use crate::TaskRejection;

    #[test]
    fn lines_match_log_format() {
        let r = RobotId(4);
        let cases = [
            (FleetEvent::Waiting { robot: r, lane: lane(2, 3) }, "Robot 4 waiting for lane 2-3"),
            (FleetEvent::Stopped { robot: r, released: 0 }, "Robot 4 stopped"),
            (
                FleetEvent::Rejected { robot: r, reason: TaskRejection::UnknownVertex },
                "Task for Robot 4 rejected: Unknown vertex",
            ),
            (
                FleetEvent::TaskCompleted { robot: r, vertex: "C1".into(), status: RobotStatus::Charging },
                "Robot 4 completed task at C1 and started charging",
            ),
            (FleetEvent::AllStopped, "All robots stopped"),
        ];
        for (event, line) in cases {
            assert_eq!(event.to_string(), line);
        }
        assert_eq!(FleetEvent::AllStopped.robot(), None);
        assert_eq!(FleetEvent::Selected { robot: r }.robot(), Some(r));
    }
}
