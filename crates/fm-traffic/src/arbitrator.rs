//! The `TrafficArbitrator`: exclusive lane holders plus FIFO wait queues.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use fm_core::RobotId;

use crate::LaneKey;

// ── State ─────────────────────────────────────────────────────────────────────

/// Holder map and wait queues.  Only ever touched under the arbitrator's
/// mutex.
#[derive(Default)]
struct TrafficState {
    /// Directed key → robot currently holding it.
    holders: FxHashMap<LaneKey, RobotId>,
    /// Directed key → robots denied that key, oldest first.
    queues: FxHashMap<LaneKey, VecDeque<RobotId>>,
}

impl TrafficState {
    #[inline]
    fn is_occupied(&self, lane: LaneKey) -> bool {
        lane.both_ways().iter().any(|k| self.holders.contains_key(k))
    }

    fn request(&mut self, robot: RobotId, lane: LaneKey) -> bool {
        if self.is_occupied(lane) {
            let queue = self.queues.entry(lane).or_default();
            if !queue.contains(&robot) {
                queue.push_back(robot);
            }
            tracing::debug!(robot = robot.0, %lane, depth = queue.len(), "lane denied");
            return false;
        }
        self.holders.insert(lane, robot);
        // A stale queue entry would make this robot promote itself on release.
        self.dequeue(robot, lane);
        tracing::debug!(robot = robot.0, %lane, "lane granted");
        true
    }

    fn release(&mut self, robot: RobotId, lane: LaneKey) -> bool {
        if self.holders.get(&lane) != Some(&robot) {
            return false;
        }
        self.holders.remove(&lane);
        tracing::debug!(robot = robot.0, %lane, "lane released");
        self.promote(lane);
        true
    }

    /// Hand the freed corridor to the oldest waiter on `lane`, or, when
    /// nobody waits on that direction, to the oldest waiter on the reverse.
    fn promote(&mut self, lane: LaneKey) {
        for key in lane.both_ways() {
            let Some(next) = self.queues.get_mut(&key).and_then(VecDeque::pop_front) else {
                continue;
            };
            if self.queues.get(&key).is_some_and(VecDeque::is_empty) {
                self.queues.remove(&key);
            }
            tracing::debug!(robot = next.0, lane = %key, "promoting waiter");
            self.request(next, key);
            return;
        }
    }

    fn dequeue(&mut self, robot: RobotId, lane: LaneKey) {
        if let Some(queue) = self.queues.get_mut(&lane) {
            queue.retain(|&r| r != robot);
            if queue.is_empty() {
                self.queues.remove(&lane);
            }
        }
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Point-in-time copy of the reservation state for display and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficSnapshot {
    /// `(lane, holder)` sorted by lane.
    pub held: Vec<(LaneKey, RobotId)>,
    /// `(lane, waiters oldest first)` sorted by lane; empty queues omitted.
    pub queued: Vec<(LaneKey, Vec<RobotId>)>,
}

impl TrafficSnapshot {
    pub fn holder_of(&self, lane: LaneKey) -> Option<RobotId> {
        self.held
            .iter()
            .find(|(k, _)| lane.both_ways().contains(k))
            .map(|&(_, r)| r)
    }
}

// ── TrafficArbitrator ─────────────────────────────────────────────────────────

/// Grants, queues, and releases lane reservations for every robot.
///
/// Shared between movement workers as `Arc<TrafficArbitrator>`.  Every
/// mutation happens under a single mutex; a condition variable wakes robots
/// blocked in [`wait_for_grant`](Self::wait_for_grant) whenever a lane is
/// released or [`notify_all`](Self::notify_all) is called.
pub struct TrafficArbitrator {
    state: Mutex<TrafficState>,
    changed: Condvar,
}

impl TrafficArbitrator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrafficState::default()),
            changed: Condvar::new(),
        }
    }

    // A panicking worker cannot leave the maps half-written (every mutation
    // completes before the guard drops), so a poisoned lock is still valid.
    fn lock(&self) -> MutexGuard<'_, TrafficState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reservation operations ────────────────────────────────────────────

    /// Ask for `lane` on behalf of `robot`.
    ///
    /// Grants when neither direction of the corridor is held and records
    /// `robot` as holder of `lane`.  Otherwise denies and appends `robot` to
    /// the queue for `lane` unless it is already queued there.  A robot that
    /// already holds the lane is denied like anyone else.
    pub fn request(&self, robot: RobotId, lane: LaneKey) -> bool {
        self.lock().request(robot, lane)
    }

    /// Release `lane` if `robot` holds it, then promote the oldest waiter.
    ///
    /// Returns `false` (and changes nothing) when `robot` is not the holder
    /// of exactly this directed key.
    pub fn release(&self, robot: RobotId, lane: LaneKey) -> bool {
        let released = self.lock().release(robot, lane);
        if released {
            self.changed.notify_all();
        }
        released
    }

    /// Confirm a grant made by promotion, or request the lane.
    ///
    /// This is what a movement worker calls on every attempt: if a release
    /// already promoted `robot` to holder it gets `true` without being
    /// re-queued behind itself.
    pub fn claim(&self, robot: RobotId, lane: LaneKey) -> bool {
        let mut state = self.lock();
        if state.holders.get(&lane) == Some(&robot) {
            state.dequeue(robot, lane);
            return true;
        }
        state.request(robot, lane)
    }

    /// Block until `robot` holds `lane`, the corridor frees up, `cancelled`
    /// returns `true`, or `timeout` elapses.
    ///
    /// Returns `true` only when `robot` holds the lane.  On `false` the
    /// caller should check its stop flag and [`claim`](Self::claim) again.
    pub fn wait_for_grant<F>(&self, robot: RobotId, lane: LaneKey, timeout: Duration, cancelled: F) -> bool
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.holders.get(&lane) == Some(&robot) {
                return true;
            }
            if cancelled() || !state.is_occupied(lane) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Wake every robot blocked in [`wait_for_grant`](Self::wait_for_grant)
    /// so it re-checks its stop flag.
    pub fn notify_all(&self) {
        // Taking the lock orders this after any waiter's flag check.
        let _guard = self.lock();
        self.changed.notify_all();
    }

    /// Drop every trace of `robot`: release all lanes it holds (promoting
    /// waiters) and remove it from every queue.  Returns the released lanes.
    pub fn withdraw(&self, robot: RobotId) -> Vec<LaneKey> {
        let mut state = self.lock();
        for queue in state.queues.values_mut() {
            queue.retain(|&r| r != robot);
        }
        state.queues.retain(|_, q| !q.is_empty());

        let mut held: Vec<LaneKey> = state
            .holders
            .iter()
            .filter(|&(_, &r)| r == robot)
            .map(|(&k, _)| k)
            .collect();
        held.sort_unstable();
        for &lane in &held {
            state.release(robot, lane);
        }
        drop(state);

        if !held.is_empty() {
            self.changed.notify_all();
        }
        held
    }

    // ── Read-only queries ─────────────────────────────────────────────────

    /// `true` if either direction of the corridor is held.
    pub fn is_occupied(&self, lane: LaneKey) -> bool {
        self.lock().is_occupied(lane)
    }

    /// Robot holding either direction of the corridor, if any.
    pub fn holder(&self, lane: LaneKey) -> Option<RobotId> {
        let state = self.lock();
        lane.both_ways().iter().find_map(|k| state.holders.get(k).copied())
    }

    /// `true` if `robot` holds exactly this directed key.
    pub fn holds(&self, robot: RobotId, lane: LaneKey) -> bool {
        self.lock().holders.get(&lane) == Some(&robot)
    }

    /// Number of robots queued on this directed key.
    pub fn queue_depth(&self, lane: LaneKey) -> usize {
        self.lock().queues.get(&lane).map_or(0, VecDeque::len)
    }

    /// Robots queued on this directed key, oldest first.
    pub fn waiters(&self, lane: LaneKey) -> Vec<RobotId> {
        self.lock()
            .queues
            .get(&lane)
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Consistent copy of all holders and queues.
    pub fn snapshot(&self) -> TrafficSnapshot {
        let state = self.lock();
        let mut held: Vec<(LaneKey, RobotId)> = state.holders.iter().map(|(&k, &r)| (k, r)).collect();
        held.sort_unstable();
        let mut queued: Vec<(LaneKey, Vec<RobotId>)> = state
            .queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(&k, q)| (k, q.iter().copied().collect()))
            .collect();
        queued.sort_unstable_by_key(|(k, _)| *k);
        TrafficSnapshot { held, queued }
    }
}

impl Default for TrafficArbitrator {
    fn default() -> Self {
        Self::new()
    }
}
