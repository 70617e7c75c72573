//! Engine configuration.
//!
//! Every timing constant the movement workers and the traffic arbitrator use
//! lives in [`FleetConfig`], so tests can run the same state machine with a
//! fast clock and applications can tune it without touching the engine.

use std::time::Duration;

use crate::{CoreError, CoreResult};

/// Cyclic colour palette handed out to robots in spawn order.
pub const DEFAULT_PALETTE: [&str; 12] = [
    "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#FFA500", "#800080", "#008000", "#000080", "#800000", "#008080",
];

/// Top-level engine configuration.
///
/// Typically built with `FleetConfig::default()` and the `with_*` setters,
/// or loaded from JSON by the application (feature `serde`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FleetConfig {
    /// Travel speed in graph units per second.  Default: 50.
    pub speed: f64,

    /// Interpolation updates per second of travel.  Default: 30.
    pub animation_hz: u32,

    /// Backoff between denied lane requests.  Default: 500 ms.
    pub lane_retry: Duration,

    /// Upper bound of the uniform random delay added to each backoff.
    /// Zero (the default) gives the plain fixed-interval retry.
    pub retry_jitter: Duration,

    /// Seed for the per-robot jitter RNGs.
    pub seed: u64,

    /// Default tolerance for vertex hit-testing.  Default: 5.
    pub vertex_tolerance: f64,

    /// Default tolerance for robot hit-testing.  Default: 15.
    pub robot_tolerance: f64,

    /// How long a stop waits for the movement worker to exit.  Default: 1 s.
    pub stop_join_timeout: Duration,

    /// Release held lanes and leave every wait queue when a robot is
    /// force-stopped.  `false` keeps the lane held until someone else
    /// releases it, which in practice is never.
    pub release_on_stop: bool,

    /// Colours assigned to spawned robots, cycled in order.
    pub palette: Vec<String>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            speed:             50.0,
            animation_hz:      30,
            lane_retry:        Duration::from_millis(500),
            retry_jitter:      Duration::ZERO,
            seed:              0,
            vertex_tolerance:  5.0,
            robot_tolerance:   15.0,
            stop_join_timeout: Duration::from_secs(1),
            release_on_stop:   true,
            palette:           DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl FleetConfig {
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_animation_hz(mut self, hz: u32) -> Self {
        self.animation_hz = hz;
        self
    }

    pub fn with_lane_retry(mut self, retry: Duration) -> Self {
        self.lane_retry = retry;
        self
    }

    pub fn with_retry_jitter(mut self, jitter: Duration, seed: u64) -> Self {
        self.retry_jitter = jitter;
        self.seed = seed;
        self
    }

    pub fn with_release_on_stop(mut self, release: bool) -> Self {
        self.release_on_stop = release;
        self
    }

    pub fn with_palette<I, S>(mut self, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.palette = palette.into_iter().map(Into::into).collect();
        self
    }

    /// Reject settings the movement loop cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(CoreError::Config(format!("speed must be positive, got {}", self.speed)));
        }
        if self.animation_hz == 0 {
            return Err(CoreError::Config("animation_hz must be at least 1".into()));
        }
        if self.palette.is_empty() {
            return Err(CoreError::Config("colour palette is empty".into()));
        }
        Ok(())
    }

    /// Colour for the `n`-th spawned robot (0-based), cycling the palette.
    pub fn color_for(&self, n: usize) -> &str {
        if self.palette.is_empty() {
            return "#000000";
        }
        &self.palette[n % self.palette.len()]
    }

    /// Time needed to cover `distance` at the configured speed.
    ///
    /// Saturates at `Duration::MAX` for distances too long to represent.
    pub fn travel_time(&self, distance: f64) -> Duration {
        if distance <= 0.0 || !distance.is_finite() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(distance / self.speed).unwrap_or(Duration::MAX)
    }

    /// Number of interpolation steps for a traversal lasting `travel`.
    ///
    /// Always at least 1 so a zero-length lane still produces an arrival
    /// update.
    pub fn animation_steps(&self, travel: Duration) -> u32 {
        let steps = (travel.as_secs_f64() * self.animation_hz as f64).round() as u32;
        steps.max(1)
    }
}
