//! Fluent builder for constructing a [`FleetManager`].

use std::collections::BTreeMap;
use std::sync::Arc;

use fm_core::FleetConfig;
use fm_graph::{BfsPathFinder, NavGraph, PathFinder};
use fm_robot::MotionContext;
use fm_traffic::TrafficArbitrator;

use crate::observer::EventRelay;
use crate::{EventSink, FleetManager, FleetResult};

/// Fluent builder for [`FleetManager`].
///
/// # Required inputs
///
/// - [`NavGraph`]: the navigation graph, owned or already behind an `Arc`
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                          |
/// |----------------------|----------------------------------|
/// | `.config(c)`         | `FleetConfig::default()`         |
/// | `.path_finder(p)`    | `BfsPathFinder`                  |
/// | `.traffic(t)`        | A fresh `TrafficArbitrator`      |
/// | `.sink(s)`           | No sinks (events are dropped)    |
///
/// # Example
///
/// ```rust,ignore
/// let graph = fm_graph::load_from_path("nav_graph.json")?;
/// let mut fleet = FleetManagerBuilder::new(graph)
///     .config(FleetConfig::default().with_speed(80.0))
///     .sink(Arc::new(TracingSink))
///     .build()?;
/// let robot = fleet.spawn(VertexId(0)).unwrap();
/// fleet.assign_task(robot.id(), VertexId(5))?;
/// ```
pub struct FleetManagerBuilder {
    graph:   Arc<NavGraph>,
    config:  FleetConfig,
    finder:  Box<dyn PathFinder>,
    traffic: Option<Arc<TrafficArbitrator>>,
    sinks:   Vec<Arc<dyn EventSink>>,
}

impl FleetManagerBuilder {
    pub fn new(graph: impl Into<Arc<NavGraph>>) -> Self {
        Self {
            graph:   graph.into(),
            config:  FleetConfig::default(),
            finder:  Box::new(BfsPathFinder),
            traffic: None,
            sinks:   Vec::new(),
        }
    }

    pub fn config(mut self, config: FleetConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the breadth-first path search.
    pub fn path_finder<P: PathFinder + 'static>(mut self, finder: P) -> Self {
        self.finder = Box::new(finder);
        self
    }

    /// Share an existing arbitrator, e.g. one a display thread already
    /// polls.
    pub fn traffic(mut self, traffic: Arc<TrafficArbitrator>) -> Self {
        self.traffic = Some(traffic);
        self
    }

    /// Register an event sink.  May be called repeatedly; every sink sees
    /// every event.
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Validate the configuration and return an empty fleet.
    pub fn build(self) -> FleetResult<FleetManager> {
        self.config.validate()?;

        let relay = Arc::new(EventRelay::new(self.sinks));
        let ctx = MotionContext {
            graph:    self.graph,
            traffic:  self.traffic.unwrap_or_default(),
            config:   Arc::new(self.config),
            observer: relay.clone(),
        };

        tracing::debug!(
            vertices = ctx.graph.vertex_count(),
            lanes = ctx.graph.lane_count(),
            "fleet manager ready"
        );

        Ok(FleetManager {
            ctx,
            relay,
            finder:   self.finder,
            robots:   BTreeMap::new(),
            next_id:  1,
            selected: None,
        })
    }
}
