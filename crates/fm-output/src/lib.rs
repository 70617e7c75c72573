//! `fm-output`: output collaborators for the fleet coordination engine.
//!
//! | Type                  | File                                   | Driven by                        |
//! |-----------------------|----------------------------------------|----------------------------------|
//! | [`LogFileSink`]       | any path, e.g. `logs/fleet_logs.txt`   | `fm_fleet::EventSink` events     |
//! | [`CsvSnapshotWriter`] | `<dir>/robot_snapshots.csv`            | `FleetManager::snapshots()` calls |
//!
//! # Usage
//!
//! ```rust,ignore
//! use fm_output::{CsvSnapshotWriter, LogFileSink};
//!
//! let log = Arc::new(LogFileSink::create("logs/fleet_logs.txt")?);
//! let mut fleet = FleetManagerBuilder::new(graph).sink(log.clone()).build()?;
//! let mut csv = CsvSnapshotWriter::new(Path::new("./output"))?;
//! csv.write_frame(&fleet.snapshots())?;
//! csv.finish()?;
//! log.take_error().map(|e| eprintln!("log error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod log;
pub mod row;


pub use csv::CsvSnapshotWriter;
pub use error::{OutputError, OutputResult};
pub use log::LogFileSink;
pub use row::SnapshotRow;
