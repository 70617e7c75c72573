//! CSV snapshot backend.
//!
//! Creates `robot_snapshots.csv` in the configured output directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use fm_robot::RobotSnapshot;

use crate::{OutputResult, SnapshotRow};

pub const SNAPSHOT_FILE: &str = "robot_snapshots.csv";

pub const SNAPSHOT_HEADER: [&str; 7] =
    ["frame", "robot_id", "x", "y", "status", "current_vertex", "target_vertex"];

/// Appends one row per robot per captured frame.
pub struct CsvSnapshotWriter {
    writer:   Writer<File>,
    path:     PathBuf,
    frame:    u64,
    finished: bool,
}

impl CsvSnapshotWriter {
    /// Create (or truncate) `dir/robot_snapshots.csv` and write the header.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let path = dir.join(SNAPSHOT_FILE);
        let mut writer = Writer::from_path(&path)?;
        writer.write_record(SNAPSHOT_HEADER)?;
        Ok(Self { writer, path, frame: 0, finished: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames captured so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    /// Capture one frame, e.g. `FleetManager::snapshots()`.
    pub fn write_frame(&mut self, snapshots: &[RobotSnapshot]) -> OutputResult<()> {
        let rows: Vec<SnapshotRow> = snapshots
            .iter()
            .map(|s| SnapshotRow::from_snapshot(self.frame, s))
            .collect();
        self.write_rows(&rows)?;
        self.frame += 1;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[SnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.writer.write_record(row.record())?;
        }
        Ok(())
    }

    /// Flush the file.  Idempotent.
    pub fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}
