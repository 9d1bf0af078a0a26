use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrackingConfig;
use crate::kinematics::KinematicsReport;
use crate::track::{TrackSample, Trajectory};

/// Export failures surfaced to the caller. Core state is unaffected and retry
/// is always safe: writes go to a temporary sibling first, so a failed export
/// never leaves a partial destination file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode export document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Raw-trajectory export document: the active settings, every recorded
/// sample, and the export wall-clock time in epoch seconds.
#[derive(Debug, Serialize, Deserialize)]
pub struct RawExport {
    pub settings: TrackingConfig,
    pub tracking_data: Vec<TrackSample>,
    pub timestamp: f64,
}

/// Serialize the raw trajectory with its settings to pretty JSON.
pub fn export_raw(
    settings: &TrackingConfig,
    trajectory: &[TrackSample],
    path: &Path,
) -> Result<(), ExportError> {
    let document = RawExport {
        settings: *settings,
        tracking_data: trajectory.to_vec(),
        timestamp: epoch_seconds(),
    };
    let json = serde_json::to_string_pretty(&document)?;
    write_atomic(path, json.as_bytes())
}

/// Re-parse a raw export document.
pub fn load_raw(path: &Path) -> Result<RawExport, ExportError> {
    let data = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&data)?)
}

/// Serialize derived kinematics to CSV, one row per recorded sample. Velocity
/// and acceleration default to 0 when the report has fewer entries than the
/// trajectory (analysis not yet run, or run on an older snapshot).
pub fn export_table(
    trajectory: &[TrackSample],
    report: &KinematicsReport,
    path: &Path,
) -> Result<(), ExportError> {
    let mut csv = String::from("Timestamp,X,Y,Velocity,Acceleration\n");
    for (i, sample) in trajectory.iter().enumerate() {
        let velocity = report.velocities.get(i).copied().unwrap_or(0.0);
        let acceleration = report.accelerations.get(i).copied().unwrap_or(0.0);
        // String formatting is infallible here
        let _ = writeln!(
            csv,
            "{},{},{},{},{}",
            sample.timestamp, sample.x, sample.y, velocity, acceleration
        );
    }
    write_atomic(path, csv.as_bytes())
}

/// Extract just the trajectory from a raw export document.
pub fn trajectory_from_raw(document: &RawExport) -> Trajectory {
    document.tracking_data.clone()
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Write to a temporary sibling in the destination directory, then rename
/// into place. Rename within one directory is atomic on the platforms we
/// care about.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Err(source) = fs::write(&tmp, bytes) {
        // A partial temp file (disk full) must not linger either
        let _ = fs::remove_file(&tmp);
        return Err(io_err(source));
    }
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(source));
    }
    Ok(())
}
