//! Snapshot File I/O
//!
//! Writes ensemble snapshots to JSON files named by run title and
//! iteration, and reads them back. A failed write is fatal to the run, so
//! errors propagate without retry.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use sim_particles::{snapshot_filename, EnsembleSnapshot};

/// Errors that can occur while persisting or loading snapshots.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes a snapshot into `dir` under its canonical file name.
///
/// Creates the directory if it doesn't exist and returns the full path of
/// the written file.
pub fn write_snapshot(snapshot: &EnsembleSnapshot, dir: &Path) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(snapshot_filename(&snapshot.title, snapshot.iteration));
    let file = File::create(&path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(path)
}

/// Reads a snapshot back from a file written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<EnsembleSnapshot, OutputError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_particles::{ParameterSet, WeightedParticle, PARAM_SET_DIMENSION};
    use tempfile::tempdir;

    fn make_snapshot() -> EnsembleSnapshot {
        let members = (1..=3)
            .map(|i| WeightedParticle {
                params: ParameterSet::new(vec![i as f64; PARAM_SET_DIMENSION]).unwrap(),
                weight: i as f64 / 10.0,
            })
            .collect();
        EnsembleSnapshot::new("test_run", 100, members)
    }

    #[test]
    fn test_snapshot_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let snapshot = make_snapshot();

        let path = write_snapshot(&snapshot, dir.path()).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("ensemble_test_run_100.json")
        );

        let back = read_snapshot(&path).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_write_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("out").join("snapshots");

        let path = write_snapshot(&make_snapshot(), &nested).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("ensemble_nope_1.json");
        assert!(read_snapshot(&missing).is_err());
    }
}
