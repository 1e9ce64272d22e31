use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::layout::PARTIAL_SUFFIX;
use crate::errors::StatsError;
use crate::source::decode::decode_snapshot;

/// Read a snapshot file, mapping a missing file to `Ok(None)`.
pub fn read_optional(source_id: &str, path: &Path) -> Result<Option<String>, StatsError> {
    match fs::read_to_string(path) {
        Ok(body) => Ok(Some(body)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StatsError::Fetch {
            source_id: source_id.to_string(),
            reason: format!("failed reading {}: {err}", path.display()),
        }),
    }
}

/// Result of one snapshot rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Whether an existing current snapshot was preserved as previous.
    pub previous_written: bool,
    /// Records found in the fresh body.
    pub records: usize,
    /// Malformed newline-delimited lines in the fresh body.
    pub skipped_lines: usize,
}

/// Rotate `current` into `previous`, then install `fresh_body` as `current`.
///
/// The fresh body must decode as a snapshot; nothing on disk changes otherwise.
/// The new current file is written beside the target and renamed into place.
pub fn rotate_snapshot(
    current: &Path,
    previous: &Path,
    fresh_body: &str,
) -> Result<RotationOutcome, StatsError> {
    let source_id = current.display().to_string();
    let decoded = decode_snapshot(&source_id, fresh_body)?;

    let previous_written = match fs::copy(current, previous) {
        Ok(_) => true,
        Err(err) if err.kind() == ErrorKind::NotFound => false,
        Err(err) => return Err(err.into()),
    };

    let partial = partial_path(current);
    fs::write(&partial, fresh_body)?;
    fs::rename(&partial, current)?;
    info!(
        "[racestats:rotate] installed {} records={} previous_written={}",
        current.display(),
        decoded.len(),
        previous_written
    );
    Ok(RotationOutcome {
        previous_written,
        records: decoded.len(),
        skipped_lines: decoded.skipped_lines,
    })
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    target.with_file_name(name)
}
