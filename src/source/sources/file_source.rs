use std::path::PathBuf;

use crate::errors::StatsError;
use crate::source::SnapshotSource;
use crate::transport::fs::read_optional;
use crate::types::SourceId;

/// Snapshot stored as a file on disk; a missing file reads as not-found.
#[derive(Clone, Debug)]
pub struct FileSnapshotSource {
    id: SourceId,
    path: PathBuf,
}

impl FileSnapshotSource {
    /// Source reading `path`, identified by its display form.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            path,
        }
    }

    /// Override the source identifier used in logs and errors.
    pub fn with_id(mut self, id: impl Into<SourceId>) -> Self {
        self.id = id.into();
        self
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&self) -> Result<Option<String>, StatsError> {
        read_optional(&self.id, &self.path)
    }
}
