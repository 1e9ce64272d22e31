use crate::errors::StatsError;
use crate::source::SnapshotSource;
use crate::transport::http::get_optional;
use crate::types::SourceId;

/// Snapshot published at an HTTP(S) URL. One GET per fetch, no retries.
#[derive(Clone, Debug)]
pub struct HttpSnapshotSource {
    id: SourceId,
    url: String,
}

impl HttpSnapshotSource {
    /// Source fetching `url`, identified by the URL itself.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: url.clone(),
            url,
        }
    }

    /// Override the source identifier used in logs and errors.
    pub fn with_id(mut self, id: impl Into<SourceId>) -> Self {
        self.id = id.into();
        self
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&self) -> Result<Option<String>, StatsError> {
        get_optional(&self.id, &self.url)
    }
}
