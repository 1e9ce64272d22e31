use std::path::PathBuf;

use crate::source::SnapshotSource;

/// Filesystem-backed snapshot source.
pub mod file_source;

#[cfg(feature = "http")]
/// HTTP-backed snapshot source.
pub mod http_source;

/// Build a source for `location`: HTTP(S) URLs fetch remotely, anything else reads a file.
#[cfg(feature = "http")]
pub fn source_for_location(location: &str) -> Box<dyn SnapshotSource> {
    if crate::transport::is_http_url(location) {
        return Box::new(http_source::HttpSnapshotSource::new(location));
    }
    Box::new(file_source::FileSnapshotSource::new(PathBuf::from(location)))
}

/// Build a source for `location`; without the `http` feature every location is a file path.
#[cfg(not(feature = "http"))]
pub fn source_for_location(location: &str) -> Box<dyn SnapshotSource> {
    Box::new(file_source::FileSnapshotSource::new(PathBuf::from(location)))
}
