/// Filesystem reads and snapshot rotation.
pub mod fs;
/// HTTP retrieval.
#[cfg(feature = "http")]
pub mod http;

/// True if `location` should be fetched over HTTP rather than read from disk.
pub fn is_http_url(location: &str) -> bool {
    let lowered = location.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}
