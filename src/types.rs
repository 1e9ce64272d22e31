/// Lowercased racer identifier used to pair records across snapshots.
/// Example: `speedy_kat`
pub type RacerKey = String;
/// Identifier for a snapshot source (file path, URL, or caller-chosen name).
/// Examples: `data/racers.json`, `https://example.org/api.ndjson`, `lean_now`
pub type SourceId = String;
/// Racer identifier as it appears in a feed (case preserved).
/// Example: `Speedy_Kat`
pub type Username = String;
/// Warning/log message text.
/// Examples: `skipping malformed line 4`, `required source 'racers.json' failed: ...`
pub type LogMessage = String;
