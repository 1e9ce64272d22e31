/// Constants used by the period-metric calculator.
pub mod metrics {
    /// Race deltas at (or above, depending on cutoff mode) this value are treated as glitched data.
    pub const DEFAULT_ANOMALY_THRESHOLD: u64 = 2600;
    /// Base added to every derived score.
    pub const SCORE_BASE: f64 = 100.0;
    /// Speed is halved before being scaled by accuracy in the derived score.
    pub const SCORE_SPEED_DIVISOR: f64 = 2.0;
    /// Upper clamp for accuracy percentages.
    pub const ACCURACY_MAX: f64 = 100.0;
    /// Default minimum race delta kept by the row post-filter.
    pub const DEFAULT_MIN_RACES: i64 = 1;
}

/// Constants used by record normalization.
pub mod normalize {
    /// Membership level assumed when a record omits it.
    pub const DEFAULT_MEMBERSHIP: &str = "basic";
}

/// Field names recognized on incoming racer records, in alias-priority order.
pub mod fields {
    /// Racer identifier.
    pub const USERNAME: &[&str] = &["username"];
    /// Human-readable label.
    pub const DISPLAY_NAME: &[&str] = &["displayName"];
    /// Team tag; the rich feed uses `teamTag`.
    pub const TAG: &[&str] = &["tag", "teamTag"];
    /// Profile title.
    pub const TITLE: &[&str] = &["title"];
    /// Lifetime race count: rich feed first, then lean feed.
    pub const RACES: &[&str] = &["racesPlayed", "lifetimeRaces"];
    /// Average speed.
    pub const AVG_SPEED: &[&str] = &["avgSpeed", "avgWpm"];
    /// Peak speed.
    pub const HIGH_SPEED: &[&str] = &["highestSpeed", "highWpm"];
    /// Profile view counter.
    pub const PROFILE_VIEWS: &[&str] = &["profileViews"];
    /// Garage item count.
    pub const GARAGE_CARS: &[&str] = &["garageCars"];
    /// Nitro-use counter (rich feed only).
    pub const NITROS_USED: &[&str] = &["nitrosUsed"];
    /// Longest session length.
    pub const LONGEST_SESSION: &[&str] = &["longestSession"];
    /// League tier.
    pub const LEAGUE_TIER: &[&str] = &["leagueTier"];
    /// Membership level.
    pub const MEMBERSHIP: &[&str] = &["membership"];
    /// Join date.
    pub const JOIN_DATE: &[&str] = &["joinDate"];
    /// Profile link.
    pub const PROFILE_URL: &[&str] = &["profileURL"];
    /// Characters typed (lean feed).
    pub const TYPED: &[&str] = &["typed"];
    /// Typing errors (lean feed).
    pub const ERRS: &[&str] = &["errs"];
    /// Races behind the lean feed's speed average.
    pub const PLAYED: &[&str] = &["played"];
    /// Wrapped-snapshot timestamp field.
    pub const UPDATED_AT: &str = "updatedAt";
    /// Wrapped-snapshot record list field.
    pub const RACERS: &str = "racers";
}

/// Conventional snapshot file names produced by the rotation job.
pub mod layout {
    /// Current rich-feed snapshot.
    pub const RICH_CURRENT: &str = "racers.json";
    /// Previous rich-feed snapshot.
    pub const RICH_PREVIOUS: &str = "racers_prev.json";
    /// Current lean-feed snapshot.
    pub const LEAN_CURRENT: &str = "api.ndjson";
    /// Previous lean-feed snapshot.
    pub const LEAN_PREVIOUS: &str = "api_prev.ndjson";
    /// Suffix used for the temporary file written before an atomic rename.
    pub const PARTIAL_SUFFIX: &str = "part";
}
