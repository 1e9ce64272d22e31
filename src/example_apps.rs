use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum, error::ErrorKind};
use serde::Serialize;

use crate::board::{
    Board, BoardRow, BoardSummary, SortColumn, SortDirection, retain_min_races, sort_rows,
};
use crate::config::{SpeedMethod, StatsConfig};
use crate::constants::layout::{LEAN_CURRENT, LEAN_PREVIOUS, RICH_CURRENT, RICH_PREVIOUS};
use crate::data::{DailyRow, EventRow};
use crate::errors::StatsError;
use crate::ingestion::{
    DailySources, EventSources, SourceSpec, ViewStatus, run_daily_view, run_event_view,
};
use crate::source::sources::source_for_location;
use crate::transport::fs::rotate_snapshot;

/// Placeholder printed for values the engine reports as absent.
const MISSING_CELL: &str = "-";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Tag,
    Races,
    Speed,
    Accuracy,
    Points,
    Nitros,
    PeakSpeed,
    ProfileViews,
    AvgSpeed,
}

impl From<SortArg> for SortColumn {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => SortColumn::Name,
            SortArg::Tag => SortColumn::Tag,
            SortArg::Races => SortColumn::Races,
            SortArg::Speed => SortColumn::Speed,
            SortArg::Accuracy => SortColumn::Accuracy,
            SortArg::Points => SortColumn::Points,
            SortArg::Nitros => SortColumn::Nitros,
            SortArg::PeakSpeed => SortColumn::PeakSpeed,
            SortArg::ProfileViews => SortColumn::ProfileViews,
            SortArg::AvgSpeed => SortColumn::AvgSpeed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpeedArg {
    Weighted,
    Snapshot,
}

impl From<SpeedArg> for SpeedMethod {
    fn from(value: SpeedArg) -> Self {
        match value {
            SpeedArg::Weighted => SpeedMethod::Weighted,
            SpeedArg::Snapshot => SpeedMethod::Snapshot,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeedArg {
    Rich,
    Lean,
}

#[derive(Debug, Parser)]
#[command(
    name = "period_report",
    disable_help_subcommand = true,
    about = "Leaderboard period statistics from snapshot pairs",
    long_about = "Compare leaderboard snapshots taken at two points in time and report per-racer period metrics.",
    after_help = "Snapshot locations are file paths or http(s) URLs. Unset locations resolve against --data-dir using the standard rotation file names."
)]
/// CLI for `period_report`.
///
/// Common usage:
/// - Event view from a rotated data directory: `event --data-dir data`
/// - Daily view of the rich feed: `daily --data-dir data --feed rich`
/// - Install a freshly downloaded snapshot: `rotate --current data/racers.json --previous data/racers_prev.json --fresh https://...`
struct PeriodReportCli {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    /// Four-source comparison (lean + rich feeds, before + now).
    Event(EventArgs),
    /// Two-source comparison within one feed.
    Daily(DailyArgs),
    /// Preserve the current snapshot as previous and install a fresh one.
    Rotate(RotateArgs),
}

#[derive(Debug, Args)]
struct OutputArgs {
    #[arg(long, value_name = "PATH", help = "JSON config file (anomalyThreshold, speedMethod, ...)")]
    config: Option<PathBuf>,
    #[arg(long = "anomaly-threshold", help = "Override the anomaly threshold")]
    anomaly_threshold: Option<u64>,
    #[arg(long = "speed-method", value_enum, help = "Override the speed derivation method")]
    speed_method: Option<SpeedArg>,
    #[arg(long = "min-races", help = "Hide rows with fewer period races than this")]
    min_races: Option<i64>,
    #[arg(long, value_enum, help = "Column to order rows by (default: races)")]
    sort: Option<SortArg>,
    #[arg(long, help = "Sort ascending instead of descending")]
    asc: bool,
    #[arg(long, help = "Emit JSON instead of a text table")]
    json: bool,
}

#[derive(Debug, Args)]
struct EventArgs {
    #[arg(long = "data-dir", value_name = "DIR", default_value = ".")]
    data_dir: PathBuf,
    #[arg(long = "lean-before", value_name = "LOCATION")]
    lean_before: Option<String>,
    #[arg(long = "lean-now", value_name = "LOCATION")]
    lean_now: Option<String>,
    #[arg(long = "rich-before", value_name = "LOCATION")]
    rich_before: Option<String>,
    #[arg(long = "rich-now", value_name = "LOCATION")]
    rich_now: Option<String>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct DailyArgs {
    #[arg(long = "data-dir", value_name = "DIR", default_value = ".")]
    data_dir: PathBuf,
    #[arg(long, value_enum, default_value = "rich", help = "Feed whose standard file names are used")]
    feed: FeedArg,
    #[arg(long, value_name = "LOCATION")]
    before: Option<String>,
    #[arg(long, value_name = "LOCATION")]
    now: Option<String>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct RotateArgs {
    #[arg(long, value_name = "PATH")]
    current: PathBuf,
    #[arg(long, value_name = "PATH")]
    previous: PathBuf,
    #[arg(long, value_name = "LOCATION", help = "Location of the fresh snapshot")]
    fresh: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a, R> {
    view: &'a str,
    status: &'a str,
    updated_at: Option<DateTime<Utc>>,
    summary: Option<BoardSummary>,
    rows: &'a [R],
}

/// Run the period report CLI, writing to stdout.
pub fn run_period_report<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_period_report_to(args_iter, &mut out)
}

/// Run the period report CLI, writing the report to `out`.
pub fn run_period_report_to<I, W>(args_iter: I, out: &mut W) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let Some(cli) = parse_cli::<PeriodReportCli, _>(
        std::iter::once("period_report".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    match cli.command {
        ReportCommand::Event(args) => {
            let config = resolve_config(&args.output)?;
            let location = |explicit: Option<String>, name: &str| {
                explicit.unwrap_or_else(|| default_location(&args.data_dir, name))
            };
            let sources = EventSources {
                lean_before: optional_spec(&location(args.lean_before.clone(), LEAN_PREVIOUS)),
                lean_now: optional_spec(&location(args.lean_now.clone(), LEAN_CURRENT)),
                rich_before: optional_spec(&location(args.rich_before.clone(), RICH_PREVIOUS)),
                rich_now: optional_spec(&location(args.rich_now.clone(), RICH_CURRENT)),
            };
            let status = run_event_view(sources, &config);
            emit(out, "event", status, &args.output, &config, write_event_table)
        }
        ReportCommand::Daily(args) => {
            let config = resolve_config(&args.output)?;
            let (previous_name, current_name) = match args.feed {
                FeedArg::Rich => (RICH_PREVIOUS, RICH_CURRENT),
                FeedArg::Lean => (LEAN_PREVIOUS, LEAN_CURRENT),
            };
            let before = args
                .before
                .clone()
                .unwrap_or_else(|| default_location(&args.data_dir, previous_name));
            let now = args
                .now
                .clone()
                .unwrap_or_else(|| default_location(&args.data_dir, current_name));
            let sources = DailySources {
                before: SourceSpec::boxed(source_for_location(&before), false),
                now: SourceSpec::boxed(source_for_location(&now), true),
            };
            let status = run_daily_view(sources, &config);
            emit(out, "daily", status, &args.output, &config, write_daily_table)
        }
        ReportCommand::Rotate(args) => {
            let source = source_for_location(&args.fresh);
            let body = source.fetch()?.ok_or_else(|| StatsError::Fetch {
                source_id: source.id().to_string(),
                reason: "not found".into(),
            })?;
            let outcome = rotate_snapshot(&args.current, &args.previous, &body)?;
            writeln!(
                out,
                "rotated {} ({} records, previous preserved: {}, skipped lines: {})",
                args.current.display(),
                outcome.records,
                outcome.previous_written,
                outcome.skipped_lines
            )?;
            Ok(())
        }
    }
}

fn optional_spec(location: &str) -> SourceSpec {
    SourceSpec::boxed(source_for_location(location), false)
}

fn default_location(data_dir: &Path, name: &str) -> String {
    data_dir.join(name).display().to_string()
}

fn resolve_config(output: &OutputArgs) -> Result<StatsConfig, Box<dyn Error>> {
    let mut config = match &output.config {
        Some(path) => StatsConfig::from_json_file(path)?,
        None => StatsConfig::default(),
    };
    if let Some(threshold) = output.anomaly_threshold {
        config = config.with_anomaly_threshold(threshold);
    }
    if let Some(method) = output.speed_method {
        config = config.with_speed_method(method.into());
    }
    if let Some(min_races) = output.min_races {
        config = config.with_min_races(min_races);
    }
    Ok(config)
}

fn emit<R, W, F>(
    out: &mut W,
    view: &str,
    status: ViewStatus<R>,
    output: &OutputArgs,
    config: &StatsConfig,
    write_table: F,
) -> Result<(), Box<dyn Error>>
where
    R: BoardRow + Clone + Serialize,
    W: Write,
    F: Fn(&mut W, &[R]) -> std::io::Result<()>,
{
    let (board, updated_at) = match status {
        ViewStatus::Ready { board, updated_at } => (board, updated_at),
        ViewStatus::NoData => {
            if output.json {
                write_json(out, view, "noData", None, None, &[] as &[R])?;
            } else {
                writeln!(out, "{view}: no data for this comparison")?;
            }
            return Ok(());
        }
        ViewStatus::Error(message) => {
            if output.json {
                write_json(out, view, "error", None, None, &[] as &[R])?;
            }
            return Err(format!("{view}: {message}").into());
        }
    };

    let Board { rows, summary } = board;
    let rows = retain_min_races(&rows, config.min_races);
    let rows = match output.sort {
        Some(column) => {
            let direction = if output.asc {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            sort_rows(rows, column.into(), direction)
        }
        None if output.asc => sort_rows(rows, SortColumn::Races, SortDirection::Ascending),
        None => rows,
    };

    if output.json {
        write_json(out, view, "ready", updated_at, Some(summary), &rows)?;
        return Ok(());
    }
    if let Some(updated_at) = updated_at {
        writeln!(out, "{view} (updated {})", updated_at.to_rfc3339())?;
    } else {
        writeln!(out, "{view}")?;
    }
    write_table(out, &rows)?;
    writeln!(
        out,
        "{} shown, {} racers compared, {} inactive, {} anomalous",
        rows.len(),
        summary.visited,
        summary.inactive,
        summary.anomalous
    )?;
    Ok(())
}

fn write_json<W: Write, R: Serialize>(
    out: &mut W,
    view: &str,
    status: &str,
    updated_at: Option<DateTime<Utc>>,
    summary: Option<BoardSummary>,
    rows: &[R],
) -> Result<(), Box<dyn Error>> {
    let report = JsonReport {
        view,
        status,
        updated_at,
        summary,
        rows,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn write_event_table<W: Write>(out: &mut W, rows: &[EventRow]) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<24} {:<8} {:>8} {:>8} {:>9} {:>8} {:>7}",
        "#", "Racer", "Tag", "Races", "Speed", "Accuracy", "Points", "Nitros"
    )?;
    for (idx, row) in rows.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<24} {:<8} {:>8} {:>8} {:>9} {:>8} {:>7}",
            idx + 1,
            row.display_name,
            row.tag,
            format_count(row.races),
            format_optional(row.speed, 1, ""),
            format_optional(row.accuracy, 1, "%"),
            format_optional(row.points, 2, ""),
            row.nitros
                .map(format_count)
                .unwrap_or_else(|| MISSING_CELL.to_string()),
        )?;
    }
    Ok(())
}

fn write_daily_table<W: Write>(out: &mut W, rows: &[DailyRow]) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<24} {:<8} {:>8} {:>9} {:>8} {:>7} {:>8}",
        "#", "Racer", "Tag", "Races", "Peak +/-", "Views", "Nitros", "Avg"
    )?;
    for (idx, row) in rows.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<24} {:<8} {:>8} {:>9} {:>8} {:>7} {:>8.1}",
            idx + 1,
            row.display_name,
            row.tag,
            format_signed(row.races),
            format!("{:+.1}", row.peak_speed_delta),
            format_signed(row.profile_views_delta),
            row.nitros
                .map(format_signed)
                .unwrap_or_else(|| MISSING_CELL.to_string()),
            row.avg_speed,
        )?;
    }
    Ok(())
}

/// Group digits in thousands: `1234567` -> `1,234,567`.
pub fn format_count(value: i64) -> String {
    let raw = value.unsigned_abs().to_string();
    let mut grouped_reversed = String::with_capacity(raw.len() + (raw.len() / 3));
    for (idx, ch) in raw.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped_reversed.push(',');
        }
        grouped_reversed.push(ch);
    }
    let grouped: String = grouped_reversed.chars().rev().collect();
    if value < 0 { format!("-{grouped}") } else { grouped }
}

/// Thousands-grouped count with an explicit sign: `+1,200`, `-3`, `0`.
pub fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{}", format_count(value))
    } else {
        format_count(value)
    }
}

fn format_optional(value: Option<f64>, decimals: usize, suffix: &str) -> String {
    match value {
        Some(value) => format!("{value:.decimals$}{suffix}"),
        None => MISSING_CELL.to_string(),
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
