use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use frontier_queue::{trace::ReplayStats, utils::human_duration};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use itertools::Itertools;
use num_format::{Locale, ToFormattedString};
use std::{
    collections::VecDeque,
    error::Error,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub mod generate;
pub mod replay;

/// Minimal estimated runtime after which to show a progress bar instead of simple log messages.
pub const PROGRESS_BAR_THRESHOLD: Duration = Duration::from_millis(500);

/// Initializes `env_logger` (default level `info`) behind a bridge that keeps log lines from
/// tearing progress bars.
pub fn init_logging() -> MultiProgress {
    let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .build();
    let level = logger.filter();

    let progress = MultiProgress::new();
    if let Err(e) = LogWrapper::new(progress.clone(), logger).try_init() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log::set_max_level(level);

    progress
}

/// Collects the trace files to replay, in the order they should be processed.
/// A directory yields its files sorted by path, truncated to `limit`.
pub fn get_trace_input_queue(
    path: &Path,
    limit: Option<usize>,
) -> Result<VecDeque<PathBuf>, Box<dyn Error>> {
    if path.is_file() {
        return Ok(VecDeque::from([path.to_path_buf()]));
    }
    if !path.is_dir() {
        return Err(format!("Path {:?} is not a file or directory", path).into());
    }

    Ok(fs::read_dir(path)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .sorted()
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}

/// Estimates the remaining runtime from the first file's runtime.
pub fn should_use_progress_bar(num_remaining: usize, first_duration: Duration) -> bool {
    first_duration.saturating_mul(num_remaining.min(u32::MAX as usize) as u32)
        >= PROGRESS_BAR_THRESHOLD
}

pub fn create_progress_bar(progress: &MultiProgress, len: usize) -> ProgressBar {
    let pb = progress.add(ProgressBar::new(len as u64));
    match ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => log::warn!("Invalid progress bar template: {}", e),
    }
    pb
}

/// Aggregated statistics for a replay run.
pub struct Stats {
    pub processed: usize,
    pub errors: usize,
    pub totals: ReplayStats,
    pub parse_durations: Vec<Duration>,
    pub replay_durations: Vec<Duration>,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            processed: 0,
            errors: 0,
            totals: ReplayStats::default(),
            parse_durations: Vec::new(),
            replay_durations: Vec::new(),
        }
    }

    pub fn record(&mut self, file_stats: &ReplayStats) {
        let totals = &mut self.totals;
        totals.ops += file_stats.ops;
        totals.inserts += file_stats.inserts;
        totals.updates += file_stats.updates;
        totals.removals += file_stats.removals;
        totals.peeks += file_stats.peeks;
        totals.clears += file_stats.clears;
        totals.empty_errors += file_stats.empty_errors;
        totals.max_len = totals.max_len.max(file_stats.max_len);
    }

    pub fn print_summary(&self) {
        let count = |n: usize| n.to_formatted_string(&Locale::en);

        let mut table = Table::new();
        table
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["", "value"]);

        let rows = [
            ("files", count(self.processed)),
            ("errors", count(self.errors)),
            ("operations", count(self.totals.ops)),
            ("inserts", count(self.totals.inserts)),
            ("updates", count(self.totals.updates)),
            ("removals", count(self.totals.removals)),
            ("peeks", count(self.totals.peeks)),
            ("clears", count(self.totals.clears)),
            ("empty queue errors", count(self.totals.empty_errors)),
            ("max queue size", count(self.totals.max_len)),
            ("parse time", summarize_durations(&self.parse_durations)),
            ("replay time", summarize_durations(&self.replay_durations)),
        ];
        for (name, value) in rows {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(value).set_alignment(CellAlignment::Right),
            ]);
        }

        println!("{table}");
    }
}

/// Formats total, median and max of the given durations.
fn summarize_durations(durations: &[Duration]) -> String {
    if durations.is_empty() {
        return "-".to_string();
    }

    let total: Duration = durations.iter().sum();
    let sorted = durations.iter().sorted().collect_vec();
    let median = *sorted[sorted.len() / 2];
    let max = *sorted[sorted.len() - 1];

    format!(
        "total {}, median {}, max {}",
        human_duration(total),
        human_duration(median),
        human_duration(max)
    )
}
