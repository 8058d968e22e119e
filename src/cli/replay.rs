use crate::cli::{self, Stats};
use frontier_queue::{
    IndexedMinQueue, measure_time, record_time,
    trace::{ReplayStats, parse_trace, replay as replay_ops},
    utils::human_duration,
};
use log::{error, info};
use memmap2::Mmap;
use std::{
    error::Error,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

pub fn replay(
    path: PathBuf,
    limit: Option<usize>,
    check: bool,
    quiet: bool,
    no_progress_bar: bool,
) -> Result<(), Box<dyn Error>> {
    let progress = cli::init_logging();

    let start = Instant::now();
    let mut stats = Stats::new();
    let mut queue = cli::get_trace_input_queue(&path, limit)?;

    // Replay the first file to estimate the remaining runtime
    let Some(first_file) = queue.pop_front() else {
        info!("No trace files found in {:?}", path);
        return Ok(());
    };
    let first_duration = measure_time!({
        replay_file(&first_file, &mut stats, check, quiet).map_err(|e| {
            error!("Error while replaying {:?}: {}", first_file, e);
            e
        })?
    });

    if !queue.is_empty() {
        // Create a progress bar if the remaining time is significant enough
        let pb = if !no_progress_bar && cli::should_use_progress_bar(queue.len(), first_duration) {
            let pb = cli::create_progress_bar(&progress, queue.len() + 1);
            pb.set_position(1); // Account for the first file we just replayed
            Some(pb)
        } else {
            None
        };

        for path in queue {
            if let Err(e) = replay_file(&path, &mut stats, check, quiet) {
                error!("Error while replaying {:?}: {}", path, e);
                stats.errors += 1;
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
        if let Some(pb) = &pb {
            pb.finish_with_message("done");
        }
    }

    stats.print_summary();
    info!("Total runtime: {}", human_duration(start.elapsed()));

    Ok(())
}

/// Replays a single trace file against a fresh queue, printing its outputs unless `quiet`.
fn replay_file(
    path: &Path,
    stats: &mut Stats,
    check: bool,
    quiet: bool,
) -> Result<ReplayStats, Box<dyn Error>> {
    info!("Replaying {:?}", path);
    stats.processed += 1;

    let ops = {
        let file = File::open(path)?;
        // SAFETY: the trace file must not be modified while it is mapped.
        let mmap = unsafe { Mmap::map(&file)? };

        record_time!(stats.parse_durations, { parse_trace(&mmap)? })
    };

    let mut queue: IndexedMinQueue<String, i64> = IndexedMinQueue::with_capacity(ops.len());
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    let file_stats = record_time!(stats.replay_durations, {
        replay_ops(&mut queue, &ops, check, |line| {
            if quiet { Ok(()) } else { writeln!(writer, "{}", line) }
        })?
    });
    writer.flush()?;

    info!(
        "{} ops, {} removals, {} empty queue errors, {} left in queue",
        file_stats.ops,
        file_stats.removals,
        file_stats.empty_errors,
        queue.len()
    );
    stats.record(&file_stats);

    Ok(file_stats)
}
