use std::time::Duration;

/// Formats a duration with the coarsest unit that keeps it readable, down to nanoseconds for
/// single queue operations.
pub fn human_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;
        let millis = d.subsec_millis();
        format!("{}h {:02}m {:02}.{:03}s", hours, minutes, seconds, millis)
    } else if secs >= 60 {
        let minutes = secs / 60;
        let seconds = secs % 60;
        let millis = d.subsec_millis();
        format!("{}m {:02}.{:03}s", minutes, seconds, millis)
    } else if secs >= 1 {
        format!("{:.3} s", d.as_secs_f64())
    } else if d.as_millis() >= 1 {
        format!("{} ms", d.as_millis())
    } else if d.as_micros() >= 1 {
        format!("{} µs", d.as_micros())
    } else {
        format!("{} ns", d.as_nanos())
    }
}

/// Runs the block, pushes its runtime onto `$durations` and evaluates to the block's result.
#[macro_export]
macro_rules! record_time {
    ($durations:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = { $block };
        $durations.push(start.elapsed());
        result
    }};
}

/// Runs the block and evaluates to its runtime.
#[macro_export]
macro_rules! measure_time {
    ($block:block) => {{
        let start = std::time::Instant::now();
        {
            $block
        };
        start.elapsed()
    }};
}
