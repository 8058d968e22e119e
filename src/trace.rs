//! Line-oriented operation traces for driving a [`MinQueue`] outside of a graph search.
//!
//! ```text
//! c comment
//! a <key> <priority>   add or update
//! r                    remove minimum
//! p                    peek minimum
//! s                    size
//! x                    clear
//! ```

use std::{
    fmt,
    io::{self, Write},
    num::NonZeroUsize,
};

use log::debug;

use crate::{error::QueueError, min_queue::MinQueue};

/// A single queue operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    AddOrUpdate { key: String, priority: i64 },
    RemoveMin,
    PeekMin,
    Len,
    Clear,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::AddOrUpdate { key, priority } => write!(f, "a {} {}", key, priority),
            Op::RemoveMin => write!(f, "r"),
            Op::PeekMin => write!(f, "p"),
            Op::Len => write!(f, "s"),
            Op::Clear => write!(f, "x"),
        }
    }
}

/// Parses a trace. Errors name the offending 1-based line.
pub fn parse_trace(data: &[u8]) -> Result<Vec<Op>, String> {
    let mut ops = Vec::new();

    for (line_idx, line) in data.split(|&b| b == b'\n').enumerate() {
        let line_no = line_idx + 1;
        let mut cursor = ByteCursor::new(line);
        cursor.skip_ascii_whitespace();

        let tag = match cursor.next_byte() {
            Some(b'c') => continue, // Comment
            Some(tag) => tag,
            None => continue, // Blank line
        };
        if !cursor.peek().is_none_or(|b| b.is_ascii_whitespace()) {
            return Err(format!("line {}: expected a single-letter operation", line_no));
        }

        let op = match tag {
            b'a' => {
                cursor.skip_ascii_whitespace();
                let key = cursor
                    .parse_token()
                    .ok_or_else(|| format!("line {}: expected key", line_no))?;
                cursor.skip_ascii_whitespace();
                let priority = cursor
                    .parse_i64()
                    .ok_or_else(|| format!("line {}: expected integer priority", line_no))?;
                Op::AddOrUpdate {
                    key: key.to_string(),
                    priority,
                }
            }
            b'r' => Op::RemoveMin,
            b'p' => Op::PeekMin,
            b's' => Op::Len,
            b'x' => Op::Clear,
            other => {
                return Err(format!(
                    "line {}: unknown operation '{}'",
                    line_no,
                    other.escape_ascii()
                ));
            }
        };

        cursor.skip_ascii_whitespace();
        if !cursor.is_at_end() {
            return Err(format!("line {}: unexpected trailing input", line_no));
        }

        ops.push(op);
    }

    Ok(ops)
}

/// Writes `ops` in the format read by [`parse_trace`], one operation per line.
/// Keys must be non-empty and free of whitespace, otherwise nothing further is written and
/// an [`io::ErrorKind::InvalidInput`] error is returned.
pub fn write_trace<W: Write>(ops: &[Op], writer: &mut W) -> io::Result<()> {
    for op in ops {
        if let Op::AddOrUpdate { key, .. } = op {
            if key.is_empty() || key.bytes().any(|b| b.is_ascii_whitespace()) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("key {:?} is not a single whitespace-free token", key),
                ));
            }
        }
        writeln!(writer, "{}", op)?;
    }
    Ok(())
}

/// Generates a random, reproducible workload over `num_keys` distinct keys.
pub fn generate_trace(num_ops: usize, num_keys: NonZeroUsize, seed: u64) -> Vec<Op> {
    let mut rng = fastrand::Rng::with_seed(seed);

    (0..num_ops)
        .map(|_| match rng.u32(0..100) {
            0..55 => Op::AddOrUpdate {
                key: format!("k{}", rng.usize(..num_keys.get())),
                priority: rng.i64(0..10_000),
            },
            55..90 => Op::RemoveMin,
            90..95 => Op::PeekMin,
            95..99 => Op::Len,
            _ => Op::Clear,
        })
        .collect()
}

/// Emitted by `r` and `p` on an empty queue. Contains whitespace, so no key can print as it.
pub const EMPTY_MARKER: &str = "! empty";

/// Counters collected while replaying a trace.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub ops: usize,
    pub inserts: usize,
    pub updates: usize,
    pub removals: usize,
    pub peeks: usize,
    pub clears: usize,
    /// Removals and peeks that hit an empty queue.
    pub empty_errors: usize,
    pub max_len: usize,
}

/// Applies `ops` to `queue`, passing every observable result to `emit`.
///
/// `r` emits the removed key, `p` the minimal key and priority, `s` the size; either of the
/// former emits [`EMPTY_MARKER`] on an empty queue, which is counted but not fatal.
/// With `check`, the queue's invariants are verified after every mutation.
pub fn replay<Q, E>(
    queue: &mut Q,
    ops: &[Op],
    check: bool,
    mut emit: E,
) -> Result<ReplayStats, String>
where
    Q: MinQueue<String, i64>,
    E: FnMut(fmt::Arguments<'_>) -> io::Result<()>,
{
    let mut stats = ReplayStats::default();
    let write_err = |e: io::Error| format!("Failed to write output: {}", e);

    for (op_idx, op) in ops.iter().enumerate() {
        stats.ops += 1;

        let mutated = match op {
            Op::AddOrUpdate { key, priority } => {
                let len_before = queue.len();
                queue.add_or_update(key.clone(), *priority);
                if queue.len() > len_before {
                    stats.inserts += 1;
                } else {
                    stats.updates += 1;
                }
                stats.max_len = stats.max_len.max(queue.len());
                true
            }
            Op::RemoveMin => match queue.remove_min() {
                Ok(key) => {
                    stats.removals += 1;
                    emit(format_args!("{}", key)).map_err(write_err)?;
                    true
                }
                Err(QueueError::Empty) => {
                    debug!("op {}: {} on an empty queue", op_idx + 1, op);
                    stats.empty_errors += 1;
                    emit(format_args!("{}", EMPTY_MARKER)).map_err(write_err)?;
                    false
                }
            },
            Op::PeekMin => {
                stats.peeks += 1;
                match (queue.peek_min(), queue.peek_min_priority()) {
                    (Ok(key), Ok(priority)) => {
                        emit(format_args!("{} {}", key, priority)).map_err(write_err)?;
                    }
                    _ => {
                        debug!("op {}: {} on an empty queue", op_idx + 1, op);
                        stats.empty_errors += 1;
                        emit(format_args!("{}", EMPTY_MARKER)).map_err(write_err)?;
                    }
                }
                false
            }
            Op::Len => {
                emit(format_args!("{}", queue.len())).map_err(write_err)?;
                false
            }
            Op::Clear => {
                stats.clears += 1;
                queue.clear();
                true
            }
        };

        if check && mutated {
            queue
                .check_invariants()
                .map_err(|e| format!("op {} ({}): {}", op_idx + 1, op, e))?;
        }
    }

    Ok(stats)
}

/// A bounds-checked cursor over the bytes of one trace line.
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn skip_ascii_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Parses a run of non-whitespace bytes as UTF-8.
    fn parse_token(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.data[start..self.pos]).ok()
    }

    /// Parses an optionally negative decimal integer that ends at whitespace or the line end.
    /// Leaves the cursor untouched on failure.
    fn parse_i64(&mut self) -> Option<i64> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        let mut num = 0i64;
        let mut found = false;
        while let Some(digit) = self.peek().filter(u8::is_ascii_digit) {
            let digit = (digit - b'0') as i64;
            // Accumulate towards the sign so that i64::MIN parses
            let next = num.checked_mul(10).and_then(|n| {
                if negative {
                    n.checked_sub(digit)
                } else {
                    n.checked_add(digit)
                }
            });
            match next {
                Some(n) => num = n,
                None => {
                    self.pos = start;
                    return None;
                }
            }
            self.pos += 1;
            found = true;
        }

        if !found || !self.peek().is_none_or(|b| b.is_ascii_whitespace()) {
            self.pos = start;
            return None;
        }
        Some(num)
    }
}
