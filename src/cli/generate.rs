use frontier_queue::trace::{generate_trace, write_trace};
use std::{
    error::Error,
    io::{self, BufWriter, Write},
    num::NonZeroUsize,
};

pub fn generate(num_ops: usize, num_keys: NonZeroUsize, seed: u64) -> Result<(), Box<dyn Error>> {
    let ops = generate_trace(num_ops, num_keys, seed);

    let stdout = io::stdout();
    let handle = stdout.lock();
    let mut writer = BufWriter::new(handle);

    writeln!(
        writer,
        "c Random trace: {} ops over {} keys, seed {}",
        num_ops, num_keys, seed
    )?;
    write_trace(&ops, &mut writer)?;

    writer.flush()?;
    Ok(())
}
