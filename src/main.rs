use clap::{Parser, Subcommand};
use std::{error::Error, num::NonZeroUsize, path::PathBuf};

mod cli;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay and generate indexed min-queue operation traces", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a trace file, or every trace file in a directory
    Replay {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Maximum number of files to replay from a directory
        #[arg(short, long)]
        limit: Option<usize>,

        /// Verify the queue invariants after every mutation
        #[arg(long)]
        check: bool,

        /// Don't print the results of removals, peeks and size queries
        #[arg(short, long)]
        quiet: bool,

        #[arg(long)]
        no_progress_bar: bool,
    },
    /// Write a random trace to stdout
    Generate {
        /// Number of operations
        #[arg(long, default_value_t = 10_000)]
        ops: usize,

        /// Number of distinct keys
        #[arg(long, default_value = "1000")]
        keys: NonZeroUsize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Command::Replay {
            path,
            limit,
            check,
            quiet,
            no_progress_bar,
        } => cli::replay::replay(path, limit, check, quiet, no_progress_bar),
        Command::Generate { ops, keys, seed } => cli::generate::generate(ops, keys, seed),
    }
}
