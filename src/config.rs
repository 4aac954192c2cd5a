//! CLI surface and the plain `Config` it's assembled into.
//!
//! Content-file format and a config-file loader are explicitly out of
//! scope (spec §1), so configuration here is CLI-flag driven only, in
//! the same `Args` (parsed) → `Config` (plain, defaulted) split the
//! teacher uses in its own `main.rs`.

use std::path::PathBuf;

use clap::Parser;

use crate::state::Options;

#[derive(Debug, Parser)]
#[command(author, version, about = "Synchronizes RAID parity over a set of data disks")]
pub struct Args {
    /// Data disk directory, one per slot, in slot order. Pass `-` for a hole.
    #[arg(long = "data", value_name = "DIR")]
    pub data: Vec<String>,

    /// Parity file, one per level, in level order.
    #[arg(long = "parity", value_name = "FILE")]
    pub parity: Vec<PathBuf>,

    /// Block size in bytes.
    #[arg(long, default_value_t = 4096)]
    pub block_size: u64,

    /// First block index to process.
    #[arg(long, default_value_t = 0)]
    pub block_start: u64,

    /// Number of blocks to process; 0 means "to the end".
    #[arg(long, default_value_t = 0)]
    pub block_count: u64,

    /// Bytes processed between autosave snapshots; 0 disables autosave.
    #[arg(long, default_value_t = 0)]
    pub autosave: u64,

    /// Skip the startup buffer self-test.
    #[arg(long)]
    pub skip_self: bool,

    /// Skip the sequential-read hint when opening data files.
    #[arg(long)]
    pub skip_sequential: bool,

    /// Skip preallocation when growing parity files.
    #[arg(long)]
    pub skip_fallocate: bool,

    /// Invert the exit code: succeed only if errors were encountered.
    #[arg(long)]
    pub expect_recoverable: bool,

    /// Path to the persisted block map / info array snapshot.
    #[arg(long, value_name = "FILE")]
    pub content: PathBuf,

    /// Increase verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log file for machine-readable tagged lines.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Contains configuration options, mirroring the teacher's `Config`.
#[derive(Debug)]
pub struct Config {
    pub data: Vec<String>,
    pub parity: Vec<PathBuf>,
    pub content: PathBuf,
    pub log_file_path: Option<PathBuf>,
    pub verbosity: u32,
    pub options: Options,
}

impl Default for Config {
    fn default() -> Self
    {
        Self {
            data: Vec::new(),
            parity: Vec::new(),
            content: PathBuf::default(),
            log_file_path: None,
            verbosity: 0,
            options: Options::default(),
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self
    {
        let mut cfg = Config::default();
        cfg.data = args.data;
        cfg.parity = args.parity;
        cfg.content = args.content;
        cfg.log_file_path = args.log_file;
        cfg.verbosity = args.verbose as u32;
        cfg.options = Options {
            skip_self: args.skip_self,
            skip_sequential: args.skip_sequential,
            skip_fallocate: args.skip_fallocate,
            expect_recoverable: args.expect_recoverable,
            autosave_bytes: args.autosave,
        };
        cfg
    }
}
