//! Fatal error kinds: the only errors that abort the sync driver.
//!
//! External modification (ENOENT/EACCES/stat mismatch) and silent data
//! errors (hash mismatch) are NOT represented here — they are counted
//! and logged inline by the driver and never become an `Err`. Only the
//! truly unrecoverable kinds from spec §7.1 get a variant.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("unexpected close of {path}: {source}")]
    Close { path: PathBuf, #[source] source: std::io::Error },

    #[error("read error on {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("open error on {path}: {source}")]
    Open { path: PathBuf, #[source] source: std::io::Error },

    #[error("parity error:{index}:{level}: write error: {source}")]
    ParityWrite { index: u64, level: usize, #[source] source: std::io::Error },

    #[error("parity resize error: {source}")]
    ParityResize { #[source] source: std::io::Error },

    #[error("parity sync error: {source}")]
    ParitySync { #[source] source: std::io::Error },

    #[error("parity close error: {source}")]
    ParityClose { #[source] source: std::io::Error },

    #[error("parity file {path} is smaller than the previously recorded size ({on_disk} < {recorded}), refusing to continue")]
    ParityShrunk { path: PathBuf, on_disk: u64, recorded: u64 },

    #[error("raid codec error: {0}")]
    Raid(#[from] crate::raid::RaidError),

    #[error("state write error: {source}")]
    StateWrite { #[source] source: std::io::Error },

    #[error("buffer self-test failed at buffer {index}: expected pattern not read back")]
    SelfTestFailed { index: usize },
}

pub type SyncResult<T> = Result<T, SyncError>;
