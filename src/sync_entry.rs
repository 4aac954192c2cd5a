//! Sync entry point: resizes each parity file to match `block_max`,
//! invokes the driver over the requested range, then flushes and closes
//! every parity file regardless of whether the driver succeeded.

use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::parity::ParityFile;
use crate::progress::ProgressReporter;
use crate::state::State;
use crate::sync::{self, SyncReport};

/// Runs a full sync: opens/resizes the parity files named in
/// `parity_paths` (one per level, in level order), then delegates to
/// [`sync::run`] over `[block_start, block_start + block_count)`
/// (clamped to `state.block_max()`; `block_count == 0` means "to the end").
pub fn run_sync(
    state: &mut State,
    parity_paths: &[&Path],
    block_start: u64,
    block_count: u64,
    logger: &mut crate::logger::Logger,
    progress: &mut dyn ProgressReporter,
    autosave_path: Option<&Path>,
) -> SyncResult<SyncReport>
{
    debug_assert_eq!(parity_paths.len(), state.level);

    let block_max = state.block_max();
    let block_end = if block_count > 0 { (block_start + block_count).min(block_max) } else { block_max };

    let mut parity_files = Vec::with_capacity(state.level);
    for (level, path) in parity_paths.iter().enumerate() {
        let (mut pf, existing_size) =
            ParityFile::create(path, state.block_size).map_err(|e| SyncError::Open { path: path.to_path_buf(), source: e })?;

        let recorded = state.parity_size.get(level).copied().unwrap_or(0);
        if existing_size < recorded {
            return Err(SyncError::ParityShrunk { path: path.to_path_buf(), on_disk: existing_size, recorded });
        }

        let required = block_max * state.block_size;
        let actual = pf
            .chsize(required, state.options.skip_fallocate)
            .map_err(|e| SyncError::ParityResize { source: e })?;
        state.parity_size[level] = actual;

        parity_files.push(pf);
    }

    let result = if block_start < block_max {
        sync::run(state, &mut parity_files, block_start, block_end, logger, progress, autosave_path)
    } else {
        Ok(SyncReport::default())
    };

    let mut flush_errors = 0;
    for pf in parity_files {
        if pf_flush_and_close(pf).is_err() {
            flush_errors += 1;
        }
    }

    match result {
        Ok(report) if flush_errors > 0 => {
            Err(SyncError::ParitySync { source: std::io::Error::new(std::io::ErrorKind::Other, format!("{flush_errors} parity file(s) failed to flush/close")) })
        }
        other => other,
    }
}

fn pf_flush_and_close(mut pf: ParityFile) -> SyncResult<()>
{
    pf.sync().map_err(|e| SyncError::ParitySync { source: e })?;
    pf.close().map_err(|e| SyncError::ParityClose { source: e })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockState, FileEntry};
    use crate::logger::Logger;
    use crate::progress::NullProgress;
    use crate::state::{DiskSlot, State};

    fn write_disk_file(dir: &std::path::Path, name: &str, content: &[u8]) -> FileEntry
    {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        use std::os::unix::fs::MetadataExt;

        FileEntry { path, size: meta.size(), mtime_sec: meta.mtime(), mtime_nsec: meta.mtime_nsec() as i32, inode: meta.ino() }
    }

    #[test]
    fn new_block_produces_xor_parity_and_promotes_to_blk()
    {
        let dir = tempfile::tempdir().unwrap();
        let block_size = 4096u64;

        let file = write_disk_file(dir.path(), "a", &[0xAAu8; 4096]);
        let mut disk_a = DiskSlot::new("disk_a", 6);
        disk_a.files.push(file);
        disk_a.blocks[5] = Block { state: BlockState::New, file: Some(0), file_offset: 0, hash: [0; 16], hash_present: false };

        let disk_b = DiskSlot::new("disk_b", 6);

        let mut state = State::new(block_size, 1, vec![Some(disk_a), Some(disk_b)], 6);

        let parity_path = dir.path().join("parity.0");
        let mut logger = Logger::new(0, None);
        let mut progress = NullProgress;

        let report = run_sync(&mut state, &[&parity_path], 0, 0, &mut logger, &mut progress, None).unwrap();

        assert_eq!(report.errors, 0);
        assert_eq!(report.silent_errors, 0);

        let parity_bytes = std::fs::read(&parity_path).unwrap();
        let got = &parity_bytes[5 * block_size as usize..6 * block_size as usize];
        assert_eq!(got, &[0xAAu8; 4096][..]);

        assert_eq!(state.block(0, 5).state, BlockState::Blk);
        assert!(state.info[5].get_time() > 0);
    }
}
