//! The sync driver: the core of the engine. Walks `[block_start, block_end)`,
//! reads every present slot's block, reconciles hashes, recomputes parity
//! for any block whose presence or content changed, and updates the info
//! array. See spec §4.1 for the per-index algorithm this mirrors closely.

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::block::{Block, BlockState};
use crate::disk::DiskHandle;
use crate::error::{SyncError, SyncResult};
use crate::hash::{self, Digest, Scheme};
use crate::logger::Logger;
use crate::parity::ParityFile;
use crate::progress::ProgressReporter;
use crate::raid::RaidCodec;
use crate::state::State;

/// Counts and outcome of one driver run. Not itself a pass/fail verdict:
/// use `is_success` with the run's `expect_recoverable` option.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncReport {
    pub errors: u64,
    pub silent_errors: u64,
    pub bytes_read: u64,
    pub countpos: u64,
    pub aborted: bool,
}

impl SyncReport {
    /// Normal mode: success iff no errors at all. Under `expect_recoverable`
    /// (§4.1/§7) the sense is inverted: the caller asserts errors *should*
    /// have occurred, so success means at least one did.
    pub fn is_success(&self, expect_recoverable: bool) -> bool
    {
        let had_errors = self.errors + self.silent_errors > 0;
        if expect_recoverable {
            had_errors
        } else {
            !had_errors
        }
    }
}

fn now_secs() -> i64
{
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

/// Per-slot rehash staging: the new-scheme digest computed this index,
/// committed to the block only if the index's parity ends up rewritten.
type Rehandle = Vec<Option<Digest>>;

/// Runs the driver over `[block_start, block_end)`. `autosave_path`, if
/// given, is where periodic snapshots of `state` are written; passing
/// `None` disables autosave regardless of `state.options.autosave_bytes`.
pub fn run(
    state: &mut State,
    parity: &mut [ParityFile],
    block_start: u64,
    block_end: u64,
    logger: &mut Logger,
    progress: &mut dyn ProgressReporter,
    autosave_path: Option<&Path>,
) -> SyncResult<SyncReport>
{
    let ndisks = state.ndisks();
    let nparity = state.level;
    debug_assert_eq!(parity.len(), nparity);

    let codec = RaidCodec::new(ndisks, nparity)?;

    let mut handles: Vec<Option<DiskHandle>> =
        state.slots.iter().map(|s| s.as_ref().map(|_| DiskHandle::new())).collect();

    let mut buffers: Vec<Vec<u8>> = vec![vec![0u8; state.block_size as usize]; ndisks + nparity];
    if !state.options.skip_self {
        self_test(&mut buffers)?;
    }

    let mut rehandle: Rehandle = vec![None; ndisks];

    let work_blocks = count_work_blocks(state, block_start, block_end);
    let autosave_stride = match autosave_path {
        Some(_) if state.options.autosave_bytes > 0 => {
            (state.options.autosave_bytes / (ndisks as u64 * state.block_size)).max(1)
        }
        _ => 0,
    };

    let mut report = SyncReport::default();
    let mut done_since_last = 0u64;

    for i in block_start..block_end {
        let info = state.info[i as usize];
        let bad = info.get_bad();

        let one_valid = (0..ndisks).any(|j| state.slots[j].is_some() && state.block(j, i).has_file());
        let one_invalid =
            (0..ndisks).any(|j| state.slots[j].is_some() && state.block(j, i).has_invalid_parity(bad));

        if !(one_valid && one_invalid) {
            for j in 0..ndisks {
                if state.slots[j].is_some() && state.block(j, i).state == BlockState::Deleted {
                    state.set_block(j, i, Block::empty());
                    state.need_write = true;
                }
            }
            continue;
        }

        let rehash = info.get_rehash();
        let mut parity_needs_update = bad;
        let mut error_on_this_block = false;
        let mut silent_error_on_this_block = false;

        for j in 0..ndisks {
            rehandle[j] = None;

            if state.slots[j].is_none() {
                buffers[j].fill(0);
                continue;
            }

            let b = state.block(j, i).clone();
            let disk_name = state.slots[j].as_ref().unwrap().name.clone();

            if !b.has_same_presence() {
                parity_needs_update = true;
            }

            if !b.has_file() {
                buffers[j].fill(0);
                continue;
            }

            let file_entry = state.file(j, b.file.expect("has_file() implies a file ref")).clone();
            let handle = handles[j].as_mut().expect("present slot has a handle");

            if handle.is_open() && handle.open_path() != Some(file_entry.path.as_path()) {
                handle
                    .close()
                    .map_err(|e| SyncError::Close { path: file_entry.path.clone(), source: e })?;
            }

            match handle.open(&file_entry.path, !state.options.skip_sequential) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    logger.block_error(i, &disk_name, &file_entry.path.to_string_lossy(), "missing file");
                    report.errors += 1;
                    error_on_this_block = true;
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    logger.block_error(i, &disk_name, &file_entry.path.to_string_lossy(), "no access");
                    report.errors += 1;
                    error_on_this_block = true;
                    continue;
                }
                Err(e) => return Err(SyncError::Open { path: file_entry.path.clone(), source: e }),
            }

            let stat = handle.stat();
            if stat.size != file_entry.size
                || stat.mtime_sec != file_entry.mtime_sec
                || stat.mtime_nsec != file_entry.mtime_nsec
                || stat.ino != file_entry.inode
            {
                logger.block_error(i, &disk_name, &file_entry.path.to_string_lossy(), "unexpected change during sync");
                report.errors += 1;
                error_on_this_block = true;
                continue;
            }

            handle
                .read(b.file_offset, &mut buffers[j])
                .map_err(|e| SyncError::Read { path: file_entry.path.clone(), source: e })?;
            report.bytes_read += state.block_size;

            let compare_hash = if rehash {
                let old_hash = hash::digest(Scheme::Legacy, &state.hash_seeds, &buffers[j]);
                let new_hash = hash::digest(Scheme::Current, &state.hash_seeds, &buffers[j]);
                rehandle[j] = Some(new_hash);
                old_hash
            } else {
                hash::digest(Scheme::Current, &state.hash_seeds, &buffers[j])
            };

            if b.has_updated_hash() {
                if b.hash != compare_hash {
                    logger.block_error(i, &disk_name, &file_entry.path.to_string_lossy(), "data error");
                    report.silent_errors += 1;
                    silent_error_on_this_block = true;
                    continue;
                }
            } else {
                if !parity_needs_update && (!b.has_any_hash() || b.hash != compare_hash) {
                    parity_needs_update = true;
                }

                let mut updated = b.clone();
                updated.hash = compare_hash;
                updated.hash_present = true;
                state.set_block(j, i, updated);
            }
        }

        if !error_on_this_block && !silent_error_on_this_block {
            if parity_needs_update {
                codec.par(&mut buffers)?;
                for l in 0..nparity {
                    parity[l].write(i, &buffers[ndisks + l]).map_err(|e| {
                        logger.parity_error(i, l);
                        SyncError::ParityWrite { index: i, level: l, source: e }
                    })?;
                }
            }

            for j in 0..ndisks {
                if state.slots[j].is_none() {
                    continue;
                }
                let b = state.block(j, i).clone();
                match b.state {
                    BlockState::Empty => {}
                    BlockState::Deleted => state.set_block(j, i, Block::empty()),
                    _ => {
                        let mut promoted = b;
                        promoted.state = BlockState::Blk;
                        state.set_block(j, i, promoted);
                    }
                }
            }

            if parity_needs_update {
                if rehash {
                    for j in 0..ndisks {
                        if let Some(new_hash) = rehandle[j] {
                            let mut b = state.block(j, i).clone();
                            b.hash = new_hash;
                            b.hash_present = true;
                            state.set_block(j, i, b);
                        }
                    }
                }
                state.info[i as usize] = crate::info::Info::make(now_secs(), false, false);
            }
        } else if silent_error_on_this_block {
            state.info[i as usize] = state.info[i as usize].set_bad();
        }

        state.need_write = true;
        report.countpos += 1;
        done_since_last += 1;

        if !progress.on_progress(report.countpos, work_blocks) {
            report.aborted = true;
            break;
        }

        let remaining = work_blocks.saturating_sub(report.countpos);
        if autosave_stride > 0 && done_since_last >= autosave_stride && remaining >= autosave_stride {
            progress.on_pause();
            state.write(autosave_path.expect("autosave_stride > 0 implies a path")).map_err(|e| {
                SyncError::StateWrite { source: e }
            })?;
            progress.on_resume();
            done_since_last = 0;
        }
    }

    let mut close_errors = 0u64;
    for handle in handles.iter_mut().flatten() {
        if handle.close().is_err() {
            close_errors += 1;
        }
    }
    report.errors += close_errors;

    logger.summary(report.errors, report.silent_errors, report.is_success(state.options.expect_recoverable));

    Ok(report)
}

/// First pass: counts indices with at least one present file and at
/// least one slot with invalid parity. Drives progress totals and the
/// autosave stride.
fn count_work_blocks(state: &State, block_start: u64, block_end: u64) -> u64
{
    let ndisks = state.ndisks();
    let mut count = 0u64;

    for i in block_start..block_end {
        let bad = state.info[i as usize].get_bad();
        let one_valid = (0..ndisks).any(|j| state.slots[j].is_some() && state.block(j, i).has_file());
        let one_invalid =
            (0..ndisks).any(|j| state.slots[j].is_some() && state.block(j, i).has_invalid_parity(bad));

        if one_valid && one_invalid {
            count += 1;
        }
    }

    count
}

/// Known-value write-and-verify pass across all `D+K` buffers, run once
/// at setup unless `skip_self` is set. A mismatch indicates corrupted
/// or non-addressable memory and is a fatal setup error.
fn self_test(buffers: &mut [Vec<u8>]) -> SyncResult<()>
{
    fn pattern(index: usize) -> u8
    {
        (index as u8).wrapping_mul(0x5B).wrapping_add(0x07)
    }

    for (index, buf) in buffers.iter_mut().enumerate() {
        buf.fill(pattern(index));
    }

    for (index, buf) in buffers.iter().enumerate() {
        if buf.iter().any(|&b| b != pattern(index)) {
            return Err(SyncError::SelfTestFailed { index });
        }
    }

    for buf in buffers.iter_mut() {
        buf.fill(0);
    }

    Ok(())
}
