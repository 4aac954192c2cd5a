//! State store: the persisted block map and per-block info array, plus
//! the options that configure a run. Persistence format follows the
//! teacher's own `bincode` + fixint-encoding convention (see
//! `filesys/ext2.rs::process_drive` / `filesys/detect.rs::detect_e2fs`).

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bincode::Options as _;
use serde::{Deserialize, Serialize};

use crate::block::{Block, FileEntry};
use crate::hash::HashSeeds;
use crate::info::Info;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiskSlot {
    pub name: String,
    pub files: Vec<FileEntry>,
    pub blocks: Vec<Block>,
}

impl DiskSlot {
    pub fn new(name: impl Into<String>, block_max: u64) -> Self
    {
        Self { name: name.into(), files: Vec::new(), blocks: vec![Block::empty(); block_max as usize] }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub skip_self: bool,
    pub skip_sequential: bool,
    pub skip_fallocate: bool,
    pub expect_recoverable: bool,
    /// 0 disables autosave.
    pub autosave_bytes: u64,
}

impl Default for Options {
    fn default() -> Self
    {
        Self {
            skip_self: false,
            skip_sequential: false,
            skip_fallocate: false,
            expect_recoverable: false,
            autosave_bytes: 0,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    block_size: u64,
    level: usize,
    slots: Vec<Option<DiskSlot>>,
    info: Vec<Info>,
    parity_size: Vec<u64>,
    hash_seed_legacy: u32,
    hash_seed_current: u64,
}

/// The full state the sync driver reads from and writes back to: the
/// dense per-slot block map, the per-block info array, and the options
/// for this run.
pub struct State {
    pub block_size: u64,
    pub level: usize,
    /// Dense `[0, D)`; `None` is a hole (absent disk).
    pub slots: Vec<Option<DiskSlot>>,
    pub info: Vec<Info>,
    /// Previously recorded on-disk size of each parity level, used to
    /// detect a shrunk/corrupted parity file before resizing it.
    pub parity_size: Vec<u64>,
    pub hash_seeds: HashSeeds,
    pub options: Options,
    pub need_write: bool,
}

impl State {
    pub fn new(block_size: u64, level: usize, slots: Vec<Option<DiskSlot>>, block_max: u64) -> Self
    {
        Self {
            block_size,
            level,
            slots,
            info: vec![Info::default(); block_max as usize],
            parity_size: vec![0; level],
            hash_seeds: fresh_hash_seeds(),
            options: Options::default(),
            need_write: false,
        }
    }

    pub fn ndisks(&self) -> usize
    {
        self.slots.len()
    }

    /// Required parity file length in blocks.
    pub fn block_max(&self) -> u64
    {
        self.info.len() as u64
    }

    pub fn block(&self, slot: usize, i: u64) -> &Block
    {
        match &self.slots[slot] {
            Some(disk) => &disk.blocks[i as usize],
            None => panic!("block() called on an absent slot {slot}"),
        }
    }

    pub fn set_block(&mut self, slot: usize, i: u64, b: Block)
    {
        match &mut self.slots[slot] {
            Some(disk) => disk.blocks[i as usize] = b,
            None => panic!("set_block() called on an absent slot {slot}"),
        }
    }

    pub fn file(&self, slot: usize, file_ref: u32) -> &FileEntry
    {
        &self.slots[slot].as_ref().expect("absent slot").files[file_ref as usize]
    }

    /// Persists the block map, info array, and parity sizes to `path`.
    /// Clears `need_write` on success.
    pub fn write(&mut self, path: &Path) -> io::Result<()>
    {
        let snapshot = Snapshot {
            block_size: self.block_size,
            level: self.level,
            slots: self.slots.clone(),
            info: self.info.clone(),
            parity_size: self.parity_size.clone(),
            hash_seed_legacy: self.hash_seeds.legacy,
            hash_seed_current: self.hash_seeds.current,
        };

        let bincode_opt = bincode::DefaultOptions::new().with_fixint_encoding().allow_trailing_bytes();

        let tmp_path = tmp_path_for(path);
        let file = std::fs::File::create(&tmp_path)?;
        bincode_opt
            .serialize_into(&file, &snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;

        self.need_write = false;
        Ok(())
    }

    pub fn load(path: &Path) -> io::Result<Self>
    {
        let bincode_opt = bincode::DefaultOptions::new().with_fixint_encoding().allow_trailing_bytes();

        let file = std::fs::File::open(path)?;
        let snapshot: Snapshot =
            bincode_opt.deserialize_from(&file).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        Ok(Self {
            block_size: snapshot.block_size,
            level: snapshot.level,
            slots: snapshot.slots,
            info: snapshot.info,
            parity_size: snapshot.parity_size,
            hash_seeds: HashSeeds { legacy: snapshot.hash_seed_legacy, current: snapshot.hash_seed_current },
            options: Options::default(),
            need_write: false,
        })
    }
}

fn tmp_path_for(path: &Path) -> PathBuf
{
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Generates a fresh pair of hash seeds for a brand-new content file.
/// Not cryptographic: only needs to differ run-to-run so that two
/// independently created arrays don't share a legacy/current key pair.
fn fresh_hash_seeds() -> HashSeeds
{
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64;
    let pid = std::process::id() as u64;

    HashSeeds { legacy: (nanos ^ pid) as u32, current: nanos.rotate_left(21) ^ pid.rotate_left(7) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_load_roundtrips()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content");

        let mut state = State::new(4096, 1, vec![Some(DiskSlot::new("disk0", 4))], 4);
        state.info[2] = Info::make(123, true, false);
        state.write(&path).unwrap();
        assert!(!state.need_write);

        let loaded = State::load(&path).unwrap();
        assert_eq!(loaded.hash_seeds.legacy, state.hash_seeds.legacy);
        assert_eq!(loaded.hash_seeds.current, state.hash_seeds.current);
        assert_eq!(loaded.block_size, 4096);
        assert_eq!(loaded.level, 1);
        assert_eq!(loaded.info[2].get_time(), 123);
        assert!(loaded.info[2].get_bad());
    }
}
