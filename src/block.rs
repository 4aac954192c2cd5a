//! Block records: the per-`(slot, index)` lifecycle state plus payload.
//!
//! A block holds a back-reference to the file it belongs to. Following
//! the teacher's "cyclic references" note (§9 of the spec), files live
//! in an arena owned by the disk and are referenced by index, not by
//! pointer.

use serde::{Deserialize, Serialize};

use crate::hash::Digest;

/// One data file tracked on a disk. Multiple blocks may reference the
/// same file (large files span several blocks).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: std::path::PathBuf,
    pub size: u64,
    pub mtime_sec: i64,
    pub mtime_nsec: i32,
    pub inode: u64,
}

/// Index into a disk's `FileEntry` arena.
pub type FileRef = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    Empty,
    Blk,
    Chg,
    New,
    Deleted,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub state: BlockState,
    /// Absent for EMPTY and DELETED (DELETED is a ghost: no live file).
    pub file: Option<FileRef>,
    /// Byte offset within `file` where this block's content starts.
    pub file_offset: u64,
    pub hash: Digest,
    /// Whether `hash` holds a meaningful value at all (vs. all-zero default).
    pub hash_present: bool,
}

impl Block {
    pub fn empty() -> Self
    {
        Self {
            state: BlockState::Empty,
            file: None,
            file_offset: 0,
            hash: [0u8; crate::hash::DIGEST_LEN],
            hash_present: false,
        }
    }

    pub fn has_file(&self) -> bool
    {
        matches!(self.state, BlockState::Blk | BlockState::Chg | BlockState::New)
    }

    pub fn has_invalid_parity(&self, bad: bool) -> bool
    {
        bad || matches!(self.state, BlockState::Chg | BlockState::New | BlockState::Deleted)
    }

    pub fn has_same_presence(&self) -> bool
    {
        matches!(self.state, BlockState::Blk | BlockState::Chg)
    }

    pub fn has_updated_hash(&self) -> bool
    {
        self.state == BlockState::Blk
    }

    pub fn has_any_hash(&self) -> bool
    {
        self.hash_present
    }
}

impl Default for Block {
    fn default() -> Self
    {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with(state: BlockState) -> Block
    {
        Block { state, file: Some(0), file_offset: 0, hash: [0; 16], hash_present: false }
    }

    #[test]
    fn has_file_matches_blk_chg_new_only()
    {
        assert!(block_with(BlockState::Blk).has_file());
        assert!(block_with(BlockState::Chg).has_file());
        assert!(block_with(BlockState::New).has_file());
        assert!(!block_with(BlockState::Empty).has_file());
        assert!(!block_with(BlockState::Deleted).has_file());
    }

    #[test]
    fn invalid_parity_follows_state_or_bad_flag()
    {
        assert!(!block_with(BlockState::Blk).has_invalid_parity(false));
        assert!(block_with(BlockState::Blk).has_invalid_parity(true));
        assert!(block_with(BlockState::Chg).has_invalid_parity(false));
        assert!(block_with(BlockState::New).has_invalid_parity(false));
        assert!(block_with(BlockState::Deleted).has_invalid_parity(false));
    }

    #[test]
    fn same_presence_only_for_blk_and_chg()
    {
        assert!(block_with(BlockState::Blk).has_same_presence());
        assert!(block_with(BlockState::Chg).has_same_presence());
        assert!(!block_with(BlockState::New).has_same_presence());
        assert!(!block_with(BlockState::Deleted).has_same_presence());
    }

    #[test]
    fn updated_hash_only_for_blk()
    {
        assert!(block_with(BlockState::Blk).has_updated_hash());
        assert!(!block_with(BlockState::Chg).has_updated_hash());
    }
}
