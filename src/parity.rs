//! Parity file: a stateful handle for one parity level's flat file.
//!
//! Block `i` occupies bytes `[i*block_size, (i+1)*block_size)`. Resizing
//! prefers `posix_fallocate` over a plain `set_len` when growing, unless
//! `skip_fallocate` is set, matching the spec's "preallocation hint".

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

pub struct ParityFile {
    path: PathBuf,
    file: File,
    block_size: u64,
}

impl ParityFile {
    /// Creates or opens `path` for read/write. Returns the size the file
    /// had on disk before any resizing (used by the caller to detect a
    /// shrunk/corrupted parity file against the previously recorded size).
    pub fn create(path: &Path, block_size: u64) -> io::Result<(Self, u64)>
    {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        let existing_size = file.metadata()?.len();

        Ok((Self { path: path.to_path_buf(), file, block_size }, existing_size))
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// Resizes to exactly `new_size` bytes. Returns the resulting size.
    pub fn chsize(&mut self, new_size: u64, skip_fallocate: bool) -> io::Result<u64>
    {
        let current = self.file.metadata()?.len();

        if new_size <= current || skip_fallocate {
            self.file.set_len(new_size)?;
        } else {
            let grow_by = (new_size - current) as i64;
            let fallocated = nix::fcntl::posix_fallocate(self.file.as_raw_fd(), current as i64, grow_by);
            if fallocated.is_err() {
                self.file.set_len(new_size)?;
            }
        }

        Ok(self.file.metadata()?.len())
    }

    /// Writes one block-aligned buffer at block index `i`. `buf.len()`
    /// must equal `block_size`.
    pub fn write(&mut self, index: u64, buf: &[u8]) -> io::Result<()>
    {
        debug_assert_eq!(buf.len() as u64, self.block_size);
        self.file.write_all_at(buf, index * self.block_size)
    }

    /// Flushes to durable storage; must not return before data hits disk.
    pub fn sync(&mut self) -> io::Result<()>
    {
        self.file.sync_all()
    }

    /// Closes the file explicitly via `nix::unistd::close` rather than
    /// relying on `File`'s `Drop`, which swallows close(2) errors.
    pub fn close(self) -> io::Result<()>
    {
        let fd = self.file.into_raw_fd();
        nix::unistd::close(fd).map_err(io::Error::from)
    }
}
