//! Disk handle: a thin stateful wrapper over one open data file per disk
//! slot, caching the last-opened file's identity and stat.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, MetadataExt};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

/// `{st.size, st.mtime_sec, st.mtime_nsec, st.ino}`, captured at open time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stat {
    pub size: u64,
    pub mtime_sec: i64,
    pub mtime_nsec: i32,
    pub ino: u64,
}

/// Owns at most one open `File` at a time for a single disk slot.
#[derive(Debug, Default)]
pub struct DiskHandle {
    open_path: Option<PathBuf>,
    file: Option<File>,
    stat: Stat,
}

impl DiskHandle {
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn is_open(&self) -> bool
    {
        self.file.is_some()
    }

    pub fn open_path(&self) -> Option<&Path>
    {
        self.open_path.as_deref()
    }

    pub fn stat(&self) -> Stat
    {
        self.stat
    }

    /// Opens `path` (closing whatever was previously open under a
    /// different identity is the caller's responsibility -- the driver
    /// always calls `close` itself before switching files so that a
    /// close error can be raised as fatal at the right point).
    pub fn open(&mut self, path: &Path, sequential_hint: bool) -> io::Result<()>
    {
        let file = OpenOptions::new().read(true).open(path)?;
        let meta = file.metadata()?;

        if sequential_hint {
            let _ = nix::fcntl::posix_fadvise(
                file.as_raw_fd(),
                0,
                0,
                nix::fcntl::PosixFadviseAdvice::POSIX_FADV_SEQUENTIAL,
            );
        }

        self.stat = Stat {
            size: meta.size(),
            mtime_sec: meta.mtime(),
            mtime_nsec: meta.mtime_nsec() as i32,
            ino: meta.ino(),
        };
        self.open_path = Some(path.to_path_buf());
        self.file = Some(file);

        Ok(())
    }

    /// Closes the currently open file, if any. `File`'s own `Drop` impl
    /// swallows close(2) errors, so the fd is closed explicitly via
    /// `nix::unistd::close` to let a genuine close failure propagate.
    pub fn close(&mut self) -> io::Result<()>
    {
        self.open_path = None;
        self.stat = Stat::default();

        if let Some(file) = self.file.take() {
            let fd = file.into_raw_fd();
            nix::unistd::close(fd).map_err(io::Error::from)?;
        }
        Ok(())
    }

    /// Positioned read of `buf.len()` bytes at `offset`. A short read at
    /// EOF zero-pads the remainder of `buf` rather than erroring.
    pub fn read(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>
    {
        let file = self.file.as_ref().expect("read() called on a closed handle");

        let mut total = 0;
        loop {
            match file.read_at(&mut buf[total..], offset + total as u64) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
            if total == buf.len() {
                break;
            }
        }

        if total < buf.len() {
            buf[total..].fill(0);
        }

        Ok(total)
    }
}

impl Drop for DiskHandle {
    fn drop(&mut self)
    {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_short_file_zero_pads_tail()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0x11u8; 10]).unwrap();
        drop(f);

        let mut handle = DiskHandle::new();
        handle.open(&path, false).unwrap();

        let mut buf = [0xFFu8; 16];
        let n = handle.read(0, &mut buf).unwrap();

        assert_eq!(n, 10);
        assert_eq!(&buf[..10], &[0x11u8; 10]);
        assert_eq!(&buf[10..], &[0u8; 6]);
    }

    #[test]
    fn stat_reflects_opened_file()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        std::fs::write(&path, [0u8; 4096]).unwrap();

        let mut handle = DiskHandle::new();
        handle.open(&path, true).unwrap();

        assert_eq!(handle.stat().size, 4096);
        assert!(handle.is_open());

        handle.close().unwrap();
        assert!(!handle.is_open());
    }
}
