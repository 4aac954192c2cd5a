//! Per-global-block metadata: last parity update time, bad flag, rehash flag.
//!
//! Packed into a single `u64` the way the teacher packs its ext2 feature
//! flags into a newtype around the raw integer (see `filesys/ext2.rs`).

use serde::{Deserialize, Serialize};

const BAD_BIT: u64 = 1 << 0;
const REHASH_BIT: u64 = 1 << 1;
const TIME_SHIFT: u32 = 2;

/// `{ time, bad, rehash }`, packed as `time << 2 | rehash << 1 | bad`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info(u64);

impl Info {
    pub fn make(time: i64, bad: bool, rehash: bool) -> Self
    {
        let mut word = (time as u64) << TIME_SHIFT;
        if bad {
            word |= BAD_BIT;
        }
        if rehash {
            word |= REHASH_BIT;
        }
        Self(word)
    }

    /// Returns a copy with `bad` forced on, timestamp preserved, rehash cleared.
    #[must_use]
    pub fn set_bad(self) -> Self
    {
        Self((self.0 & !REHASH_BIT) | BAD_BIT)
    }

    pub fn get_bad(&self) -> bool
    {
        self.0 & BAD_BIT != 0
    }

    pub fn get_rehash(&self) -> bool
    {
        self.0 & REHASH_BIT != 0
    }

    pub fn get_time(&self) -> i64
    {
        (self.0 >> TIME_SHIFT) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::Info;

    #[test]
    fn roundtrips_time_bad_rehash()
    {
        let info = Info::make(1_700_000_000, true, true);

        assert_eq!(info.get_time(), 1_700_000_000);
        assert!(info.get_bad());
        assert!(info.get_rehash());
    }

    #[test]
    fn set_bad_preserves_time_and_clears_rehash()
    {
        let info = Info::make(42, false, true);
        let bad = info.set_bad();

        assert_eq!(bad.get_time(), 42);
        assert!(bad.get_bad());
        assert!(!bad.get_rehash());
    }

    #[test]
    fn default_is_all_zero()
    {
        let info = Info::default();

        assert_eq!(info.get_time(), 0);
        assert!(!info.get_bad());
        assert!(!info.get_rehash());
    }
}
