//! Keyed content hashing, with two coexisting schemes for migration.
//!
//! `Scheme::Legacy` reuses the teacher's ext4-style crc32c construction
//! (`crc::crc32::update` keyed by a seed); `Scheme::Current` folds two
//! differently-seeded seahash passes into a wider digest. Both are pure
//! functions over a byte slice plus a 64-bit seed.

/// Fixed output width, matching the historical 128-bit digest used by
/// the on-disk block map regardless of which scheme produced it.
pub const DIGEST_LEN: usize = 16;

pub type Digest = [u8; DIGEST_LEN];

/// Which hash function produced (or should be compared against) a digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// The scheme a rehash migrates away from.
    Legacy,
    /// The scheme new content is always hashed with.
    Current,
}

/// Per-scheme keys loaded once at startup and reused for every block.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashSeeds {
    pub legacy: u32,
    pub current: u64,
}

/// Hashes `buf` under `scheme`, keyed by the matching seed in `seeds`.
pub fn digest(scheme: Scheme, seeds: &HashSeeds, buf: &[u8]) -> Digest
{
    match scheme {
        Scheme::Legacy => legacy_digest(seeds.legacy, buf),
        Scheme::Current => current_digest(seeds.current, buf),
    }
}

/// Ext4-style crc32c, keyed by `seed`, zero-padded to the common digest width.
///
/// Source construction: `crc::crc32::update(seed ^ !0, CASTAGNOLI_TABLE, buf) ^ !0`.
fn legacy_digest(seed: u32, buf: &[u8]) -> Digest
{
    let crc = crc::crc32::update(seed ^ (!0), &crc::crc32::CASTAGNOLI_TABLE, buf) ^ (!0u32);

    let mut out = [0u8; DIGEST_LEN];
    out[..4].copy_from_slice(&crc.to_le_bytes());
    out
}

/// Two independently-seeded seahash passes, concatenated into 16 bytes.
fn current_digest(seed: u64, buf: &[u8]) -> Digest
{
    let lo = seahash::hash_seeded(buf, seed, seed.rotate_left(17), !seed, seed.rotate_right(23));
    let hi = seahash::hash_seeded(
        buf,
        seed ^ 0x9E37_79B9_7F4A_7C15,
        seed.rotate_left(41),
        seed.wrapping_add(0x1234_5678),
        !seed.rotate_right(11),
    );

    let mut out = [0u8; DIGEST_LEN];
    out[..8].copy_from_slice(&lo.to_le_bytes());
    out[8..].copy_from_slice(&hi.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_digest_is_deterministic()
    {
        let seeds = HashSeeds { legacy: 0, current: 42 };
        let buf = vec![0xAAu8; 4096];

        assert_eq!(digest(Scheme::Current, &seeds, &buf), digest(Scheme::Current, &seeds, &buf));
    }

    #[test]
    fn schemes_disagree_on_the_same_buffer()
    {
        let seeds = HashSeeds { legacy: 7, current: 7 };
        let buf = vec![0x11u8; 128];

        assert_ne!(digest(Scheme::Legacy, &seeds, &buf), digest(Scheme::Current, &seeds, &buf));
    }

    #[test]
    fn content_change_changes_the_digest()
    {
        let seeds = HashSeeds { legacy: 0, current: 0 };
        let a = vec![0x00u8; 64];
        let mut b = a.clone();
        b[0] = 0x01;

        assert_ne!(digest(Scheme::Current, &seeds, &a), digest(Scheme::Current, &seeds, &b));
        assert_ne!(digest(Scheme::Legacy, &seeds, &a), digest(Scheme::Legacy, &seeds, &b));
    }
}
