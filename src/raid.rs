//! RAID codec: pure erasure-coding transform over in-memory block buffers.
//!
//! `ndata` data buffers are encoded into `nparity` parity buffers such that
//! any `nparity` of the `ndata + nparity` buffers can be lost and
//! reconstructed from the rest. Built on `reed-solomon-erasure`'s GF(2^8)
//! implementation, the same family of crate this corpus reaches for
//! elsewhere in the pack for shard-based erasure coding.

use reed_solomon_erasure::galois_8::ReedSolomon;

#[derive(Debug, thiserror::Error)]
pub enum RaidError {
    #[error("invalid raid geometry: {0}")]
    Geometry(#[from] reed_solomon_erasure::Error),
}

/// A codec fixed to one `(ndata, nparity)` geometry, reused across every
/// block index of a run.
pub struct RaidCodec {
    ndata: usize,
    nparity: usize,
    inner: ReedSolomon,
}

impl RaidCodec {
    pub fn new(ndata: usize, nparity: usize) -> Result<Self, RaidError>
    {
        Ok(Self { ndata, nparity, inner: ReedSolomon::new(ndata, nparity)? })
    }

    pub fn ndata(&self) -> usize
    {
        self.ndata
    }

    pub fn nparity(&self) -> usize
    {
        self.nparity
    }

    /// Fills `buffers[ndata..ndata+nparity]` from `buffers[0..ndata]`.
    /// `buffers` must have exactly `ndata + nparity` entries, all of the
    /// same length (`block_size`).
    pub fn par(&self, buffers: &mut [Vec<u8>]) -> Result<(), RaidError>
    {
        debug_assert_eq!(buffers.len(), self.ndata + self.nparity);
        self.inner.encode(buffers)?;
        Ok(())
    }

    /// Reconstructs any missing (`None`) shards in place. Used by tests
    /// to verify P1 (parity correctness / recoverability), not by the
    /// sync driver itself (reconstruction is a different command).
    pub fn recover(&self, shards: &mut [Option<Vec<u8>>]) -> Result<(), RaidError>
    {
        debug_assert_eq!(shards.len(), self.ndata + self.nparity);
        self.inner.reconstruct(shards)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_parity_for_single_level()
    {
        let codec = RaidCodec::new(2, 1).unwrap();
        let mut buffers = vec![vec![0xAAu8; 8], vec![0x00u8; 8], vec![0u8; 8]];

        codec.par(&mut buffers).unwrap();

        assert_eq!(buffers[2], vec![0xAAu8; 8]);
    }

    #[test]
    fn recovers_any_k_missing_shards()
    {
        let codec = RaidCodec::new(4, 2).unwrap();
        let mut buffers: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8; 16]).chain([vec![0u8; 16]; 2]).collect();

        codec.par(&mut buffers).unwrap();

        let mut shards: Vec<Option<Vec<u8>>> = buffers.iter().cloned().map(Some).collect();
        shards[0] = None;
        shards[3] = None;

        codec.recover(&mut shards).unwrap();

        for (i, shard) in shards.iter().enumerate().take(4) {
            assert_eq!(shard.as_ref().unwrap(), &buffers[i]);
        }
    }
}
