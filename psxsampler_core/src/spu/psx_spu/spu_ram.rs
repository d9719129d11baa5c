// SPDX-License-Identifier: GPL-3.0
// spu_ram.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::warn;
use psxsampler_utility::min;

use super::adpcm::{
    AdpcmBlock,
    ADPCM_BLOCK_SIZE,
    ADPCM_FLAG_LOOP_END,
    ADPCM_FLAG_LOOP_START,
};
use crate::error::{Result, SamplerError};

/// SPU RAM size in bytes: this is the size that the PlayStation had.
pub const SPU_RAM_SIZE: usize = 512 * 1024;

/// The number of blocks making up the silent sample terminator.
const TERMINATOR_BLOCKS: u32 = 2;

/// A run of ADPCM blocks in SPU RAM.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub first_block: u32,
    pub block_count: u32,
}

impl BlockRange {

    /// Byte address of the first block.
    pub fn start_address(&self) -> u32 {
        self.first_block * ADPCM_BLOCK_SIZE as u32
    }

    /// Byte address just past the last block.
    pub fn end_address(&self) -> u32 {
        (self.first_block + self.block_count) * ADPCM_BLOCK_SIZE as u32
    }
}

/// This struct models the sound RAM of the SPU. It never changes size after
/// creation, and every address handed out is block aligned.
pub struct SpuRam {

    // The arena itself (heap allocated).
    bytes: Vec<u8>,

    // How many blocks the currently loaded sample occupies, starting at block 0.
    sample_block_count: u32,
}

impl SpuRam {

    /// Creates a zeroed arena of the given size. This is the only fallible step
    /// of building an SPU, and failure aborts construction.
    pub fn new(size: usize) -> Result<Self> {

        if size % ADPCM_BLOCK_SIZE != 0 || size < ADPCM_BLOCK_SIZE * TERMINATOR_BLOCKS as usize {
            return Err(SamplerError::InvalidRamSize {
                bytes: size,
                block_size: ADPCM_BLOCK_SIZE,
            });
        }

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| SamplerError::RamAllocation { bytes: size })?;
        bytes.resize(size, 0);

        Ok(SpuRam {
            bytes,
            sample_block_count: 0,
        })
    }

    /// The size of the arena in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The number of whole ADPCM blocks the arena holds.
    pub fn capacity_blocks(&self) -> u32 {
        (self.bytes.len() / ADPCM_BLOCK_SIZE) as u32
    }

    /// The number of blocks occupied by the loaded sample.
    pub fn sample_block_count(&self) -> u32 {
        self.sample_block_count
    }

    /// Gives read access to the raw arena.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes ADPCM sample data starting at block 0. Data beyond the arena is
    /// dropped and a trailing partial block is padded with zeroes. The
    /// terminator is not placed here; see `place_terminator`.
    pub fn write_sample(&mut self, adpcm_data: &[u8]) -> BlockRange {

        let data_blocks = adpcm_data.len().div_ceil(ADPCM_BLOCK_SIZE);
        let block_count = min(data_blocks, self.capacity_blocks() as usize);
        let byte_count = min(adpcm_data.len(), block_count * ADPCM_BLOCK_SIZE);

        if data_blocks > block_count {
            warn!(
                "Sample of {} blocks does not fit in SPU RAM, keeping the first {}",
                data_blocks,
                block_count
            );
        }

        self.bytes[..byte_count].copy_from_slice(&adpcm_data[..byte_count]);
        self.bytes[byte_count..block_count * ADPCM_BLOCK_SIZE].fill(0);
        self.sample_block_count = block_count as u32;

        BlockRange {
            first_block: 0,
            block_count: block_count as u32,
        }
    }

    /// Figures out which block the terminator starts at for a sample of the
    /// given length. It always fits, even if that means overwriting the tail of
    /// a sample which fills the whole arena.
    pub fn terminator_block_index_for(&self, existing_block_count: u32) -> u32 {
        min(existing_block_count, self.capacity_blocks() - TERMINATOR_BLOCKS)
    }

    /// Byte address of the terminator for the loaded sample.
    pub fn terminator_address(&self) -> u32 {
        self.terminator_block_index_for(self.sample_block_count) * ADPCM_BLOCK_SIZE as u32
    }

    /// Adds a terminator for the currently loaded sample consisting of two silent
    /// ADPCM blocks: the first flagged loop start, the second loop end. SPU voices
    /// technically never stop, so this guarantees that anything reading past the
    /// end of the sample falls into silence.
    pub fn place_terminator(&mut self) {

        let first_block = self.terminator_block_index_for(self.sample_block_count);

        if first_block < self.sample_block_count {
            warn!(
                "Sample fills SPU RAM: its last {} blocks are replaced by the terminator",
                self.sample_block_count - first_block
            );
        }

        let start = first_block as usize * ADPCM_BLOCK_SIZE;
        let terminator = &mut self.bytes[start..start + ADPCM_BLOCK_SIZE * TERMINATOR_BLOCKS as usize];

        terminator.fill(0);
        terminator[1] = ADPCM_FLAG_LOOP_START;
        terminator[ADPCM_BLOCK_SIZE + 1] = ADPCM_FLAG_LOOP_END;
    }

    /// Returns the address unchanged if it is block aligned and inside the arena,
    /// otherwise redirects it to the terminator so the read produces silence.
    pub fn sanitize_address(&self, address: u32) -> u32 {

        let in_range = (address as usize) + ADPCM_BLOCK_SIZE <= self.bytes.len();
        let aligned = address as usize % ADPCM_BLOCK_SIZE == 0;

        if in_range && aligned {
            address
        } else {
            self.terminator_address()
        }
    }

    /// Reads the block at an address, after sanitizing it.
    pub fn read_block(&self, address: u32) -> AdpcmBlock {

        let start = self.sanitize_address(address) as usize;

        AdpcmBlock::from_slice(&self.bytes[start..]).unwrap_or(AdpcmBlock::silent(ADPCM_FLAG_LOOP_END))
    }

    /// Reads the flag byte of the block at an address, after sanitizing it.
    pub fn flags_at(&self, address: u32) -> u8 {
        self.bytes[self.sanitize_address(address) as usize + 1]
    }
}

#[cfg(test)]
mod tests;
