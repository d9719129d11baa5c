// SPDX-License-Identifier: GPL-3.0
// adpcm.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use psxsampler_utility::SpuInteger;

/// The size in bytes of one ADPCM block.
pub const ADPCM_BLOCK_SIZE: usize = 16;

/// The number of PCM samples encoded by one ADPCM block.
pub const ADPCM_SAMPLES_PER_BLOCK: usize = 28;

/// Flag byte bit: jump to the repeat address once this block finishes.
pub const ADPCM_FLAG_LOOP_END: u8 = 0x01;

/// Flag byte bit: keep playing after a loop end. Without it the voice is silenced.
pub const ADPCM_FLAG_REPEAT: u8 = 0x02;

/// Flag byte bit: this block becomes the voice's repeat address.
pub const ADPCM_FLAG_LOOP_START: u8 = 0x04;

/// Number of prediction filters the hardware implements.
const NUM_FILTERS: usize = 5;

/// Largest meaningful shift value. Bigger ones behave as 9 on the real SPU.
const MAX_SHIFT: i32 = 12;

// Prediction filter coefficients, in 1/64ths, for the previous sample and the
// one before that respectively.
const FILTER_POS: [i32; NUM_FILTERS] = [0, 60, 115, 98, 122];
const FILTER_NEG: [i32; NUM_FILTERS] = [0, 0, -52, -55, -60];

/// The two previously decoded samples, which the prediction filters use.
/// Carried from one block to the next for the lifetime of a note.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AdpcmHistory {
    pub old: i16,
    pub older: i16,
}

/// One 16-byte unit of compressed sample data as laid out in SPU RAM.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdpcmBlock {
    bytes: [u8; ADPCM_BLOCK_SIZE],
}

/// Loop points of a PCM sample, in samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoopPoints {
    pub start_sample: usize,
    pub end_sample: usize,
}

/// Informational description of ADPCM sample data, matching the read-only
/// parameters the host displays.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleInfo {
    pub length_in_samples: u32,
    pub length_in_blocks: u32,
    pub loop_start_sample: u32,
    pub loop_end_sample: u32,
}

impl AdpcmBlock {

    /// Creates a block from its raw bytes.
    pub fn new(bytes: [u8; ADPCM_BLOCK_SIZE]) -> Self {
        AdpcmBlock { bytes }
    }

    /// Creates a block which decodes to silence and carries the given flags.
    pub fn silent(flags: u8) -> Self {

        let mut bytes = [0; ADPCM_BLOCK_SIZE];
        bytes[1] = flags;

        AdpcmBlock { bytes }
    }

    /// Creates a block from the first 16 bytes of a slice, if there are enough.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; ADPCM_BLOCK_SIZE] = bytes.get(..ADPCM_BLOCK_SIZE)?.try_into().ok()?;
        Some(AdpcmBlock { bytes })
    }

    /// Returns the raw bytes of this block.
    pub fn as_bytes(&self) -> &[u8; ADPCM_BLOCK_SIZE] {
        &self.bytes
    }

    /// Returns the effective shift amount from the low header nibble.
    pub fn shift(&self) -> i32 {

        let shift = (self.bytes[0] & 0xF) as i32;

        if shift > MAX_SHIFT {
            9
        } else {
            shift
        }
    }

    /// Returns the effective prediction filter from header bits 4-6.
    pub fn filter(&self) -> usize {
        (((self.bytes[0] >> 4) & 0x7) as usize).min(NUM_FILTERS - 1)
    }

    /// Returns the flag byte.
    pub fn flags(&self) -> u8 {
        self.bytes[1]
    }

    pub fn is_loop_start(&self) -> bool {
        self.flags() & ADPCM_FLAG_LOOP_START != 0
    }

    pub fn is_loop_end(&self) -> bool {
        self.flags() & ADPCM_FLAG_LOOP_END != 0
    }

    pub fn is_repeat(&self) -> bool {
        self.flags() & ADPCM_FLAG_REPEAT != 0
    }

    /// Returns the sign-extended 4-bit residual for a sample index (0-27).
    /// Samples are packed low nibble first.
    pub fn nibble(&self, index: usize) -> i32 {

        let byte = self.bytes[2 + index / 2] as i32;
        let raw = if index & 1 == 0 { byte } else { byte >> 4 };

        raw.sign_extend(3)
    }
}

/// Decodes one block into 28 PCM samples, updating the predictor history in
/// place. This follows the console's integer arithmetic exactly.
pub fn decode_block(
    block: &AdpcmBlock,
    history: &mut AdpcmHistory,
    output: &mut [i16; ADPCM_SAMPLES_PER_BLOCK]
) {

    let shift = block.shift();
    let filter = block.filter();

    for (index, out) in output.iter_mut().enumerate() {

        let residual = (block.nibble(index) << 12) >> shift;
        let sample = (residual + predict(history, filter)).saturate_i16();

        history.older = history.old;
        history.old = sample;
        *out = sample;
    }
}

/// The prediction the given filter makes from the decoder history.
#[inline(always)]
fn predict(history: &AdpcmHistory, filter: usize) -> i32 {
    (history.old as i32 * FILTER_POS[filter] + history.older as i32 * FILTER_NEG[filter] + 32) >> 6
}

/// Encodes 16-bit PCM into ADPCM blocks. Every block tries all filter and shift
/// combinations and keeps the one with the least squared error, tracking the
/// decoder's own state so prediction stays in lockstep with playback.
///
/// With loop points the loop start block gets the loop start flag, and encoding
/// stops at the block holding the loop end, which gets loop end and repeat.
/// Without them the last block gets loop end only, so playback goes silent.
/// Empty input encodes to a single silent loop end block.
pub fn encode_samples(samples: &[i16], loop_points: Option<LoopPoints>) -> Vec<u8> {

    if samples.is_empty() {
        return AdpcmBlock::silent(ADPCM_FLAG_LOOP_END).as_bytes().to_vec();
    }

    let mut num_blocks = samples.len().div_ceil(ADPCM_SAMPLES_PER_BLOCK);

    let loop_start_block = loop_points.map(|points| {

        // Loop points past the data are pulled back inside it.
        let end_block = points.end_sample.div_ceil(ADPCM_SAMPLES_PER_BLOCK).clamp(1, num_blocks);
        num_blocks = end_block;

        (points.start_sample / ADPCM_SAMPLES_PER_BLOCK).min(end_block - 1)
    });

    let mut encoded = Vec::with_capacity(num_blocks * ADPCM_BLOCK_SIZE);
    let mut history = AdpcmHistory::default();

    for block_index in 0..num_blocks {

        // Gather this block's samples, padding the final one with silence.
        let mut block_samples = [0_i16; ADPCM_SAMPLES_PER_BLOCK];
        let first_sample = block_index * ADPCM_SAMPLES_PER_BLOCK;
        let available = &samples[first_sample.min(samples.len())..];
        let count = available.len().min(ADPCM_SAMPLES_PER_BLOCK);
        block_samples[..count].copy_from_slice(&available[..count]);

        let mut flags = 0;

        if loop_start_block == Some(block_index) {
            flags |= ADPCM_FLAG_LOOP_START;
        }

        if block_index == num_blocks - 1 {
            flags |= ADPCM_FLAG_LOOP_END;

            if loop_start_block.is_some() {
                flags |= ADPCM_FLAG_REPEAT;
            }
        }

        let block = encode_block(&block_samples, &mut history, flags);
        encoded.extend_from_slice(block.as_bytes());
    }

    encoded
}

/// Encodes one block of 28 samples, leaving the history as the decoder will
/// have it after decoding the result.
pub fn encode_block(
    samples: &[i16; ADPCM_SAMPLES_PER_BLOCK],
    history: &mut AdpcmHistory,
    flags: u8
) -> AdpcmBlock {

    let mut best_error = i64::MAX;
    let mut best_header = 0_u8;
    let mut best_nibbles = [0_u8; ADPCM_SAMPLES_PER_BLOCK];
    let mut best_history = *history;

    for filter in 0..NUM_FILTERS {
        for shift in 0..=MAX_SHIFT {

            let mut trial_history = *history;
            let mut nibbles = [0_u8; ADPCM_SAMPLES_PER_BLOCK];
            let mut total_error = 0_i64;

            for (nibble_out, &target) in nibbles.iter_mut().zip(samples.iter()) {

                let prediction = predict(&trial_history, filter);

                // Invert the decoder's (nibble << 12) >> shift, rounding to nearest.
                let residual = target as i32 - prediction;
                let nibble = (((residual << shift) + (1 << 11)) >> 12).clamp(-8, 7);

                let decoded = (((nibble << 12) >> shift) + prediction).saturate_i16();
                let error = (target as i64) - (decoded as i64);
                total_error += error * error;

                trial_history.older = trial_history.old;
                trial_history.old = decoded;
                *nibble_out = (nibble & 0xF) as u8;
            }

            if total_error < best_error {
                best_error = total_error;
                best_header = ((filter as u8) << 4) | shift as u8;
                best_nibbles = nibbles;
                best_history = trial_history;
            }
        }
    }

    let mut bytes = [0_u8; ADPCM_BLOCK_SIZE];
    bytes[0] = best_header;
    bytes[1] = flags;

    for (byte, pair) in bytes[2..].iter_mut().zip(best_nibbles.chunks_exact(2)) {
        *byte = pair[0] | (pair[1] << 4);
    }

    *history = best_history;
    AdpcmBlock::new(bytes)
}

/// Describes ADPCM data the way the sample info display does: loop start is
/// the first block flagged loop start, loop end the end of the first block
/// flagged loop end (or the end of the data when there is none).
pub fn scan_sample_info(adpcm_data: &[u8]) -> SampleInfo {

    let length_in_blocks = (adpcm_data.len() / ADPCM_BLOCK_SIZE) as u32;
    let length_in_samples = length_in_blocks * ADPCM_SAMPLES_PER_BLOCK as u32;

    let mut loop_start_sample = None;
    let mut loop_end_sample = None;

    for (index, chunk) in adpcm_data.chunks_exact(ADPCM_BLOCK_SIZE).enumerate() {

        let flags = chunk[1];
        let block_start_sample = (index * ADPCM_SAMPLES_PER_BLOCK) as u32;

        if loop_start_sample.is_none() && flags & ADPCM_FLAG_LOOP_START != 0 {
            loop_start_sample = Some(block_start_sample);
        }

        if flags & ADPCM_FLAG_LOOP_END != 0 {
            loop_end_sample = Some(block_start_sample + ADPCM_SAMPLES_PER_BLOCK as u32);
            break;
        }
    }

    SampleInfo {
        length_in_samples,
        length_in_blocks,
        loop_start_sample: loop_start_sample.unwrap_or(0),
        loop_end_sample: loop_end_sample.unwrap_or(length_in_samples),
    }
}

#[cfg(test)]
mod tests;
