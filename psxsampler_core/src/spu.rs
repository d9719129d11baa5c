// SPDX-License-Identifier: GPL-3.0
// spu.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use crate::params::SamplerParams;
use psx_spu::spu_ram::BlockRange;

/// This module contains the default sound chip implementation. There
/// may be others in future.
pub mod psx_spu;

/// This trait provides an implementation-opaque way of driving the SPU from
/// the sampler. Note and parameter calls carry the current parameter snapshot,
/// the SPU itself keeps no copy of it.
pub trait Spu {

    /// Writes ADPCM sample data into SPU RAM, replacing what was there.
    fn load_sample(&mut self, adpcm_data: &[u8]) -> BlockRange;

    /// Allocates a voice and starts playing a note on it.
    fn key_on(&mut self, note: u8, velocity: u8, params: &SamplerParams);

    /// Releases every voice playing this note.
    fn key_off(&mut self, note: u8);

    /// Retunes all sounding voices for a new (centred) pitch wheel position.
    fn set_pitch_bend(&mut self, bend: i16, params: &SamplerParams);

    /// Pushes a new parameter snapshot to all sounding voices.
    fn apply_params(&mut self, params: &SamplerParams);

    /// Releases every voice, as with the "all notes off" controller.
    fn release_all(&mut self);

    /// Cuts every voice immediately, as with the "all sound off" controller.
    fn silence_all(&mut self);

    /// Runs the SPU for one 44100Hz tick, returning a stereo sample.
    fn tick(&mut self) -> (i16, i16);
}
