// SPDX-License-Identifier: GPL-3.0
// sampler.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use crate::error::Result;
use crate::events::SamplerEvent;
use crate::params::{ParamId, SamplerParams};
use crate::spu::psx_spu::adpcm::SampleInfo;
use crate::vag::VagFile;

/// This module contains the default sampler implementation, built on the
/// PlayStation SPU.
pub mod psx_sampler;

/// This trait is the control thread's view of the sampler: everything here may
/// be called from a thread other than the one processing audio, and takes
/// effect no later than the start of the next block.
pub trait SamplerControl {

    /// Sets a single host parameter. Invalid values are rejected and leave the
    /// sampler as it was.
    fn set_param(&self, id: ParamId, value: f64) -> Result<()>;

    /// Reads a single host parameter.
    fn param(&self, id: ParamId) -> f64;

    /// Returns a copy of the whole parameter snapshot.
    fn params(&self) -> SamplerParams;

    /// Runs an edit of several parameters as one change: audio processing sees
    /// either none of it or all of it. If the result fails validation, nothing
    /// is changed.
    fn update_params(&self, update: &mut dyn FnMut(&mut SamplerParams)) -> Result<()>;

    /// Sets the pitch wheel range, in semitones.
    fn set_pitch_bend_range(&self, semitones: f64) -> Result<()>;

    /// Queues a note from the on-screen keyboard, to be played at the start of
    /// the next block. Returns false if the queue was full and it was dropped.
    fn queue_event(&self, event: SamplerEvent) -> bool;

    /// Replaces the sample in SPU RAM with raw ADPCM data.
    fn load_adpcm_sample(&self, adpcm_data: &[u8]) -> Result<SampleInfo>;

    /// Replaces the sample in SPU RAM with the contents of a .vag file, taking
    /// on its sample rate as well.
    fn load_vag(&self, vag: &VagFile) -> Result<SampleInfo>;
}
