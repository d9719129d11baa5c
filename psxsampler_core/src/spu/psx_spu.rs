// SPDX-License-Identifier: GPL-3.0
// psx_spu.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::info;
use psxsampler_utility::SpuInteger;

use super::Spu;
use crate::error::Result;
use crate::params::SamplerParams;
use envelope::EnvelopePhase;
use spu_ram::{BlockRange, SpuRam};
use voice::{bend_semitones, pitch_for_note, voice_volumes, Voice};

/// This module contains the ADPCM codec used for SPU sample data.
pub mod adpcm;

/// This module contains the ADSR envelope of a voice.
pub mod envelope;

/// This module contains the SPU's sound RAM.
pub mod spu_ram;

/// This module contains the hardware voices.
pub mod voice;

/// The number of hardware voices.
pub const SPU_NUM_VOICES: usize = 24;

/// The rate at which the SPU produces samples.
pub const SPU_SAMPLE_RATE: u32 = 44100;

/// Full scale for the master volume registers.
const MASTER_VOLUME_MAX: i16 = 0x3FFF;

/// A left/right pair of volume registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Volume {
    pub left: i16,
    pub right: i16,
}

/// The SPU's global mixing registers, set up once and left alone: only the
/// voices are routed to the output. Reverb gets no RAM and no volume, and
/// there is no CD audio or external input to mix in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MasterMix {
    pub master_vol: Volume,
    pub reverb_vol: Volume,
    pub ext_input_vol: Volume,
    pub unmute: bool,
    pub reverb_write_enable: bool,
    pub ext_enabled: bool,

    // Reverb work area start, in units of 8 bytes.
    pub reverb_base_addr8: u32,
}

impl MasterMix {

    /// Creates the mix register state for an SPU with the given RAM size.
    pub fn new(ram_size: usize) -> Self {
        MasterMix {
            master_vol: Volume { left: MASTER_VOLUME_MAX, right: MASTER_VOLUME_MAX },
            reverb_vol: Volume { left: 0, right: 0 },
            ext_input_vol: Volume { left: 0, right: 0 },
            unmute: true,
            reverb_write_enable: false,
            ext_enabled: false,

            // Place the reverb area at the very end of RAM, which gives it no space.
            reverb_base_addr8: (ram_size / 8) as u32 - 1,
        }
    }
}

/// This struct models the SPU (sound chip) of the PlayStation, reduced to what
/// the sampler drives: sound RAM, the 24 voices and the master mix.
pub struct PsxSpu {

    // Sound RAM holding the sample and its terminator.
    ram: SpuRam,

    // The hardware voices, addressed by index.
    voices: [Voice; SPU_NUM_VOICES],

    // Bit n is set while voice n is sounding.
    active_voices: u32,

    master: MasterMix,

    // Centred pitch wheel position, -8192 to 8191.
    pitch_bend: i16,

    // Incremented on every key on, stamped onto the voice allocated.
    timestamp_counter: u32,

    // Total SPU ticks run.
    cycle_count: u64,
}

/// Implementation functions for the SPU component itself.
impl PsxSpu {

    /// Creates a new SPU object with the correct initial state. Fails only if
    /// sound RAM can't be allocated.
    pub fn new(ram_size: usize) -> Result<Self> {

        let mut ram = SpuRam::new(ram_size)?;
        ram.place_terminator();

        info!("SPU created with {} bytes of sound RAM", ram_size);

        Ok(PsxSpu {
            ram,
            voices: [Voice::new(); SPU_NUM_VOICES],
            active_voices: 0,
            master: MasterMix::new(ram_size),
            pitch_bend: 0,
            timestamp_counter: 0,
            cycle_count: 0,
        })
    }

    pub fn ram(&self) -> &SpuRam {
        &self.ram
    }

    pub fn master(&self) -> &MasterMix {
        &self.master
    }

    pub fn voice(&self, index: usize) -> &Voice {
        &self.voices[index]
    }

    pub fn active_voices(&self) -> u32 {
        self.active_voices
    }

    pub fn pitch_bend(&self) -> i16 {
        self.pitch_bend
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Picks the voice for a new note: a free one if there is one, otherwise the
    /// quietest of those releasing, otherwise the one playing longest.
    fn allocate_voice(&self) -> usize {

        if self.active_voices != (1 << SPU_NUM_VOICES) - 1 {
            return (!self.active_voices).trailing_zeros() as usize;
        }

        let quietest_releasing = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, voice)| voice.phase() == EnvelopePhase::Release)
            .min_by_key(|(_, voice)| voice.level())
            .map(|(index, _)| index);

        quietest_releasing.unwrap_or_else(|| {
            self.voices
                .iter()
                .enumerate()
                .max_by_key(|(_, voice)| self.timestamp_counter.wrapping_sub(voice.timestamp()))
                .map_or(0, |(index, _)| index)
        })
    }

    /// The pitch a voice playing this note should have right now.
    fn pitch_for(&self, note: u8, params: &SamplerParams) -> u16 {

        let (up_range, down_range) = params.bend_ranges();
        let bend = bend_semitones(self.pitch_bend, up_range, down_range);

        pitch_for_note(note, bend, params.base_note, params.sample_rate)
    }
}

/// Implementation functions to be called from anything that understands what
/// an Spu object is.
impl Spu for PsxSpu {

    /// Loading a sample cuts all voices, as they would otherwise play whatever
    /// ends up at their current address.
    fn load_sample(&mut self, adpcm_data: &[u8]) -> BlockRange {

        self.silence_all();

        let range = self.ram.write_sample(adpcm_data);
        self.ram.place_terminator();

        info!(
            "Loaded sample of {} blocks, terminator at 0x{:05X}",
            range.block_count,
            self.ram.terminator_address()
        );

        range
    }

    fn key_on(&mut self, note: u8, velocity: u8, params: &SamplerParams) {

        let index = self.allocate_voice();
        let pitch = self.pitch_for(note, params);
        self.timestamp_counter = self.timestamp_counter.wrapping_add(1);

        let voice = &mut self.voices[index];
        voice.set_pitch(pitch);
        voice.set_volumes(voice_volumes(params.volume, params.pan, velocity));
        voice.key_on(&self.ram, note, velocity, self.timestamp_counter, &params.envelope);
        self.active_voices |= 1 << index;
    }

    fn key_off(&mut self, note: u8) {

        for voice in self.voices.iter_mut() {
            if voice.is_active() && voice.note() == note {
                voice.key_off();
            }
        }
    }

    fn set_pitch_bend(&mut self, bend: i16, params: &SamplerParams) {

        self.pitch_bend = bend;

        for index in 0..SPU_NUM_VOICES {
            if self.active_voices & (1 << index) != 0 {
                let pitch = self.pitch_for(self.voices[index].note(), params);
                self.voices[index].set_pitch(pitch);
            }
        }
    }

    fn apply_params(&mut self, params: &SamplerParams) {

        for index in 0..SPU_NUM_VOICES {
            if self.active_voices & (1 << index) != 0 {
                let pitch = self.pitch_for(self.voices[index].note(), params);
                let voice = &mut self.voices[index];
                voice.set_pitch(pitch);
                voice.set_volumes(voice_volumes(params.volume, params.pan, voice.velocity()));
                voice.set_envelope_params(&params.envelope);
            }
        }
    }

    fn release_all(&mut self) {

        for voice in self.voices.iter_mut() {
            voice.key_off();
        }
    }

    fn silence_all(&mut self) {

        for voice in self.voices.iter_mut() {
            voice.stop();
        }
        self.active_voices = 0;
    }

    fn tick(&mut self) -> (i16, i16) {

        self.cycle_count += 1;

        let mut left = 0_i32;
        let mut right = 0_i32;
        let mut remaining = self.active_voices;

        while remaining != 0 {
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;

            let voice = &mut self.voices[index];
            let (voice_left, voice_right) = voice.tick(&self.ram);
            left += voice_left;
            right += voice_right;

            if !voice.is_active() {
                self.active_voices &= !(1 << index);
            }
        }

        if !self.master.unmute {
            return (0, 0);
        }

        let left = (left.saturate_i16() as i32 * self.master.master_vol.left as i32) >> 14;
        let right = (right.saturate_i16() as i32 * self.master.master_vol.right as i32) >> 14;

        (left.saturate_i16(), right.saturate_i16())
    }
}
