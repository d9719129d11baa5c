// SPDX-License-Identifier: GPL-3.0
// params.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::warn;
use psxsampler_utility::min;

use crate::error::{Result, SamplerError};
use crate::spu::psx_spu::adpcm::SampleInfo;
use crate::spu::psx_spu::envelope::EnvelopeParams;

/// The largest pitch wheel range, in semitones, for both the pitch step limits
/// and the wheel range itself.
pub const MAX_PITCH_BEND_RANGE: u8 = 36;

/// The host-visible parameters of the sampler, in the order the host lists them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamId {
    SampleRate,
    BaseNote,
    LengthInSamples,
    LengthInBlocks,
    LoopStartSample,
    LoopEndSample,
    Volume,
    Pan,
    PitchstepUp,
    PitchstepDown,
    AttackStep,
    AttackShift,
    AttackIsExp,
    DecayShift,
    SustainLevel,
    SustainStep,
    SustainShift,
    SustainDec,
    SustainIsExp,
    ReleaseShift,
    ReleaseIsExp,
}

/// The inclusive range a parameter accepts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {

    const fn new(min: f64, max: f64) -> Self {
        ParamRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

const INT_RANGE: ParamRange = ParamRange::new(0.0, i32::MAX as f64);
const MIDI_RANGE: ParamRange = ParamRange::new(0.0, 127.0);
const FLAG_RANGE: ParamRange = ParamRange::new(0.0, 1.0);
const STEP_RANGE: ParamRange = ParamRange::new(0.0, 3.0);
const SHIFT_RANGE: ParamRange = ParamRange::new(0.0, 31.0);
const NIBBLE_RANGE: ParamRange = ParamRange::new(0.0, 15.0);
const BEND_RANGE: ParamRange = ParamRange::new(0.0, MAX_PITCH_BEND_RANGE as f64);

impl ParamId {

    /// Every parameter, in host order.
    pub const ALL: [ParamId; 21] = [
        ParamId::SampleRate,
        ParamId::BaseNote,
        ParamId::LengthInSamples,
        ParamId::LengthInBlocks,
        ParamId::LoopStartSample,
        ParamId::LoopEndSample,
        ParamId::Volume,
        ParamId::Pan,
        ParamId::PitchstepUp,
        ParamId::PitchstepDown,
        ParamId::AttackStep,
        ParamId::AttackShift,
        ParamId::AttackIsExp,
        ParamId::DecayShift,
        ParamId::SustainLevel,
        ParamId::SustainStep,
        ParamId::SustainShift,
        ParamId::SustainDec,
        ParamId::SustainIsExp,
        ParamId::ReleaseShift,
        ParamId::ReleaseIsExp,
    ];

    /// The name the host displays.
    pub fn name(self) -> &'static str {
        match self {
            ParamId::SampleRate => "sampleRate",
            ParamId::BaseNote => "baseNote",
            ParamId::LengthInSamples => "lengthInSamples",
            ParamId::LengthInBlocks => "lengthInBlocks",
            ParamId::LoopStartSample => "loopStartSample",
            ParamId::LoopEndSample => "loopEndSample",
            ParamId::Volume => "volume",
            ParamId::Pan => "pan",
            ParamId::PitchstepUp => "pitchstepUp",
            ParamId::PitchstepDown => "pitchstepDown",
            ParamId::AttackStep => "attackStep",
            ParamId::AttackShift => "attackShift",
            ParamId::AttackIsExp => "attackIsExp",
            ParamId::DecayShift => "decayShift",
            ParamId::SustainLevel => "sustainLevel",
            ParamId::SustainStep => "sustainStep",
            ParamId::SustainShift => "sustainShift",
            ParamId::SustainDec => "sustainDec",
            ParamId::SustainIsExp => "sustainIsExp",
            ParamId::ReleaseShift => "releaseShift",
            ParamId::ReleaseIsExp => "releaseIsExp",
        }
    }

    /// Checks a value against this parameter's range without writing it.
    pub fn check(self, value: f64) -> Result<()> {
        check_range(self.name(), value, self.range())
    }

    pub fn range(self) -> ParamRange {
        match self {
            ParamId::SampleRate => ParamRange::new(1.0, i32::MAX as f64),
            ParamId::BaseNote => ParamRange::new(0.00001, 10000.0),
            ParamId::LengthInSamples
            | ParamId::LengthInBlocks
            | ParamId::LoopStartSample
            | ParamId::LoopEndSample => INT_RANGE,
            ParamId::Volume | ParamId::Pan => MIDI_RANGE,
            ParamId::PitchstepUp | ParamId::PitchstepDown => BEND_RANGE,
            ParamId::AttackStep | ParamId::SustainStep => STEP_RANGE,
            ParamId::AttackShift | ParamId::SustainShift | ParamId::ReleaseShift => SHIFT_RANGE,
            ParamId::DecayShift | ParamId::SustainLevel => NIBBLE_RANGE,
            ParamId::AttackIsExp
            | ParamId::SustainDec
            | ParamId::SustainIsExp
            | ParamId::ReleaseIsExp => FLAG_RANGE,
        }
    }

    pub fn default_value(self) -> f64 {
        SamplerParams::default().get(self)
    }

    /// The sample description parameters are informational only.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            ParamId::LengthInSamples
                | ParamId::LengthInBlocks
                | ParamId::LoopStartSample
                | ParamId::LoopEndSample
        )
    }

    /// Everything except the base note is a whole number.
    pub fn is_integer(self) -> bool {
        self != ParamId::BaseNote
    }
}

/// A complete snapshot of the sampler's parameters. The control thread edits
/// a copy and the audio thread picks it up whole at the start of a block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplerParams {

    // Rate the loaded sample was recorded at, in Hz.
    pub sample_rate: u32,

    // The (possibly fractional) MIDI note at which the sample plays back at its
    // recorded rate.
    pub base_note: f64,

    // Description of the loaded sample, read-only to the host.
    pub sample_info: SampleInfo,

    pub volume: u8,
    pub pan: u8,

    // Pitch wheel limits in semitones, further capped by `pitch_bend_range`.
    pub pitchstep_up: u8,
    pub pitchstep_down: u8,

    pub envelope: EnvelopeParams,

    // Pitch wheel range set from the UI, in semitones.
    pub pitch_bend_range: u8,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            sample_rate: 11025,
            base_note: 84.0,
            sample_info: SampleInfo::default(),
            volume: 127,
            pan: 64,
            pitchstep_up: 1,
            pitchstep_down: 1,
            envelope: EnvelopeParams::default(),
            pitch_bend_range: 2,
        }
    }
}

impl SamplerParams {

    /// Reads a parameter as the host sees it.
    pub fn get(&self, id: ParamId) -> f64 {

        let envelope = &self.envelope;

        match id {
            ParamId::SampleRate => self.sample_rate as f64,
            ParamId::BaseNote => self.base_note,
            ParamId::LengthInSamples => self.sample_info.length_in_samples as f64,
            ParamId::LengthInBlocks => self.sample_info.length_in_blocks as f64,
            ParamId::LoopStartSample => self.sample_info.loop_start_sample as f64,
            ParamId::LoopEndSample => self.sample_info.loop_end_sample as f64,
            ParamId::Volume => self.volume as f64,
            ParamId::Pan => self.pan as f64,
            ParamId::PitchstepUp => self.pitchstep_up as f64,
            ParamId::PitchstepDown => self.pitchstep_down as f64,
            ParamId::AttackStep => envelope.attack_step as f64,
            ParamId::AttackShift => envelope.attack_shift as f64,
            ParamId::AttackIsExp => flag_value(envelope.attack_is_exp),
            ParamId::DecayShift => envelope.decay_shift as f64,
            ParamId::SustainLevel => envelope.sustain_level as f64,
            ParamId::SustainStep => envelope.sustain_step as f64,
            ParamId::SustainShift => envelope.sustain_shift as f64,
            ParamId::SustainDec => flag_value(envelope.sustain_is_dec),
            ParamId::SustainIsExp => flag_value(envelope.sustain_is_exp),
            ParamId::ReleaseShift => envelope.release_shift as f64,
            ParamId::ReleaseIsExp => flag_value(envelope.release_is_exp),
        }
    }

    /// Writes a parameter from the host. Out of range values and writes to the
    /// informational parameters are rejected, leaving the snapshot untouched.
    /// Whole-number parameters are rounded.
    pub fn set(&mut self, id: ParamId, value: f64) -> Result<()> {

        if id.is_read_only() {
            warn!("Rejected write to read-only parameter {}", id.name());
            return Err(SamplerError::ReadOnlyParam(id.name()));
        }

        let value = if id.is_integer() { value.round() } else { value };
        check_range(id.name(), value, id.range())?;

        let envelope = &mut self.envelope;

        // The range check makes all of these casts lossless.
        match id {
            ParamId::SampleRate => self.sample_rate = value as u32,
            ParamId::BaseNote => self.base_note = value,
            ParamId::Volume => self.volume = value as u8,
            ParamId::Pan => self.pan = value as u8,
            ParamId::PitchstepUp => self.pitchstep_up = value as u8,
            ParamId::PitchstepDown => self.pitchstep_down = value as u8,
            ParamId::AttackStep => envelope.attack_step = value as u8,
            ParamId::AttackShift => envelope.attack_shift = value as u8,
            ParamId::AttackIsExp => envelope.attack_is_exp = value != 0.0,
            ParamId::DecayShift => envelope.decay_shift = value as u8,
            ParamId::SustainLevel => envelope.sustain_level = value as u8,
            ParamId::SustainStep => envelope.sustain_step = value as u8,
            ParamId::SustainShift => envelope.sustain_shift = value as u8,
            ParamId::SustainDec => envelope.sustain_is_dec = value != 0.0,
            ParamId::SustainIsExp => envelope.sustain_is_exp = value != 0.0,
            ParamId::ReleaseShift => envelope.release_shift = value as u8,
            ParamId::ReleaseIsExp => envelope.release_is_exp = value != 0.0,
            ParamId::LengthInSamples
            | ParamId::LengthInBlocks
            | ParamId::LoopStartSample
            | ParamId::LoopEndSample => return Err(SamplerError::ReadOnlyParam(id.name())),
        }

        Ok(())
    }

    /// Sets the pitch wheel range from the UI.
    pub fn set_pitch_bend_range(&mut self, semitones: f64) -> Result<()> {

        let semitones = semitones.round();
        check_range("pitchBendRange", semitones, BEND_RANGE)?;
        self.pitch_bend_range = semitones as u8;

        Ok(())
    }

    /// Checks every field is within its range. Used after batched edits, which
    /// write fields directly.
    pub fn validate(&self) -> Result<()> {

        for id in ParamId::ALL {
            check_range(id.name(), self.get(id), id.range())?;
        }

        check_range("pitchBendRange", self.pitch_bend_range as f64, BEND_RANGE)
    }

    /// Updates the informational parameters after a sample load.
    pub fn set_sample_info(&mut self, sample_info: SampleInfo) {
        self.sample_info = sample_info;
    }

    /// The semitone ranges of the pitch wheel, up then down.
    pub fn bend_ranges(&self) -> (u8, u8) {
        (
            min(self.pitchstep_up, self.pitch_bend_range),
            min(self.pitchstep_down, self.pitch_bend_range),
        )
    }
}

fn flag_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

fn check_range(name: &'static str, value: f64, range: ParamRange) -> Result<()> {

    // NaN fails both comparisons, so it is rejected too.
    if range.contains(value) {
        Ok(())
    } else {
        warn!("Rejected value {} for parameter {}", value, name);
        Err(SamplerError::ParamOutOfRange {
            name,
            value,
            min: range.min,
            max: range.max,
        })
    }
}

#[cfg(test)]
mod tests;
