// SPDX-License-Identifier: GPL-3.0
// envelope.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::cmp::max;

/// The highest level an envelope can reach (15-bit, always non-negative).
pub const ENVELOPE_MAX_LEVEL: i32 = 0x7FFF;

/// Above this level an exponential increase slows down to a quarter speed.
const EXPONENTIAL_SLOWDOWN_LEVEL: i32 = 0x6000;

/// The phases of the ADSR envelope. Off is not a hardware phase as such, it
/// marks a voice which is free to be allocated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Decay,
    Sustain,
    Release,
    Off,
}

/// The user-facing envelope settings, in the bit widths of the hardware ADSR
/// registers. Step values are 2-bit, shift values 5-bit (4-bit for decay) and
/// the sustain level is 4-bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeParams {
    pub attack_step: u8,
    pub attack_shift: u8,
    pub attack_is_exp: bool,
    pub decay_shift: u8,
    pub sustain_level: u8,
    pub sustain_step: u8,
    pub sustain_shift: u8,
    pub sustain_is_dec: bool,
    pub sustain_is_exp: bool,
    pub release_shift: u8,
    pub release_is_exp: bool,
}

impl Default for EnvelopeParams {

    /// A near-instant attack into a held full-level sustain, and an instant
    /// release.
    fn default() -> Self {
        EnvelopeParams {
            attack_step: 3,
            attack_shift: 0,
            attack_is_exp: false,
            decay_shift: 0,
            sustain_level: 15,
            sustain_step: 0,
            sustain_shift: 31,
            sustain_is_dec: false,
            sustain_is_exp: true,
            release_shift: 0,
            release_is_exp: false,
        }
    }
}

impl EnvelopeParams {

    /// The level at which decay hands over to sustain.
    pub fn sustain_target(&self) -> i32 {
        ((self.sustain_level as i32 + 1) * 0x800).min(ENVELOPE_MAX_LEVEL)
    }

    fn attack_curve(&self) -> EnvelopeCurve {
        EnvelopeCurve {
            step_bits: self.attack_step,
            shift: self.attack_shift,
            is_decreasing: false,
            is_exponential: self.attack_is_exp,
        }
    }

    fn decay_curve(&self) -> EnvelopeCurve {
        EnvelopeCurve {
            step_bits: 0,
            shift: self.decay_shift,
            is_decreasing: true,
            is_exponential: true,
        }
    }

    fn sustain_curve(&self) -> EnvelopeCurve {
        EnvelopeCurve {
            step_bits: self.sustain_step,
            shift: self.sustain_shift,
            is_decreasing: self.sustain_is_dec,
            is_exponential: self.sustain_is_exp,
        }
    }

    fn release_curve(&self) -> EnvelopeCurve {
        EnvelopeCurve {
            step_bits: 0,
            shift: self.release_shift,
            is_decreasing: true,
            is_exponential: self.release_is_exp,
        }
    }
}

/// One phase's worth of envelope settings, as the hardware sees them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeCurve {
    pub step_bits: u8,
    pub shift: u8,
    pub is_decreasing: bool,
    pub is_exponential: bool,
}

/// How far the level moves and how many ticks pass before the next move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnvelopeStep {
    pub wait_cycles: u32,
    pub step: i32,
}

impl EnvelopeCurve {

    /// Works out the next step for the given current level.
    pub fn step_for_level(&self, level: i32) -> EnvelopeStep {

        let step_bits = (self.step_bits & 0x3) as i32;
        let shift = (self.shift & 0x1F) as i32;

        let unscaled_step = if self.is_decreasing {
            -8 + step_bits
        } else {
            7 - step_bits
        };

        let mut wait_cycles = 1_u32 << max(0, shift - 11);
        let mut step = unscaled_step << max(0, 11 - shift);

        if self.is_exponential {
            if self.is_decreasing {

                // Arithmetic shift rounds towards minus infinity, so the step
                // stays at -1 or lower while the level is above 0.
                step = (step * level) >> 15;
            } else if level > EXPONENTIAL_SLOWDOWN_LEVEL {
                wait_cycles *= 4;
            }
        }

        EnvelopeStep { wait_cycles, step }
    }
}

/// This struct models the ADSR unit of a single voice.
#[derive(Copy, Clone, Debug)]
pub struct Envelope {

    // Which phase the envelope is in.
    phase: EnvelopePhase,

    // Current level, 0 to 0x7FFF inclusive.
    level: i32,

    // Ticks left until the level next moves.
    wait_counter: u32,

    // The settings this envelope runs with.
    params: EnvelopeParams,
}

impl Envelope {

    /// Creates a new envelope object with the correct initial state.
    pub fn new() -> Self {
        Envelope {
            phase: EnvelopePhase::Off,
            level: 0,
            wait_counter: 0,
            params: EnvelopeParams::default(),
        }
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.phase
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    pub fn is_active(&self) -> bool {
        self.phase != EnvelopePhase::Off
    }

    /// Replaces the settings. Takes effect from the next step onwards without
    /// disturbing the phase or level.
    pub fn set_params(&mut self, params: &EnvelopeParams) {
        self.params = *params;
    }

    /// Starts the attack phase from silence.
    pub fn key_on(&mut self, params: &EnvelopeParams) {

        self.params = *params;
        self.phase = EnvelopePhase::Attack;
        self.level = 0;
        self.wait_counter = 0;
    }

    /// Moves any sounding phase into release.
    pub fn key_off(&mut self) {

        if self.phase != EnvelopePhase::Off && self.phase != EnvelopePhase::Release {
            self.phase = EnvelopePhase::Release;
            self.wait_counter = 0;
        }
    }

    /// What the hardware does at a loop end without the repeat flag: release
    /// at level 0, meaning the voice goes quiet immediately.
    pub fn force_silent_release(&mut self) {

        if self.phase != EnvelopePhase::Off {
            self.phase = EnvelopePhase::Release;
            self.level = 0;
            self.wait_counter = 0;
        }
    }

    /// Stops the envelope outright, freeing its voice.
    pub fn stop(&mut self) {

        self.phase = EnvelopePhase::Off;
        self.level = 0;
        self.wait_counter = 0;
    }

    /// Advances the envelope by one SPU tick.
    pub fn tick(&mut self) {

        let curve = match self.phase {
            EnvelopePhase::Attack => self.params.attack_curve(),
            EnvelopePhase::Decay => self.params.decay_curve(),
            EnvelopePhase::Sustain => self.params.sustain_curve(),
            EnvelopePhase::Release => self.params.release_curve(),
            EnvelopePhase::Off => return,
        };

        if self.wait_counter > 0 {
            self.wait_counter -= 1;

            if self.wait_counter > 0 {
                return;
            }
        }

        let step = curve.step_for_level(self.level);
        self.wait_counter = step.wait_cycles;
        self.level = (self.level + step.step).clamp(0, ENVELOPE_MAX_LEVEL);

        self.update_phase();
    }

    /// Applies any phase transitions the current level calls for.
    fn update_phase(&mut self) {

        if self.phase == EnvelopePhase::Attack && self.level >= ENVELOPE_MAX_LEVEL {
            self.phase = EnvelopePhase::Decay;
            self.wait_counter = 0;
        }

        if self.phase == EnvelopePhase::Decay && self.level <= self.params.sustain_target() {
            self.phase = EnvelopePhase::Sustain;
            self.wait_counter = 0;
        }

        if self.phase == EnvelopePhase::Release && self.level == 0 {
            self.phase = EnvelopePhase::Off;
        }
    }
}
