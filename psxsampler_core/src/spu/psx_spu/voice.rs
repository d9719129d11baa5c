// SPDX-License-Identifier: GPL-3.0
// voice.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use psxsampler_utility::min;

use super::adpcm::{
    decode_block,
    AdpcmHistory,
    ADPCM_BLOCK_SIZE,
    ADPCM_FLAG_LOOP_END,
    ADPCM_FLAG_REPEAT,
    ADPCM_SAMPLES_PER_BLOCK,
};
use super::envelope::{Envelope, EnvelopeParams, EnvelopePhase};
use super::spu_ram::SpuRam;

/// The pitch register value that plays a sample back at 44100Hz.
pub const PITCH_UNITY: u16 = 0x1000;

/// The largest value the pitch register holds.
pub const PITCH_MAX: u16 = 0x3FFF;

/// The pitch counter never advances by more than four samples per tick.
const PITCH_STEP_LIMIT: u32 = 0x4000;

/// Full volume in the voice volume registers.
pub const VOICE_VOLUME_MAX: i32 = 0x3FFF;

/// The pitch counter wraps after one block's worth of samples (in 4.12 fixed point).
const PITCH_COUNTER_BLOCK: u32 = (ADPCM_SAMPLES_PER_BLOCK as u32) << 12;

/// This struct models one of the SPU's hardware voices. Voices are never created
/// or destroyed while playing, only recycled.
#[derive(Copy, Clone, Debug)]
pub struct Voice {

    // The note this voice was last keyed on with.
    note: u8,

    // Velocity of that note, kept so volume can be recalculated.
    velocity: u8,

    // SPU RAM address of the block being played.
    current_address: u32,

    // Where to jump to at a loop end.
    repeat_address: u32,

    // Flag byte of the block being played.
    current_flags: u8,

    // ADPCM decoder state, carried from block to block.
    history: AdpcmHistory,

    // The decoded samples of the block being played.
    decoded: [i16; ADPCM_SAMPLES_PER_BLOCK],

    // 4.12 fixed point sample rate, 0x1000 meaning 44100Hz.
    pitch: u16,

    // Position within the current block in 4.12 fixed point.
    pitch_counter: u32,

    envelope: Envelope,

    volume_left: i32,
    volume_right: i32,

    // When this voice was allocated, for voice stealing.
    timestamp: u32,
}

impl Voice {

    /// Creates a new voice object with the correct initial state.
    pub fn new() -> Self {
        Voice {
            note: 0,
            velocity: 0,
            current_address: 0,
            repeat_address: 0,
            current_flags: 0,
            history: AdpcmHistory::default(),
            decoded: [0; ADPCM_SAMPLES_PER_BLOCK],
            pitch: PITCH_UNITY,
            pitch_counter: 0,
            envelope: Envelope::new(),
            volume_left: 0,
            volume_right: 0,
            timestamp: 0,
        }
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn pitch(&self) -> u16 {
        self.pitch
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn current_address(&self) -> u32 {
        self.current_address
    }

    pub fn volumes(&self) -> (i32, i32) {
        (self.volume_left, self.volume_right)
    }

    pub fn phase(&self) -> EnvelopePhase {
        self.envelope.phase()
    }

    pub fn level(&self) -> i32 {
        self.envelope.level()
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    /// Starts playing from the first block of SPU RAM. The repeat address
    /// points at the terminator until the sample sets its own loop start.
    pub fn key_on(
        &mut self,
        ram: &SpuRam,
        note: u8,
        velocity: u8,
        timestamp: u32,
        envelope_params: &EnvelopeParams
    ) {

        self.note = note;
        self.velocity = velocity;
        self.timestamp = timestamp;
        self.current_address = 0;
        self.repeat_address = ram.terminator_address();
        self.history = AdpcmHistory::default();
        self.pitch_counter = 0;
        self.envelope.key_on(envelope_params);
        self.load_block(ram);
    }

    pub fn key_off(&mut self) {
        self.envelope.key_off();
    }

    /// Frees the voice immediately.
    pub fn stop(&mut self) {
        self.envelope.stop();
    }

    pub fn set_pitch(&mut self, pitch: u16) {
        self.pitch = min(pitch, PITCH_MAX);
    }

    pub fn set_volumes(&mut self, (left, right): (i32, i32)) {
        self.volume_left = left;
        self.volume_right = right;
    }

    pub fn set_envelope_params(&mut self, params: &EnvelopeParams) {
        self.envelope.set_params(params);
    }

    /// Produces this voice's output for one SPU tick and moves it along by its
    /// pitch. Nearest sample playback, no interpolation.
    pub fn tick(&mut self, ram: &SpuRam) -> (i32, i32) {

        if !self.envelope.is_active() {
            return (0, 0);
        }

        let sample = self.decoded[(self.pitch_counter >> 12) as usize] as i32;
        let enveloped = (sample * self.envelope.level()) >> 15;
        let left = (enveloped * self.volume_left) >> 14;
        let right = (enveloped * self.volume_right) >> 14;

        self.envelope.tick();

        self.pitch_counter += min(self.pitch as u32, PITCH_STEP_LIMIT);
        while self.pitch_counter >= PITCH_COUNTER_BLOCK {
            self.pitch_counter -= PITCH_COUNTER_BLOCK;
            self.advance_block(ram);
        }

        (left, right)
    }

    /// Moves on from the block just finished, honouring its loop flags.
    fn advance_block(&mut self, ram: &SpuRam) {

        if self.current_flags & ADPCM_FLAG_LOOP_END != 0 {
            self.current_address = self.repeat_address;

            if self.current_flags & ADPCM_FLAG_REPEAT == 0 {
                self.envelope.force_silent_release();
            }
        } else {
            self.current_address += ADPCM_BLOCK_SIZE as u32;
        }

        self.load_block(ram);
    }

    /// Decodes the block at the current address. A loop start flag makes it
    /// the new repeat address.
    fn load_block(&mut self, ram: &SpuRam) {

        self.current_address = ram.sanitize_address(self.current_address);
        let block = ram.read_block(self.current_address);

        if block.is_loop_start() {
            self.repeat_address = self.current_address;
        }

        self.current_flags = block.flags();
        decode_block(&block, &mut self.history, &mut self.decoded);
    }
}

/// Works out a voice's left and right volume registers from track volume
/// (0-127), pan (0-127, 64 being centre) and note velocity (0-127).
pub fn voice_volumes(volume: u8, pan: u8, velocity: u8) -> (i32, i32) {

    let volume = min(volume, 127) as i32;
    let pan = min(pan, 127) as i32;
    let velocity = min(velocity, 127) as i32;

    let combined = volume * velocity * VOICE_VOLUME_MAX / (127 * 127);
    let left = min(combined, combined * (127 - pan) / 63);
    let right = min(combined, combined * pan / 64);

    (left, right)
}

/// Works out the pitch register value for a note, given the note the sample
/// was recorded at and its sample rate. Clamped to what the register holds.
pub fn pitch_for_note(note: u8, bend_semitones: f64, base_note: f64, sample_rate: u32) -> u16 {

    let semitones = note as f64 - base_note + bend_semitones;
    let pitch = PITCH_UNITY as f64 * sample_rate as f64 / 44100.0 * (semitones / 12.0).exp2();

    // NaN becomes 0 here, which just stalls the voice.
    pitch.round().clamp(0.0, PITCH_MAX as f64) as u16
}

/// Converts a centred pitch wheel position (-8192 to 8191) into semitones,
/// full deflection giving the up or down range.
pub fn bend_semitones(bend: i16, up_range: u8, down_range: u8) -> f64 {

    if bend >= 0 {
        bend as f64 / 8191.0 * up_range as f64
    } else {
        bend as f64 / 8192.0 * down_range as f64
    }
}
