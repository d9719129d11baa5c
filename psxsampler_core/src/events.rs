// SPDX-License-Identifier: GPL-3.0
// events.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// The MIDI controller number for "all sound off".
pub const CC_ALL_SOUND_OFF: u8 = 120;

/// The MIDI controller number for "all notes off".
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// The centre position of the 14-bit pitch wheel.
pub const PITCH_BEND_CENTRE: u16 = 8192;

/// A single already-decoded event delivered to the sampler, either by the host
/// for the current block or by the UI's on-screen keyboard.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerEvent {

    /// A velocity of 0 is treated as a note-off, as with MIDI running status.
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },

    /// 14-bit wheel value, 0..=16383 with 8192 meaning no bend.
    PitchBend { value: u16 },
    ControlChange { controller: u8, value: u8 },
}

/// Host transport position for the block being processed. Nothing is tempo
/// synced yet, but the value is kept alongside the SPU state.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TransportInfo {
    pub ppq_pos: f64,
    pub is_running: bool,
}
