// SPDX-License-Identifier: GPL-3.0
// psx_sampler.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::mem;

use arrayvec::ArrayVec;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;

use super::SamplerControl;
use crate::error::{Result, SamplerError};
use crate::events::{
    SamplerEvent,
    TransportInfo,
    CC_ALL_NOTES_OFF,
    CC_ALL_SOUND_OFF,
    PITCH_BEND_CENTRE,
};
use crate::meter::{meter_channel, MeterReceiver, MeterSender};
use crate::params::{ParamId, SamplerParams};
use crate::spu::psx_spu::adpcm::{scan_sample_info, SampleInfo, ADPCM_BLOCK_SIZE};
use crate::spu::psx_spu::envelope::EnvelopePhase;
use crate::spu::psx_spu::spu_ram::SPU_RAM_SIZE;
use crate::spu::psx_spu::PsxSpu;
use crate::spu::Spu;
use crate::vag::VagFile;
use transport::SpuClock;

/// This module contains the conversion from host frames to SPU ticks.
pub mod transport;

/// How many on-screen keyboard events can wait for the next block.
pub const UI_EVENT_QUEUE_SIZE: usize = 64;

/// Scale from SPU samples to the host's floating point range.
const OUTPUT_SCALE: f32 = 1.0 / 32768.0;

/// State shared with the control thread. Only ever locked for quick copies.
struct ControlState {

    // The latest parameter snapshot.
    params: SamplerParams,

    // Bumped on every change to `params`.
    version: u64,

    // Notes from the on-screen keyboard, oldest first.
    ui_events: ArrayVec<SamplerEvent, UI_EVENT_QUEUE_SIZE>,
}

/// State owned by audio processing. Locked for a whole block, so the control
/// thread only takes this lock to load samples.
struct AudioState {
    spu: PsxSpu,
    clock: SpuClock,

    // The snapshot the SPU was last updated with, and its version.
    applied_params: SamplerParams,
    applied_version: u64,

    meter: MeterSender,
    last_transport: TransportInfo,
}

/// This struct is the sampler instrument: a PlayStation SPU playing one sample
/// across its 24 voices, driven one host block at a time. Lock order is fixed:
/// audio processing drops the control lock before taking the audio lock, and
/// the control thread never holds both.
pub struct PsxSampler {
    control: Mutex<ControlState>,
    audio: Mutex<AudioState>,
    meter_receiver: MeterReceiver,
}

impl PsxSampler {

    /// Creates a new sampler object with the correct initial state and a full
    /// size SPU RAM. The host rate is unknown until the first `reset`, so until
    /// then the sampler outputs silence.
    pub fn new() -> Result<Self> {
        Self::with_ram_size(SPU_RAM_SIZE)
    }

    /// As `new`, with a chosen SPU RAM size.
    pub fn with_ram_size(ram_size: usize) -> Result<Self> {

        let params = SamplerParams::default();
        let spu = PsxSpu::new(ram_size)?;
        let (meter, meter_receiver) = meter_channel();

        info!("Sampler created");

        Ok(PsxSampler {
            control: Mutex::new(ControlState {
                params,
                version: 0,
                ui_events: ArrayVec::new(),
            }),
            audio: Mutex::new(AudioState {
                spu,
                clock: SpuClock::new(0),
                applied_params: params,
                applied_version: 0,
                meter,
                last_transport: TransportInfo::default(),
            }),
            meter_receiver,
        })
    }

    /// Prepares for playback at a host sample rate, cutting any sounding notes.
    pub fn reset(&self, host_sample_rate: u32) {

        let mut audio = self.audio.lock();
        audio.clock = SpuClock::new(host_sample_rate);
        audio.spu.silence_all();

        info!("Sampler reset for a host rate of {}Hz", host_sample_rate);
    }

    /// Renders one block of output. Queued keyboard notes are played first,
    /// then the host's events in order, all at the start of the block. Output
    /// beyond the shorter of the two channels is zeroed.
    pub fn process_block(
        &self,
        events: &[SamplerEvent],
        transport: TransportInfo,
        left: &mut [f32],
        right: &mut [f32]
    ) {

        // Take what we need from the control state and let go straight away.
        let (params, version, ui_events) = {
            let mut control = self.control.lock();
            (control.params, control.version, mem::take(&mut control.ui_events))
        };

        let mut audio = self.audio.lock();
        let audio = &mut *audio;
        audio.last_transport = transport;

        if version != audio.applied_version {
            audio.applied_params = params;
            audio.applied_version = version;
            audio.spu.apply_params(&params);
        }

        for event in ui_events.iter().chain(events.iter()) {
            handle_event(&mut audio.spu, &audio.applied_params, *event);
        }

        let frames = left.len().min(right.len());
        let spu = &mut audio.spu;

        for (out_left, out_right) in left.iter_mut().zip(right.iter_mut()) {
            let (sample_left, sample_right) = audio.clock.next_frame(|| spu.tick());
            *out_left = sample_left as f32 * OUTPUT_SCALE;
            *out_right = sample_right as f32 * OUTPUT_SCALE;
        }

        left[frames..].fill(0.0);
        right[frames..].fill(0.0);

        audio.meter.process_block(&left[..frames], &right[..frames]);
    }

    /// The UI end of the peak meter.
    pub fn meter_receiver(&self) -> &MeterReceiver {
        &self.meter_receiver
    }

    /// The parameter snapshot audio processing is currently using.
    pub fn applied_params(&self) -> SamplerParams {
        self.audio.lock().applied_params
    }

    pub fn last_transport(&self) -> TransportInfo {
        self.audio.lock().last_transport
    }

    pub fn voice_phase(&self, index: usize) -> EnvelopePhase {
        self.audio.lock().spu.voice(index).phase()
    }

    pub fn voice_level(&self, index: usize) -> i32 {
        self.audio.lock().spu.voice(index).level()
    }

    pub fn active_voices(&self) -> u32 {
        self.audio.lock().spu.active_voices()
    }
}

/// Plays one note or controller event on the SPU. Runs on the audio thread,
/// so nothing here logs.
fn handle_event(spu: &mut PsxSpu, params: &SamplerParams, event: SamplerEvent) {

    match event {
        SamplerEvent::NoteOn { note, velocity: 0 } | SamplerEvent::NoteOff { note } => {
            spu.key_off(note);
        }
        SamplerEvent::NoteOn { note, velocity } => spu.key_on(note, velocity, params),
        SamplerEvent::PitchBend { value } => {
            let bend = value.min(0x3FFF) as i32 - PITCH_BEND_CENTRE as i32;
            spu.set_pitch_bend(bend as i16, params);
        }
        SamplerEvent::ControlChange { controller: CC_ALL_SOUND_OFF, .. } => spu.silence_all(),
        SamplerEvent::ControlChange { controller: CC_ALL_NOTES_OFF, .. } => spu.release_all(),
        SamplerEvent::ControlChange { .. } => {}
    }
}

impl SamplerControl for PsxSampler {

    fn set_param(&self, id: ParamId, value: f64) -> Result<()> {

        let mut control = self.control.lock();
        control.params.set(id, value)?;
        control.version += 1;

        debug!("Set {} to {}, snapshot {}", id.name(), value, control.version);

        Ok(())
    }

    fn param(&self, id: ParamId) -> f64 {
        self.control.lock().params.get(id)
    }

    fn params(&self) -> SamplerParams {
        self.control.lock().params
    }

    fn update_params(&self, update: &mut dyn FnMut(&mut SamplerParams)) -> Result<()> {

        let mut control = self.control.lock();
        let mut candidate = control.params;
        update(&mut candidate);

        if let Some(id) = ParamId::ALL
            .into_iter()
            .filter(|id| id.is_read_only())
            .find(|&id| candidate.get(id) != control.params.get(id))
        {
            warn!("Rejected batched write to read-only parameter {}", id.name());
            return Err(SamplerError::ReadOnlyParam(id.name()));
        }

        candidate.validate()?;
        control.params = candidate;
        control.version += 1;

        debug!("Applied batched update, snapshot {}", control.version);

        Ok(())
    }

    fn set_pitch_bend_range(&self, semitones: f64) -> Result<()> {

        let mut control = self.control.lock();
        control.params.set_pitch_bend_range(semitones)?;
        control.version += 1;

        Ok(())
    }

    fn queue_event(&self, event: SamplerEvent) -> bool {

        let mut control = self.control.lock();

        if control.ui_events.try_push(event).is_err() {
            warn!("Keyboard event queue full, dropping {:?}", event);
            return false;
        }

        trace!("Queued keyboard event {:?}", event);

        true
    }

    fn load_adpcm_sample(&self, adpcm_data: &[u8]) -> Result<SampleInfo> {
        self.load_sample(adpcm_data, None)
    }

    fn load_vag(&self, vag: &VagFile) -> Result<SampleInfo> {

        let sample_info = self.load_sample(&vag.adpcm_data, Some(vag.sample_rate))?;

        info!("Loaded VAG '{}' at {}Hz", vag.name, vag.sample_rate);

        Ok(sample_info)
    }
}

impl PsxSampler {

    /// Writes a sample into SPU RAM and publishes its info, plus its sample
    /// rate when given, as one parameter change. A bad rate is rejected before
    /// SPU RAM is touched.
    fn load_sample(&self, adpcm_data: &[u8], sample_rate: Option<u32>) -> Result<SampleInfo> {

        if let Some(rate) = sample_rate {
            ParamId::SampleRate.check(rate as f64)?;
        }

        let range = self.audio.lock().spu.load_sample(adpcm_data);

        let loaded_bytes = (range.block_count as usize * ADPCM_BLOCK_SIZE).min(adpcm_data.len());
        let sample_info = scan_sample_info(&adpcm_data[..loaded_bytes]);

        let mut control = self.control.lock();
        let mut params = control.params;
        params.set_sample_info(sample_info);
        if let Some(rate) = sample_rate {
            params.set(ParamId::SampleRate, rate as f64)?;
        }
        control.params = params;
        control.version += 1;

        Ok(sample_info)
    }
}
