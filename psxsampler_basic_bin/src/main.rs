// SPDX-License-Identifier: GPL-3.0
// main.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

// This file is the core of the basic client - it exists merely as a CLI-based
// program to load in a sample, play one note through the sampler and write the
// result out as a WAV file. It stands in for a proper plugin host.

use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{error, info, warn, LevelFilter};
use psxsampler_core::{
    events::{SamplerEvent, TransportInfo},
    params::ParamId,
    sampler::{psx_sampler::PsxSampler, SamplerControl},
    spu::psx_spu::adpcm::{encode_samples, LoopPoints},
    vag::VagFile,
    SamplerError,
};
use thiserror::Error;

#[derive(Parser)]
#[command(
    version,
    about = "A basic barebones renderer for the PsxSampler instrument",
    long_about = None
)]
struct PsxSamplerArgs {
    #[arg(help = "A .vag sample, or a .wav file to encode", id = "Sample file")]
    sample: PathBuf,

    #[arg(short, long, default_value = "out.wav", help = "Where to write the rendered audio")]
    output: PathBuf,

    #[arg(long, default_value_t = 60, help = "MIDI note to play")]
    note: u8,

    #[arg(long, default_value_t = 127, help = "Note velocity")]
    velocity: u8,

    #[arg(long, default_value_t = 1000, help = "How long to hold the note, in milliseconds")]
    hold_ms: u32,

    #[arg(long, default_value_t = 1000, help = "How long to render after note off, in milliseconds")]
    tail_ms: u32,

    #[arg(long, default_value_t = 44100, help = "Output sample rate")]
    host_rate: u32,

    #[arg(long, default_value_t = 512, help = "Frames per processing block")]
    block_size: usize,

    #[arg(long, help = "Loop start (in samples) when encoding a .wav file")]
    loop_start: Option<usize>,

    #[arg(long, help = "Also save the sample as a .vag file")]
    save_vag: Option<PathBuf>,

    #[arg(long, help = "Override the sample rate of the sample")]
    sample_rate: Option<f64>,

    #[arg(long, help = "The note at which the sample plays at its own rate")]
    base_note: Option<f64>,

    #[arg(long, help = "Track volume, 0-127")]
    volume: Option<f64>,

    #[arg(long, help = "Pan, 0-127 with 64 as centre")]
    pan: Option<f64>,

    #[arg(long, help = "Attack shift, 0-31")]
    attack_shift: Option<f64>,

    #[arg(long, help = "Decay shift, 0-15")]
    decay_shift: Option<f64>,

    #[arg(long, help = "Sustain level, 0-15")]
    sustain_level: Option<f64>,

    #[arg(long, help = "Release shift, 0-31")]
    release_shift: Option<f64>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More logging (repeat for more)")]
    verbose: u8,
}

/// Everything that can stop a render.
#[derive(Error, Debug)]
enum RenderError {
    #[error("Sampler error: {0}")]
    Sampler(#[from] SamplerError),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Unsupported sample file {0}: expected .vag or .wav")]
    UnsupportedFile(String),
}

fn main() -> ExitCode {
    let args = PsxSamplerArgs::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    colog::default_builder().filter_level(level).init();

    match render(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn render(args: &PsxSamplerArgs) -> Result<(), RenderError> {

    let vag = load_sample_file(&args.sample, args.loop_start)?;

    if let Some(path) = &args.save_vag {
        vag.write_to(path)?;
    }

    let sampler = PsxSampler::new()?;
    let sample_info = sampler.load_vag(&vag)?;
    info!(
        "Sample is {} samples long, looping {}..{}",
        sample_info.length_in_samples,
        sample_info.loop_start_sample,
        sample_info.loop_end_sample
    );

    let overrides = [
        (ParamId::SampleRate, args.sample_rate),
        (ParamId::BaseNote, args.base_note),
        (ParamId::Volume, args.volume),
        (ParamId::Pan, args.pan),
        (ParamId::AttackShift, args.attack_shift),
        (ParamId::DecayShift, args.decay_shift),
        (ParamId::SustainLevel, args.sustain_level),
        (ParamId::ReleaseShift, args.release_shift),
    ];
    for (id, value) in overrides {
        if let Some(value) = value {
            sampler.set_param(id, value)?;
        }
    }

    sampler.reset(args.host_rate);

    let hold_frames = ms_to_frames(args.hold_ms, args.host_rate);
    let total_frames = hold_frames + ms_to_frames(args.tail_ms, args.host_rate);
    let block_size = args.block_size.max(1);
    let release_frame = note_off_frame(hold_frames, block_size);

    if hold_frames < block_size {
        warn!(
            "Hold of {} frames is shorter than a {} frame block, releasing at frame {}",
            hold_frames,
            block_size,
            release_frame
        );
    }

    let mut output = Vec::with_capacity(total_frames * 2);
    let mut left = vec![0.0_f32; block_size];
    let mut right = vec![0.0_f32; block_size];
    let mut frame = 0;
    let mut note_released = false;

    while frame < total_frames {
        let mut events = Vec::new();

        if frame == 0 {
            events.push(SamplerEvent::NoteOn { note: args.note, velocity: args.velocity });
        }
        if !note_released && frame >= release_frame {
            events.push(SamplerEvent::NoteOff { note: args.note });
            note_released = true;
        }

        let frames = block_size.min(total_frames - frame);
        let transport = TransportInfo {
            ppq_pos: frame as f64 / args.host_rate.max(1) as f64 * 2.0,
            is_running: true,
        };
        sampler.process_block(&events, transport, &mut left[..frames], &mut right[..frames]);

        for (&sample_left, &sample_right) in left[..frames].iter().zip(&right[..frames]) {
            output.push(to_i16(sample_left));
            output.push(to_i16(sample_right));
        }
        frame += frames;
    }

    if let Some(meter) = sampler.meter_receiver().transmit_data() {
        info!("Peak levels: left {:.3}, right {:.3}", meter.peak_left, meter.peak_right);
    }

    write_wav(&args.output, args.host_rate, &output)?;
    info!("Wrote {} frames to {}", total_frames, args.output.display());

    Ok(())
}

/// Loads a .vag directly, or reads a .wav and encodes it to ADPCM.
fn load_sample_file(path: &Path, loop_start: Option<usize>) -> Result<VagFile, RenderError> {

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("vag") => Ok(VagFile::read_from(path)?),
        Some("wav") => {
            let (samples, sample_rate) = read_wav_mono(path)?;
            let loop_points = loop_start.map(|start_sample| LoopPoints {
                start_sample,
                end_sample: samples.len(),
            });

            info!("Encoding {} samples from {}", samples.len(), path.display());

            Ok(VagFile {
                name: path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                sample_rate,
                adpcm_data: encode_samples(&samples, loop_points),
            })
        }
        _ => Err(RenderError::UnsupportedFile(path.display().to_string())),
    }
}

/// Reads the first channel of a WAV file as 16-bit samples.
fn read_wav_mono(path: &Path) -> Result<(Vec<i16>, u32), RenderError> {

    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .map(|sample| sample.map(to_i16))
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let shift = spec.bits_per_sample as i32 - 16;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|sample| {
                    sample.map(|value| {
                        if shift >= 0 {
                            (value >> shift) as i16
                        } else {
                            (value << -shift) as i16
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec.sample_rate))
}

fn write_wav(path: &Path, sample_rate: u32, interleaved: &[i16]) -> Result<(), RenderError> {

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Start of the block that sends note off: the block the hold ends in, but
/// never the first block, since a note on and off in the same block is silent.
fn note_off_frame(hold_frames: usize, block_size: usize) -> usize {
    (hold_frames / block_size).max(1) * block_size
}

fn ms_to_frames(ms: u32, rate: u32) -> usize {
    (ms as u64 * rate as u64 / 1000) as usize
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
