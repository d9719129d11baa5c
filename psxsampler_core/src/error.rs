// SPDX-License-Identifier: GPL-3.0
// error.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::io;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, SamplerError>;

/// Everything that can go wrong outside of the audio tick itself. Per-tick
/// arithmetic is total and never produces an error.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Input output error: {0}")]
    IoError(#[from] io::Error),
    #[error("Couldn't allocate {bytes} bytes of SPU RAM")]
    RamAllocation { bytes: usize },
    #[error("Invalid SPU RAM size {bytes}: must be a multiple of {block_size} bytes holding at least two blocks")]
    InvalidRamSize { bytes: usize, block_size: usize },
    #[error("Value {value} is out of range for parameter `{name}` ({min}..={max})")]
    ParamOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Parameter `{0}` is read-only")]
    ReadOnlyParam(&'static str),
    #[error("Invalid VAG file: {0}")]
    BadVagFile(String),
}
