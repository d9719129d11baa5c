// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// Crate-wide lines to disable specific lints:

// Components are constructed with explicit initial hardware state, so there
// will be no derived Default implementations unless needed.
#![allow(clippy::new_without_default)]

/// This module contains the error type shared by the whole crate.
pub mod error;

/// This module contains the note/controller events and transport information
/// delivered to the sampler by the host.
pub mod events;

/// This module contains the peak metering sent from the audio thread to the UI.
pub mod meter;

/// This module contains the host-visible parameters of the sampler.
pub mod params;

/// This module contains the sampler instrument built on top of the SPU.
pub mod sampler;

/// This module contains PlayStation sound chip related functionality.
pub mod spu;

/// This module contains reading and writing of .vag sample files.
pub mod vag;

pub use error::{Result, SamplerError};
