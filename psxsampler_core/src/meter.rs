// SPDX-License-Identifier: GPL-3.0
// meter.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// How many blocks of meter data can be waiting before new ones are dropped.
pub const METER_CHANNEL_SIZE: usize = 32;

/// Peak levels of one processed block, in the 0.0 to 1.0 range.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MeterData {
    pub peak_left: f32,
    pub peak_right: f32,
    pub frames: usize,
}

impl MeterData {

    /// Folds another block into this one, keeping the highest peaks.
    pub fn merge(&mut self, other: &MeterData) {
        self.peak_left = self.peak_left.max(other.peak_left);
        self.peak_right = self.peak_right.max(other.peak_right);
        self.frames += other.frames;
    }
}

/// The audio thread end of the meter channel. Sending never blocks: if the
/// UI has fallen behind, the block's data is simply dropped.
pub struct MeterSender {
    sender: Sender<MeterData>,
}

/// The UI end of the meter channel.
pub struct MeterReceiver {
    receiver: Receiver<MeterData>,
}

/// Creates a connected sender and receiver.
pub fn meter_channel() -> (MeterSender, MeterReceiver) {

    let (sender, receiver) = bounded(METER_CHANNEL_SIZE);

    (MeterSender { sender }, MeterReceiver { receiver })
}

impl MeterSender {

    /// Measures a processed block and passes the result on, returning whether
    /// it was accepted.
    pub fn process_block(&self, left: &[f32], right: &[f32]) -> bool {

        let data = MeterData {
            peak_left: peak(left),
            peak_right: peak(right),
            frames: left.len().max(right.len()),
        };

        match self.sender.try_send(data) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl MeterReceiver {

    /// Collects everything sent since the last call into one reading, or None
    /// if nothing arrived.
    pub fn transmit_data(&self) -> Option<MeterData> {

        let mut combined: Option<MeterData> = None;

        for data in self.receiver.try_iter() {
            match combined.as_mut() {
                Some(total) => total.merge(&data),
                None => combined = Some(data),
            }
        }

        combined
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |peak, sample| peak.max(sample.abs()))
}
