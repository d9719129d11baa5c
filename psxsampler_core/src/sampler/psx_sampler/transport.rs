// SPDX-License-Identifier: GPL-3.0
// transport.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use crate::spu::psx_spu::SPU_SAMPLE_RATE;

/// This struct converts between the host's output rate and the SPU's fixed
/// 44100Hz tick. Each host frame runs however many SPU ticks fall inside it
/// and outputs the last SPU sample produced, holding it when none do.
pub struct SpuClock {

    // Host output rate in Hz, 0 meaning not yet known.
    host_rate: u32,

    // Fractional progress towards the next SPU tick, in units of 1/host_rate ticks.
    phase: u64,

    // The most recent SPU output.
    held: (i16, i16),
}

impl SpuClock {

    /// Creates a new clock object with the correct initial state.
    pub fn new(host_rate: u32) -> Self {
        SpuClock {
            host_rate,
            phase: 0,
            held: (0, 0),
        }
    }

    pub fn host_rate(&self) -> u32 {
        self.host_rate
    }

    /// Whether the clock can produce output at all.
    pub fn is_running(&self) -> bool {
        self.host_rate != 0
    }

    /// Produces one host frame, calling `tick` once per SPU tick due.
    pub fn next_frame(&mut self, mut tick: impl FnMut() -> (i16, i16)) -> (i16, i16) {

        if self.host_rate == 0 {
            return (0, 0);
        }

        self.phase += SPU_SAMPLE_RATE as u64;
        let ticks = self.phase / self.host_rate as u64;
        self.phase %= self.host_rate as u64;

        for _ in 0..ticks {
            self.held = tick();
        }

        self.held
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn count_ticks(clock: &mut SpuClock, frames: usize) -> u32 {

        let mut ticks = 0;
        for _ in 0..frames {
            clock.next_frame(|| {
                ticks += 1;
                (0, 0)
            });
        }
        ticks
    }

    #[test]
    fn matching_rates_should_tick_once_per_frame() {

        let mut clock = SpuClock::new(44100);

        assert_eq!(count_ticks(&mut clock, 100), 100);
    }

    #[test]
    fn higher_host_rate_should_tick_fewer_times_and_hold() {

        let mut clock = SpuClock::new(88200);
        let mut counter = 0;

        let outputs: Vec<(i16, i16)> = (0..4)
            .map(|_| {
                clock.next_frame(|| {
                    counter += 1;
                    (counter, -counter)
                })
            })
            .collect();

        assert_eq!(outputs, vec![(0, 0), (1, -1), (1, -1), (2, -2)]);
    }

    #[test]
    fn lower_host_rate_should_tick_several_times_per_frame() {

        let mut clock = SpuClock::new(22050);

        assert_eq!(count_ticks(&mut clock, 10), 20);
    }

    #[test]
    fn ticks_should_add_up_over_a_second_at_any_rate() {

        for rate in [8000, 44100, 48000, 96000] {
            let mut clock = SpuClock::new(rate);
            assert_eq!(count_ticks(&mut clock, rate as usize), 44100);
        }
    }

    #[test]
    fn zero_host_rate_should_produce_silence_without_ticking() {

        let mut clock = SpuClock::new(0);

        assert!(!clock.is_running());
        assert_eq!(count_ticks(&mut clock, 10), 0);
        assert_eq!(clock.next_frame(|| (5, 5)), (0, 0));
    }
}
