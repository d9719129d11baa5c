// SPDX-License-Identifier: GPL-3.0
// tests.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use super::*;

/// Decodes a whole run of encoded blocks with a fresh history.
fn decode_all(encoded: &[u8]) -> Vec<i16> {

    let mut history = AdpcmHistory::default();
    let mut decoded = Vec::new();

    for chunk in encoded.chunks_exact(ADPCM_BLOCK_SIZE) {
        let block = AdpcmBlock::from_slice(chunk).unwrap();
        let mut output = [0; ADPCM_SAMPLES_PER_BLOCK];
        decode_block(&block, &mut history, &mut output);
        decoded.extend_from_slice(&output);
    }

    decoded
}

#[test]
fn silent_block_should_decode_to_zeroes() {

    let block = AdpcmBlock::silent(0);
    let mut history = AdpcmHistory::default();
    let mut output = [1; ADPCM_SAMPLES_PER_BLOCK];

    decode_block(&block, &mut history, &mut output);

    assert_eq!(output, [0; ADPCM_SAMPLES_PER_BLOCK]);
    assert_eq!(history, AdpcmHistory::default());
}

#[test]
fn nibbles_should_be_unpacked_low_first_and_sign_extended() {

    let mut bytes = [0; ADPCM_BLOCK_SIZE];
    bytes[2] = 0xAB;
    let block = AdpcmBlock::new(bytes);

    assert_eq!(block.nibble(0), -5);
    assert_eq!(block.nibble(1), -6);
    assert_eq!(block.nibble(2), 0);
}

#[test]
fn header_should_map_out_of_range_shift_and_filter() {

    let block = AdpcmBlock::new([0x7D, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    assert_eq!(block.shift(), 9);
    assert_eq!(block.filter(), 4);
}

#[test]
fn filter_0_should_decode_residuals_directly() {

    // Shift 12 leaves each nibble as-is.
    let mut bytes = [0; ADPCM_BLOCK_SIZE];
    bytes[0] = 0x0C;
    bytes[2] = 0x87;
    let block = AdpcmBlock::new(bytes);
    let mut history = AdpcmHistory::default();
    let mut output = [0; ADPCM_SAMPLES_PER_BLOCK];

    decode_block(&block, &mut history, &mut output);

    assert_eq!(output[0], 7);
    assert_eq!(output[1], -8);
    assert_eq!(history, AdpcmHistory { old: 0, older: 0 });
}

#[test]
fn filter_1_should_predict_from_previous_sample() {

    // Shift 0 gives a residual of 7 << 12 for the first sample, after which
    // zero residuals leave only the prediction of 60/64ths of the last sample.
    let mut bytes = [0; ADPCM_BLOCK_SIZE];
    bytes[0] = 0x10;
    bytes[2] = 0x07;
    let block = AdpcmBlock::new(bytes);
    let mut history = AdpcmHistory::default();
    let mut output = [0; ADPCM_SAMPLES_PER_BLOCK];

    decode_block(&block, &mut history, &mut output);

    assert_eq!(output[0], 28672);
    assert_eq!(output[1], ((28672 * 60 + 32) >> 6) as i16);
}

#[test]
fn decoding_should_saturate_instead_of_wrapping() {

    // Filter 4 with a large history overshoots the 16-bit range.
    let mut bytes = [0; ADPCM_BLOCK_SIZE];
    bytes[0] = 0x40;
    bytes[2] = 0x07;
    let block = AdpcmBlock::new(bytes);
    let mut history = AdpcmHistory { old: 32767, older: 0 };
    let mut output = [0; ADPCM_SAMPLES_PER_BLOCK];

    decode_block(&block, &mut history, &mut output);

    assert_eq!(output[0], i16::MAX);
}

#[test]
fn encode_then_decode_should_stay_within_quantisation_error() {

    let samples: Vec<i16> = (0..ADPCM_SAMPLES_PER_BLOCK * 8)
        .map(|i| ((i as f64 * 0.1).sin() * 16000.0) as i16)
        .collect();

    let encoded = encode_samples(&samples, None);
    let decoded = decode_all(&encoded);

    assert_eq!(encoded.len(), 8 * ADPCM_BLOCK_SIZE);

    let max_error = samples
        .iter()
        .zip(decoded.iter())
        .map(|(&a, &b)| (a as i32 - b as i32).abs())
        .max()
        .unwrap();

    assert!(max_error < 2048, "max error {max_error} too large");
}

#[test]
fn encoding_quiet_signal_should_be_exact() {

    // Small values are representable with shift 12 and filter 0.
    let samples: Vec<i16> = (0..ADPCM_SAMPLES_PER_BLOCK as i16).map(|i| (i % 15) - 7).collect();

    let encoded = encode_samples(&samples, None);
    let decoded = decode_all(&encoded);

    assert_eq!(&decoded[..], &samples[..]);
}

#[test]
fn encoding_should_pad_the_final_block_and_flag_it_loop_end() {

    let samples = vec![100_i16; ADPCM_SAMPLES_PER_BLOCK + 1];

    let encoded = encode_samples(&samples, None);

    assert_eq!(encoded.len(), 2 * ADPCM_BLOCK_SIZE);
    assert_eq!(encoded[1], 0);
    assert_eq!(encoded[ADPCM_BLOCK_SIZE + 1], ADPCM_FLAG_LOOP_END);
}

#[test]
fn encoding_with_loop_points_should_set_loop_flags() {

    let samples = vec![0_i16; ADPCM_SAMPLES_PER_BLOCK * 6];
    let loop_points = LoopPoints {
        start_sample: ADPCM_SAMPLES_PER_BLOCK,
        end_sample: ADPCM_SAMPLES_PER_BLOCK * 4,
    };

    let encoded = encode_samples(&samples, Some(loop_points));

    // Data after the loop end is never played, so it is not encoded.
    assert_eq!(encoded.len(), 4 * ADPCM_BLOCK_SIZE);
    assert_eq!(encoded[ADPCM_BLOCK_SIZE + 1], ADPCM_FLAG_LOOP_START);
    assert_eq!(
        encoded[3 * ADPCM_BLOCK_SIZE + 1],
        ADPCM_FLAG_LOOP_END | ADPCM_FLAG_REPEAT
    );
}

#[test]
fn encoding_nothing_should_produce_one_silent_end_block() {

    let encoded = encode_samples(&[], None);

    assert_eq!(encoded, AdpcmBlock::silent(ADPCM_FLAG_LOOP_END).as_bytes().to_vec());
}

#[test]
fn sample_info_should_report_lengths_and_loop_points() {

    let samples = vec![0_i16; ADPCM_SAMPLES_PER_BLOCK * 5];
    let loop_points = LoopPoints {
        start_sample: ADPCM_SAMPLES_PER_BLOCK * 2,
        end_sample: ADPCM_SAMPLES_PER_BLOCK * 5,
    };
    let encoded = encode_samples(&samples, Some(loop_points));

    let info = scan_sample_info(&encoded);

    assert_eq!(info.length_in_blocks, 5);
    assert_eq!(info.length_in_samples, 140);
    assert_eq!(info.loop_start_sample, 56);
    assert_eq!(info.loop_end_sample, 140);
}

#[test]
fn sample_info_without_flags_should_span_the_whole_sample() {

    let info = scan_sample_info(&[0; ADPCM_BLOCK_SIZE * 3]);

    assert_eq!(info.loop_start_sample, 0);
    assert_eq!(info.loop_end_sample, 84);
}
