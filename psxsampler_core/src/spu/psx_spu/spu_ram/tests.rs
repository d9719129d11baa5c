// SPDX-License-Identifier: GPL-3.0
// tests.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use super::*;

#[test]
fn new_should_reject_sizes_which_are_not_block_multiples() {

    assert!(matches!(
        SpuRam::new(100),
        Err(SamplerError::InvalidRamSize { bytes: 100, block_size: 16 })
    ));
}

#[test]
fn new_should_reject_arenas_too_small_for_the_terminator() {

    assert!(SpuRam::new(16).is_err());
    assert!(SpuRam::new(32).is_ok());
}

#[test]
fn new_should_zero_the_arena() {

    let ram = SpuRam::new(SPU_RAM_SIZE).unwrap();

    assert_eq!(ram.size(), SPU_RAM_SIZE);
    assert_eq!(ram.capacity_blocks(), 32768);
    assert!(ram.as_bytes().iter().all(|&byte| byte == 0));
}

#[test]
fn write_sample_should_pad_a_partial_final_block() {

    let mut ram = SpuRam::new(256).unwrap();
    ram.write_sample(&[0xFF; 64]);

    let range = ram.write_sample(&[0x11; 20]);

    assert_eq!(range, BlockRange { first_block: 0, block_count: 2 });
    assert_eq!(&ram.as_bytes()[..20], &[0x11; 20]);
    assert_eq!(&ram.as_bytes()[20..32], &[0; 12]);
}

#[test]
fn write_sample_should_truncate_to_capacity() {

    let mut ram = SpuRam::new(64).unwrap();

    let range = ram.write_sample(&[0x22; 100]);

    assert_eq!(range.block_count, 4);
    assert_eq!(range.end_address(), 64);
    assert_eq!(ram.sample_block_count(), 4);
}

#[test]
fn terminator_should_follow_the_sample() {

    let mut ram = SpuRam::new(256).unwrap();
    ram.write_sample(&[0x33; 48]);
    ram.place_terminator();

    let bytes = ram.as_bytes();
    assert_eq!(ram.terminator_address(), 48);
    assert_eq!(bytes[48], 0);
    assert_eq!(bytes[49], ADPCM_FLAG_LOOP_START);
    assert_eq!(&bytes[50..64], &[0; 14]);
    assert_eq!(bytes[64], 0);
    assert_eq!(bytes[65], ADPCM_FLAG_LOOP_END);
    assert_eq!(&bytes[66..80], &[0; 14]);
}

#[test]
fn terminator_should_overwrite_the_tail_of_a_full_arena() {

    let mut ram = SpuRam::new(128).unwrap();
    ram.write_sample(&[0x44; 128]);
    ram.place_terminator();

    let bytes = ram.as_bytes();
    assert_eq!(ram.terminator_block_index_for(8), 6);
    assert_eq!(ram.terminator_address(), 96);
    assert_eq!(bytes[97], ADPCM_FLAG_LOOP_START);
    assert_eq!(bytes[113], ADPCM_FLAG_LOOP_END);
    assert_eq!(&bytes[..96], &[0x44; 96]);
}

#[test]
fn placing_the_terminator_twice_should_change_nothing() {

    let mut ram = SpuRam::new(256).unwrap();
    ram.write_sample(&[0x55; 80]);
    ram.place_terminator();
    let first = ram.as_bytes().to_vec();

    ram.place_terminator();

    assert_eq!(ram.as_bytes(), &first[..]);
}

#[test]
fn sanitize_address_should_redirect_bad_addresses_to_the_terminator() {

    let mut ram = SpuRam::new(256).unwrap();
    ram.write_sample(&[0x66; 32]);
    ram.place_terminator();

    assert_eq!(ram.sanitize_address(16), 16);
    assert_eq!(ram.sanitize_address(17), 32);
    assert_eq!(ram.sanitize_address(256), 32);
    assert_eq!(ram.sanitize_address(u32::MAX), 32);
}

#[test]
fn read_block_past_the_arena_should_give_silence() {

    let mut ram = SpuRam::new(256).unwrap();
    ram.write_sample(&[0x77; 32]);
    ram.place_terminator();

    let block = ram.read_block(10_000);

    assert!(block.is_loop_start());
    assert_eq!(ram.flags_at(10_000), ADPCM_FLAG_LOOP_START);
    assert_eq!(&block.as_bytes()[2..], &[0; 14]);
}
