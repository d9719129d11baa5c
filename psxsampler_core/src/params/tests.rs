// SPDX-License-Identifier: GPL-3.0
// tests.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use super::*;

#[test]
fn defaults_should_match_the_host_defaults() {

    let expected = [
        (ParamId::SampleRate, 11025.0),
        (ParamId::BaseNote, 84.0),
        (ParamId::LengthInSamples, 0.0),
        (ParamId::Volume, 127.0),
        (ParamId::Pan, 64.0),
        (ParamId::PitchstepUp, 1.0),
        (ParamId::PitchstepDown, 1.0),
        (ParamId::AttackStep, 3.0),
        (ParamId::AttackShift, 0.0),
        (ParamId::AttackIsExp, 0.0),
        (ParamId::DecayShift, 0.0),
        (ParamId::SustainLevel, 15.0),
        (ParamId::SustainStep, 0.0),
        (ParamId::SustainShift, 31.0),
        (ParamId::SustainDec, 0.0),
        (ParamId::SustainIsExp, 1.0),
        (ParamId::ReleaseShift, 0.0),
        (ParamId::ReleaseIsExp, 0.0),
    ];

    for (id, value) in expected {
        assert_eq!(id.default_value(), value, "{}", id.name());
    }
    assert_eq!(SamplerParams::default().pitch_bend_range, 2);
}

#[test]
fn defaults_should_be_valid() {

    assert!(SamplerParams::default().validate().is_ok());

    for id in ParamId::ALL {
        assert!(id.range().contains(id.default_value()), "{}", id.name());
    }
}

#[test]
fn set_then_get_should_give_the_value_back() {

    let mut params = SamplerParams::default();

    params.set(ParamId::Pan, 10.0).unwrap();
    params.set(ParamId::BaseNote, 60.5).unwrap();
    params.set(ParamId::SustainDec, 1.0).unwrap();
    params.set(ParamId::ReleaseShift, 31.0).unwrap();

    assert_eq!(params.get(ParamId::Pan), 10.0);
    assert_eq!(params.get(ParamId::BaseNote), 60.5);
    assert!(params.envelope.sustain_is_dec);
    assert_eq!(params.envelope.release_shift, 31);
}

#[test]
fn set_should_round_whole_number_parameters() {

    let mut params = SamplerParams::default();

    params.set(ParamId::Volume, 99.6).unwrap();

    assert_eq!(params.volume, 100);
}

#[test]
fn set_should_reject_out_of_range_values_and_keep_the_old_one() {

    let mut params = SamplerParams::default();

    let result = params.set(ParamId::AttackStep, 4.0);

    assert!(matches!(
        result,
        Err(SamplerError::ParamOutOfRange { name: "attackStep", min, max, .. }) if min == 0.0 && max == 3.0
    ));
    assert_eq!(params.envelope.attack_step, 3);
    assert!(params.set(ParamId::SampleRate, 0.0).is_err());
    assert!(params.set(ParamId::BaseNote, 0.0).is_err());
    assert!(params.set(ParamId::DecayShift, 16.0).is_err());
    assert!(params.set(ParamId::Pan, f64::NAN).is_err());
    assert!(params.set(ParamId::Volume, -1.0).is_err());
}

#[test]
fn set_should_reject_read_only_parameters() {

    let mut params = SamplerParams::default();

    for id in ParamId::ALL.into_iter().filter(|id| id.is_read_only()) {
        assert!(matches!(params.set(id, 1.0), Err(SamplerError::ReadOnlyParam(_))));
    }
    assert_eq!(params.sample_info, SampleInfo::default());
}

#[test]
fn validate_should_catch_fields_written_directly() {

    let mut params = SamplerParams::default();
    params.envelope.sustain_level = 16;

    assert!(params.validate().is_err());

    params.envelope.sustain_level = 15;
    params.pitch_bend_range = 37;

    assert!(params.validate().is_err());
}

#[test]
fn pitch_bend_range_should_be_checked() {

    let mut params = SamplerParams::default();

    params.set_pitch_bend_range(12.0).unwrap();
    assert_eq!(params.pitch_bend_range, 12);

    assert!(params.set_pitch_bend_range(37.0).is_err());
    assert_eq!(params.pitch_bend_range, 12);
}

#[test]
fn check_should_test_the_range_only() {

    assert!(ParamId::SampleRate.check(44100.0).is_ok());
    assert!(ParamId::SampleRate.check(u32::MAX as f64).is_err());
    assert!(ParamId::SampleRate.check(0.0).is_err());
}

#[test]
fn bend_ranges_should_be_capped_by_the_wheel_range() {

    let mut params = SamplerParams::default();
    params.pitchstep_up = 12;
    params.pitchstep_down = 1;
    params.pitch_bend_range = 7;

    assert_eq!(params.bend_ranges(), (7, 1));
}

#[test]
fn set_sample_info_should_update_the_read_only_values() {

    let mut params = SamplerParams::default();
    let info = SampleInfo {
        length_in_samples: 280,
        length_in_blocks: 10,
        loop_start_sample: 28,
        loop_end_sample: 280,
    };

    params.set_sample_info(info);

    assert_eq!(params.get(ParamId::LengthInBlocks), 10.0);
    assert_eq!(params.get(ParamId::LoopStartSample), 28.0);
    assert!(params.validate().is_ok());
}
