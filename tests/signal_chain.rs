use std::f32::consts::PI;

use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use eqscope::audio::{
    find_preset, OfflineHost, Preset, SampleSource, SignalChain, BUILTIN_PRESETS,
};
use eqscope::params::{audio_constants, EqualizerConfig};
use eqscope::EngineError;

const SAMPLE_RATE: u32 = 44100;

fn chain() -> SignalChain<OfflineHost> {
    SignalChain::build(EqualizerConfig::default(), OfflineHost::new(SAMPLE_RATE, 2)).unwrap()
}

fn sine(freq: f32, amplitude: f32, seconds: f32) -> SampleSource {
    let frames = (seconds * SAMPLE_RATE as f32) as usize;
    let samples = (0..frames)
        .map(|i| (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin() * amplitude)
        .collect();
    SampleSource::new(samples, 1, SAMPLE_RATE).looping(true)
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Five time constants of settle time
fn settle(chain: &mut SignalChain<OfflineHost>) {
    chain
        .host_mut()
        .run_for(5.0 * audio_constants::SMOOTHING_TIME_CONSTANT_S + 0.01);
}

#[test]
fn test_gain_change_ramps_then_settles() {
    let mut chain = chain();
    chain.set_band_gain(4, 9.0).unwrap();

    // Target is visible immediately, the audible gain is not
    assert_eq!(chain.get_current_gains()[4], 9.0);
    chain.host_mut().render(16);
    assert!(chain.effective_gains()[4] < 1.0);

    settle(&mut chain);
    assert_abs_diff_eq!(chain.effective_gains()[4], 9.0, epsilon = 0.1);
}

#[test]
fn test_every_preset_sets_all_targets() {
    let mut chain = chain();
    for preset in BUILTIN_PRESETS.iter() {
        chain.apply_preset(preset).unwrap();
        assert_eq!(chain.get_current_gains(), preset.gains_db.to_vec(), "{}", preset.name);
    }
}

#[test]
fn test_rejected_operations_leave_gains_unchanged() {
    let mut chain = chain();
    chain.apply_preset_named("rock").unwrap();
    let before = chain.get_current_gains();

    let err = chain.set_band_gain(10, 3.0).unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidIndex {
            index: 10,
            band_count: 10
        }
    );

    let short = Preset::custom("short", vec![1.0; 9]);
    let err = chain.apply_preset(&short).unwrap_err();
    assert_eq!(
        err,
        EngineError::PresetSizeMismatch {
            expected: 10,
            actual: 9
        }
    );

    assert!(matches!(
        chain.apply_preset_named("dubstep"),
        Err(EngineError::UnknownPreset(_))
    ));
    assert_eq!(chain.get_current_gains(), before);
}

#[test]
fn test_bass_preset_boosts_low_tone() {
    let mut flat = chain();
    let mut bass = chain();
    for chain in [&mut flat, &mut bass] {
        chain.set_master_gain(1.0);
        chain.attach_source(Box::new(sine(60.0, 0.1, 1.0)));
        chain.play().unwrap();
    }
    bass.apply_preset(find_preset("bass-boost").unwrap()).unwrap();
    settle(&mut flat);
    settle(&mut bass);

    let flat_rms = rms(&flat.host_mut().render(8820));
    let bass_rms = rms(&bass.host_mut().render(8820));

    assert_abs_diff_eq!(flat_rms, 0.1 / 2f32.sqrt(), epsilon = 0.005);
    // +10 dB centred on 60 Hz plus the skirt of the +8 dB 150 Hz band
    assert!(bass_rms > flat_rms * 2.0, "bass {} flat {}", bass_rms, flat_rms);
}

#[test]
fn test_treble_preset_settles_presence_band() {
    let mut chain = chain();
    chain.set_master_gain(1.0);
    chain.apply_preset_named("treble").unwrap();
    chain.attach_source(Box::new(sine(1000.0, 0.1, 1.0)));
    chain.play().unwrap();
    settle(&mut chain);
    assert_abs_diff_eq!(chain.effective_gains()[5], 5.0, epsilon = 0.1);
    assert!(rms(&chain.host_mut().render(4410)) > 0.0);
}

#[test]
fn test_volume_ramps_without_jump() {
    let mut chain = chain();
    assert_abs_diff_eq!(chain.get_volume(), 0.7);
    chain.set_master_gain(0.0);
    assert_eq!(chain.get_volume(), 0.0);

    chain.host_mut().render(1);
    assert!(chain.effective_volume() > 0.65);

    settle(&mut chain);
    assert!(chain.effective_volume() < 0.01);
}

#[test]
fn test_suspended_output_needs_resume() {
    let mut chain =
        SignalChain::build(EqualizerConfig::default(), OfflineHost::new(SAMPLE_RATE, 2).suspended())
            .unwrap();
    chain.attach_source(Box::new(sine(440.0, 0.2, 0.5)));
    assert!(matches!(
        chain.play(),
        Err(EngineError::PlaybackStartFailed(_))
    ));

    chain.resume_if_suspended();
    chain.resume_if_suspended();
    chain.play().unwrap();
    assert!(chain.is_playing());
}

#[test]
fn test_unavailable_host_reports_engine_unavailable() {
    let result = SignalChain::build(
        EqualizerConfig::default(),
        OfflineHost::new(SAMPLE_RATE, 2).unavailable(),
    );
    assert!(matches!(result, Err(EngineError::EngineUnavailable(_))));
}

#[test]
fn test_source_end_stops_and_replay_rewinds() {
    let mut chain = chain();
    let short = SampleSource::new(vec![0.3; 1000], 1, SAMPLE_RATE);
    chain.attach_source(Box::new(short));
    chain.play().unwrap();
    chain.host_mut().render(2048);
    assert!(!chain.is_playing());

    chain.play().unwrap();
    let out = chain.host_mut().render(64);
    assert!(out.iter().any(|&s| s != 0.0));
}

#[test]
fn test_reset_returns_to_flat() {
    let mut chain = chain();
    chain.apply_preset_named("pop").unwrap();
    chain.reset().unwrap();
    assert!(chain.get_current_gains().iter().all(|&g| g == 0.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_requested_gain_is_clamped(index in 0usize..10, gain in -100.0f32..100.0) {
        let mut chain = chain();
        chain.set_band_gain(index, gain).unwrap();
        let stored = chain.get_current_gains()[index];
        prop_assert!((-12.0..=12.0).contains(&stored));
        prop_assert_eq!(stored, gain.clamp(-12.0, 12.0));
    }

    #[test]
    fn prop_effective_gain_reaches_target(index in 0usize..10, gain in -12.0f32..12.0) {
        let mut chain = chain();
        chain.set_band_gain(index, gain).unwrap();
        settle(&mut chain);
        prop_assert!((chain.effective_gains()[index] - gain).abs() < 0.1);
    }

    #[test]
    fn prop_volume_is_clamped(volume in -5.0f32..5.0) {
        let mut chain = chain();
        chain.set_master_gain(volume);
        prop_assert!((0.0..=1.0).contains(&chain.get_volume()));
    }
}
