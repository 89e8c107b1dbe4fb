// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_session::app::AnimationSequencer;
use camera_session::constants::{animation, frame_rate, orientation, timing, zoom};
use camera_session::pipelines::TransitionKind;

#[test]
fn test_frame_rate_default_within_bounds() {
    assert!(frame_rate::DEFAULT_FRAME_RATE >= frame_rate::MIN_FRAME_RATE);
}

#[test]
fn test_zoom_cap_above_unity() {
    assert!(zoom::MAX_ZOOM_FACTOR > 1.0);
}

#[test]
fn test_orientation_threshold_leaves_dead_zone() {
    // Diagonal holds (both axes near 0.707 g) must fall inside the dead zone
    let diagonal = std::f64::consts::FRAC_1_SQRT_2;
    assert!(orientation::GRAVITY_THRESHOLD > diagonal);
    assert!(orientation::GRAVITY_THRESHOLD < 1.0);
}

#[test]
fn test_lead_times_cover_freeze_fade_in() {
    for kind in [TransitionKind::Blur, TransitionKind::BlurFlip] {
        assert!(
            AnimationSequencer::lead_time(kind) >= animation::FREEZE_FADE_IN,
            "{:?} swaps before the blur is opaque",
            kind
        );
    }
    assert_eq!(AnimationSequencer::lead_time(TransitionKind::Blur), timing::BLUR_LEAD_TIME);
    assert_eq!(
        AnimationSequencer::lead_time(TransitionKind::BlurFlip),
        timing::BLUR_FLIP_LEAD_TIME
    );
}

#[test]
fn test_recording_tick_is_one_second() {
    assert_eq!(timing::RECORDING_TICK.as_secs(), 1);
}
