// SPDX-License-Identifier: MPL-2.0

//! Property tests for device clamping and orientation tagging

use camera_session::app::{DeviceOrientation, OrientationTracker};
use camera_session::backends::camera::{
    CameraPosition, CaptureDevice, DeviceConfigurator, DeviceRegistry,
};
use camera_session::backends::motion::Acceleration;
use camera_session::backends::simulated::SimulatedCamera;
use camera_session::backends::surface::UiRotation;
use camera_session::constants::frame_rate::MIN_FRAME_RATE;
use camera_session::constants::zoom::MAX_ZOOM_FACTOR;
use camera_session::errors::ConfigurationError;
use proptest::prelude::*;
use std::sync::Arc;

fn devices() -> (Arc<SimulatedCamera>, DeviceConfigurator, Vec<CaptureDevice>) {
    let camera = Arc::new(SimulatedCamera::new());
    let configurator = DeviceConfigurator::new(camera.clone());
    let resolved = DeviceRegistry::new(camera.clone()).resolve_devices().unwrap();
    let cameras = [resolved.back, resolved.front].into_iter().flatten().collect();
    (camera, configurator, cameras)
}

fn rotation() -> impl Strategy<Value = UiRotation> {
    prop_oneof![
        Just(UiRotation::Unknown),
        Just(UiRotation::Portrait),
        Just(UiRotation::PortraitUpsideDown),
        Just(UiRotation::LandscapeLeft),
        Just(UiRotation::LandscapeRight),
        Just(UiRotation::FaceUp),
        Just(UiRotation::FaceDown),
    ]
}

fn position() -> impl Strategy<Value = CameraPosition> {
    prop_oneof![Just(CameraPosition::Back), Just(CameraPosition::Front)]
}

proptest! {
    #[test]
    fn zoom_always_within_capped_range(requested in -100.0f64..100.0) {
        let (camera, configurator, cameras) = devices();
        for device in &cameras {
            let (min, max) = device.capabilities.zoom_range();
            let applied = configurator.apply_zoom(device, requested).unwrap();

            prop_assert!(applied >= min);
            prop_assert!(applied <= max.min(MAX_ZOOM_FACTOR));
            prop_assert_eq!(camera.device_state(device.id()).zoom_factor, applied);
            prop_assert!(!camera.is_locked(device.id()));
        }
    }

    #[test]
    fn frame_rate_accepted_only_within_bounds(fps in 0u32..200) {
        let (camera, configurator, cameras) = devices();
        for device in &cameras {
            let max = device.capabilities.max_frame_rate();
            let before = camera.device_state(device.id());

            match configurator.apply_frame_rate(device, fps) {
                Ok(applied) => {
                    prop_assert!((MIN_FRAME_RATE..=max).contains(&fps));
                    prop_assert_eq!(applied, fps);
                    let state = camera.device_state(device.id());
                    prop_assert_eq!(state.min_frame_duration, state.max_frame_duration);
                }
                Err(e) => {
                    prop_assert!(fps < MIN_FRAME_RATE || fps > max);
                    let is_invalid_frame_rate = matches!(e, ConfigurationError::InvalidFrameRate { .. });
                    prop_assert!(is_invalid_frame_rate);
                    prop_assert_eq!(camera.device_state(device.id()), before);
                }
            }
        }
    }

    #[test]
    fn frame_tags_are_total(position in position(), rotation in rotation(), mirror: bool) {
        let tag = OrientationTracker::frame_tag_for(position, rotation, mirror);
        prop_assert_eq!(tag.is_none(), rotation == UiRotation::PortraitUpsideDown);
        if let Some(tag) = tag {
            // Front camera output is mirrored unless the mirror flag undoes it
            let expect_mirrored = (position == CameraPosition::Front) != mirror;
            prop_assert_eq!(tag.is_mirrored(), expect_mirrored);
        }
    }

    #[test]
    fn upside_down_keeps_previous_tag(
        position in position(),
        first in rotation(),
        mirror: bool,
    ) {
        let mut tracker = OrientationTracker::new();
        let before = tracker.update_frame_tag(position, first, mirror);
        let after = tracker.update_frame_tag(position, UiRotation::PortraitUpsideDown, mirror);
        prop_assert_eq!(before, after);
    }

    #[test]
    fn logical_orientation_changes_only_past_threshold(
        samples in prop::collection::vec((-1.5f64..1.5, -1.5f64..1.5), 1..40),
    ) {
        let mut tracker = OrientationTracker::new();
        for (x, y) in samples {
            let previous = tracker.logical();
            let sample = Acceleration::new(x, y, 0.0);
            let changed = tracker.update_logical(&sample);

            match OrientationTracker::candidate(&sample) {
                Some(candidate) => prop_assert_eq!(tracker.logical(), candidate),
                None => prop_assert_eq!(tracker.logical(), previous),
            }
            prop_assert_eq!(changed, tracker.logical() != previous);
        }
    }

    #[test]
    fn lock_pins_frame_tag_to_portrait(
        position in position(),
        rotation in rotation(),
        mirror: bool,
    ) {
        let mut tracker = OrientationTracker::new();
        tracker.set_locked(true);
        let tag = tracker.update_frame_tag(position, rotation, mirror);

        prop_assert_eq!(
            Some(tag),
            OrientationTracker::frame_tag_for(position, UiRotation::Portrait, mirror)
        );
        prop_assert!(!tracker.user_blocked_rotation(rotation));
        prop_assert_eq!(tracker.logical(), DeviceOrientation::Portrait);
    }
}
