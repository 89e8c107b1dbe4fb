// SPDX-License-Identifier: GPL-3.0-only

//! Animation sequencing
//!
//! Pure timing logic: every function returns the view effects of one
//! animation together with the delay at which each must be applied. The
//! session applies zero-delay effects immediately and schedules the rest.

use crate::backends::camera::FocusPoint;
use crate::backends::surface::{OverlayView, ViewEffect, ViewTransform};
use crate::constants::animation::*;
use crate::constants::timing::{BLUR_FLIP_LEAD_TIME, BLUR_LEAD_TIME};
use crate::pipelines::TransitionKind;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;

/// A view effect due `delay` after the animation starts
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEffect {
    pub delay: Duration,
    pub effect: ViewEffect,
}

impl ScheduledEffect {
    fn now(effect: ViewEffect) -> Self {
        Self {
            delay: Duration::ZERO,
            effect,
        }
    }

    fn after(delay: Duration, effect: ViewEffect) -> Self {
        Self { delay, effect }
    }
}

fn alpha(view: OverlayView, alpha: f32, duration: Duration) -> ViewEffect {
    ViewEffect::Alpha {
        view,
        alpha,
        duration,
    }
}

fn transform(view: OverlayView, transform: ViewTransform, duration: Duration) -> ViewEffect {
    ViewEffect::Transform {
        view,
        transform,
        duration,
    }
}

pub struct AnimationSequencer;

impl AnimationSequencer {
    /// White flash that fades out after a still capture
    pub fn capture_flash() -> Vec<ScheduledEffect> {
        vec![
            ScheduledEffect::now(alpha(OverlayView::CaptureFlash, 1.0, Duration::ZERO)),
            ScheduledEffect::now(alpha(OverlayView::CaptureFlash, 0.0, CAPTURE_FLASH_FADE)),
        ]
    }

    /// Focus ring: appear at `point`, shrink, hold, fade
    pub fn focus_ring(point: FocusPoint) -> Vec<ScheduledEffect> {
        let ring = OverlayView::FocusRing;
        vec![
            ScheduledEffect::now(ViewEffect::Position { view: ring, point }),
            ScheduledEffect::now(transform(
                ring,
                ViewTransform::Scale(FOCUS_RING_INITIAL_SCALE),
                Duration::ZERO,
            )),
            ScheduledEffect::now(alpha(ring, 1.0, Duration::ZERO)),
            ScheduledEffect::now(transform(ring, ViewTransform::Scale(1.0), FOCUS_RING_APPEAR)),
            ScheduledEffect::after(
                FOCUS_RING_APPEAR + FOCUS_RING_VISIBLE,
                alpha(ring, 0.0, FOCUS_RING_FADE),
            ),
        ]
    }

    pub fn grid_fade(visible: bool) -> Vec<ScheduledEffect> {
        let target = if visible { 1.0 } else { 0.0 };
        vec![ScheduledEffect::now(alpha(OverlayView::Grid, target, GRID_FADE))]
    }

    /// Show the frozen snapshot blurred over the preview; flip it for camera swaps
    pub fn freeze(kind: TransitionKind, snapshot: Option<Arc<RgbaImage>>) -> Vec<ScheduledEffect> {
        let mut effects = vec![
            ScheduledEffect::now(ViewEffect::ShowFreeze { snapshot }),
            ScheduledEffect::now(alpha(OverlayView::Blur, 1.0, FREEZE_FADE_IN)),
        ];
        if kind == TransitionKind::BlurFlip {
            effects.push(ScheduledEffect::now(transform(
                OverlayView::Preview,
                ViewTransform::FlipY(90.0),
                FLIP_HALF,
            )));
            effects.push(ScheduledEffect::after(
                FLIP_HALF,
                transform(OverlayView::Preview, ViewTransform::FlipY(0.0), FLIP_HALF),
            ));
        }
        effects
    }

    /// Time between the start of a freeze and the swap
    pub fn lead_time(kind: TransitionKind) -> Duration {
        match kind {
            TransitionKind::Blur => BLUR_LEAD_TIME,
            TransitionKind::BlurFlip => BLUR_FLIP_LEAD_TIME,
        }
    }

    /// Fade the blur out
    ///
    /// The freeze view stays up until [`Self::unfreeze_duration`] elapsed;
    /// the session removes it together with the frozen snapshot.
    pub fn unfreeze() -> Vec<ScheduledEffect> {
        vec![ScheduledEffect::now(alpha(
            OverlayView::Blur,
            0.0,
            UNFREEZE_FADE_OUT,
        ))]
    }

    pub fn unfreeze_duration() -> Duration {
        UNFREEZE_FADE_OUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_completes_within_lead_time() {
        let effects = AnimationSequencer::freeze(TransitionKind::BlurFlip, None);
        let end = effects
            .iter()
            .map(|e| {
                let duration = match &e.effect {
                    ViewEffect::Transform { duration, .. } | ViewEffect::Alpha { duration, .. } => {
                        *duration
                    }
                    _ => Duration::ZERO,
                };
                e.delay + duration
            })
            .max()
            .unwrap();
        assert!(end <= AnimationSequencer::lead_time(TransitionKind::BlurFlip));
    }

    #[test]
    fn test_blur_freeze_has_no_flip() {
        let effects = AnimationSequencer::freeze(TransitionKind::Blur, None);
        assert!(effects.iter().all(|e| !matches!(e.effect, ViewEffect::Transform { .. })));
        assert!(matches!(effects[0].effect, ViewEffect::ShowFreeze { .. }));
    }

    #[test]
    fn test_unfreeze_only_fades() {
        let effects = AnimationSequencer::unfreeze();
        assert!(effects.iter().all(|e| e.delay.is_zero()));
        assert!(effects.iter().all(|e| e.effect != ViewEffect::RemoveFreeze));
        assert_eq!(
            effects[0].effect,
            alpha(OverlayView::Blur, 0.0, AnimationSequencer::unfreeze_duration())
        );
    }

    #[test]
    fn test_focus_ring_fades_last() {
        let point = FocusPoint::new(0.25, 0.75);
        let effects = AnimationSequencer::focus_ring(point);

        assert_eq!(
            effects[0].effect,
            ViewEffect::Position {
                view: OverlayView::FocusRing,
                point
            }
        );
        let last = effects.last().unwrap();
        assert_eq!(last.delay, FOCUS_RING_APPEAR + FOCUS_RING_VISIBLE);
        assert!(matches!(last.effect, ViewEffect::Alpha { alpha, .. } if alpha == 0.0));
    }

    #[test]
    fn test_grid_fade_targets() {
        let shown = AnimationSequencer::grid_fade(true);
        assert!(matches!(shown[0].effect, ViewEffect::Alpha { alpha, .. } if alpha == 1.0));
        let hidden = AnimationSequencer::grid_fade(false);
        assert!(matches!(hidden[0].effect, ViewEffect::Alpha { alpha, .. } if alpha == 0.0));
    }
}
