// SPDX-License-Identifier: GPL-3.0-only

//! UI host surface interface
//!
//! The surface hosts the preview, grid, focus ring, blur and flash overlays.
//! The core never touches views directly; it sends [`ViewEffect`] requests.

use crate::backends::camera::FocusPoint;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;

/// Rotation of the device as reported by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UiRotation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    /// Device rotated so its top points left (home side right)
    LandscapeLeft,
    /// Device rotated so its top points right (home side left)
    LandscapeRight,
    FaceUp,
    FaceDown,
}

/// Overlay views hosted by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayView {
    Preview,
    Blur,
    Grid,
    FocusRing,
    CaptureFlash,
}

/// Transform applied to an overlay view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewTransform {
    Identity,
    Scale(f32),
    /// Rotate about the vertical axis by the given angle in degrees
    FlipY(f32),
}

/// A single alpha/transform mutation request for the UI surface
#[derive(Clone, PartialEq)]
pub enum ViewEffect {
    /// Install the blur view showing a frozen snapshot
    ShowFreeze { snapshot: Option<Arc<RgbaImage>> },
    /// Remove the blur view and drop its snapshot
    RemoveFreeze,
    Alpha {
        view: OverlayView,
        alpha: f32,
        duration: Duration,
    },
    Transform {
        view: OverlayView,
        transform: ViewTransform,
        duration: Duration,
    },
    /// Move a view's center to a normalized point
    Position { view: OverlayView, point: FocusPoint },
}

impl std::fmt::Debug for ViewEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewEffect::ShowFreeze { snapshot } => f
                .debug_struct("ShowFreeze")
                .field("has_snapshot", &snapshot.is_some())
                .finish(),
            ViewEffect::RemoveFreeze => write!(f, "RemoveFreeze"),
            ViewEffect::Alpha {
                view,
                alpha,
                duration,
            } => f
                .debug_struct("Alpha")
                .field("view", view)
                .field("alpha", alpha)
                .field("duration", duration)
                .finish(),
            ViewEffect::Transform {
                view,
                transform,
                duration,
            } => f
                .debug_struct("Transform")
                .field("view", view)
                .field("transform", transform)
                .field("duration", duration)
                .finish(),
            ViewEffect::Position { view, point } => f
                .debug_struct("Position")
                .field("view", view)
                .field("point", point)
                .finish(),
        }
    }
}

/// Host surface owned by the UI layer
pub trait UiSurface: Send + Sync {
    /// Current device rotation as seen by the UI
    fn device_rotation(&self) -> UiRotation;

    /// Apply an animation request
    fn apply(&self, effect: &ViewEffect);

    /// Detach all overlays and release the preview surface
    fn release(&self);
}
