// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules
//!
//! Handlers are `impl CameraSession` blocks organized by functional domain.

mod camera;
mod capture;
mod exposure;
mod orientation;
mod system;
