// SPDX-License-Identifier: GPL-3.0-only

//! Permission gate interface

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Kind of capture permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    Camera,
    Microphone,
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionKind::Camera => write!(f, "camera"),
            PermissionKind::Microphone => write!(f, "microphone"),
        }
    }
}

/// Authorization state of a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    /// Denied or restricted by policy
    Denied,
    /// The user has not been asked yet
    Undetermined,
}

/// Platform permission prompts
pub trait PermissionGate: Send + Sync {
    /// Current status without prompting
    fn status(&self, kind: PermissionKind) -> PermissionStatus;

    /// Prompt the user; resolves to `Granted` or `Denied`
    fn request(&self, kind: PermissionKind) -> BoxFuture<'static, PermissionStatus>;
}
