// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");

    // Packagers can pin the version string
    let version = if let Ok(v) = std::env::var("CAMERA_SESSION_VERSION") {
        v
    } else {
        get_git_version()
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn get_git_version() -> String {
    // "v0.1.0" at a tag, "v0.1.0-5-gabcdef1" after it
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output();

    let version = match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => return env_version_or_hash(),
    };

    // Strip 'v' prefix if present
    let version = version.strip_prefix('v').unwrap_or(&version);

    // Get the current commit hash for all builds
    let commit_hash = get_commit_hash().unwrap_or_else(|| "unknown".to_string());

    if version.contains('-') {
        let parts: Vec<&str> = version.rsplitn(3, '-').collect();
        if parts.len() >= 3 {
            let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
            let base_version = parts[2];
            format!("{}-dirty-{}", base_version, hash)
        } else {
            version.to_string()
        }
    } else {
        format!("{}-{}", version, commit_hash)
    }
}

/// Outside a git checkout fall back to the crate version, tagged with the
/// commit hash when one can be read.
fn env_version_or_hash() -> String {
    let crate_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    match get_commit_hash() {
        Some(hash) => format!("{}-{}", crate_version, hash),
        None => crate_version,
    }
}

fn get_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
