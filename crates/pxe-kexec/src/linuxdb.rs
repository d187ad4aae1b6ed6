/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

//! Detection of the running Linux distribution. Only distributions known to
//! execute a kexec-loaded kernel at the end of a regular `reboot` are
//! whitelisted for the reboot handoff.

use std::fmt;
use std::path::Path;

use version_compare::Cmp;

pub const LSB_RELEASE: &str = "/etc/lsb-release";
pub const OS_RELEASE: &str = "/etc/os-release";

/// Oldest Ubuntu release whose shutdown scripts run `kexec -e`.
const UBUNTU_KEXEC_REBOOT: &str = "9.10";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistType {
    #[default]
    Unknown,
    Suse,
    Debian,
    Ubuntu,
    RedHat,
    Arch,
}

impl DistType {
    pub fn from_id(id: &str) -> Self {
        let id = id.to_ascii_lowercase();
        match id.as_str() {
            "ubuntu" => Self::Ubuntu,
            "debian" => Self::Debian,
            "redhat" | "redhatenterpriseserver" | "rhel" | "fedora" | "centos" => Self::RedHat,
            "arch" | "archlinux" => Self::Arch,
            _ if id.contains("suse") => Self::Suse,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinuxDistribution {
    pub dist_type: DistType,
    pub distribution: String,
    pub release: String,
    pub codename: String,
    pub description: String,
}

impl LinuxDistribution {
    /// Reads the `DISTRIB_*` keys of an `lsb-release` file.
    pub fn from_lsb_release(text: &str) -> Self {
        let mut dist = Self::default();
        for (key, value) in key_values(text) {
            match key {
                "DISTRIB_ID" => dist.distribution = value,
                "DISTRIB_RELEASE" => dist.release = value,
                "DISTRIB_CODENAME" => dist.codename = value,
                "DISTRIB_DESCRIPTION" => dist.description = value,
                _ => {}
            }
        }
        dist.dist_type = DistType::from_id(&dist.distribution);
        dist
    }

    pub fn from_os_release(text: &str) -> Self {
        let mut dist = Self::default();
        let mut id = String::new();
        for (key, value) in key_values(text) {
            match key {
                "ID" => id = value,
                "NAME" => dist.distribution = value,
                "VERSION_ID" => dist.release = value,
                "VERSION_CODENAME" => dist.codename = value,
                "PRETTY_NAME" => dist.description = value,
                _ => {}
            }
        }
        dist.dist_type = match DistType::from_id(&id) {
            DistType::Unknown => DistType::from_id(&dist.distribution),
            known => known,
        };
        dist
    }

    /// Whether a `reboot` is known to end in the loaded kernel.
    pub fn is_whitelisted(&self) -> bool {
        match self.dist_type {
            DistType::Suse | DistType::Debian | DistType::RedHat => true,
            DistType::Ubuntu if self.release.is_empty() => false,
            DistType::Ubuntu => {
                version_compare::compare_to(&self.release, UBUNTU_KEXEC_REBOOT, Cmp::Ge)
                    .is_ok_and(|r| r)
            }
            DistType::Arch | DistType::Unknown => false,
        }
    }
}

impl fmt::Display for LinuxDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.description.is_empty() {
            write!(f, "{}", self.description)
        } else if self.distribution.is_empty() {
            write!(f, "unknown")
        } else if self.release.is_empty() {
            write!(f, "{}", self.distribution)
        } else {
            write!(f, "{} {}", self.distribution, self.release)
        }
    }
}

fn key_values(text: &str) -> impl Iterator<Item = (&str, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match line.split_once('=') {
            Some((key, value)) => Some((key.trim(), value.trim().trim_matches('"').to_string())),
            None => {
                tracing::warn!(line, "Invalid line in release file");
                None
            }
        })
}

/// Detects the distribution from `lsb_release`, falling back to `os_release`.
/// `None` when neither file can be read.
pub fn detect_from(lsb_release: &Path, os_release: &Path) -> Option<LinuxDistribution> {
    if let Ok(text) = std::fs::read_to_string(lsb_release) {
        return Some(LinuxDistribution::from_lsb_release(&text));
    }
    match std::fs::read_to_string(os_release) {
        Ok(text) => Some(LinuxDistribution::from_os_release(&text)),
        Err(e) => {
            tracing::debug!(error = %e, "No distribution information found");
            None
        }
    }
}

pub fn detect() -> Option<LinuxDistribution> {
    let dist = detect_from(Path::new(LSB_RELEASE), Path::new(OS_RELEASE));
    tracing::debug!(?dist, "Detected Linux distribution");
    dist
}
