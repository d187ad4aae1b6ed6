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
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::download::Protocol;
use crate::network::{DHCPCD_DIR, LeaseDirs, STATE_DIR};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/pxe-kexec.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `/etc/pxe-kexec.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "std::env::temp_dir")]
    pub tmp_dir: PathBuf,
    #[serde(default = "default_curl_binary")]
    pub curl_binary: String,
    #[serde(default = "default_kexec_binary")]
    pub kexec_binary: String,
    #[serde(default = "default_reboot_binary")]
    pub reboot_binary: String,
    #[serde(default = "default_dhcpcd_dir")]
    pub dhcpcd_dir: PathBuf,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            interface: None,
            host: None,
            timeout_secs: default_timeout_secs(),
            tmp_dir: std::env::temp_dir(),
            curl_binary: default_curl_binary(),
            kexec_binary: default_kexec_binary(),
            reboot_binary: default_reboot_binary(),
            dhcpcd_dir: default_dhcpcd_dir(),
            state_dir: default_state_dir(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_curl_binary() -> String {
    "curl".to_string()
}

fn default_kexec_binary() -> String {
    "kexec".to_string()
}

fn default_reboot_binary() -> String {
    "reboot".to_string()
}

fn default_dhcpcd_dir() -> PathBuf {
    PathBuf::from(DHCPCD_DIR)
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(STATE_DIR)
}

impl FileConfig {
    /// Loads the configuration file in toml format from the given path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, or the default file if there is one.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_from(default_path)
                } else {
                    tracing::debug!(path = DEFAULT_CONFIG_PATH, "No configuration file");
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Everything the boot flow needs to know, from the command line and the
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub host: Option<String>,
    pub interface: Option<String>,
    pub protocol: Protocol,
    pub label: Option<String>,
    pub quiet: bool,
    pub noconfirm: bool,
    pub keep_files: bool,
    pub dry_run: bool,
    pub force: bool,
    pub load_only: bool,
    pub ignore_whitelist: bool,
    pub timeout: Duration,
    pub tmp_dir: PathBuf,
    pub curl_binary: String,
    pub kexec_binary: String,
    pub reboot_binary: String,
    pub lease_dirs: LeaseDirs,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_args_and_config(&Args::default(), FileConfig::default())
    }
}

impl Options {
    /// Command line values win over the configuration file.
    pub fn from_args_and_config(args: &Args, file: FileConfig) -> Self {
        let label = args.boot_label().map(str::to_string);
        let protocol = if args.ftp {
            Protocol::Ftp
        } else {
            args.protocol.unwrap_or(file.protocol)
        };

        // An explicit `-` asks for the DHCP server even if a host is configured.
        let host = match args.host {
            Some(_) => args.pxe_host().map(str::to_string),
            None => file.host,
        };

        Self {
            host,
            interface: args.interface.clone().or(file.interface),
            protocol,
            quiet: args.quiet || label.is_some(),
            label,
            noconfirm: args.noconfirm,
            keep_files: args.nodelete,
            dry_run: args.dry_run,
            force: args.force,
            load_only: args.load_only,
            ignore_whitelist: args.ignore_whitelist,
            timeout: Duration::from_secs(args.timeout.unwrap_or(file.timeout_secs)),
            tmp_dir: file.tmp_dir,
            curl_binary: file.curl_binary,
            kexec_binary: file.kexec_binary,
            reboot_binary: file.reboot_binary,
            lease_dirs: LeaseDirs {
                dhcpcd_dir: file.dhcpcd_dir,
                state_dir: file.state_dir,
            },
        }
    }
}
