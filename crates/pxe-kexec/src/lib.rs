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

//! Boots an entry of a PXELINUX menu on the running system: fetches the
//! configuration from the PXE server the way a PXELINUX client would, lets the
//! operator pick an entry, downloads kernel and initrd and hands them to kexec.

pub mod boot;
pub mod cli;
pub mod config;
pub mod download;
pub mod kexec;
pub mod linuxdb;
pub mod lines;
pub mod network;
pub mod process;

pub use boot::{BootFlow, BootStage, FlowOutcome};
pub use config::{FileConfig, Options};

use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::kexec::KexecError;
use crate::network::NetworkError;

#[derive(thiserror::Error, Debug)]
pub enum PxeKexecError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Network(#[from] NetworkError),
    #[error("No PXE host specified and no DHCP server known for interface {0}")]
    NoPxeHost(String),
    #[error("No PXE configuration found.")]
    NoConfigFound,
    #[error("Unable to parse PXE configuration: {0}")]
    Parse(#[from] pxe_config::ParseError),
    #[error("Downloading {what} from {url} failed: {source}")]
    Download {
        what: &'static str,
        url: String,
        #[source]
        source: DownloadError,
    },
    #[error("Downloader setup failed: {0}")]
    DownloaderSetup(#[source] DownloadError),
    #[error("{0}")]
    Kexec(#[from] KexecError),
    #[error(
        "Distribution {0} is not known to handle a kexec'd reboot. Use --force to run 'kexec -e' \
         directly or --ignore-whitelist to reboot anyway."
    )]
    NotWhitelisted(String),
    #[error("No kernel has been downloaded")]
    NoKernelDownloaded,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PxeKexecResult<T> = Result<T, PxeKexecError>;
