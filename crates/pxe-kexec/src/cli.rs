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
use std::path::PathBuf;

use clap::Parser;

use crate::download::Protocol;

/// Host argument meaning "the DHCP server of the interface".
pub const DHCP_HOST: &str = "-";

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "pxe-kexec",
    version,
    about = "Boots an entry of the PXELINUX configuration of a PXE server with kexec"
)]
pub struct Args {
    /// PXE server to read the configuration from. `-` or nothing uses the DHCP server.
    #[arg(value_name = "HOST")]
    pub host: Option<String>,

    /// Entry to boot without showing the menu. Implies --quiet.
    #[arg(value_name = "LABEL")]
    pub label_arg: Option<String>,

    /// Entry to boot without showing the menu.
    #[arg(short = 'l', long, conflicts_with = "label_arg")]
    pub label: Option<String>,

    /// Network interface to use. Defaults to the first non-loopback interface.
    #[arg(short = 'i', long)]
    pub interface: Option<String>,

    /// Use FTP instead of TFTP.
    #[arg(short = 'F', long, conflicts_with = "protocol")]
    pub ftp: bool,

    /// Protocol used for all downloads.
    #[arg(long, value_enum)]
    pub protocol: Option<Protocol>,

    /// Don't print the menu message and download progress.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Boot the chosen entry without asking.
    #[arg(short = 'n', long)]
    pub noconfirm: bool,

    /// Keep the downloaded kernel and initrd.
    #[arg(short = 'd', long)]
    pub nodelete: bool,

    /// Log the kexec commands instead of running them.
    #[arg(short = 'Y', long)]
    pub dry_run: bool,

    /// Run 'kexec -e' directly instead of rebooting.
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Only load the kernel, it is executed on the next reboot.
    #[arg(short = 'L', long)]
    pub load_only: bool,

    /// Reboot into the loaded kernel even on distributions not known to support it.
    #[arg(short = 'w', long)]
    pub ignore_whitelist: bool,

    /// Log everything. Same as --log-level trace.
    #[arg(short = 'D', long)]
    pub debug: bool,

    #[arg(long, default_value = "warn", help = "Log filter, e.g. 'info' or 'pxe_kexec=debug'")]
    pub log_level: String,

    /// Configuration file. Defaults to /etc/pxe-kexec.toml if it exists.
    #[arg(long, env = "PXE_KEXEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Download timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Args {
    /// The explicitly given PXE host, if any.
    pub fn pxe_host(&self) -> Option<&str> {
        self.host.as_deref().filter(|host| *host != DHCP_HOST)
    }

    pub fn boot_label(&self) -> Option<&str> {
        self.label.as_deref().or(self.label_arg.as_deref())
    }

    pub fn log_filter(&self) -> &str {
        if self.debug { "trace" } else { &self.log_level }
    }
}
