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
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use mac_address::MacAddress;
use pxe_config::strutil::strip;

pub const DHCPCD_DIR: &str = "/var/lib/dhcpcd";
pub const STATE_DIR: &str = "/var/lib/pxe-kexec";

#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("Unable to enumerate network interfaces: {0}")]
    Enumerate(String),
    #[error("Unable to read the MAC address of {0}: {1}")]
    MacAddress(String, String),
    #[error("No network interfaces found")]
    NoInterfaces,
    #[error("Specified network interface {0} does not exist")]
    InterfaceNotFound(String),
}

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Directories holding DHCP lease information per interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseDirs {
    /// `dhcpcd-<interface>.info` files with a `DHCPSIADDR=` line.
    pub dhcpcd_dir: PathBuf,
    /// `<interface>` files with a `dhcp_server_identifier=` line, written by
    /// a DHCP client hook.
    pub state_dir: PathBuf,
}

impl Default for LeaseDirs {
    fn default() -> Self {
        Self {
            dhcpcd_dir: PathBuf::from(DHCPCD_DIR),
            state_dir: PathBuf::from(STATE_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub mac: MacAddress,
    pub ip: Ipv4Addr,
    pub dhcp_server: Option<String>,
}

impl NetworkInterface {
    /// PXELINUX configuration names to probe for this interface.
    pub fn config_candidates(&self) -> Vec<String> {
        pxe_config::config_candidates(self.mac.bytes(), self.ip)
    }
}

/// Non-loopback IPv4 interfaces in the order the system lists them. An
/// interface with several addresses is reported once, with its first address.
pub fn discover_interfaces(lease_dirs: &LeaseDirs) -> NetworkResult<Vec<NetworkInterface>> {
    let addresses = local_ip_address::list_afinet_netifas()
        .map_err(|e| NetworkError::Enumerate(e.to_string()))?;

    let mut interfaces: Vec<NetworkInterface> = Vec::new();
    for (name, addr) in addresses {
        let IpAddr::V4(ip) = addr else {
            continue;
        };
        if ip.is_loopback() || interfaces.iter().any(|i| i.name == name) {
            continue;
        }

        let mac = match mac_address::mac_address_by_name(&name) {
            Ok(Some(mac)) => mac,
            Ok(None) => {
                tracing::debug!(name, "Skipping interface without MAC address");
                continue;
            }
            Err(e) => return Err(NetworkError::MacAddress(name, e.to_string())),
        };

        let dhcp_server = detect_dhcp_server(&name, lease_dirs);
        tracing::debug!(name, %mac, %ip, ?dhcp_server, "Found network interface");
        interfaces.push(NetworkInterface {
            name,
            mac,
            ip,
            dhcp_server,
        });
    }

    Ok(interfaces)
}

/// The DHCP server that configured `interface`, as recorded by dhcpcd or by
/// the pxe-kexec DHCP client hook.
pub fn detect_dhcp_server(interface: &str, lease_dirs: &LeaseDirs) -> Option<String> {
    lease_value(
        &lease_dirs.dhcpcd_dir.join(format!("dhcpcd-{interface}.info")),
        "DHCPSIADDR=",
    )
    .or_else(|| lease_value(&lease_dirs.state_dir.join(interface), "dhcp_server_identifier="))
}

fn lease_value(path: &Path, key: &str) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    text.lines()
        .find_map(|line| line.strip_prefix(key))
        .map(|value| strip(value).trim_matches(['\'', '"']).to_string())
        .filter(|value| !value.is_empty())
}

/// The interface called `name`, or the first one when no name is given.
pub fn select_interface(
    interfaces: Vec<NetworkInterface>,
    name: Option<&str>,
) -> NetworkResult<NetworkInterface> {
    match name {
        Some(name) => interfaces
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| NetworkError::InterfaceNotFound(name.to_string())),
        None => interfaces
            .into_iter()
            .next()
            .ok_or(NetworkError::NoInterfaces),
    }
}
