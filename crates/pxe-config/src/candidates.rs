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

//! The names PXELINUX requests below `pxelinux.cfg/`, most specific first:
//! the client MAC with ARP type prefix `01`, then the client IP in hex with one
//! trailing digit removed at a time, then `default`.

use std::net::Ipv4Addr;

/// Number of names returned by [`config_candidates`].
pub const CANDIDATE_COUNT: usize = 10;

pub const DEFAULT_CANDIDATE: &str = "default";

/// `01-` followed by the lowercase, dash separated MAC address.
pub fn mac_candidate(mac: [u8; 6]) -> String {
    let octets: Vec<String> = mac.iter().map(|b| format!("{b:02x}")).collect();
    format!("01-{}", octets.join("-"))
}

/// The IPv4 address as 8 uppercase hex digits, zero padded.
pub fn ip_hex(ip: Ipv4Addr) -> String {
    format!("{:08X}", u32::from(ip))
}

pub fn config_candidates(mac: [u8; 6], ip: Ipv4Addr) -> Vec<String> {
    let hex = ip_hex(ip);

    let mut names = Vec::with_capacity(CANDIDATE_COUNT);
    names.push(mac_candidate(mac));
    names.extend((1..=hex.len()).rev().map(|len| hex[..len].to_string()));
    names.push(DEFAULT_CANDIDATE.to_string());
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_list() {
        let names = config_candidates(
            [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            Ipv4Addr::new(192, 168, 0, 1),
        );
        assert_eq!(
            names,
            vec![
                "01-00-11-22-33-44-55",
                "C0A80001",
                "C0A8000",
                "C0A800",
                "C0A80",
                "C0A8",
                "C0A",
                "C0",
                "C",
                "default",
            ]
        );
    }

    #[test]
    fn test_candidates_are_stable() {
        let mac = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        let ip = Ipv4Addr::new(10, 1, 2, 3);
        let first = config_candidates(mac, ip);
        assert_eq!(first.len(), CANDIDATE_COUNT);
        assert_eq!(first, config_candidates(mac, ip));
        assert_eq!(first[0], "01-aa-bb-cc-dd-ee-ff");
    }

    #[test]
    fn test_ip_hex_is_zero_padded() {
        assert_eq!(ip_hex(Ipv4Addr::new(0, 0, 0, 1)), "00000001");
        assert_eq!(ip_hex(Ipv4Addr::new(10, 0, 0, 255)), "0A0000FF");

        let names = config_candidates([0; 6], Ipv4Addr::new(0, 0, 1, 0));
        assert_eq!(
            &names[1..9],
            &["00000100", "0000010", "000001", "00000", "0000", "000", "00", "0"]
        );
    }
}
