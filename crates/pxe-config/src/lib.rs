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

//! PXELINUX configuration handling: the boot menu model, the line parser and
//! the list of configuration file names a PXELINUX client probes.

pub mod candidates;
mod entry;
mod menu;
pub mod parser;
pub mod strutil;

pub use candidates::{config_candidates, ip_hex, mac_candidate};
pub use entry::BootEntry;
pub use menu::BootMenu;
pub use parser::{ParseError, ParseMode, ParseResult, PxeParser, parse};
