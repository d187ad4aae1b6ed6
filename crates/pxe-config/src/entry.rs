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
use std::cell::OnceCell;
use std::fmt::{Display, Formatter};

const INITRD_TOKEN: &str = "initrd=";

/// One selectable boot option of a PXE menu, opened by a `label` line.
///
/// The initrd is not stored on its own: PXELINUX passes it on the kernel
/// command line as `initrd=<path>`, so it is extracted from the append line on
/// first use and cached until the append line changes.
#[derive(Debug, Clone, Default)]
pub struct BootEntry {
    valid: bool,
    label: String,
    kernel: String,
    append: String,
    initrd: OnceCell<String>,
}

impl BootEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            valid: true,
            label: label.into(),
            ..Default::default()
        }
    }

    /// The "not found" sentinel returned by label lookups.
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kernel(&self) -> &str {
        &self.kernel
    }

    pub fn set_kernel(&mut self, kernel: impl Into<String>) {
        self.kernel = kernel.into();
    }

    pub fn append(&self) -> &str {
        &self.append
    }

    pub fn set_append(&mut self, append: impl Into<String>) {
        self.append = append.into();
        self.initrd = OnceCell::new();
    }

    /// The value of the first `initrd=` token of the append line, or an empty
    /// string if there is none.
    pub fn initrd(&self) -> &str {
        self.initrd.get_or_init(|| extract_initrd(&self.append))
    }
}

fn extract_initrd(append: &str) -> String {
    let Some(pos) = append.find(INITRD_TOKEN) else {
        return String::new();
    };
    append[pos + INITRD_TOKEN.len()..]
        .split(|c: char| c.is_ascii_whitespace())
        .next()
        .unwrap_or_default()
        .to_string()
}

// The initrd cache is derived state and must not influence comparisons.
impl PartialEq for BootEntry {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && self.label == other.label
            && self.kernel == other.kernel
            && self.append == other.append
    }
}

impl Eq for BootEntry {}

impl Display for BootEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Kernel   : {}", self.kernel())?;
        writeln!(f, "Initrd   : {}", self.initrd())?;
        write!(f, "Append   : {}", self.append())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        let entry = BootEntry::invalid();
        assert!(!entry.is_valid());
        assert_eq!(entry.label(), "");
        assert!(BootEntry::new("linux").is_valid());
    }

    #[test]
    fn test_initrd_extraction() {
        let mut entry = BootEntry::new("linux");
        assert_eq!(entry.initrd(), "");

        entry.set_append("root=/dev/sda1 initrd=initrd.img quiet");
        assert_eq!(entry.initrd(), "initrd.img");

        entry.set_append("initrd=boot/initrd-5.14\tsplash");
        assert_eq!(entry.initrd(), "boot/initrd-5.14");

        entry.set_append("console=ttyS0 initrd=last");
        assert_eq!(entry.initrd(), "last");

        entry.set_append("console=ttyS0");
        assert_eq!(entry.initrd(), "");
    }

    #[test]
    fn test_initrd_cache_invalidated_by_set_append() {
        let mut entry = BootEntry::new("linux");
        entry.set_append("initrd=first.img");
        assert_eq!(entry.initrd(), "first.img");

        entry.set_append("quiet initrd=second.img");
        assert_eq!(entry.initrd(), "second.img");
    }

    #[test]
    fn test_equality_ignores_cache() {
        let mut a = BootEntry::new("linux");
        a.set_append("initrd=x");
        let b = a.clone();
        let _ = a.initrd();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let mut entry = BootEntry::new("linux");
        entry.set_kernel("vmlinuz");
        entry.set_append("initrd=initrd.img quiet");
        assert_eq!(
            entry.to_string(),
            "Kernel   : vmlinuz\nInitrd   : initrd.img\nAppend   : initrd=initrd.img quiet"
        );
    }
}
