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
use crate::entry::BootEntry;
use crate::strutil::starts_with_ignore_case;

/// A parsed PXE configuration: the `say` banner, the optional default label
/// and the boot entries in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootMenu {
    message: String,
    default_label: Option<String>,
    entries: Vec<BootEntry>,
}

impl BootMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated `say` text. Every line is preceded by a newline.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn add_message(&mut self, msg: &str) {
        self.message.push('\n');
        self.message.push_str(msg);
    }

    pub fn default_label(&self) -> Option<&str> {
        self.default_label.as_deref()
    }

    pub fn set_default_label(&mut self, label: impl Into<String>) {
        self.default_label = Some(label.into());
    }

    /// Appends a finished entry. Sentinel entries are dropped so that every
    /// stored entry is valid.
    pub fn add_entry(&mut self, entry: BootEntry) {
        if !entry.is_valid() {
            tracing::warn!("Ignoring invalid boot entry");
            return;
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[BootEntry] {
        &self.entries
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label().to_string()).collect()
    }

    /// First entry whose label matches case-insensitively.
    pub fn find(&self, label: &str) -> Option<&BootEntry> {
        self.entries
            .iter()
            .find(|e| e.label().eq_ignore_ascii_case(label))
    }

    /// Like [`BootMenu::find`], but returns the invalid sentinel for unknown
    /// labels. Callers check [`BootEntry::is_valid`].
    pub fn entry(&self, label: &str) -> BootEntry {
        self.find(label).cloned().unwrap_or_else(BootEntry::invalid)
    }

    pub fn default_entry(&self) -> Option<&BootEntry> {
        self.default_label().and_then(|label| self.find(label))
    }

    /// Entry labels starting with `partial`, ignoring case.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        self.entries
            .iter()
            .map(BootEntry::label)
            .filter(|label| starts_with_ignore_case(label, partial))
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
