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

//! The boot flow: fetch the PXELINUX configuration, let the operator choose
//! and confirm an entry, download its files and hand them to kexec.
//!
//! ```text
//! Start -> ConfigFetched -> EntryChosen -> Confirmed -> Downloaded -> Executed
//! ```
//!
//! Any step can fail, which ends the flow.

use std::io::Write;
use std::path::{Path, PathBuf};

use pxe_config::strutil::strip;
use pxe_config::{BootEntry, BootMenu, PxeParser};

use crate::config::Options;
use crate::download::{
    self, DotProgress, DownloadRequest, Downloader, PXELINUX_CFG, ProgressNotifier, Protocol,
};
use crate::kexec::{Handoff, KexecImage, KexecRunner};
use crate::linuxdb::LinuxDistribution;
use crate::lines::{Completer, LineReader};
use crate::network::NetworkInterface;
use crate::{PxeKexecError, PxeKexecResult};

pub const KERNEL_BASENAME: &str = "pxe-kexec-kernel";
pub const INITRD_BASENAME: &str = "pxe-kexec-initrd";

const CHOICE_PROMPT: &str = "> ";
const CONFIRM_PROMPT: &str = "Continue? [Y/n/e] ";
const CONFIRM_RETRY_PROMPT: &str = "Invalid input. Try again [Y/n/e] ";
const APPEND_PROMPT: &str = "Append   : ";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[0;0H";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    Start,
    ConfigFetched,
    EntryChosen,
    Confirmed,
    Downloaded,
    Executed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Control was handed to the new kernel.
    Booted,
    /// The kernel is loaded and runs on the next `kexec -e` or reboot.
    Loaded,
    /// The operator backed out.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Edit,
    Invalid,
}

fn parse_answer(answer: &str) -> Answer {
    match answer.trim().chars().next() {
        None | Some('y' | 'Y') => Answer::Yes,
        Some('n' | 'N') => Answer::No,
        Some('e' | 'E') => Answer::Edit,
        Some(_) => Answer::Invalid,
    }
}

/// `dir/base` with `_` appended until no such file exists.
pub fn unique_path(dir: &Path, base: &str) -> PathBuf {
    let mut name = base.to_string();
    while dir.join(&name).exists() {
        name.push('_');
    }
    dir.join(name)
}

/// Picks how the loaded kernel gets control. `--force` always runs `kexec -e`;
/// a reboot is only trusted on whitelisted distributions.
pub fn select_handoff(
    options: &Options,
    distribution: Option<&LinuxDistribution>,
) -> PxeKexecResult<Handoff> {
    if options.force {
        return Ok(Handoff::Direct);
    }
    if options.ignore_whitelist || distribution.is_some_and(LinuxDistribution::is_whitelisted) {
        return Ok(Handoff::Reboot);
    }
    Err(PxeKexecError::NotWhitelisted(
        distribution.map_or_else(|| "unknown".to_string(), ToString::to_string),
    ))
}

/// Downloaded kernel and initrd, removed again unless they are to be kept.
#[derive(Debug, Default)]
struct DownloadedFiles {
    kernel: Option<PathBuf>,
    initrd: Option<PathBuf>,
    keep: bool,
}

impl DownloadedFiles {
    /// Forgets the files and returns those that are to be deleted.
    fn take_removable(&mut self) -> Vec<PathBuf> {
        let files = [self.kernel.take(), self.initrd.take()];
        if self.keep {
            return Vec::new();
        }
        files.into_iter().flatten().collect()
    }

    async fn remove(&mut self) {
        for path in self.take_removable() {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::info!(path = %path.display(), error = %e, "Removal failed");
            }
        }
    }
}

impl Drop for DownloadedFiles {
    fn drop(&mut self) {
        for path in self.take_removable() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::info!(path = %path.display(), error = %e, "Removal failed");
            }
        }
    }
}

pub struct BootFlow {
    options: Options,
    downloader: Box<dyn Downloader>,
    kexec: Box<dyn KexecRunner>,
    reader: Box<dyn LineReader>,
    stage: BootStage,
    host: String,
    menu: BootMenu,
    choice: BootEntry,
    files: DownloadedFiles,
}

impl BootFlow {
    pub fn new(
        options: Options,
        downloader: Box<dyn Downloader>,
        kexec: Box<dyn KexecRunner>,
        reader: Box<dyn LineReader>,
    ) -> Self {
        let files = DownloadedFiles {
            kernel: None,
            initrd: None,
            keep: options.keep_files,
        };
        Self {
            options,
            downloader,
            kexec,
            reader,
            stage: BootStage::Start,
            host: String::new(),
            menu: BootMenu::default(),
            choice: BootEntry::invalid(),
            files,
        }
    }

    pub fn stage(&self) -> BootStage {
        self.stage
    }

    pub fn menu(&self) -> &BootMenu {
        &self.menu
    }

    pub fn choice(&self) -> &BootEntry {
        &self.choice
    }

    fn advance(&mut self, stage: BootStage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "Boot flow transition");
        self.stage = stage;
    }

    fn say(&self, text: impl std::fmt::Display) {
        if !self.options.quiet {
            println!("{text}");
        }
    }

    /// Runs the whole flow. `handoff` is how an executed kernel gets control;
    /// `None` only loads it.
    pub async fn run(
        &mut self,
        interface: &NetworkInterface,
        handoff: Option<Handoff>,
    ) -> PxeKexecResult<FlowOutcome> {
        self.fetch_config(interface).await?;
        self.display_message();
        if self.choose_entry()?.is_none() {
            return Ok(FlowOutcome::Cancelled);
        }
        if !self.confirm_boot()? {
            return Ok(FlowOutcome::Cancelled);
        }
        self.download_images().await?;
        self.execute(handoff).await
    }

    /// Fetches the configuration from the configured host, or from the DHCP
    /// server of `interface`.
    pub async fn fetch_config(&mut self, interface: &NetworkInterface) -> PxeKexecResult<()> {
        let host = match (&self.options.host, &interface.dhcp_server) {
            (Some(host), _) | (None, Some(host)) => host.clone(),
            (None, None) => return Err(PxeKexecError::NoPxeHost(interface.name.clone())),
        };
        self.fetch_config_from(&host, &interface.config_candidates())
            .await
    }

    /// Tries `candidates` in order and parses the first one found. An
    /// unreachable server ends the search right away.
    pub async fn fetch_config_from(
        &mut self,
        host: &str,
        candidates: &[String],
    ) -> PxeKexecResult<()> {
        let protocol = self.options.protocol;
        let mut config: Vec<u8> = Vec::new();

        for name in candidates {
            let url = download::config_url(protocol, host, name);
            tracing::trace!(url, "Trying to retrieve PXE configuration");
            self.say(format_args!("Trying {PXELINUX_CFG}/{name}"));

            let request = DownloadRequest {
                url: &url,
                timeout: Some(self.options.timeout),
            };
            let mut data: Vec<u8> = Vec::new();
            match self.downloader.download(&request, &mut data, None).await {
                Ok(_) => {
                    tracing::info!(url, "Found PXE configuration");
                    config = data;
                    break;
                }
                Err(e) if e.is_connection_failure() => {
                    tracing::warn!(host, %protocol, error = %e, "Connection failed, aborting");
                    eprintln!("Connection to {host} with protocol {protocol} failed. Aborting.");
                    if protocol == Protocol::Tftp {
                        eprintln!(concat!(
                            "\nHINT: This failure could be because of firewall settings. ",
                            "Check your firewall\nconfiguration. If your FTP server has the same ",
                            "directory layout as your TFTP\nserver, you may also consider ",
                            "the '-F' option.\n"
                        ));
                    }
                    break;
                }
                Err(e) => tracing::trace!(url, error = %e, "Candidate not available"),
            }
        }

        if config.is_empty() {
            return Err(PxeKexecError::NoConfigFound);
        }

        let text = String::from_utf8_lossy(&config);
        let mut parser = PxeParser::new();
        parser.parse_stream(text.as_bytes())?;
        self.menu = parser.into_menu();
        self.host = host.to_string();
        tracing::debug!(entries = ?self.menu.entry_names(), "Parsed PXE configuration");
        self.advance(BootStage::ConfigFetched);
        Ok(())
    }

    pub fn display_message(&self) {
        if !self.options.quiet {
            print!("{CLEAR_SCREEN}");
            println!("{}\n\n", self.menu.message());
        }
    }

    fn choose(&mut self, entry: BootEntry) -> BootEntry {
        tracing::info!(label = entry.label(), "Boot entry chosen");
        self.choice = entry.clone();
        self.advance(BootStage::EntryChosen);
        entry
    }

    /// The entry to boot, from the pre-chosen label or the operator. `None`
    /// when the operator enters nothing, `quit` or `exit`.
    pub fn choose_entry(&mut self) -> PxeKexecResult<Option<BootEntry>> {
        if let Some(label) = self.options.label.clone() {
            let entry = self.menu.entry(&label);
            if entry.is_valid() {
                return Ok(Some(self.choose(entry)));
            }
            println!("Entry {label} does not exist.");
        }

        loop {
            let completer = Some(&self.menu as &dyn Completer);
            let Some(line) = self.reader.read_line(CHOICE_PROMPT, completer)? else {
                return Ok(None);
            };
            let choice = strip(&line);
            if choice.is_empty() || choice == "quit" || choice == "exit" {
                return Ok(None);
            }

            let entry = self.menu.entry(choice);
            if entry.is_valid() {
                return Ok(Some(self.choose(entry)));
            }
            println!("Entry {choice} does not exist.");
        }
    }

    /// Shows the chosen entry and asks whether to boot it. The append line can
    /// be edited before answering.
    pub fn confirm_boot(&mut self) -> PxeKexecResult<bool> {
        loop {
            if !(self.options.noconfirm && self.options.quiet) {
                println!("Booting following entry:\n{}\n", self.choice);
            }
            if self.options.noconfirm {
                self.advance(BootStage::Confirmed);
                return Ok(true);
            }

            let mut prompt = CONFIRM_PROMPT;
            let edit = loop {
                let Some(answer) = self.reader.read_line(prompt, None)? else {
                    return Ok(false);
                };
                match parse_answer(&answer) {
                    Answer::Yes => break false,
                    Answer::No => return Ok(false),
                    Answer::Edit => break true,
                    Answer::Invalid => prompt = CONFIRM_RETRY_PROMPT,
                }
            };
            if !edit {
                self.advance(BootStage::Confirmed);
                return Ok(true);
            }

            let append = self.reader.edit_line(APPEND_PROMPT, self.choice.append())?;
            tracing::info!(append, "Append line edited");
            self.choice.set_append(append);
            println!("\n");
        }
    }

    /// Downloads the kernel and, if the entry has one, the initrd into
    /// uniquely named files in the temporary directory.
    pub async fn download_images(&mut self) -> PxeKexecResult<()> {
        let kernel = self.choice.kernel().to_string();
        let kernel_path = unique_path(&self.options.tmp_dir, KERNEL_BASENAME);
        self.files.kernel = Some(kernel_path.clone());
        self.download_file("kernel", &kernel, &kernel_path).await?;

        let initrd = self.choice.initrd().to_string();
        if !initrd.is_empty() {
            let initrd_path = unique_path(&self.options.tmp_dir, INITRD_BASENAME);
            self.files.initrd = Some(initrd_path.clone());
            self.download_file("initrd", &initrd, &initrd_path).await?;
        }

        self.advance(BootStage::Downloaded);
        Ok(())
    }

    async fn download_file(
        &self,
        what: &'static str,
        remote: &str,
        path: &Path,
    ) -> PxeKexecResult<()> {
        let url = download::file_url(self.options.protocol, &self.host, remote);
        tracing::debug!(what, url, path = %path.display(), "Downloading");

        let mut file = tokio::fs::File::create(path).await?;
        let progress = DotProgress::new();
        let notifier: Option<&dyn ProgressNotifier> = if self.options.quiet {
            None
        } else {
            print!("Downloading {what} ");
            if let Err(e) = std::io::stdout().flush() {
                tracing::trace!(error = %e, "Unable to flush stdout");
            }
            Some(&progress)
        };

        let request = DownloadRequest {
            url: &url,
            timeout: None,
        };
        match self.downloader.download(&request, &mut file, notifier).await {
            Ok(bytes) => {
                tracing::debug!(what, bytes, "Download finished");
                Ok(())
            }
            Err(source) => {
                self.say("");
                Err(PxeKexecError::Download { what, url, source })
            }
        }
    }

    /// Loads the downloaded kernel and passes control to it according to
    /// `handoff`. The downloaded files are removed once loaded.
    pub async fn execute(&mut self, handoff: Option<Handoff>) -> PxeKexecResult<FlowOutcome> {
        let kernel = self
            .files
            .kernel
            .clone()
            .ok_or(PxeKexecError::NoKernelDownloaded)?;
        let image = KexecImage {
            kernel,
            initrd: self.files.initrd.clone(),
            cmdline: self.choice.append().to_string(),
        };

        let loaded = self.kexec.load(&image).await;
        self.files.remove().await;
        loaded?;

        let outcome = match handoff {
            Some(handoff) if !self.options.load_only => {
                self.kexec.execute(handoff).await?;
                FlowOutcome::Booted
            }
            _ => {
                self.say("Kernel loaded. It is booted on the next 'kexec -e' or reboot.");
                FlowOutcome::Loaded
            }
        };
        self.advance(BootStage::Executed);
        Ok(outcome)
    }
}
