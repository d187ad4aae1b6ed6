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

use async_trait::async_trait;

use crate::process::{Process, ProcessError};

/// A kernel with its optional initrd and command line, ready to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexecImage {
    pub kernel: PathBuf,
    pub initrd: Option<PathBuf>,
    pub cmdline: String,
}

impl KexecImage {
    /// Arguments of `kexec` that load this image.
    pub fn load_args(&self) -> Vec<String> {
        let mut args = vec!["-l".to_string(), self.kernel.display().to_string()];
        if let Some(initrd) = &self.initrd {
            args.push(format!("--initrd={}", initrd.display()));
        }
        args.push(format!("--append={}", self.cmdline));
        args
    }
}

/// How control is passed to a loaded kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// `kexec -e`: jump into the new kernel right away.
    Direct,
    /// `reboot`: the init system shuts down cleanly and executes the loaded
    /// kernel as its last step.
    Reboot,
}

#[derive(thiserror::Error, Debug)]
pub enum KexecError {
    #[error("kexec is not usable, is '{0}' installed? ({1})")]
    NotInstalled(String, String),
    #[error("Loading the kernel failed: {0}")]
    Load(#[source] ProcessError),
    #[error("Executing the loaded kernel failed: {0}")]
    Execute(#[source] ProcessError),
}

pub type KexecResult<T> = Result<T, KexecError>;

#[async_trait]
pub trait KexecRunner: Send + Sync {
    async fn check_available(&self) -> KexecResult<()>;
    async fn load(&self, image: &KexecImage) -> KexecResult<()>;
    async fn execute(&self, handoff: Handoff) -> KexecResult<()>;
}

/// [`KexecRunner`] calling the `kexec` and `reboot` programs.
#[derive(Debug, Clone)]
pub struct KexecTool {
    kexec_binary: String,
    reboot_binary: String,
    dry_run: bool,
}

impl KexecTool {
    pub fn new(kexec_binary: impl Into<String>, reboot_binary: impl Into<String>) -> Self {
        Self {
            kexec_binary: kexec_binary.into(),
            reboot_binary: reboot_binary.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn kexec(&self) -> Process {
        Process::new(&self.kexec_binary).dry_run(self.dry_run)
    }
}

#[async_trait]
impl KexecRunner for KexecTool {
    async fn check_available(&self) -> KexecResult<()> {
        match self.kexec().arg("-h").succeeds().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(KexecError::NotInstalled(
                self.kexec_binary.clone(),
                "'-h' failed".to_string(),
            )),
            Err(e) => Err(KexecError::NotInstalled(
                self.kexec_binary.clone(),
                e.to_string(),
            )),
        }
    }

    async fn load(&self, image: &KexecImage) -> KexecResult<()> {
        tracing::info!(
            kernel = %image.kernel.display(),
            initrd = ?image.initrd,
            cmdline = image.cmdline,
            "Loading kernel"
        );
        self.kexec()
            .args(image.load_args())
            .run()
            .await
            .map_err(KexecError::Load)
    }

    async fn execute(&self, handoff: Handoff) -> KexecResult<()> {
        tracing::info!(?handoff, "Executing loaded kernel");
        let process = match handoff {
            Handoff::Direct => self.kexec().arg("-e"),
            Handoff::Reboot => Process::new(&self.reboot_binary).dry_run(self.dry_run),
        };
        process.run().await.map_err(KexecError::Execute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_args() {
        let image = KexecImage {
            kernel: PathBuf::from("/tmp/pxe-kexec-kernel"),
            initrd: Some(PathBuf::from("/tmp/pxe-kexec-initrd_")),
            cmdline: "root=/dev/sda1 initrd=initrd.img quiet".to_string(),
        };
        assert_eq!(
            image.load_args(),
            vec![
                "-l",
                "/tmp/pxe-kexec-kernel",
                "--initrd=/tmp/pxe-kexec-initrd_",
                "--append=root=/dev/sda1 initrd=initrd.img quiet",
            ]
        );

        let image = KexecImage {
            initrd: None,
            cmdline: String::new(),
            ..image
        };
        assert_eq!(
            image.load_args(),
            vec!["-l", "/tmp/pxe-kexec-kernel", "--append="]
        );
    }

    #[tokio::test]
    async fn test_missing_kexec_binary() {
        let tool = KexecTool::new("/nonexistent/kexec", "/nonexistent/reboot");
        assert!(matches!(
            tool.check_available().await,
            Err(KexecError::NotInstalled(..))
        ));

        let tool = KexecTool::new("false", "false");
        assert!(matches!(
            tool.check_available().await,
            Err(KexecError::NotInstalled(..))
        ));
    }

    #[tokio::test]
    async fn test_dry_run_never_executes() {
        let tool = KexecTool::new("/nonexistent/kexec", "/nonexistent/reboot").dry_run(true);
        let image = KexecImage {
            kernel: PathBuf::from("vmlinuz"),
            initrd: None,
            cmdline: "quiet".to_string(),
        };
        tool.check_available().await.unwrap();
        tool.load(&image).await.unwrap();
        tool.execute(Handoff::Direct).await.unwrap();
        tool.execute(Handoff::Reboot).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_failure() {
        let tool = KexecTool::new("false", "true");
        let image = KexecImage {
            kernel: PathBuf::from("vmlinuz"),
            initrd: None,
            cmdline: String::new(),
        };
        assert!(matches!(
            tool.load(&image).await,
            Err(KexecError::Load(_))
        ));
        tool.execute(Handoff::Reboot).await.unwrap();
    }
}
