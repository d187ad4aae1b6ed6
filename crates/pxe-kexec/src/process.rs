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
use std::ffi::OsStr;
use std::process::{Output, Stdio};

use tokio::process::Command as TokioCommand;

#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("Error running '{0}': {1}")]
    RunError(String, String),
    #[error("'{0}' failed with exit code {1:?}: {2}")]
    Subprocess(String, Option<i32>, String),
}

impl ProcessError {
    fn subprocess_error(pretty_cmd: String, output: &Output) -> Self {
        let error_details = if output.stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout)
        } else {
            String::from_utf8_lossy(&output.stderr)
        };
        Self::Subprocess(
            pretty_cmd,
            output.status.code(),
            error_details.trim_end().to_string(),
        )
    }
}

pub type ProcessResult<T> = Result<T, ProcessError>;

/// An external program run to completion. In dry-run mode the command line is
/// only logged.
#[derive(Debug)]
pub struct Process {
    command: TokioCommand,
    dry_run: bool,
}

impl Process {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            command: TokioCommand::new(program),
            dry_run: false,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.command.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs the command, failing on a non-zero exit status.
    pub async fn run(mut self) -> ProcessResult<()> {
        let Some(output) = self.output().await? else {
            return Ok(());
        };
        if output.status.success() {
            Ok(())
        } else {
            Err(ProcessError::subprocess_error(self.pretty_cmd(), &output))
        }
    }

    /// Runs the command and reports whether it exited successfully. Only a
    /// failure to start it at all is an error.
    pub async fn succeeds(mut self) -> ProcessResult<bool> {
        Ok(self
            .output()
            .await?
            .is_none_or(|output| output.status.success()))
    }

    async fn output(&mut self) -> ProcessResult<Option<Output>> {
        let pretty = self.pretty_cmd();
        if self.dry_run {
            tracing::info!(command = pretty, "Dry run, not executing");
            return Ok(None);
        }

        tracing::debug!(command = pretty, "Running");
        self.command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(Some)
            .map_err(|e| ProcessError::RunError(pretty, e.to_string()))
    }

    pub fn pretty_cmd(&self) -> String {
        let c = self.command.as_std();
        let mut parts = vec![c.get_program().to_string_lossy()];
        parts.extend(c.get_args().map(|x| x.to_string_lossy()));
        parts.join(" ")
    }
}
