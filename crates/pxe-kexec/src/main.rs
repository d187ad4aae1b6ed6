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
use std::process::ExitCode;

use clap::Parser;
use pxe_kexec::boot::select_handoff;
use pxe_kexec::cli::Args;
use pxe_kexec::kexec::{KexecRunner, KexecTool};
use pxe_kexec::{
    BootFlow, FileConfig, FlowOutcome, Options, PxeKexecError, PxeKexecResult, download, lines,
    linuxdb, network,
};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::builder().parse(args.log_filter())?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(env_filter),
        )
        .try_init()?;
    Ok(())
}

async fn run(args: Args) -> PxeKexecResult<FlowOutcome> {
    let file_config = FileConfig::load(args.config.as_deref())?;
    let options = Options::from_args_and_config(&args, file_config);
    tracing::debug!(?options, "Starting");

    let kexec = KexecTool::new(&options.kexec_binary, &options.reboot_binary)
        .dry_run(options.dry_run);
    kexec.check_available().await?;

    let handoff = if options.load_only {
        None
    } else {
        let distribution = linuxdb::detect();
        Some(select_handoff(&options, distribution.as_ref())?)
    };

    let interfaces = network::discover_interfaces(&options.lease_dirs)?;
    let interface = network::select_interface(interfaces, options.interface.as_deref())?;
    tracing::info!(
        interface = interface.name,
        mac = %interface.mac,
        ip = %interface.ip,
        "Using network interface"
    );

    let downloader = download::downloader_for(options.protocol, &options.curl_binary)
        .map_err(PxeKexecError::DownloaderSetup)?;
    let mut flow = BootFlow::new(
        options,
        downloader,
        Box::new(kexec),
        lines::stdio_reader(),
    );
    flow.run(&interface, handoff).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Unable to set up logging: {e}");
    }

    match run(args).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Boot flow finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Boot flow failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
