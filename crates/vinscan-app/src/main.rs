// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// vinscan — read a VIN from camera frames and enrich it from the vehicle
// registry.
//
// Entry point. Initialises logging, loads the config, builds the capability
// bundle and runs one command. Results go to stdout as JSON; logs go to
// stderr.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};
use vinscan_bridge::VideoSurface;
use vinscan_bridge::traits::ScanCapabilities;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::human_errors::humanize_error;
use vinscan_core::types::{ScanMode, SessionId, VehicleInfo};
use vinscan_core::ScanConfig;
use vinscan_scan::{Validator, VinScanner};

use services::still_camera::StillImageCamera;
use services::{capabilities, data_dir};

#[derive(Debug, Parser)]
#[command(name = "vinscan", version, about = "Read a VIN from camera frames")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan image files as if they were successive camera frames.
    Scan {
        /// Frames to scan, cycled in order.
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Recognition mode: `text` (OCR) or `code` (barcode).
        #[arg(long, default_value = "text")]
        mode: ScanMode,
        /// Config file (defaults to the data directory's config.json).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Registry base URL (e.g. https://vpic.nhtsa.dot.gov), overriding the
        /// config.
        #[arg(long)]
        registry: Option<String>,
        /// Directory holding the OCR detection and recognition models.
        #[arg(long)]
        ocr_models: Option<PathBuf>,
        /// Give up after this many seconds without an accepted VIN.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        /// Save the effective config before scanning.
        #[arg(long)]
        write_config: bool,
    },
    /// Validate a typed-in VIN and look it up.
    Check {
        vin: String,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Registry base URL, overriding the config.
        #[arg(long)]
        registry: Option<String>,
    },
}

/// What `scan` prints on success.
#[derive(Debug, Serialize)]
struct ScanReport {
    session_id: SessionId,
    mode: ScanMode,
    frames: u64,
    vehicle: VehicleInfo,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("vinscan starting");

    let output = match cli.command {
        Command::Scan {
            images,
            mode,
            config,
            registry,
            ocr_models,
            timeout,
            write_config,
        } => {
            scan_command(
                images,
                mode,
                config,
                registry,
                ocr_models,
                Duration::from_secs(timeout),
                write_config,
            )
            .await
        }
        Command::Check {
            vin,
            config,
            registry,
        } => check_command(&vin, config, registry).await,
    };

    match output {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, class = ?e.class(), "vinscan failed");
            let human = humanize_error(&e);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

/// Load the config and apply command-line overrides.
fn effective_config(path: Option<&PathBuf>, registry: Option<String>) -> Result<ScanConfig> {
    let mut config = data_dir::load_config(path.map(PathBuf::as_path))?;
    if registry.is_some() {
        config.registry_url = registry;
    }
    Ok(config)
}

async fn scan_command(
    images: Vec<PathBuf>,
    mode: ScanMode,
    config_path: Option<PathBuf>,
    registry: Option<String>,
    ocr_models: Option<PathBuf>,
    deadline: Duration,
    write_config: bool,
) -> Result<String> {
    let config = effective_config(config_path.as_ref(), registry)?;
    if write_config {
        let path = data_dir::save_config(&config, config_path.as_deref())?;
        info!(path = %path.display(), "Config written");
    }

    let camera = Arc::new(StillImageCamera::open(&images)?);
    let caps = capabilities::build(camera, &config, ocr_models);
    let report = run_scan(caps, config, mode, deadline).await?;
    Ok(serde_json::to_string_pretty(&report)?)
}

/// One session from start to result. Ctrl-C and the deadline both cancel it.
async fn run_scan(
    caps: ScanCapabilities,
    config: ScanConfig,
    mode: ScanMode,
    deadline: Duration,
) -> Result<ScanReport> {
    let scanner = VinScanner::new(caps, Arc::new(VideoSurface::new()), config);
    let ticket = scanner.start_session(mode).await;
    let session_id = ticket.session_id();

    let outcome = tokio::select! {
        outcome = ticket.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            scanner.cancel_session();
            Err(VinScanError::Cancelled)
        }
        _ = tokio::time::sleep(deadline) => {
            warn!(deadline_s = deadline.as_secs(), "No VIN accepted before the deadline");
            scanner.cancel_session();
            Err(VinScanError::Cancelled)
        }
    };
    let frames = scanner.current_status().frame_count;
    scanner.shutdown().await;

    Ok(ScanReport {
        session_id,
        mode,
        frames,
        vehicle: outcome?,
    })
}

async fn check_command(
    input: &str,
    config_path: Option<PathBuf>,
    registry: Option<String>,
) -> Result<String> {
    let config = effective_config(config_path.as_ref(), registry)?;
    let validator = Validator::new(
        capabilities::registry(&config),
        config.min_match_count,
        config.lookup_timeout(),
    );
    let info = validator.validate_manual(input).await?;
    Ok(serde_json::to_string_pretty(&info)?)
}
