//! recorder-gateway: HTTP control plane for a tuner/recording backend.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use recorder_gateway::backend::{CardInfo, SimulatedBackend};
use recorder_gateway::config::{self, ConfigFile, GatewayConfig, DEFAULT_CONFIG_FILE};
use recorder_gateway::notifier::default_notifier;
use recorder_gateway::sweeper::Sweeper;
use recorder_gateway::{logging, web, ApartmentDispatcher, RecorderGateway, SessionRegistry};

const DEFAULT_LISTEN: &str = "0.0.0.0:49942";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_RETENTION_DAYS: u64 = 7;
const DEFAULT_RTSP_BASE: &str = "rtsp://127.0.0.1:554";

/// recorder-gateway - serialized control plane for tuner recorders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on (overrides [server].listen)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory where log files are stored
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Number of days to keep log files
    #[arg(long)]
    log_retention_days: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Explicit path > auto-detect > defaults
    let config_path = args.config.clone().or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        default_path.exists().then_some(default_path)
    });

    let file_config = match &config_path {
        Some(path) => match config::load_config(path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file {}: {}", path.display(), e);
                return Err(e.into());
            }
        },
        None => ConfigFile::default(),
    };

    // Command line takes precedence
    let log_dir = args
        .log_dir
        .clone()
        .or_else(|| file_config.logging.log_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
    let log_retention_days = args
        .log_retention_days
        .or(file_config.logging.retention_days)
        .unwrap_or(DEFAULT_RETENTION_DAYS);
    logging::init_logging(
        &log_dir,
        log_retention_days,
        args.verbose,
        file_config.logging.level.as_deref(),
    )
    .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    let listen_addr = match args.listen {
        Some(addr) => addr,
        None => file_config
            .server
            .listen
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN)
            .parse::<SocketAddr>()?,
    };
    let gateway_config = GatewayConfig::from(&file_config.recorder);

    info!("recorder-gateway starting...");
    info!("  Listen address: {}", listen_addr);
    info!("  Recorder name: {}", gateway_config.recorder_name);
    info!("  Keep-alive timeout: {:?}", gateway_config.keep_alive_timeout);
    info!("  Sweep interval: {:?}", gateway_config.sweep_interval);

    let cards: Vec<CardInfo> = file_config.cards.iter().map(CardInfo::from).collect();
    if cards.is_empty() {
        warn!("No [[cards]] configured; every tune and recording will fail");
    }
    for card in &cards {
        info!("  Card {} ({}) priority={} channels={}", card.card_id, card.name, card.priority, card.channels.len());
    }
    let backend = SimulatedBackend::new(
        cards,
        file_config.recorder.mac_addresses.clone(),
        file_config
            .recorder
            .rtsp_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_RTSP_BASE.to_string()),
    );

    let dispatcher = Arc::new(ApartmentDispatcher::start("backend", Box::new(backend))?);
    let registry = Arc::new(SessionRegistry::new());
    let gateway = Arc::new(RecorderGateway::new(
        Arc::clone(&dispatcher),
        registry,
        default_notifier(),
        gateway_config.clone(),
    ));

    let card_count = gateway.load_cards().await?;
    info!("Loaded {} card(s) into the registry", card_count);

    let shutdown = CancellationToken::new();
    let sweeper = Sweeper::new(Arc::clone(&gateway), gateway_config.sweep_interval).spawn(shutdown.clone());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
            shutdown.cancel();
        });
    }

    let served = web::start_web_server(listen_addr, Arc::clone(&gateway), shutdown.clone()).await;
    // Make sure the sweep stops even if the server failed on its own
    shutdown.cancel();
    if let Err(e) = sweeper.await {
        error!("Sweeper task failed: {}", e);
    }

    for recording in gateway.registry().list_recordings() {
        warn!(
            "Recording {} on card {} still active at shutdown",
            recording.file_name, recording.allocation.card_id
        );
    }
    let stopped = gateway.stop_all_streams().await;
    if stopped > 0 {
        info!("Stopped {} live stream(s)", stopped);
    }
    if !dispatcher.shutdown(gateway_config.drain_timeout).await {
        warn!("Backend did not drain within {:?}", gateway_config.drain_timeout);
    }

    if let Err(e) = &served {
        error!("Server error: {}", e);
    }
    info!("recorder-gateway stopped");
    served
}
