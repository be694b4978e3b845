//! Couch Lurker CLI
//!
//! Runs the capture orchestration against simulated platform collaborators:
//! a scripted permission prompt, an in-process device provider, a synthetic
//! camera and a scripted face detector.

use clap::Parser;
use couch_lurker::{
    capture::{FileConfig, MockCamera},
    detection::ScriptedDetector,
    device::{DeviceSession, MockDeviceProvider},
    metrics::{MetricsRegistry, MetricsReporter},
    orchestration::{CaptureDetectLoop, LoopState, Orchestrator},
    permission::{PermissionGate, StaticPrompt},
    report::{LogReporter, Reporter, TickReport},
    Lifecycle,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "couch-lurker", version, about = "Count faces in front of the camera on a fixed period")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the tick period in milliseconds.
    #[arg(long)]
    period_ms: Option<u64>,

    /// Stop after this many ticks (runs until Ctrl-C otherwise).
    #[arg(long)]
    ticks: Option<u64>,

    /// Answer the simulated permission prompt with a refusal.
    #[arg(long)]
    deny_permission: bool,

    /// Face counts the simulated detector reports, in order.
    #[arg(long, value_delimiter = ',')]
    counts: Vec<usize>,

    /// Override the metrics server port (0 disables it).
    #[arg(long)]
    metrics_port: Option<u16>,
}

/// Tears the lifecycle down once enough ticks have been reported.
struct StopAfter {
    remaining: AtomicU64,
    lifecycle: Lifecycle,
}

impl Reporter for StopAfter {
    fn report(&self, _report: &TickReport) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            info!("Tick limit reached");
            self.lifecycle.teardown();
        }
    }
}

fn load_config(args: &Args) -> Result<FileConfig, couch_lurker::capture::ConfigError> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if let Some(period_ms) = args.period_ms {
        config.detection.period_ms = period_ms;
    }
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Couch Lurker v{}", couch_lurker::VERSION);
    info!("This is a demonstration using a simulated camera and detector");

    let lifecycle = Lifecycle::new();
    let on_signal = lifecycle.clone();
    if let Err(e) = ctrlc::set_handler(move || on_signal.teardown()) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let registry = match MetricsRegistry::new() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to create metrics registry: {}", e);
            return ExitCode::FAILURE;
        }
    };
    start_metrics_server(config.output.metrics_port, &registry, &lifecycle);

    let stop_after = args.ticks.filter(|&n| n > 0).map(|n| StopAfter {
        remaining: AtomicU64::new(n),
        lifecycle: lifecycle.clone(),
    });
    let log = config.output.log_reports.then_some(LogReporter);
    let reporter = ((log, MetricsReporter::new(Arc::clone(&registry))), stop_after);

    let prompt = if args.deny_permission {
        StaticPrompt::denying()
    } else {
        StaticPrompt::granting()
    };
    let capture_loop = CaptureDetectLoop::new(
        MockCamera::new(&config.capture),
        ScriptedDetector::with_counts(args.counts.iter().copied()),
        reporter,
        &config.detection,
    );
    let mut orchestrator = Orchestrator::new(
        PermissionGate::new(prompt),
        DeviceSession::with_lens(MockDeviceProvider::new(), config.capture.lens),
        capture_loop,
    );

    let mut states = orchestrator.state().subscribe();
    let state_registry = Arc::clone(&registry);
    tokio::spawn(async move {
        loop {
            let state = *states.borrow_and_update();
            state_registry.set_state(state);
            if state == LoopState::Stopped || states.changed().await.is_err() {
                break;
            }
        }
    });

    let result = orchestrator.run(&lifecycle).await;
    lifecycle.teardown();

    let health = orchestrator.capture_loop().health();
    info!(
        "Processed {} ticks: {} failed",
        health.total_ticks, health.total_failures
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Stopping: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "metrics")]
fn start_metrics_server(port: u16, registry: &Arc<MetricsRegistry>, lifecycle: &Lifecycle) {
    use couch_lurker::metrics::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), Arc::clone(registry));
    let lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        if let Err(e) = server.run(lifecycle).await {
            error!("Metrics server failed: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn start_metrics_server(port: u16, _registry: &Arc<MetricsRegistry>, _lifecycle: &Lifecycle) {
    if port != 0 {
        warn!("Metrics port {} ignored: built without the `metrics` feature", port);
    }
}
