//! CLI entrypoint for swarm-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use swarm_application::{
    CompositeTelemetry, ContextStore, FallbackManager, HealthMonitor, InferenceGateway,
    MissionDeps, RunMissionUseCase, TelemetrySink, ThoughtCache, TokenGovernor,
};
use swarm_domain::MissionRequest;
use swarm_infrastructure::{
    ConfigLoader, FileConfig, FileContextStore, FileOutputFormat, GatewayProvider,
    InMemoryContextStore, JsonlTelemetryLogger, OfflineGateway, OpenAiCompatibleGateway,
};
use swarm_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Exit code for missions that ended without completing.
const MISSION_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    info!("Starting swarm-council");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };
    for issue in config.validate() {
        warn!("config: {}", issue);
    }

    let Some(goal) = cli.goal.clone() else {
        bail!("A goal is required, e.g. swarm-council \"Plan the spring launch\"");
    };

    let (params, _) = config.to_mission_params();
    let problems = params.validate();
    if !problems.is_empty() {
        bail!("invalid mission configuration: {}", problems.join("; "));
    }

    // === Dependency Injection ===
    let gateway = build_gateway(&config, cli.offline)?;
    let context_store = build_context_store(&config);

    let health = Arc::new(HealthMonitor::new(config.health.to_thresholds().0));
    let mut telemetry = CompositeTelemetry::default().with(health.clone());
    if let Some(path) = &config.telemetry.jsonl_path {
        match JsonlTelemetryLogger::new(path) {
            Some(logger) => {
                info!("Writing telemetry to {}", logger.path().display());
                telemetry = telemetry.with(Arc::new(logger));
            }
            None => warn!("Telemetry log disabled"),
        }
    }
    let telemetry: Arc<dyn TelemetrySink> = Arc::new(telemetry);

    let deps = MissionDeps {
        gateway,
        context_store,
        cache: Arc::new(ThoughtCache::new(&config.cache.to_cache_policy().0)),
        governor: Arc::new(TokenGovernor::new(config.budget.to_budget_policy().0)),
        telemetry,
        fallback: FallbackManager::new(config.retry.to_retry_policy().0),
        params,
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping mission");
                cancel.cancel();
            }
        });
    }
    let use_case = RunMissionUseCase::new(deps).with_cancellation(cancel);

    let mut request = MissionRequest::new(cli.workspace.as_str(), goal);
    if let Some(session) = &cli.session {
        request = request.with_session(session.as_str());
    }
    for (key, value) in &cli.overrides {
        request = request.with_override(key.as_str(), value.clone());
    }

    let outcome = if cli.quiet {
        use_case.execute(request).await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(request, &progress).await
    };

    ConsoleFormatter::set_color(config.output.color);
    let format = cli
        .output
        .or(config.output.format.map(|f| match f {
            FileOutputFormat::Full => OutputFormat::Full,
            FileOutputFormat::Summary => OutputFormat::Summary,
            FileOutputFormat::Json => OutputFormat::Json,
        }))
        .unwrap_or(OutputFormat::Summary);
    let output = match format {
        OutputFormat::Full => ConsoleFormatter::format(&outcome),
        OutputFormat::Summary => ConsoleFormatter::format_summary(&outcome),
        OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
    };
    println!("{}", output);

    if config.telemetry.health_report && format != OutputFormat::Json {
        println!("{}", ConsoleFormatter::format_health(&health.report()));
    }

    if outcome.status.is_failure() {
        return Ok(ExitCode::from(MISSION_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}

/// Install the tracing subscriber. The returned guard flushes the log file.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let (file_layer, guard) = match &cli.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| ".".into());
            let name = path
                .file_name()
                .context("--log-file must name a file")?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(EnvFilter::new(level)),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn build_gateway(config: &FileConfig, offline: bool) -> Result<Arc<dyn InferenceGateway>> {
    if offline || config.gateway.provider == GatewayProvider::Offline {
        info!("Using offline gateway");
        return Ok(Arc::new(OfflineGateway::new()));
    }

    if config.gateway.resolve_api_key().is_none() {
        warn!(
            "No API key found in {}; requests to {} are sent unauthenticated",
            config.gateway.api_key_env, config.gateway.base_url
        );
    }
    let gateway = OpenAiCompatibleGateway::from_config(&config.gateway)
        .context("failed to build inference gateway")?;
    info!("Using gateway {} ({})", gateway.endpoint(), config.gateway.model);
    Ok(Arc::new(gateway))
}

fn build_context_store(config: &FileConfig) -> Arc<dyn ContextStore> {
    if config.storage.in_memory {
        return Arc::new(InMemoryContextStore::new());
    }
    let dir = config.storage.resolve_context_dir();
    info!("Workspace context stored under {}", dir.display());
    Arc::new(FileContextStore::new(dir))
}
