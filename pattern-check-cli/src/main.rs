use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pattern_check_core::config::PluginConfig;
use pattern_check_core::logging::init_tracing;
use pattern_check_engine::{
    metadata, HttpStepReporter, PatternCheckPlugin, PluginApiBuilder, PluginServiceConfig,
    RecordingReporter, SessionReport, StepReporter,
};
use pattern_check_protocol::execution::{ExecuteTaskRequest, Platform};
use pattern_check_rules::load_flow;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

mod output;

use output::{print_metadata, print_report, print_step_history};

#[derive(Parser)]
#[command(name = "pattern-check")]
#[command(about = "Pattern Check - decision gate for workflow executions", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a flow's patterns against a payload
    Evaluate(EvaluateArgs),
    /// Show the plugin descriptor
    Info,
    /// Expose the plugin over HTTP
    Serve {
        /// Address to bind (defaults to PATTERN_CHECK_HTTP_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Args)]
struct EvaluateArgs {
    /// Flow or pattern file (JSON or YAML), or a directory of them
    #[arg(long)]
    flow: PathBuf,
    /// JSON payload file, `-` reads stdin
    #[arg(long)]
    payload: PathBuf,
    #[arg(long)]
    execution_id: Option<Uuid>,
    #[arg(long)]
    step_id: Option<Uuid>,
    #[arg(long, default_value = "alertflow")]
    platform: String,
    /// Step backend; without it the step history is only printed
    #[arg(long, env = "PATTERN_CHECK_BACKEND_URL")]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = PluginConfig::from_env()?;
    init_tracing(Some(cli.log_level.as_deref().unwrap_or(&config.log_level)))?;

    match cli.command {
        Commands::Evaluate(args) => evaluate(args, &config).await,
        Commands::Info => {
            print_metadata(&metadata());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Serve { bind } => serve(bind, config).await,
    }
}

async fn evaluate(args: EvaluateArgs, config: &PluginConfig) -> anyhow::Result<ExitCode> {
    let request = build_request(&args)?;

    let report = match &args.backend {
        Some(backend) => {
            let reporter = HttpStepReporter::new(backend, config.api_key.clone())?;
            info!(backend = %reporter.base_url(), "reporting steps to backend");
            run(reporter, config, &request).await?
        }
        None => {
            let reporter = Arc::new(RecordingReporter::new());
            let report = run(reporter.clone(), config, &request).await?;
            print_step_history(&reporter.updates());
            report
        }
    };

    print_report(&report);
    Ok(if report.result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

async fn run<R: StepReporter>(
    reporter: R,
    config: &PluginConfig,
    request: &ExecuteTaskRequest,
) -> anyhow::Result<SessionReport> {
    let plugin = PatternCheckPlugin::from_config(reporter, config);
    Ok(plugin.run(request).await?)
}

async fn serve(bind: Option<String>, config: PluginConfig) -> anyhow::Result<ExitCode> {
    let reporter = HttpStepReporter::from_config(&config)?;
    let mut service = PluginServiceConfig::from(&config);
    if let Some(bind) = bind {
        service.bind_address = bind;
    }

    let plugin = PatternCheckPlugin::from_config(reporter, &config);
    let handle = PluginApiBuilder::new(Arc::new(plugin)).serve(service).await?;
    println!("Pattern Check listening on {}", handle.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown();
    Ok(ExitCode::SUCCESS)
}

fn build_request(args: &EvaluateArgs) -> anyhow::Result<ExecuteTaskRequest> {
    let flow = load_flow(&args.flow)?;
    let payload = read_payload(&args.payload)?;

    Ok(ExecuteTaskRequest {
        platform: Platform::from(args.platform.as_str()),
        execution_id: args.execution_id.unwrap_or_else(Uuid::new_v4),
        step_id: args.step_id.unwrap_or_else(Uuid::new_v4),
        flow,
        payload,
    })
}

fn read_payload(path: &Path) -> anyhow::Result<Value> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read payload from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload {}", path.display()))?
    };

    serde_json::from_str(&raw).with_context(|| format!("payload {} is not valid JSON", path.display()))
}
