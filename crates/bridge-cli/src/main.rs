//! Automation Bridge CLI
//!
//! The `automation-bridge` command is the entry point the automation runner
//! invokes when a new version lands on a watched model.
//!
//! ## Commands
//!
//! - `run`: Propagate the triggering version to recently updated sibling projects
//! - `schema`: Print the JSON schema of the function inputs

use anyhow::{Context, Result};
use bridge_core::{FailurePolicy, FunctionInputs, RunOptions, RunOrchestrator, RunReport};
use bridge_remote::{
    AutomateRunContext, AutomationRunData, HttpServerApi, ObjectTransport, RunContext,
    SecretString, ServerApi, ServerConfig, ServerTransport,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "automation-bridge")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Share a new model version with the active projects of its workspace")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one automation run
    Run {
        /// Path to the automation run data (JSON)
        run_data: PathBuf,

        /// Path to the function inputs (JSON)
        function_inputs: PathBuf,

        /// Token used to read the triggering version and report the run status
        /// (falls back to the function input token)
        #[arg(env = "SPECKLE_AUTOMATE_TOKEN", hide_env_values = true)]
        automate_token: Option<String>,

        /// Override the failure policy from the function inputs
        #[arg(long)]
        failure_policy: Option<FailurePolicy>,

        /// Override the recency window, in minutes
        #[arg(long)]
        recency_minutes: Option<i64>,
    },

    /// Print the function inputs JSON schema
    Schema {
        /// Write to this file instead of stdout
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    bridge_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            run_data,
            function_inputs,
            automate_token,
            failure_policy,
            recency_minutes,
        } => {
            cmd_run(
                &run_data,
                &function_inputs,
                automate_token,
                failure_policy,
                recency_minutes,
            )
            .await
        }
        Commands::Schema { output } => cmd_schema(output.as_deref()),
    }
}

/// Read and parse the automation run data file
fn read_run_data(path: &Path) -> Result<AutomationRunData> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read run data file: {:?}", path))?;
    let run_data: AutomationRunData =
        serde_json::from_str(&content).context("Failed to parse automation run data")?;
    Ok(run_data)
}

/// Server the run talks to: the run data wins, then `SPECKLE_SERVER_URL`.
fn server_url(run_data: &AutomationRunData, env_config: &ServerConfig) -> String {
    let from_run = run_data.speckle_server_url.trim();
    if from_run.is_empty() {
        env_config.server_url.clone()
    } else {
        from_run.trim_end_matches('/').to_string()
    }
}

/// Function inputs with command-line overrides applied
fn run_options(
    inputs: FunctionInputs,
    failure_policy: Option<FailurePolicy>,
    recency_minutes: Option<i64>,
) -> Result<RunOptions> {
    let mut options = RunOptions::from(inputs);
    if let Some(policy) = failure_policy {
        options = options.with_failure_policy(policy);
    }
    if let Some(minutes) = recency_minutes {
        if minutes <= 0 {
            anyhow::bail!("--recency-minutes must be positive, got {}", minutes);
        }
        options = options.with_recency_window(chrono::Duration::minutes(minutes));
    }
    Ok(options)
}

async fn cmd_run(
    run_data_path: &Path,
    inputs_path: &Path,
    automate_token: Option<String>,
    failure_policy: Option<FailurePolicy>,
    recency_minutes: Option<i64>,
) -> Result<()> {
    let run_data = read_run_data(run_data_path)?;
    let inputs = FunctionInputs::from_file(inputs_path).context("Failed to load function inputs")?;

    let env_config = ServerConfig::from_env();
    let url = server_url(&run_data, &env_config);
    info!(
        server = %url,
        automation_run_id = %run_data.automation_run_id,
        "Starting automation run"
    );

    let user_config = ServerConfig::new(&url)
        .with_timeout(env_config.timeout)
        .with_token(inputs.speckle_token.clone());
    let automate_token = automate_token
        .map(SecretString::new)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| inputs.speckle_token.clone());
    let automate_config = ServerConfig::new(&url)
        .with_timeout(env_config.timeout)
        .with_token(automate_token);

    let api = Arc::new(
        HttpServerApi::new(user_config.clone()).context("Invalid server configuration")?,
    );
    let transport =
        Arc::new(ServerTransport::new(user_config).context("Invalid server configuration")?);
    let context = AutomateRunContext::connect(run_data, automate_config)
        .context("Failed to connect the automation run context")?;

    let options = run_options(inputs, failure_policy, recency_minutes)?;
    let report = execute_run(api, transport, &context, options).await?;

    println!(
        "{}",
        report.result.summary_message.as_deref().unwrap_or_default()
    );
    println!("Workspace: {}", report.workspace_id);
    for id in &report.result.published_version_ids {
        println!("  version {}", id);
    }
    Ok(())
}

/// Drive one orchestrated run against the given collaborators
async fn execute_run(
    api: Arc<dyn ServerApi>,
    transport: Arc<dyn ObjectTransport>,
    context: &dyn RunContext,
    options: RunOptions,
) -> Result<RunReport> {
    let orchestrator = RunOrchestrator::new(api, transport, options);
    let report = orchestrator
        .run(context)
        .await
        .context("Automation run failed")?;
    Ok(report)
}

fn cmd_schema(output: Option<&Path>) -> Result<()> {
    let schema = serde_json::to_string_pretty(&bridge_core::function_inputs_schema())?;
    match output {
        Some(path) => {
            std::fs::write(path, schema)
                .context(format!("Failed to write schema to {:?}", path))?;
            println!("Wrote function inputs schema to {:?}", path);
        }
        None => println!("{}", schema),
    }
    Ok(())
}
