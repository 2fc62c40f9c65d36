use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use ttsbox_core::compose::{DeploymentPlan, UnitKind};
use ttsbox_core::config::{load_layered, resolve, LogFormat, LogLevel, RuntimeConfiguration};
use ttsbox_core::engine::Engine;
use ttsbox_core::telemetry::events::{record_configuration_error, record_configuration_resolved};
use ttsbox_core::telemetry::init_tracing;

const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Parser, Debug)]
#[command(name = "ttsbox")]
#[command(about = "Runtime configuration, composition and smoke tests for the TTS engine unit")]
struct Cli {
    /// Env file with KEY=value settings; process environment overrides it
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the configuration and print it in canonical KEY=value form
    Check,
    /// Print the compose document for the deployment
    Compose {
        /// Print the engine Dockerfile instead
        #[arg(long)]
        dockerfile: bool,
        /// Activate a declared companion unit
        #[arg(long, value_enum)]
        activate: Vec<CompanionUnit>,
    },
    /// Synthesize a short phrase into the output directory
    ///
    /// Loads TTS_DEFAULT_MODEL through the model cache first. With
    /// TTS_MODELS_AUTO_DOWNLOAD enabled a missing model is downloaded from
    /// TTS_MODEL_BASE_URL, even for the tone pipeline.
    Hello {
        #[arg(long, default_value = "Hello, world!")]
        text: String,
        #[arg(long, default_value = "hello_world.wav")]
        out: String,
    },
    /// Bootstrap the engine, warm up the model and stay up until a shutdown signal arrives
    ///
    /// Warm-up fetches TTS_DEFAULT_MODEL like `hello` does. No listener is
    /// opened on TTS_PORT; the port is only published by the compose document.
    Serve,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompanionUnit {
    Backend,
    Frontend,
}

impl From<CompanionUnit> for UnitKind {
    fn from(unit: CompanionUnit) -> Self {
        match unit {
            CompanionUnit::Backend => UnitKind::Backend,
            CompanionUnit::Frontend => UnitKind::Frontend,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (env_path, optional) = match &cli.env_file {
        Some(path) => (path.clone(), false),
        None => (PathBuf::from(DEFAULT_ENV_FILE), true),
    };
    let process_vars = std::env::vars_os().filter_map(|(key, value)| {
        Some((key.into_string().ok()?, value.into_string().ok()?))
    });
    let source = load_layered(Some(&env_path), optional, process_vars)
        .with_context(|| format!("failed to load {}", env_path.display()))?;

    let config = match resolve(&source) {
        Ok(config) => Arc::new(config),
        Err(errors) => {
            let _guard = init_tracing(LogLevel::default(), LogFormat::default()).ok();
            for failure in errors.iter() {
                record_configuration_error(failure);
            }
            return Err(errors.into());
        }
    };

    let _guard = init_tracing(config.log_level, config.log_format)
        .context("failed to install tracing subscriber")?;
    record_configuration_resolved(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Check => check(&config),
        Command::Compose {
            dockerfile,
            activate,
        } => compose(&config, dockerfile, activate),
        Command::Hello { text, out } => hello(config, &text, &out).await,
        Command::Serve => serve(config).await,
    }
}

fn check(config: &RuntimeConfiguration) -> Result<()> {
    print!("{}", config.to_env_file());
    validate_plan(&DeploymentPlan::from_config(config))
}

fn validate_plan(plan: &DeploymentPlan) -> Result<()> {
    if let Err(errors) = plan.validate() {
        for error in &errors {
            warn!(target: "service_composer", %error, "composition constraint violated");
        }
        anyhow::bail!("deployment plan has {} violation(s)", errors.len());
    }
    Ok(())
}

fn compose(
    config: &RuntimeConfiguration,
    dockerfile: bool,
    activate: Vec<CompanionUnit>,
) -> Result<()> {
    let mut plan = DeploymentPlan::from_config(config);
    for unit in activate {
        plan.activate(unit.into())?;
    }
    validate_plan(&plan)?;

    if dockerfile {
        let rendered = plan
            .engine_dockerfile()
            .context("engine unit has no build recipe")?;
        print!("{rendered}");
    } else {
        let document = serde_json::to_string_pretty(&plan.render_compose())?;
        println!("{document}");
    }
    Ok(())
}

async fn hello(config: Arc<RuntimeConfiguration>, text: &str, out: &str) -> Result<()> {
    let engine = Engine::bootstrap(config).context("engine startup failed")?;
    let outcome = engine
        .synthesize(text, Some(out))
        .await
        .context("smoke test synthesis failed")?;

    if let Some(path) = &outcome.saved_to {
        println!("{}", path.display());
    }
    Ok(())
}

async fn serve(config: Arc<RuntimeConfiguration>) -> Result<()> {
    let engine = Engine::bootstrap(Arc::clone(&config)).context("engine startup failed")?;
    if let Err(err) = engine.warmup().await {
        warn!(target: "engine", %err, "warm-up failed; loading will be retried per request");
    }

    let model_loaded = engine.is_loaded().await;
    info!(
        target: "engine",
        workers = config.worker_count,
        device = engine.device().as_str(),
        model_loaded,
        "engine bootstrapped; waiting for shutdown signal"
    );

    shutdown_signal().await?;
    info!(target: "engine", "shutdown signal received");
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
