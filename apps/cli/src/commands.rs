//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docflow_core::{
    InvocationResponse, build_extract_orchestrator, build_process_orchestrator, handle_extract,
    handle_process, open_zones,
};
use docflow_shared::{
    AppConfig, DocumentEvent, init_config, load_config, load_config_from, resolve_log_filter,
};
use docflow_storage::ObjectLocation;
use serde_json::Value;
use tracing::{Instrument, Span, info, info_span};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docflow: land document change events and extract page metadata.
#[derive(Parser)]
#[command(
    name = "docflow",
    version,
    about = "Land document change events and extract structured page metadata.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv). Overrides the environment-derived level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.docflow/docflow.toml).
    #[arg(long, env = "DOCFLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that override the config file when given.
#[derive(Args, Debug, Default)]
pub(crate) struct ConfigOverrides {
    /// Deployment environment: dev, qa, uat, or prod.
    #[arg(long, env = "ENVIRONMENT", global = true)]
    pub environment: Option<String>,

    /// Log level for dev/qa: debug, info, error, or silent.
    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Confluence base URL, including `/wiki`.
    #[arg(long, env = "CONFLUENCE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Object database path.
    #[arg(long, env = "DOCFLOW_DATABASE", global = true)]
    pub database: Option<String>,

    /// Workflow execution endpoint.
    #[arg(long, env = "DOCFLOW_WORKFLOW_ENDPOINT", global = true)]
    pub workflow_endpoint: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(environment) = &self.environment {
            config.runtime.environment = environment.clone();
        }
        if let Some(level) = &self.log_level {
            config.runtime.log_level = Some(level.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(database) = &self.database {
            config.storage.database_path = database.clone();
        }
        if let Some(endpoint) = &self.workflow_endpoint {
            config.workflow.endpoint = Some(endpoint.clone());
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Land a page (or a deletion record) and start the extraction workflow.
    Process {
        /// Page identifier.
        #[arg(long)]
        document_id: String,

        /// Event kind: updated or deleted.
        #[arg(long)]
        event_type: String,

        /// Correlation id for log lines (generated when omitted).
        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Extract metadata from a landed page into the ground-truth zone.
    Extract {
        /// Page identifier.
        #[arg(long)]
        document_id: String,

        /// Event kind: updated or deleted.
        #[arg(long)]
        event_type: String,

        /// URI of the landed raw page.
        #[arg(long)]
        document_uri: String,

        /// Correlation id for log lines (generated when omitted).
        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Run a raw event payload through an invocation handler.
    Handle {
        /// Handler to invoke.
        #[command(subcommand)]
        action: HandleAction,
    },

    /// Inspect stored objects.
    Objects {
        /// Objects subcommand.
        #[command(subcommand)]
        action: ObjectsAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Payload source shared by the handle subcommands.
#[derive(Args, Debug)]
pub(crate) struct HandleArgs {
    /// JSON payload file. Reads stdin when omitted.
    #[arg(long)]
    pub event: Option<PathBuf>,

    /// Correlation id to report (generated when omitted).
    #[arg(long)]
    pub correlation_id: Option<String>,
}

/// Invocation handler subcommands.
#[derive(Subcommand)]
pub(crate) enum HandleAction {
    /// Ingest handler.
    Process(HandleArgs),
    /// Extraction handler.
    Extract(HandleArgs),
}

/// Storage zone selector.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum Zone {
    Landing,
    GroundTruth,
}

/// Object inspection subcommands.
#[derive(Subcommand)]
pub(crate) enum ObjectsAction {
    /// List objects in a zone.
    List {
        #[arg(long, default_value = "landing")]
        zone: Zone,
    },
    /// Print the object at an `object://` URI.
    Get {
        uri: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Config and tracing setup
// ---------------------------------------------------------------------------

/// Load the config file and apply flag/environment overrides.
pub(crate) fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    cli.overrides.apply(&mut config);
    Ok(config)
}

/// Initialize tracing based on CLI flags and the runtime environment.
pub(crate) fn init_tracing(cli: &Cli, config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => {
            let level = resolve_log_filter(
                &config.runtime.environment,
                config.runtime.log_level.as_deref(),
            );
            format!("docflow={level}")
        }
        1 => "docflow=debug".to_string(),
        _ => "docflow=trace".to_string(),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Process {
            document_id,
            event_type,
            correlation_id,
        } => {
            let event = DocumentEvent::from_parts(Some(&document_id), Some(&event_type), None)?;
            cmd_process(&config, &event)
                .instrument(invocation_span(correlation_id))
                .await
        }
        Command::Extract {
            document_id,
            event_type,
            document_uri,
            correlation_id,
        } => {
            let event = DocumentEvent::from_parts(
                Some(&document_id),
                Some(&event_type),
                Some(&document_uri),
            )?;
            cmd_extract(&config, &event)
                .instrument(invocation_span(correlation_id))
                .await
        }
        Command::Handle { action } => match action {
            HandleAction::Process(args) => cmd_handle(&config, Handler::Process, args).await,
            HandleAction::Extract(args) => cmd_handle(&config, Handler::Extract, args).await,
        },
        Command::Objects { action } => match action {
            ObjectsAction::List { zone } => cmd_objects_list(&config, zone).await,
            ObjectsAction::Get { uri } => cmd_objects_get(&config, &uri).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn invocation_span(correlation_id: Option<String>) -> Span {
    let correlation_id = correlation_id.unwrap_or_else(|| Uuid::now_v7().to_string());
    info_span!("invocation", %correlation_id)
}

async fn cmd_process(config: &AppConfig, event: &DocumentEvent) -> Result<()> {
    let zones = open_zones(config).await?;
    let orchestrator = build_process_orchestrator(config, &zones)?;

    let result = orchestrator.process(event).await?;
    info!(object_key = %result.object_key, "page landed");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_extract(config: &AppConfig, event: &DocumentEvent) -> Result<()> {
    let zones = open_zones(config).await?;
    let orchestrator = build_extract_orchestrator(&zones);

    let result = orchestrator.extract(event).await?;
    info!(object_key = %result.object_key, "metadata stored");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[derive(Clone, Copy)]
enum Handler {
    Process,
    Extract,
}

async fn cmd_handle(config: &AppConfig, handler: Handler, args: HandleArgs) -> Result<()> {
    let raw = match &args.event {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read event file '{}': {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| eyre!("cannot read event from stdin: {e}"))?;
            buf
        }
    };
    let payload: Value =
        serde_json::from_str(&raw).map_err(|e| eyre!("event is not valid JSON: {e}"))?;

    let zones = open_zones(config).await?;
    let response: InvocationResponse = match handler {
        Handler::Process => {
            let orchestrator = build_process_orchestrator(config, &zones)?;
            handle_process(&orchestrator, payload, args.correlation_id).await
        }
        Handler::Extract => {
            let orchestrator = build_extract_orchestrator(&zones);
            handle_extract(&orchestrator, payload, args.correlation_id).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    if !response.is_success() {
        return Err(eyre!(
            "invocation {} failed with status {}",
            response.correlation_id,
            response.status_code
        ));
    }
    Ok(())
}

async fn cmd_objects_list(config: &AppConfig, zone: Zone) -> Result<()> {
    let zones = open_zones(config).await?;
    let zone = match zone {
        Zone::Landing => &zones.landing,
        Zone::GroundTruth => &zones.ground_truth,
    };

    let objects = zone.list().await?;
    if objects.is_empty() {
        println!("No objects in bucket '{}'.", zone.bucket());
        return Ok(());
    }

    for object in &objects {
        println!(
            "{:<60} {:>8}  {}",
            object.key, object.content_len, object.stored_at
        );
    }
    println!("{} object(s) in bucket '{}'", objects.len(), zone.bucket());
    Ok(())
}

async fn cmd_objects_get(config: &AppConfig, uri: &str) -> Result<()> {
    let location = ObjectLocation::parse(uri)?;
    let zones = open_zones(config).await?;
    let object = zones.landing.get(&location).await?;

    let pretty = match serde_json::from_str::<Value>(&object.body) {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(_) => object.body,
    };
    println!("{pretty}");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
