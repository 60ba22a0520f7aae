//! ReplBridge - MySQL to PostgreSQL Replication Bridge
//!
//! Verifies both endpoints and asks the operator before handing off to
//! replication.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use replbridge::boot::{BootOutcome, Bootstrap};
use replbridge::config::BridgeConfig;
use replbridge::context::ReplicationContext;
use replbridge::error::{Error, Result};
use replbridge::pool::{Backend, SqlxConnector};
use replbridge::sink::LogSink;

/// ReplBridge - MySQL to PostgreSQL Replication Bridge
#[derive(Parser)]
#[command(name = "replbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "replbridge.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); defaults to [logging].level
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify both databases, confirm with the operator and start
    Start,

    /// Verify both databases without starting
    Check,

    /// Validate configuration and mapping files
    Validate,

    /// Show the resolved replication settings
    Info,

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "replbridge.toml")]
        output: PathBuf,
    },

    /// Resolve identifiers through the mapping table
    Map {
        #[command(subcommand)]
        name: MapCommand,
    },
}

#[derive(Subcommand)]
enum MapCommand {
    /// Translate a table name
    Table {
        /// Table name to translate
        name: String,

        /// Treat the name as a target name and print the source name
        #[arg(long)]
        original: bool,
    },

    /// Translate a column name
    Column {
        /// Source name of the table the column belongs to
        table: String,

        /// Column name to translate
        column: String,

        /// Print the source name instead of the target name
        #[arg(long)]
        original: bool,
    },
}

/// Operator declined to start
const EXIT_ABORTED: u8 = 2;
/// Interrupted by a signal
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = cli
        .log_level
        .clone()
        .or_else(|| {
            BridgeConfig::from_file(&cli.config)
                .ok()
                .map(|c| c.logging.level)
        })
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level);

    let result = match cli.command {
        Commands::Start => run_start(cli.config).await,
        Commands::Check => run_check(cli.config).await.map(|_| ExitCode::SUCCESS),
        Commands::Validate => run_validate(cli.config).map(|_| ExitCode::SUCCESS),
        Commands::Info => run_info(cli.config).map(|_| ExitCode::SUCCESS),
        Commands::Init { output } => run_init(output).map(|_| ExitCode::SUCCESS),
        Commands::Map { name } => run_map(cli.config, name).map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(Error::Cancelled) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load the configuration, the mapping document and build the context
fn load(config_path: &Path) -> Result<(BridgeConfig, ReplicationContext)> {
    let config = BridgeConfig::from_file(config_path)?;
    let extra_config = config.load_extra_config()?;
    let ctx = ReplicationContext::from_config(&config, extra_config);
    Ok((config, ctx))
}

/// Completes on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run the boot pipeline and hand off
async fn run_start(config_path: PathBuf) -> Result<ExitCode> {
    let (config, ctx) = load(&config_path)?;
    let sink = LogSink::new(&ctx).await;
    sink.log("\t--[ReplBridge] Boot started...").await;

    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    let outcome = Bootstrap::new(&SqlxConnector, &sink)
        .with_match_mode(config.gate.match_mode)
        .run_until(ctx, &mut input, &mut output, shutdown_signal())
        .await?;

    match outcome {
        BootOutcome::Ready(mut ctx) => {
            sink.log(&format!(
                "\t--[ReplBridge] Replication context ready: {} mapped tables, {} excluded tables",
                ctx.extra_config().map(|d| d.len()).unwrap_or(0),
                ctx.exclude_tables().len()
            ))
            .await;
            // Change capture runs outside this binary; release the verified pools
            ctx.close_pools().await;
            Ok(ExitCode::SUCCESS)
        }
        BootOutcome::Aborted => Ok(ExitCode::from(EXIT_ABORTED)),
    }
}

/// Verify both endpoints without the operator gate
async fn run_check(config_path: PathBuf) -> Result<()> {
    let (_, ctx) = load(&config_path)?;
    let sink = LogSink::new(&ctx).await;

    Bootstrap::new(&SqlxConnector, &sink).check(ctx).await?;
    println!("✓ Both databases are reachable");
    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match load(&config_path) {
        Ok((config, ctx)) => {
            println!("✓ Configuration is valid");
            println!(
                "  Source: {}@{}:{}/{}",
                config.source.user, config.source.host, config.source.port, config.source.database
            );
            println!(
                "  Target: {}@{}:{}/{}",
                config.target.user, config.target.host, config.target.port, config.target.database
            );
            println!(
                "  Mapping: {}",
                match ctx.extra_config() {
                    Some(doc) => format!("{} tables", doc.len()),
                    None => "(disabled)".to_string(),
                }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            Err(e)
        }
    }
}

/// Show the resolved replication settings
fn run_info(config_path: PathBuf) -> Result<()> {
    let (config, ctx) = load(&config_path)?;

    println!("ReplBridge Configuration");
    println!("========================");
    println!();
    println!("Source (MySQL):");
    println!("  Host:           {}:{}", config.source.host, config.source.port);
    println!("  Database:       {}", config.source.database);
    println!("  Pool Size:      {}", ctx.max_pool_size(Backend::Source));
    println!("  Encoding:       {}", ctx.encoding());
    println!();
    println!("Target (PostgreSQL):");
    println!("  Host:           {}:{}", config.target.host, config.target.port);
    println!("  Database:       {}", config.target.database);
    println!("  Schema:         {}", ctx.schema());
    println!("  Pool Size:      {}", ctx.max_pool_size(Backend::Target));
    println!();
    println!("Logs:");
    println!("  All:            {}", ctx.all_logs_path().display());
    println!("  Errors:         {}", ctx.error_logs_path().display());
    println!();
    println!(
        "Mapped Tables:    {}",
        ctx.extra_config().map(|d| d.len()).unwrap_or(0)
    );
    println!("Excluded Tables:  {:?}", ctx.exclude_tables());
    println!("Gate Matching:    {:?}", config.gate.match_mode);

    Ok(())
}

/// Resolve a table or column name
fn run_map(config_path: PathBuf, command: MapCommand) -> Result<()> {
    let (_, ctx) = load(&config_path)?;
    let mapper = ctx.mapper();

    match command {
        MapCommand::Table { name, original } => {
            println!("{}", mapper.table_name(&name, original));
        }
        MapCommand::Column {
            table,
            column,
            original,
        } => {
            println!("{}", mapper.column_name(&table, &column, original));
        }
    }

    Ok(())
}

/// Initialize configuration file
fn run_init(output: PathBuf) -> Result<()> {
    let config_content = r#"# ReplBridge Configuration
# Generated configuration file

# Pool limits; anything that is not a positive integer means 10
max_pool_size_source = 10
max_pool_size_target = 10
encoding = "utf8"
schema = "public"
exclude_tables = []
logs_dir = "logs_directory"

# Table/column renames, see extra_config.json
enable_extra_config = false
extra_config = "extra_config.json"

[source]
host = "localhost"
port = 3306
user = "replbridge"
password = "changeme"
database = "myapp"
connect_timeout_secs = 30

[target]
host = "localhost"
port = 5432
user = "replbridge"
password = "changeme"
database = "myapp"
connect_timeout_secs = 30

[logging]
level = "info"

[gate]
# "substring" or "exact"
match_mode = "substring"
"#;

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the file to configure both databases.");
    println!("Then start with: replbridge --config {} start", output.display());

    Ok(())
}
