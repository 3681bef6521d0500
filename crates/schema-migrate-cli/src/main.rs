//! schema-migrate CLI - dialect-aware schema migrations.

use clap::{Parser, Subcommand};
use schema_migrate::core::catalog::DRIVER_ALIASES;
use schema_migrate::{
    open_session, Config, DbMigrationLog, DialectImpl, MigrateError, MigrationFile,
    MigrationLog, Migrator,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "schema-migrate")]
#[command(about = "Dialect-aware schema migrations for PostgreSQL, MySQL, SQLite and SQL Server")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the migrations in a migration file
    Apply {
        /// Path to YAML migration file
        #[arg(short, long)]
        file: PathBuf,

        /// Render the SQL for the configured dialect without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show applied migrations, and pending ones when a file is given
    Status {
        /// Path to YAML migration file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Test the database connection
    HealthCheck,

    /// Drop every table in the configured database
    CleanDb {
        /// Confirm the destructive operation
        #[arg(long)]
        force: bool,
    },

    /// List supported dialects and their driver-name aliases
    Dialects,
}

#[derive(Serialize)]
struct HealthCheckResult {
    dialect: String,
    connected: bool,
    latency_ms: u64,
    error: Option<String>,
}

#[derive(Serialize)]
struct PlannedStep {
    id: String,
    sql: String,
}

#[derive(Serialize)]
struct StatusReport {
    log_table: String,
    applied: Vec<String>,
    pending: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    // Dialects needs no configuration file
    if let Commands::Dialects = cli.command {
        return print_dialects(cli.output_json);
    }

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Dialects => unreachable!(), // Handled above

        Commands::Apply { file, dry_run } => {
            let steps = MigrationFile::load(&file)?.into_migrations();
            info!("Loaded {} migrations from {:?}", steps.len(), file);

            if dry_run {
                let dialect = DialectImpl::from_driver_name(&config.database.r#type)?;
                let plan: Vec<PlannedStep> = steps
                    .iter()
                    .map(|(id, step)| PlannedStep {
                        id: id.clone(),
                        sql: step.sql(&dialect),
                    })
                    .collect();

                if cli.output_json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    for step in &plan {
                        println!("-- {}\n{}\n", step.id, step.sql);
                    }
                }
                return Ok(());
            }

            let session = open_session(&config.database).await?;
            let log = Arc::new(DbMigrationLog::new(config.migrator.log_table.clone()));
            let mut migrator = Migrator::new(session, log);
            for (id, step) in steps {
                migrator.add_boxed(id, step)?;
            }

            let cancel_token = setup_signal_handler().await?;
            let summary = migrator.run(Some(&cancel_token)).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\nMigrations completed!");
                println!("  Applied: {}", summary.applied);
                println!("  Skipped: {}", summary.skipped);
                println!("  Already applied: {}", summary.already_applied);
                println!("  Duration: {:.2}s", summary.duration_seconds);
            }
        }

        Commands::Status { file } => {
            let session = open_session(&config.database).await?;
            let log = DbMigrationLog::new(config.migrator.log_table.clone());

            let applied = if log.exists(&session).await? {
                log.applied_ids(&session).await?
            } else {
                warn!("Migration log table {} does not exist yet", log.table_name());
                Vec::new()
            };
            let pending = match file {
                Some(path) => MigrationFile::load(&path)?
                    .migrations
                    .into_iter()
                    .map(|m| m.id)
                    .filter(|id| !applied.contains(id))
                    .collect(),
                None => Vec::new(),
            };
            let report = StatusReport {
                log_table: log.table_name().to_string(),
                applied,
                pending,
            };

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Migration log: {}", report.log_table);
                println!("  Applied: {}", report.applied.len());
                for id in &report.applied {
                    println!("    {}", id);
                }
                if !report.pending.is_empty() {
                    println!("  Pending: {}", report.pending.len());
                    for id in &report.pending {
                        println!("    {}", id);
                    }
                }
            }
        }

        Commands::HealthCheck => {
            let started = Instant::now();
            let outcome = match open_session(&config.database).await {
                Ok(session) => session.ping().await,
                Err(e) => Err(e),
            };
            let result = HealthCheckResult {
                dialect: config.database.r#type.clone(),
                connected: outcome.is_ok(),
                latency_ms: started.elapsed().as_millis() as u64,
                error: outcome.as_ref().err().map(|e| e.to_string()),
            };

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Database ({}): {} ({}ms)",
                    result.dialect,
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            outcome?;
        }

        Commands::CleanDb { force } => {
            if !config.migrator.allow_clean_db {
                return Err(MigrateError::Config(
                    "clean-db is disabled; set migrator.allow_clean_db: true to enable it"
                        .to_string(),
                ));
            }
            if !force {
                return Err(MigrateError::Config(
                    "clean-db drops every table; pass --force to confirm".to_string(),
                ));
            }

            let session = open_session(&config.database).await?;
            session.clean_db().await?;
            println!("Database cleaned");
        }
    }

    Ok(())
}

fn print_dialects(output_json: bool) -> Result<(), MigrateError> {
    if output_json {
        let dialects: Vec<_> = DRIVER_ALIASES
            .iter()
            .map(|(name, aliases)| serde_json::json!({ "name": name, "aliases": aliases }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&dialects)?);
    } else {
        println!("Supported dialects:");
        for (name, aliases) in DRIVER_ALIASES {
            println!("  {:<10} aliases: {}", name, aliases.join(", "));
        }
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    // RUST_LOG wins over --verbosity when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    // Logs go to stderr so --output-json stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Setup signal handlers so a run stops before its next step.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
#[cfg(unix)]
async fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let token = cancel_token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => eprintln!("\nReceived SIGINT. Stopping after the current step..."),
            _ = sigterm.recv() => eprintln!("\nReceived SIGTERM. Stopping after the current step..."),
        }
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
async fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping after the current step...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
