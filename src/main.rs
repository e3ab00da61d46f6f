use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use sqlseed::config::{ConnectionConfig, ExecutionMode, ExecutionOptions, ImportConfig, SchemaTarget, SplitMode};
use sqlseed::executor::ImportReport;
use sqlseed::script::{Classification, ImportPlan};
use sqlseed::types::Backend;

#[derive(Parser)]
#[command(name = "sqlseed")]
#[command(about = "Replay a SQL dump into a MySQL or PostgreSQL schema")]
#[command(version)]
#[command(long_about = "Sqlseed bootstraps a database from a SQL dump. It creates the target schema if it is missing, splits the dump into statements, skips session and schema statements that only make sense in a linear CLI replay, executes the rest one by one and reports successes, failures and the resulting tables.")]
#[command(after_help = "EXAMPLES:
    # Import a dump into a local MySQL server
    sqlseed import -d db_dump.sql --schema shop --user root

    # Import into PostgreSQL, all or nothing
    sqlseed import -d db_dump.sql --schema shop --backend postgres --transactional

    # Keep semicolons inside string literals and comments intact
    sqlseed import -d db_dump.sql --schema shop --lexical --format json

    # See which statements would run, without connecting
    sqlseed plan -d db_dump.sql")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Mysql,
    Postgres,
}

impl From<BackendArg> for Backend {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::Mysql => Backend::MySql,
            BackendArg::Postgres => Backend::Postgres,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args)]
struct DatabaseArgs {
    /// Database server flavour
    #[arg(long, env = "SQLSEED_DB_BACKEND", value_enum, default_value = "mysql")]
    backend: BackendArg,

    #[arg(long, env = "SQLSEED_DB_HOST", default_value = "localhost")]
    host: String,

    /// Server port (default: 3306 for MySQL, 5432 for PostgreSQL)
    #[arg(long, env = "SQLSEED_DB_PORT")]
    port: Option<u16>,

    #[arg(short, long, env = "SQLSEED_DB_USER", default_value = "root")]
    user: String,

    #[arg(long, env = "SQLSEED_DB_PASSWORD", default_value = "", hide_env_values = true, hide_default_value = true)]
    password: String,

    /// Database to connect to before the target schema exists (PostgreSQL only)
    #[arg(long, env = "SQLSEED_PG_DATABASE")]
    database: Option<String>,

    /// Target schema (database) the dump is replayed into
    #[arg(long, env = "SQLSEED_DB_NAME")]
    schema: String,

    /// Character set used when creating the schema
    #[arg(long, default_value = "utf8")]
    charset: String,

    /// Collation used when creating the schema
    #[arg(long, default_value = "utf8_general_ci")]
    collation: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a SQL dump into the target schema
    Import {
        /// Path to the SQL dump
        #[arg(short, long, value_name = "FILE")]
        dump: PathBuf,

        #[command(flatten)]
        db: DatabaseArgs,

        /// Split on top-level semicolons only, ignoring those inside literals and comments
        #[arg(long)]
        lexical: bool,

        /// Run the import in one transaction and roll back on the first failure
        #[arg(long)]
        transactional: bool,

        /// Abort the whole run after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Output format for the import report
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Exit with a failure status when any statement failed
        #[arg(long)]
        strict: bool,
    },

    /// Show how a dump would be split and which statements would run
    Plan {
        /// Path to the SQL dump
        #[arg(short, long, value_name = "FILE")]
        dump: PathBuf,

        /// Tokenizer dialect used with --lexical
        #[arg(long, env = "SQLSEED_DB_BACKEND", value_enum, default_value = "mysql")]
        backend: BackendArg,

        /// Split on top-level semicolons only
        #[arg(long)]
        lexical: bool,

        /// Output format for the plan
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    info!("Starting sqlseed v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Import {
            dump,
            db,
            lexical,
            transactional,
            timeout,
            format,
            strict,
        } => {
            let config = build_import_config(db, lexical, transactional, timeout);
            info!("Importing {:?} into schema '{}' on {}", dump, config.schema.name, config.connection.backend);

            match sqlseed::run_import(&config, &dump).await {
                Ok(report) => {
                    print_report(&report, format)?;
                    if strict && !report.is_successful() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("✗ Import failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Plan {
            dump,
            backend,
            lexical,
            format,
        } => match sqlseed::plan_dump(&dump, split_mode(lexical), backend.into()).await {
            Ok(plan) => print_plan(&plan, format)?,
            Err(e) => {
                eprintln!("✗ Plan failed: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn split_mode(lexical: bool) -> SplitMode {
    if lexical {
        SplitMode::Lexical
    } else {
        SplitMode::Naive
    }
}

fn build_import_config(db: DatabaseArgs, lexical: bool, transactional: bool, timeout: Option<u64>) -> ImportConfig {
    let backend = Backend::from(db.backend);
    let connection = ConnectionConfig {
        backend,
        host: db.host,
        port: db.port.unwrap_or_else(|| backend.default_port()),
        user: db.user,
        password: db.password,
        database: db.database,
    };
    let schema = SchemaTarget {
        name: db.schema,
        charset: db.charset,
        collation: db.collation,
    };
    let options = ExecutionOptions {
        split_mode: split_mode(lexical),
        execution_mode: if transactional {
            ExecutionMode::Transactional
        } else {
            ExecutionMode::BestEffort
        },
        deadline: timeout.map(Duration::from_secs),
    };
    ImportConfig::new(connection, schema).with_options(options)
}

fn print_report(report: &ImportReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            println!("✓ Statements executed: {}", report.succeeded);
            if report.skipped > 0 {
                println!("  Statements skipped: {}", report.skipped);
            }
            if report.failed > 0 {
                println!("✗ Errors: {}", report.failed);
                for failure in &report.failures {
                    println!("  - {}", failure);
                }
            }
            if report.rolled_back {
                println!("✗ Rolled back; {} statements not attempted", report.not_attempted);
            }
            if let Some(error) = &report.transaction_error {
                println!("✗ Transaction: {}", error);
            }
            if let Some(error) = &report.tables_error {
                println!("✗ Could not list tables: {}", error);
            }
            println!("✓ Tables: {}", report.tables.len());
            for table in &report.tables {
                println!("  - {}", table);
            }
            println!("{}", report.summary());
        }
    }
    Ok(())
}

fn print_plan(plan: &ImportPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plan)?),
        OutputFormat::Text => {
            for statement in &plan.statements {
                let action = match statement.classification {
                    Classification::Execute => "run ".to_string(),
                    Classification::Skip(reason) => format!("skip ({})", reason),
                };
                println!("#{:<5} {:<24} {}", statement.ordinal, action, statement.preview);
            }
            println!(
                "{} statements: {} to run, {} skipped",
                plan.statements.len(),
                plan.executable_count(),
                plan.skipped_count()
            );
        }
    }
    Ok(())
}

/// Initialize logging based on CLI configuration
fn initialize_logging(cli: &Cli) -> Result<()> {
    let log_level = if let Some(level) = &cli.log_level {
        level.clone().into()
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // RUST_LOG wins over the command line when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(log_level).into()));

    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(cli.verbose)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(cli.verbose)
            .with_file(cli.verbose)
            .with_line_number(cli.verbose)
            .init();
    }

    Ok(())
}
