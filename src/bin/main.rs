//! flatbridge CLI - Move data between ClickHouse and delimited files
//!
//! Usage:
//!   flatbridge serve [--port <port>]
//!   flatbridge tables [connection options]
//!   flatbridge columns <table>... [connection options]
//!   flatbridge preview -t <table> -c <table.column>... [--join-condition <expr>]
//!   flatbridge export -t <table> -c <table.column>... [--delimiter <d>] [--output-dir <dir>]
//!   flatbridge import <file> --table <name> [--columns a,b] [--delimiter <d>] [--no-header]
//!
//! Examples:
//!   flatbridge tables --host localhost --database shop
//!   flatbridge export -t orders -t customers -c orders.id -c customers.name \
//!       --join-condition "orders.customer_id = customers.id"
//!   flatbridge import payments.csv --table payments --connection warehouse

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use flatbridge::config::{ConnectionConfig, Settings};
use flatbridge::database::ClickHouseConnectionFactory;
use flatbridge::flatfile::Delimiter;
use flatbridge::transfer::{
    ColumnRef, FileFormat, ImportRequest, JoinSpec, Orchestrator, Selection, TransferOptions,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "flatbridge")]
#[command(about = "flatbridge - Move data between ClickHouse and delimited flat files")]
#[command(version)]
struct Cli {
    /// Path to a flatbridge.toml settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List tables in the database
    Tables {
        #[command(flatten)]
        conn: ConnArgs,
    },

    /// List columns and types of tables
    Columns {
        /// Tables to describe
        #[arg(required = true)]
        tables: Vec<String>,

        #[command(flatten)]
        conn: ConnArgs,
    },

    /// Print the first rows of a selection as JSON
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        conn: ConnArgs,
    },

    /// Export a selection to a delimited file
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Field delimiter (`\t` or `tab` for tabs)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Directory to write the export file to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        conn: ConnArgs,
    },

    /// Import a delimited file into a new table
    Import {
        /// Path to the file
        file: PathBuf,

        /// Target table (created if it does not exist)
        #[arg(long)]
        table: String,

        /// Columns to import, comma separated (all columns if omitted)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Field delimiter (`\t` or `tab` for tabs)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// The first line is data, not column names
        #[arg(long)]
        no_header: bool,

        #[command(flatten)]
        conn: ConnArgs,
    },
}

/// Connection options. Flags override a named connection from settings,
/// which overrides `FLATBRIDGE_CH_*` environment variables.
#[derive(Args)]
struct ConnArgs {
    /// Named connection from the settings file
    #[arg(long)]
    connection: Option<String>,

    /// ClickHouse host or http(s) URL
    #[arg(long)]
    host: Option<String>,

    /// ClickHouse HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Username
    #[arg(long)]
    user: Option<String>,

    /// Password or access token
    #[arg(long)]
    token: Option<String>,
}

/// Table and column selection.
#[derive(Args)]
struct SelectionArgs {
    /// Tables in join order; the first is the anchor
    #[arg(short, long = "table", required = true)]
    tables: Vec<String>,

    /// Columns as `table.column`, or `column` for the first table
    #[arg(short, long = "column", required = true)]
    columns: Vec<String>,

    /// Predicate used to join every table after the first
    #[arg(long)]
    join_condition: Option<String>,

    /// Per-table join as `table=predicate`, in table order
    #[arg(long = "join")]
    joins: Vec<String>,
}

impl SelectionArgs {
    fn to_selection(&self) -> CliResult<Selection> {
        let anchor = self.tables.first().cloned().unwrap_or_default();
        let columns = self
            .columns
            .iter()
            .map(|spec| match spec.split_once('.') {
                Some((table, column)) => ColumnRef::new(table, column),
                None => ColumnRef::new(anchor.clone(), spec.clone()),
            })
            .collect();

        let joins = self
            .joins
            .iter()
            .map(|spec| {
                spec.split_once('=')
                    .map(|(table, on)| JoinSpec::new(table.trim(), on.trim()))
                    .ok_or_else(|| format!("--join expects table=predicate, got {spec:?}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Selection {
            tables: self.tables.clone(),
            columns,
            join_condition: self.join_condition.clone(),
            joins: (!joins.is_empty()).then_some(joins),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flatbridge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            let mut settings = settings;
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            flatbridge::web::serve(settings).await
        }
        Commands::Tables { conn } => {
            let config = resolve_connection(&settings, &conn)?;
            for table in orchestrator(&settings, None)?.list_tables(&config).await? {
                println!("{table}");
            }
            Ok(())
        }
        Commands::Columns { tables, conn } => {
            let config = resolve_connection(&settings, &conn)?;
            let columns = orchestrator(&settings, None)?
                .list_columns(&config, &tables)
                .await?;
            for c in columns {
                println!("{}.{}\t{}", c.table, c.name, c.data_type);
            }
            Ok(())
        }
        Commands::Preview { selection, conn } => {
            let config = resolve_connection(&settings, &conn)?;
            let result = orchestrator(&settings, None)?
                .preview(&config, &selection.to_selection()?)
                .await?;
            print_json(&result)
        }
        Commands::Export {
            selection,
            delimiter,
            output_dir,
            conn,
        } => {
            let config = resolve_connection(&settings, &conn)?;
            let delimiter = Delimiter::parse(
                delimiter
                    .as_deref()
                    .unwrap_or(&settings.transfer.default_delimiter),
            )?;
            let result = orchestrator(&settings, output_dir)?
                .export(&config, &selection.to_selection()?, delimiter)
                .await?;
            print_json(&result)
        }
        Commands::Import {
            file,
            table,
            columns,
            delimiter,
            no_header,
            conn,
        } => {
            let config = resolve_connection(&settings, &conn)?;
            let orchestrator = orchestrator(&settings, None)?;
            let format = FileFormat {
                delimiter: Delimiter::parse(
                    delimiter
                        .as_deref()
                        .unwrap_or(&settings.transfer.default_delimiter),
                )?,
                has_header: !no_header,
            };
            let columns = if columns.is_empty() {
                orchestrator.flatfile_schema(&file, format).await?.columns
            } else {
                columns
            };
            let request = ImportRequest {
                format,
                columns,
                target_table: table,
            };
            let result = orchestrator.import(&config, &file, &request).await?;
            print_json(&result)
        }
    }
}

fn orchestrator(settings: &Settings, output_dir: Option<PathBuf>) -> CliResult<Orchestrator> {
    let factory =
        ClickHouseConnectionFactory::new(Duration::from_secs(settings.clickhouse.timeout_secs))?;
    let mut options = TransferOptions::from_settings(&settings.transfer)?;
    if let Some(dir) = output_dir {
        options.holding_dir = dir;
    }
    Ok(Orchestrator::new(Arc::new(factory), options))
}

fn resolve_connection(settings: &Settings, args: &ConnArgs) -> CliResult<ConnectionConfig> {
    let mut config = match &args.connection {
        Some(name) => settings.get_connection(name)?.resolve()?,
        None => match settings.default_connection() {
            Some((_, conn)) => conn.resolve()?,
            None => ConnectionConfig::from_env().unwrap_or_default(),
        },
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(user) = &args.user {
        config.username = Some(user.clone());
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
