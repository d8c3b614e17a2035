use crate::{
    commands::{Commands, QueryArgs},
    env::EnvManager,
    error::CliError,
};
use clap::Parser;
use engine_core::{
    attachments::parse_ids,
    connection::Connection,
    export::query_rows,
    operations::{self, Operation},
};
use soql_syntax::{
    columns::{OutputSchema, Substitutions},
    statement::{QueryStatement, split_params},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod env;
mod error;
mod output;
mod profile;

#[derive(Parser)]
#[command(
    name = "soql-export",
    version = "0.1.0",
    about = "Export SOQL query results and attachments"
)]
struct Cli {
    #[arg(long, global = true, help = "Connection profile (JSON)")]
    connection: Option<PathBuf>,

    #[arg(long, global = true, help = "Load SF_* variables from this .env file")]
    env_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::ExportFile {
            query,
            output: destination,
        } => {
            let (statement, subs) = statement(&query)?;
            let conn = connect(&cli.connection, &cli.env_file)?;
            let summary =
                operations::export_to_file(&conn, &statement, &subs, destination.as_deref())
                    .await?;
            output::print_json(&summary)?;
        }
        Commands::ExportTable {
            query,
            database,
            table,
        } => {
            let (statement, subs) = statement(&query)?;
            let conn = connect(&cli.connection, &cli.env_file)?;
            let summary =
                operations::export_to_table(&conn, &statement, &subs, &database, &table).await?;
            output::print_json(&summary)?;
        }
        Commands::ExportObject {
            query,
            location,
            key,
        } => {
            let (statement, subs) = statement(&query)?;
            let conn = connect(&cli.connection, &cli.env_file)?;
            let summary =
                operations::export_to_object(&conn, &statement, &subs, &location, &key).await?;
            output::print_json(&summary)?;
        }
        Commands::Attachments {
            ids,
            location,
            concurrency,
        } => {
            let ids = parse_ids(&ids);
            if ids.is_empty() {
                return Err(CliError::Config("No attachment ids given".into()));
            }
            let conn = connect(&cli.connection, &cli.env_file)?;
            let outcome =
                operations::attachments_to_store(&conn, &ids, &location, concurrency).await?;
            output::print_json(&outcome)?;
            outcome.into_result()?;
        }
        Commands::Query { query } => {
            let (statement, subs) = statement(&query)?;
            let conn = connect(&cli.connection, &cli.env_file)?;
            let session = conn.session().await?;
            let rows = output::print_rows(query_rows(session, &statement, &subs)?).await?;
            info!(rows = rows.saturating_sub(1), "Query finished");
        }
        Commands::Columns { query } => {
            let (statement, subs) = statement(&query)?;
            let schema = OutputSchema::from_query(&statement.render()?, &subs)?;
            output::print_json(&schema)?;
        }
        Commands::Operations => {
            for op in Operation::ALL {
                println!("{:<16} {}", op.name(), op.description());
            }
        }
    }

    Ok(())
}

fn statement(args: &QueryArgs) -> Result<(QueryStatement, Substitutions), CliError> {
    let mut params = args.param.clone();
    if let Some(raw) = &args.params {
        params.extend(split_params(raw));
    }

    let subs = args
        .replace
        .iter()
        .map(|pair| Substitutions::parse_pair(pair))
        .collect::<Result<Substitutions, _>>()?;

    Ok((QueryStatement::new(&args.soql).with_params(params), subs))
}

fn connect(
    connection: &Option<PathBuf>,
    env_file: &Option<PathBuf>,
) -> Result<Connection, CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = env_file {
        env.load_from_file(path)?;
    }
    let profile = profile::load_profile(connection.as_deref(), &env)?;
    Ok(Connection::new(profile))
}
