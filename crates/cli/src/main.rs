use crate::{commands::ConnectionArgs, error::CliError, shutdown::ShutdownCoordinator};
use clap::Parser;
use commands::Commands;
use connectors::{manager::ConnectionManager, source::mysql::MySqlSource, target::jsonl::JsonlStore};
use engine::{analyzer::SchemaAnalyzer, mapper, service::TransformationService};
use model::{
    config::{SourceConfig, TransformationConfig},
    schema::{source::SourceSchema, target::TargetSchema},
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "docshift",
    version = "0.1.0",
    about = "Relational-to-document migration tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            connection,
            target,
            batch_size,
            no_validate,
            no_preserve_ids,
            output,
        } => {
            let source_config = source_config(connection)?;
            let transformation_config = TransformationConfig {
                batch_size,
                validate_data: !no_validate,
                preserve_ids: !no_preserve_ids,
            };

            let store = JsonlStore::open(&target).await?;
            let service = TransformationService::new(ConnectionManager::new(Arc::new(store)));

            let shutdown = ShutdownCoordinator::new(CancellationToken::new());
            shutdown.register_handlers();

            let result = service
                .run(&source_config, &transformation_config, &shutdown.cancel_token())
                .await?;

            match output {
                Some(path) => output::write_report(&result, path).await?,
                None => output::print_report(&result)?,
            }
        }
        Commands::Schema { connection, output } => {
            let source_config = source_config(connection)?;
            let source = MySqlSource::connect(&source_config).await?;

            let schema = SchemaAnalyzer::new().analyze(&source).await?;
            let target = mapper::map_schema(&schema);
            let report = SchemaReport {
                source: schema,
                target,
            };

            match output {
                Some(path) => output::write_report(&report, path).await?,
                None => output::print_report(&report)?,
            }
        }
        Commands::TestConn { connection } => {
            let source_config = source_config(connection)?;
            MySqlSource::connect(&source_config).await?;
            info!(
                host = %source_config.host,
                database = %source_config.database,
                "connection OK"
            );
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct SchemaReport {
    source: SourceSchema,
    target: TargetSchema,
}

fn source_config(args: ConnectionArgs) -> Result<SourceConfig, CliError> {
    let password = match args.password {
        Some(password) => password,
        None => std::env::var("DB_PASSWORD").map_err(|_| CliError::MissingPassword)?,
    };

    Ok(SourceConfig {
        host: args.host,
        port: args.port,
        username: args.username,
        password,
        database: args.database,
    })
}
