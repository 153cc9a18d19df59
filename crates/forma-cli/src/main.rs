//! `forma`: operaciones de esquema y reconocimiento desde la línea de comandos.
//!
//! Sin `--memory` se conecta a Postgres (`--database-url` o `DATABASE_URL`);
//! las migraciones del catálogo corren al construir el pool.

mod cli;
mod commands;
mod error;

use clap::Parser;
use forma_core::{InMemoryBackend, InMemoryEngine, InMemorySchemaStore, SchemaEngine};
use forma_persistence::{build_pool, init_dotenv, DbConfig, PgBackend, PgSchemaStore, PoolProvider};
use log::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::{evaluate_mask, execute, Output};
use crate::error::CliError;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stderr: stdout queda para la salida de los comandos.
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();
}

fn run(cli: Cli) -> Result<Output, CliError> {
    if let Command::EvaluateMask { target, mask } = &cli.command {
        return evaluate_mask(target, mask);
    }
    if cli.memory {
        debug!("forma:backend memory");
        let engine = InMemoryEngine::new(InMemorySchemaStore::new(), InMemoryBackend::new())?;
        return execute(&engine, cli.command);
    }
    let url = cli.database_url
                 .ok_or_else(|| CliError::Usage("either --database-url (or DATABASE_URL) or --memory is required".into()))?;
    let cfg = DbConfig::with_url(url);
    let pool = build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)?;
    let provider = PoolProvider { pool };
    let engine = SchemaEngine::new(PgSchemaStore::new(provider.clone()), PgBackend::new(provider))?;
    debug!("forma:backend postgres");
    execute(&engine, cli.command)
}

fn main() {
    init_dotenv();
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(Output::Json(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(e) => exit_with(CliError::from(e)),
        },
        Ok(Output::Text(text)) => print!("{text}"),
        Ok(Output::Written) => {}
        Err(err) => exit_with(err),
    }
}

fn exit_with(err: CliError) -> ! {
    let payload = err.payload();
    match serde_json::to_string(&payload) {
        Ok(text) => eprintln!("{text}"),
        Err(_) => eprintln!("{err}"),
    }
    std::process::exit(err.exit_code());
}
