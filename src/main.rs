use crate::config::Config;
use crate::mail::{Mailer, NoMailer, Notify};
use crate::store::Store;
use clap::Parser;
use eyre::WrapErr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod mail;
mod model;
mod ops;
mod store;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Use FILE instead of rbridge.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
    /// Set verbosity level
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let level = match args.verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("rbridge={level}")))
        .init();
    let config = match &args.config {
        Some(file) => Config::load(file)?,
        None => Config::load_or_default("rbridge.toml")?,
    };
    let store = Store::open(&config.database.url)
        .await
        .wrap_err("cannot open database")?;
    let notify: Arc<dyn Notify> = if config.mail.enabled {
        Arc::new(Mailer::new(&config.mail)?)
    } else {
        Arc::new(NoMailer)
    };
    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .wrap_err("cannot bind listen address")?;
    info!(listen = %config.server.listen, "serving");
    axum::serve(listener, api::router(store, notify))
        .await
        .wrap_err("server error")?;
    Ok(())
}
