use crate::{
    api,
    auth::{DecisionEngine, PgAccountStore, StoreConfig},
    cli::telemetry,
};
use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<SecretString>,
    pub db_max_connections: u32,
    pub query_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the connection string is malformed or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store = store_config(&args)?;

    let engine = Arc::new(DecisionEngine::new(store));

    let result = api::new(args.port, engine).await;

    telemetry::shutdown_tracer();

    result
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    let Some(dsn) = &args.dsn else {
        warn!("No database connection string configured, every login will fail");

        return Ok(StoreConfig::Missing);
    };

    let url = parse_dsn(dsn.expose_secret())?;

    info!(
        "Database: {}, max connections: {}, query timeout: {:?}",
        redact(&url),
        args.db_max_connections,
        args.query_timeout
    );

    let store = PgAccountStore::connect_lazy(
        dsn.expose_secret(),
        args.db_max_connections,
        args.query_timeout,
    )
    .context("Failed to configure database pool")?;

    Ok(StoreConfig::configured(store))
}

fn parse_dsn(dsn: &str) -> Result<Url> {
    // the DSN may carry a password, keep it out of the error
    let url = Url::parse(dsn).map_err(|e| anyhow!("Invalid database connection string: {e}"))?;

    match url.scheme() {
        "postgres" | "postgresql" => Ok(url),
        scheme => Err(anyhow!(
            "Unsupported database connection string scheme: {scheme}"
        )),
    }
}

fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    if redacted.password().is_some() {
        let _ = redacted.set_password(Some("****"));
    }
    redacted.to_string()
}
