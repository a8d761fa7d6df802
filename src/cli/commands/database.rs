use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_DSN: &str = "dsn";
pub const ARG_MAX_CONNECTIONS: &str = "db-max-connections";
pub const ARG_QUERY_TIMEOUT: &str = "query-timeout";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .long_help(
                    "Database connection string. Without it every login attempt is answered with a server configuration error.",
                )
                .env("DATABASE_URL")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_MAX_CONNECTIONS)
                .long("db-max-connections")
                .help("Maximum number of pooled database connections")
                .env("NIGHTVOLT_DB_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_QUERY_TIMEOUT)
                .long("query-timeout")
                .help("Seconds to wait for a database connection and query")
                .env("NIGHTVOLT_QUERY_TIMEOUT")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub dsn: Option<SecretString>,
    pub max_connections: u32,
    pub query_timeout: Duration,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let dsn = matches
            .get_one::<String>(ARG_DSN)
            .map(|dsn| dsn.trim())
            .filter(|dsn| !dsn.is_empty())
            .map(|dsn| SecretString::from(dsn.to_string()));

        let max_connections = matches
            .get_one::<u32>(ARG_MAX_CONNECTIONS)
            .copied()
            .context("missing required argument: --db-max-connections")?;

        let query_timeout = matches
            .get_one::<u64>(ARG_QUERY_TIMEOUT)
            .copied()
            .map(Duration::from_secs)
            .context("missing required argument: --query-timeout")?;

        Ok(Self {
            dsn,
            max_connections,
            query_timeout,
        })
    }
}
