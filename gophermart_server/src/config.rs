use std::{env, str::FromStr, time::Duration as StdDuration};

use chrono::Duration;
use gm_common::Secret;
use gophermart_engine::accrual::PollerConfig;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::cli::{Cli, DEFAULT_ACCRUAL_ADDRESS, DEFAULT_DATABASE_URI, DEFAULT_RUN_ADDRESS};

const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACCRUAL_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// `host:port` to bind to.
    pub run_address: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub accrual_address: String,
    pub accrual_timeout: StdDuration,
    pub auth: AuthConfig,
    pub poller: PollerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_address: DEFAULT_RUN_ADDRESS.to_string(),
            database_url: DEFAULT_DATABASE_URI.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            accrual_address: DEFAULT_ACCRUAL_ADDRESS.to_string(),
            accrual_timeout: DEFAULT_ACCRUAL_TIMEOUT,
            auth: AuthConfig::default(),
            poller: PollerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let run_address = env::var("RUN_ADDRESS").unwrap_or(defaults.run_address);
        let database_url = env::var("DATABASE_URI").unwrap_or(defaults.database_url);
        let accrual_address = env::var("ACCRUAL_SYSTEM_ADDRESS").unwrap_or(defaults.accrual_address);
        let db_max_connections = parse_env("GM_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let auth = AuthConfig::from_env_or_default();
        let poller = PollerConfig {
            workers: parse_env("GM_ACCRUAL_WORKERS", defaults.poller.workers),
            queue_capacity: parse_env("GM_ACCRUAL_QUEUE_SIZE", defaults.poller.queue_capacity),
            ..defaults.poller
        };
        Self { run_address, database_url, db_max_connections, accrual_address, auth, poller, ..defaults }
    }

    /// Command-line values win over anything read from the environment.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        self.run_address = cli.run_address.clone();
        self.database_url = cli.database_uri.clone();
        self.accrual_address = cli.accrual_address.clone();
        self
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(random_secret()), token_expiry: Duration::hours(DEFAULT_TOKEN_EXPIRY_HOURS) }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = match env::var("GM_JWT_SECRET") {
            Ok(s) if !s.is_empty() => Secret::new(s),
            _ => {
                warn!(
                    "🪛️ GM_JWT_SECRET is not set. A random secret will be used for this run, and all access tokens will \
                     become invalid when the server restarts."
                );
                Secret::new(random_secret())
            },
        };
        let hours = parse_env("GM_TOKEN_EXPIRY_HOURS", DEFAULT_TOKEN_EXPIRY_HOURS);
        let token_expiry = if hours > 0 {
            Duration::hours(hours)
        } else {
            error!("🪛️ GM_TOKEN_EXPIRY_HOURS must be positive. Using the default, {DEFAULT_TOKEN_EXPIRY_HOURS}h.");
            Duration::hours(DEFAULT_TOKEN_EXPIRY_HOURS)
        };
        Self { jwt_secret, token_expiry }
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect()
}

/// Reads `name` from the environment. Missing values use `default` quietly; unparseable ones use it loudly.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}
