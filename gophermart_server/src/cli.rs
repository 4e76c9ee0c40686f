use clap::Parser;

pub const DEFAULT_RUN_ADDRESS: &str = "localhost:8080";
pub const DEFAULT_DATABASE_URI: &str = "sqlite://data/gophermart.db";
pub const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8081";

/// Gophermart loyalty server.
///
/// Every flag can also be set with the environment variable shown. Flags take precedence. Further settings are read
/// from `GM_*` environment variables only (see [`crate::config`]).
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Address and port to listen on
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS", default_value = DEFAULT_RUN_ADDRESS)]
    pub run_address: String,
    /// Database URL
    #[arg(short = 'd', long = "database", env = "DATABASE_URI", default_value = DEFAULT_DATABASE_URI)]
    pub database_uri: String,
    /// Base URL of the accrual service
    #[arg(short = 'r', long = "accrual", env = "ACCRUAL_SYSTEM_ADDRESS", default_value = DEFAULT_ACCRUAL_ADDRESS)]
    pub accrual_address: String,
    /// Default log filter, used when RUST_LOG is not set
    #[arg(short = 'l', long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
