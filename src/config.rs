// ⚙️ Settings - command-line flags with environment fallbacks
//
// Shared by the CLI and the API server (flattened into each binary's parser).

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// Log levels accepted by `--log-level` / LOG_LEVEL
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// SQLite database file
    #[arg(long = "db", env = "GROCERY_DB_PATH", default_value = "grocery.db", global = true)]
    pub database_path: PathBuf,

    /// Currency symbol used when printing prices
    #[arg(long = "currency", env = "CURRENCY_SYMBOL", default_value = "£", global = true)]
    pub currency_symbol: String,

    /// off | error | warn | info | debug | trace
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Bind address for the API server
    #[arg(long, env = "GROCERY_HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// Port for the API server
    #[arg(long, env = "GROCERY_PORT", default_value_t = 8000, global = true)]
    pub port: u16,

    #[arg(long, env = "ENVIRONMENT", value_enum, default_value = "development", global = true)]
    pub environment: Environment,
}

impl Settings {
    /// Reject settings no binary can run with
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            bail!("database path must not be empty");
        }

        if self.port == 0 {
            bail!("port must be between 1 and 65535");
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!(
                "unsupported log level `{}` (expected one of: {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Address the API server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Format a price with the configured currency symbol, 2 decimals
    pub fn format_price(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from("grocery.db"),
            currency_symbol: "£".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: Environment::Development,
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings(environment={:?}, db={:?}, bind={}, log_level={})",
            self.environment,
            self.database_path,
            self.bind_address(),
            self.log_level
        )
    }
}
