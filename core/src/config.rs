//! Configuration loading
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. A config file: the explicit path (builder or `WEFT_CONFIG_PATH`),
//!    otherwise an optional `weft.toml` in the working directory
//! 3. `WEFT_*` environment variables (`WEFT_FAIL_FAST=true`, ...)
//! 4. Explicit builder overrides (command-line flags)
//!
//! A `.env` file is loaded into the environment first.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::ParseMode;

const ENV_PREFIX: &str = "WEFT";
const CONFIG_PATH_VAR: &str = "WEFT_CONFIG_PATH";
const DEFAULT_FILE: &str = "weft";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Stop parsing at the first syntax error
    #[serde(default)]
    pub fail_fast: bool,

    /// Run the validator rules after resolution
    #[serde(default = "default_true")]
    pub lints: bool,

    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_fast: false,
            lints: true,
            log_level: default_log_level(),
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load from the default locations
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn parse_mode(&self) -> ParseMode {
        if self.fail_fast {
            ParseMode::FailFast
        } else {
            ParseMode::CollectAll
        }
    }

    /// The effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    fail_fast: Option<bool>,
    pretty: Option<bool>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn fail_fast(mut self, fail_fast: Option<bool>) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn pretty(mut self, pretty: Option<bool>) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn build(self) -> Result<Config> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("fail_fast", defaults.fail_fast)?
            .set_default("lints", defaults.lints)?
            .set_default("log_level", defaults.log_level)?
            .set_default("pretty", defaults.pretty)?;

        let path = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));
        builder = match &path {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_FILE).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        if let Some(fail_fast) = self.fail_fast {
            builder = builder.set_override("fail_fast", fail_fast)?;
        }
        if let Some(pretty) = self.pretty {
            builder = builder.set_override("pretty", pretty)?;
        }

        let settings = builder.build().with_context(|| match &path {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration".to_string(),
        })?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
