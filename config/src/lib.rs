//! # Census Configuration
//!
//! Settings are layered, each source overriding the previous one:
//!
//! 1. the built-in `default-config.yaml`
//! 2. `config.yaml` in the config directory, or the file given with `--config`
//! 3. `CENSUS__<SECTION>__<KEY>` environment variables
//! 4. command line arguments ([`VolunteerArgs`], [`CollectorArgs`])

#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod duration;

pub use app_config::get_config_dir;
pub use args::{
    CollectorArgs,
    VolunteerArgs,
};
use eyre::{
    ensure,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use url::Url;

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");
const ENV_PREFIX: &str = "CENSUS";
const ENV_SEPARATOR: &str = "__";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub volunteer: VolunteerConfig,
    pub collector: CollectorConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerConfig {
    #[serde(default)]
    pub cluster_id: String,
    /// Zero means a single report.
    #[serde(with = "duration")]
    pub period: Duration,
    pub sink: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<PathBuf>,
    #[serde(with = "duration")]
    pub http_timeout: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_api: Option<Url>,
}

impl VolunteerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.cluster_id.trim().is_empty(), "volunteer.cluster_id must be set");
        ensure!(!self.sink.trim().is_empty(), "volunteer.sink must be set");
        ensure!(!self.http_timeout.is_zero(), "volunteer.http_timeout must be positive");
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub listen_address: SocketAddr,
    pub sink: String,
    pub max_body_bytes: usize,
    #[serde(with = "duration")]
    pub read_timeout: Duration,
}

impl CollectorConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.sink.trim().is_empty(), "collector.sink must be set");
        ensure!(self.max_body_bytes > 0, "collector.max_body_bytes must be positive");
        ensure!(!self.read_timeout.is_zero(), "collector.read_timeout must be positive");
        Ok(())
    }
}

impl Config {
    /// Load the layered configuration. `config_file`, when given, must exist.
    pub fn load<A>(config_file: Option<&Path>, args: A) -> Result<Self, config::ConfigError>
    where
        A: config::Source + Send + Sync + 'static,
    {
        Self::load_with_env(config_file, Self::environment(), args)
    }

    /// Just the built-in defaults.
    pub fn defaults() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    fn load_with_env<A>(
        config_file: Option<&Path>,
        env: config::Environment,
        args: A,
    ) -> Result<Self, config::ConfigError>
    where
        A: config::Source + Send + Sync + 'static,
    {
        let mut builder =
            config::Config::builder().add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        builder = match config_file {
            Some(path) => {
                debug!(?path, "loading configuration file");
                builder.add_source(config::File::from(path).format(config::FileFormat::Yaml).required(true))
            }
            None => {
                let path = get_config_dir().join("config.yaml");
                debug!(?path, "looking for optional configuration file");
                builder.add_source(config::File::from(path).format(config::FileFormat::Yaml).required(false))
            }
        };

        builder = builder.add_source(env).add_source(args);

        builder.build()?.try_deserialize()
    }
}

/// A source that contributes nothing, for callers without CLI overrides.
#[derive(Clone, Debug, Default)]
pub struct NoArgs;

impl config::Source for NoArgs {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        Ok(HashMap::new())
    }
}
