//! Layered configuration loading: defaults -> YAML file -> environment,
//! highest priority wins.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::error::ConfigError;

/// Implemented by every subsystem's config struct; called after `figment`
/// extraction, before the value is handed to application code.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

impl Validate for crate::domain::models::AgentConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        crate::domain::models::AgentConfig::validate(self)
    }
}
impl Validate for crate::domain::models::EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        crate::domain::models::EngineConfig::validate(self)
    }
}
impl Validate for crate::domain::models::RouterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        crate::domain::models::RouterConfig::validate(self)
    }
}

/// Loads and validates configuration for one subsystem.
///
/// Precedence (lowest to highest):
/// 1. Programmatic defaults (`T::default()`)
/// 2. `path` (a YAML file; absence is not an error)
/// 3. Environment variables prefixed `env_prefix` (double-underscore for
///    nesting, e.g. `SWARMGUARD_AGENT__THRESHOLDS__CPU_HI=85`)
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<T>(path: &str, env_prefix: &str) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default + Validate,
    {
        let config: T = Figment::new()
            .merge(Serialized::defaults(T::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(env_prefix).split("__"))
            .extract()
            .context("failed to extract configuration")?;

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("configuration invalid: {e}"))?;

        Ok(config)
    }
}
