//! Configuration loading.
//!
//! `catalogdb` is configured via an optional TOML file (default:
//! `catalogdb.toml`). Every field has a built-in default, so a missing file
//! is not an error — this CLI has nothing to persist (`crates/core` has no
//! durability layer), only defaults to apply when a flag is omitted.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_metric")]
    pub default_metric: String,
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_variant")]
    pub default_index_variant: String,
    #[serde(default = "default_over_fetch_factor")]
    #[allow(dead_code)]
    pub over_fetch_factor: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_metric: default_metric(),
            default_k: default_k(),
            default_index_variant: default_variant(),
            over_fetch_factor: default_over_fetch_factor(),
        }
    }
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_k() -> usize {
    10
}

fn default_variant() -> String {
    "brute_force".to_string()
}

fn default_over_fetch_factor() -> usize {
    3
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content).with_context(|| "failed to parse config file")?;

    if !["cosine", "euclidean", "dot_product"].contains(&config.default_metric.as_str()) {
        anyhow::bail!("default_metric must be cosine, euclidean, or dot_product");
    }
    if config.default_k == 0 {
        anyhow::bail!("default_k must be > 0");
    }

    Ok(config)
}
