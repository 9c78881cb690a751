//! Daemon settings: service URL and API key.
//!
//! The key is normally read straight out of the print server's own config
//! file, since the daemon runs on the same machine. Both values can be
//! overridden from the environment for development against a remote host.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_API_URL: &str = "http://127.0.0.1";
const DEFAULT_CONFIG_PATH: &str = "/home/pi/.octoprint/config.yaml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Deserialize)]
struct ServerConfig {
    api: ApiSection,
}

#[derive(Deserialize)]
struct ApiSection {
    key: String,
}

impl Settings {
    /// Resolve settings from the environment, falling back to the print
    /// server's config file for the API key.
    pub fn load() -> anyhow::Result<Self> {
        let api_url =
            env::var("OCTOPANEL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = match env::var("OCTOPANEL_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                let path = env::var("OCTOPRINT_CONFIG_PATH")
                    .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
                key_from_config(Path::new(&path))
                    .with_context(|| format!("reading api key from {path}"))?
            }
        };
        Ok(Self { api_url, api_key })
    }
}

fn key_from_config(path: &Path) -> anyhow::Result<String> {
    let raw = fs::read_to_string(path)?;
    let config: ServerConfig = serde_yaml::from_str(&raw)?;
    Ok(config.api.key)
}
