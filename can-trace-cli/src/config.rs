//! Configuration loading and parsing

use anyhow::{Context, Result};
use can_trace_analyzer::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from a TOML file)
///
/// Every section is optional; command-line flags take precedence over the
/// values found here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalyzerConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SignalsConfig {
    /// DBC file used to decode the targeted identifier
    pub dbc: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// Load configuration from a TOML file
///
/// A relative DBC path is resolved against the directory of the config file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let (Some(dbc), Some(base)) = (config.signals.dbc.as_mut(), path.parent()) {
        if dbc.is_relative() {
            *dbc = base.join(&*dbc);
        }
    }

    anyhow::ensure!(
        config.analysis.bus_rate_mbps > 0.0,
        "Invalid bus rate in {:?}: {} Mbps",
        path,
        config.analysis.bus_rate_mbps
    );

    Ok(config)
}
