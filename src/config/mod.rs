pub mod schema;

pub use schema::{
    AgentSettings, AppConfig, LlmSettings, McpServerSettings, SchemaSource, ServerSettings,
};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default interlink home directory (~/.interlink).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".interlink"))
        .unwrap_or_else(|| PathBuf::from(".interlink"))
}

/// Default config file path.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("interlink.toml")
}

/// Resolve a path that may contain `~`.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Load config from the given path (or defaults when it does not exist),
/// then apply environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        parse_config(&contents)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).context("Failed to parse interlink config (TOML)")
}

/// `OPENAI_API_KEY`, `OPENAI_DEFAULT_MODEL` and `OPENAI_BASE_URL` win over
/// the file. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(key) = var("OPENAI_API_KEY") {
        config.llm.api_key = key;
    }
    if let Some(model) = var("OPENAI_DEFAULT_MODEL") {
        config.llm.default_model = model;
    }
    if let Some(url) = var("OPENAI_BASE_URL") {
        config.llm.base_url = url;
    }
}
