//! Optimizer configuration.
//!
//! The config is loaded once at startup, validated, and then passed by
//! reference into the store and rewrite clients. Secrets may live in the
//! environment instead of the file.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `lopt.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_REWRITE_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub const ENV_STORE_KEY: &str = "LOPT_STORE_KEY";
pub const ENV_STORE_SECRET: &str = "LOPT_STORE_SECRET";
pub const ENV_REWRITE_API_KEY: &str = "LOPT_REWRITE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub schema_version: u32,
    pub store: StoreConfig,
    pub rewrite: RewriteConfig,
    #[serde(default)]
    pub state: StateConfig,
}

/// Store REST API location and credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub base_url: String,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
}

/// Generative service endpoint, key, and model allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
}

/// Locations of the persisted ledgers and error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default = "default_pages_file")]
    pub pages_file: PathBuf,
    #[serde(default = "default_products_file")]
    pub products_file: PathBuf,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            pages_file: default_pages_file(),
            products_file: default_products_file(),
            log_file: default_log_file(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_REWRITE_ENDPOINT.to_string()
}

fn default_models() -> Vec<String> {
    vec![DEFAULT_MODEL.to_string()]
}

fn default_pages_file() -> PathBuf {
    PathBuf::from("pages.json")
}

fn default_products_file() -> PathBuf {
    PathBuf::from("products.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs.json")
}

/// Resolved on-disk locations for persisted state.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub pages: PathBuf,
    pub products: PathBuf,
    pub log: PathBuf,
}

impl AppConfig {
    /// Resolve state file paths against the directory holding the config.
    pub fn state_paths(&self, config_dir: &Path) -> StatePaths {
        StatePaths {
            pages: resolve_against(config_dir, &self.state.pages_file),
            products: resolve_against(config_dir, &self.state.products_file),
            log: resolve_against(config_dir, &self.state.log_file),
        }
    }

    /// Pick the requested model, or the first allow-listed one.
    pub fn select_model(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            None => self
                .rewrite
                .models
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("rewrite.models is empty")),
            Some(model) if self.rewrite.models.iter().any(|m| m == model) => {
                Ok(model.to_string())
            }
            Some(model) => Err(anyhow!(
                "model {model:?} is not in rewrite.models ({})",
                self.rewrite.models.join(", ")
            )),
        }
    }
}

/// Directory that relative state paths resolve against.
pub fn config_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Build the config written by `lopt init`.
pub fn default_config() -> AppConfig {
    AppConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        store: StoreConfig {
            base_url: "https://mystore.example".to_string(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
        },
        rewrite: RewriteConfig {
            api_key: String::new(),
            endpoint: default_endpoint(),
            models: default_models(),
        },
        state: StateConfig::default(),
    }
}

/// Render a pretty JSON config stub for new installs.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Load, apply environment overrides, and validate the config at `path`.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let config = read_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse the config and apply environment overrides without requiring
/// credentials. Used by commands that only touch local state.
pub fn read_config(path: &Path) -> Result<AppConfig> {
    let bytes = fs::read(path).with_context(|| {
        format!(
            "read config {} (run `lopt init` to create one)",
            path.display()
        )
    })?;
    let mut config: AppConfig = serde_json::from_slice(&bytes).context("parse config JSON")?;
    apply_env_overrides(&mut config, |name| env::var(name).ok());
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    Ok(config)
}

/// Write a config stub, refusing to clobber an existing file unless forced.
pub fn write_config_stub(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "config already exists at {} (pass --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let text = config_stub()?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Non-empty environment values take precedence over file values.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    if let Some(key) = read(ENV_STORE_KEY) {
        config.store.consumer_key = key;
    }
    if let Some(secret) = read(ENV_STORE_SECRET) {
        config.store.consumer_secret = secret;
    }
    if let Some(api_key) = read(ENV_REWRITE_API_KEY) {
        config.rewrite.api_key = api_key;
    }
}

/// Validate schema version, URLs, credentials, and the model allow-list.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    validate_url(&config.store.base_url, "store.base_url")?;
    validate_url(&config.rewrite.endpoint, "rewrite.endpoint")?;
    require_non_empty(
        &config.store.consumer_key,
        &format!("store.consumer_key (or {ENV_STORE_KEY})"),
    )?;
    require_non_empty(
        &config.store.consumer_secret,
        &format!("store.consumer_secret (or {ENV_STORE_SECRET})"),
    )?;
    require_non_empty(
        &config.rewrite.api_key,
        &format!("rewrite.api_key (or {ENV_REWRITE_API_KEY})"),
    )?;
    if config.rewrite.models.is_empty() {
        return Err(anyhow!("rewrite.models must list at least one model"));
    }
    if config.rewrite.models.iter().any(|m| m.trim().is_empty()) {
        return Err(anyhow!("rewrite.models entries must be non-empty"));
    }
    Ok(())
}

fn validate_url(url: &str, label: &str) -> Result<()> {
    require_non_empty(url, label)?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!("{label} must start with http:// or https:// (got {url:?})"));
    }
    Ok(())
}

fn require_non_empty(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
