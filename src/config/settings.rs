// Configuration structs
//
// Every section is optional in the TOML file; missing keys fall back to the
// defaults in `constants`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use super::constants::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub retry: RetrySettings,
    pub generation: GenerationSettings,
    pub database: DatabaseConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind_address: String,
    /// Deadline for one /ai/* request, covering every provider attempt
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; `"*"` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_HTTP_ADDR.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Provider names, most preferred first
    pub fallback_order: Vec<String>,
    /// Send a one-word test prompt to each provider at startup
    pub probe_on_startup: bool,
    pub gemini: ProviderSettings,
    pub grok: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            fallback_order: vec!["gemini".to_string(), "grok".to_string()],
            probe_on_startup: true,
            gemini: ProviderSettings::default(),
            grok: ProviderSettings::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn settings_for(&self, name: &str) -> Option<&ProviderSettings> {
        match name {
            "gemini" => Some(&self.gemini),
            "grok" => Some(&self.grok),
            _ => None,
        }
    }
}

/// Settings for one provider. Unset model/base_url use the provider's default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub enabled: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: None,
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            enabled: true,
        }
    }
}

impl ProviderSettings {
    /// Non-empty API key, if any.
    pub fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; `:memory:` for a throwaway database
    pub path: Option<PathBuf>,
    /// Insert demo users, instruments, lessons and songs at startup
    pub seed_on_startup: bool,
}

impl Config {
    /// Database location, defaulting to ~/.riffwise/riffwise.db.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME)
            .join(DATABASE_FILE_NAME)
    }

    pub fn validate(&self) -> Result<()> {
        let order = &self.providers.fallback_order;
        if order.is_empty() {
            bail!("providers.fallback_order must name at least one provider");
        }
        let mut seen = HashSet::new();
        for name in order {
            if self.providers.settings_for(name).is_none() {
                bail!(
                    "Unknown provider '{}' in providers.fallback_order (expected gemini or grok)",
                    name
                );
            }
            if !seen.insert(name.as_str()) {
                bail!("Provider '{}' appears twice in providers.fallback_order", name);
            }
        }

        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            bail!(
                "generation.temperature must be between 0 and 2, got {}",
                generation.temperature
            );
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            bail!("generation.top_p must be in (0, 1], got {}", generation.top_p);
        }
        if generation.max_tokens == 0 {
            bail!("generation.max_tokens must be positive");
        }

        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be positive");
        }
        for (name, settings) in [("gemini", &self.providers.gemini), ("grok", &self.providers.grok)] {
            if settings.timeout_secs == 0 {
                bail!("providers.{}.timeout_secs must be positive", name);
            }
        }

        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            bail!(
                "retry.max_retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT,
                self.retry.max_retries
            );
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            bail!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms,
                self.retry.max_delay_ms
            );
        }
        Ok(())
    }
}
