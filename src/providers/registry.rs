// Provider registry
//
// Built once at startup: providers in fallback order, each marked available
// or not. Shared read-only behind an Arc afterwards.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use super::{GeminiProvider, GenerationProvider, GrokProvider, RetryPolicy};
use crate::config::Config;

struct RegisteredProvider {
    provider: Arc<dyn GenerationProvider>,
    available: bool,
    reason: Option<String>,
}

/// Health view of one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub model: String,
    pub available: bool,
    /// 1-based position in the fallback order
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub struct ProviderRegistry {
    entries: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    /// Build providers from config in fallback order, probing them if enabled.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let retry = RetryPolicy::from(&config.retry);
        let mut providers: Vec<Arc<dyn GenerationProvider>> = Vec::new();
        let mut disabled = Vec::new();

        for name in &config.providers.fallback_order {
            let Some(settings) = config.providers.settings_for(name) else {
                anyhow::bail!("Unknown provider '{}'", name);
            };
            if !settings.enabled {
                tracing::info!(provider = %name, "Provider disabled in config");
                disabled.push(name.clone());
                continue;
            }
            let provider: Arc<dyn GenerationProvider> = match name.as_str() {
                "gemini" => Arc::new(GeminiProvider::new(settings, retry)?),
                _ => Arc::new(GrokProvider::new(settings, retry)?),
            };
            providers.push(provider);
        }

        let registry = Self::build(providers, config.providers.probe_on_startup).await;
        if registry.available_count() == 0 {
            tracing::warn!(
                disabled = ?disabled,
                "No generation provider is available; /ai endpoints will return 503"
            );
        }
        Ok(registry)
    }

    /// Registry over ready-made providers, available iff configured. No probing.
    pub fn from_providers(providers: Vec<Arc<dyn GenerationProvider>>) -> Self {
        let entries = providers
            .into_iter()
            .map(|provider| {
                let available = provider.is_configured();
                RegisteredProvider {
                    reason: (!available).then(|| "not configured".to_string()),
                    provider,
                    available,
                }
            })
            .collect();
        Self { entries }
    }

    /// Registry over ready-made providers, probing each configured one.
    pub async fn probed(providers: Vec<Arc<dyn GenerationProvider>>) -> Self {
        Self::build(providers, true).await
    }

    async fn build(providers: Vec<Arc<dyn GenerationProvider>>, probe: bool) -> Self {
        let mut registry = Self::from_providers(providers);
        for entry in &mut registry.entries {
            let name = entry.provider.name().to_string();
            if !entry.available {
                tracing::warn!(provider = %name, "Provider not configured (missing API key)");
                continue;
            }
            if !probe {
                tracing::info!(provider = %name, model = entry.provider.model(), "Provider configured");
                continue;
            }
            match entry.provider.probe().await {
                Ok(()) => {
                    tracing::info!(provider = %name, model = entry.provider.model(), "Provider probe succeeded");
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "Provider probe failed, marking unavailable");
                    entry.available = false;
                    entry.reason = Some(e.to_string());
                }
            }
        }
        registry
    }

    /// All registered providers in fallback order, with availability.
    pub fn ordered(&self) -> impl Iterator<Item = (&Arc<dyn GenerationProvider>, bool, Option<&str>)> {
        self.entries
            .iter()
            .map(|e| (&e.provider, e.available, e.reason.as_deref()))
    }

    pub fn available_count(&self) -> usize {
        self.entries.iter().filter(|e| e.available).count()
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| ProviderStatus {
                name: e.provider.name().to_string(),
                model: e.provider.model().to_string(),
                available: e.available,
                rank: i + 1,
                reason: e.reason.clone(),
            })
            .collect()
    }
}
