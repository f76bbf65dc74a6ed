// Fallback orchestration across providers
//
// Providers are tried strictly in registry order. A provider's attempt
// counts as failed on a call error, an unextractable response, or a
// response that fails normalization; the first success wins.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::extract::extract;
use super::normalize::normalize;
use super::prompt;
use super::task::GenerationRequest;
use super::types::CanonicalResult;
use crate::errors::{AttemptFailure, GenerationError};
use crate::providers::{CallOptions, GenerationProvider, ProviderRegistry};

pub struct FallbackOrchestrator {
    registry: Arc<ProviderRegistry>,
    options: CallOptions,
}

impl FallbackOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, options: CallOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Run one generation request through the fallback chain.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<CanonicalResult, GenerationError> {
        let task = request.task();
        let span = tracing::info_span!(
            "generate",
            request_id = %Uuid::new_v4(),
            task = %task,
        );

        async move {
            tracing::info!(subject = %request.subject(), "Generation started");
            let prompt = prompt::build(request);
            let mut failures = Vec::new();

            for (provider, available, reason) in self.registry.ordered() {
                let name = provider.name().to_string();
                if !available || !provider.is_configured() {
                    let reason = reason.unwrap_or("unavailable").to_string();
                    tracing::debug!(provider = %name, %reason, "Skipping provider");
                    failures.push(AttemptFailure {
                        provider: name,
                        reason,
                    });
                    continue;
                }

                match self.attempt(provider.as_ref(), request, &prompt).await {
                    Ok(result) => {
                        tracing::info!(provider = %name, "Generation succeeded");
                        return Ok(result);
                    }
                    Err(e) => {
                        tracing::warn!(provider = %name, error = %e, "Provider attempt failed, falling back");
                        failures.push(AttemptFailure {
                            provider: name,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            tracing::error!(
                failures = failures.len(),
                "All providers failed"
            );
            Err(GenerationError::AllProvidersUnavailable { task, failures })
        }
        .instrument(span)
        .await
    }

    async fn attempt(
        &self,
        provider: &dyn GenerationProvider,
        request: &GenerationRequest,
        prompt: &str,
    ) -> Result<CanonicalResult, GenerationError> {
        let raw = provider.call(prompt, &self.options).await?;
        let object = extract(&raw)?;
        Ok(normalize(request.task(), object)?)
    }
}
