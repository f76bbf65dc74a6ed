// Error taxonomy for the generation pipeline
//
// Provider clients surface only `ProviderError`; extraction and validation have
// their own enums; `GenerationError` is what the orchestrator hands back.

use std::fmt;

use thiserror::Error;

use crate::generation::GenerationTask;

/// Failure of a single provider client call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials are missing; no network I/O was attempted.
    #[error("{provider} is not configured (missing API key)")]
    NotConfigured { provider: String },

    /// Transport or HTTP failure after the retry budget was exhausted.
    #[error("{provider} unavailable after {attempts} attempt(s): {reason}")]
    ProviderUnavailable {
        provider: String,
        attempts: u32,
        reason: String,
    },
}

/// Failure to locate a JSON object inside raw provider text.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("no JSON object found in provider response")]
    NoJsonFound,

    #[error("malformed JSON in provider response: {0}")]
    MalformedJson(String),

    #[error("provider returned an empty JSON array")]
    EmptyList,
}

/// Extracted JSON does not satisfy the canonical schema for the task.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{task} response is missing required field(s): {}", .fields.join(", "))]
    MissingFields {
        task: GenerationTask,
        fields: Vec<String>,
    },

    #[error("{task} response has an invalid shape: {reason}")]
    InvalidShape {
        task: GenerationTask,
        reason: String,
    },
}

/// One provider's failed attempt, kept for the aggregate error.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub provider: String,
    pub reason: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every provider in the fallback order failed or was unavailable.
    #[error("AI service unavailable for {task}: all providers failed")]
    AllProvidersUnavailable {
        task: GenerationTask,
        failures: Vec<AttemptFailure>,
    },
}

impl GenerationError {
    /// Per-provider failures carried by an aggregate error (empty otherwise).
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            Self::AllProvidersUnavailable { failures, .. } => failures,
            _ => &[],
        }
    }
}
