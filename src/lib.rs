// Riffwise - music practice studio backend
// Library exports

pub mod config;
pub mod errors;
pub mod generation;
pub mod providers;
pub mod server;
pub mod store;

pub use errors::{GenerationError, ProviderError};
pub use generation::{CanonicalResult, FallbackOrchestrator, GenerationRequest, GenerationTask};
