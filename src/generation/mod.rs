// Music generation pipeline
//
// request -> prompt -> provider text -> extracted object -> normalized,
// typed result. Providers are tried in fallback order by the orchestrator.

pub mod extract;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod task;
pub mod types;

pub use extract::extract;
pub use normalize::normalize;
pub use orchestrator::FallbackOrchestrator;
pub use task::{GenerationRequest, GenerationTask, Instrument, PracticeSessionSummary, SongQuery};
pub use types::CanonicalResult;

/// Prompt rendering entry point.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(request: &GenerationRequest) -> String {
        prompt::build(request)
    }
}
