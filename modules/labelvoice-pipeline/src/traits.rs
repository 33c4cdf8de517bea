// Trait seams for the two remote capabilities the pipeline depends on.
//
// Interpreter: image + prompt → generated text (Gemini in production).
// Synthesizer: summary text → audio clip (speech-client in production).
//
// Both report failures as values rather than errors so the orchestrator can
// record them per image and move on. `testing` provides in-memory doubles.

use async_trait::async_trait;

use labelvoice_common::{SpeakingRate, SynthesisResult};

pub use ai_client::{VisionRequest as InterpretationRequest, VisionResult as InterpretationResult};

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Interpreter: Send + Sync {
    /// One request, no retry.
    async fn interpret(&self, request: &InterpretationRequest) -> InterpretationResult;
}

#[async_trait]
impl Interpreter for ai_client::Gemini {
    async fn interpret(&self, request: &InterpretationRequest) -> InterpretationResult {
        self.describe_image(request).await
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, rate: SpeakingRate) -> SynthesisResult;
}
