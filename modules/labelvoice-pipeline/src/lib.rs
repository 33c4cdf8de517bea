pub mod annotate;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod session;
pub mod speech;
pub mod summary;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod upload;

pub use pipeline::Pipeline;
pub use session::BatchSession;
pub use speech::SpeechSynthesizer;
pub use traits::{InterpretationRequest, InterpretationResult, Interpreter, Synthesizer};
