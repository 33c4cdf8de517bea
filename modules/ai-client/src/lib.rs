pub mod error;
pub mod gemini;
#[cfg(test)]
mod test_server;
pub mod util;

pub use error::AiError;
pub use gemini::{classify_response, Gemini, VisionRequest, VisionResult};
pub use util::truncate_to_char_boundary;
