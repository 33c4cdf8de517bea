pub mod cloud;
pub mod error;
#[cfg(test)]
mod test_server;
pub mod translate;

pub use cloud::CloudTts;
pub use error::{Result, SpeechError};
pub use translate::{split_into_chunks, TranslateTts};

/// MIME type of every clip produced by this crate.
pub const MP3_MIME: &str = "audio/mpeg";

/// Text to narrate plus voice selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub language_code: String,
    pub voice_name: Option<String>,
    /// 1.0 is normal speed; lower is slower.
    pub speaking_rate: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language_code: language_code.into(),
            voice_name: None,
            speaking_rate: 1.0,
        }
    }

    pub fn voice(mut self, voice_name: Option<String>) -> Self {
        self.voice_name = voice_name;
        self
    }

    pub fn rate(mut self, speaking_rate: f32) -> Self {
        self.speaking_rate = speaking_rate;
        self
    }
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .map_err(|e| SpeechError::Config(format!("failed to build HTTP client: {e}")))
}
