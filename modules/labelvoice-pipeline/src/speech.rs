//! Config-selected text-to-speech backend.

use async_trait::async_trait;
use speech_client::{CloudTts, SynthesisRequest, TranslateTts, MP3_MIME};
use tracing::{debug, warn};

use labelvoice_common::{Config, LabelError, SpeakingRate, SynthesisResult, TtsProvider};

use crate::traits::Synthesizer;

enum Backend {
    Cloud(CloudTts),
    Translate(TranslateTts),
}

pub struct SpeechSynthesizer {
    backend: Backend,
    language_code: String,
    voice_name: Option<String>,
}

impl SpeechSynthesizer {
    pub fn from_config(config: &Config) -> Result<Self, LabelError> {
        let backend = match config.tts_provider {
            TtsProvider::Cloud => {
                let key = config.google_tts_api_key.as_deref().ok_or_else(|| {
                    LabelError::Config("GOOGLE_TTS_API_KEY is required for cloud TTS".to_string())
                })?;
                Backend::Cloud(
                    CloudTts::new(key, config.http_timeout)
                        .map_err(|e| LabelError::Config(e.to_string()))?,
                )
            }
            TtsProvider::Translate => Backend::Translate(
                TranslateTts::new(config.http_timeout)
                    .map_err(|e| LabelError::Config(e.to_string()))?,
            ),
        };

        Ok(Self {
            backend,
            language_code: config.tts_language.clone(),
            voice_name: config.tts_voice.clone(),
        })
    }

    fn request(&self, text: &str, rate: SpeakingRate) -> SynthesisRequest {
        SynthesisRequest::new(text, self.language_code.as_str())
            .voice(self.voice_name.clone())
            .rate(rate.factor())
    }
}

#[async_trait]
impl Synthesizer for SpeechSynthesizer {
    async fn synthesize(&self, text: &str, rate: SpeakingRate) -> SynthesisResult {
        let request = self.request(text, rate);
        let result = match &self.backend {
            Backend::Cloud(tts) => tts.synthesize(&request).await,
            Backend::Translate(tts) => tts.synthesize(&request).await,
        };

        match result {
            Ok(bytes) if !bytes.is_empty() => {
                debug!(bytes = bytes.len(), rate = rate.as_str(), "Synthesized summary");
                SynthesisResult::Audio {
                    bytes,
                    mime_type: MP3_MIME.to_string(),
                }
            }
            Ok(_) => SynthesisResult::SynthesisFailure {
                cause: "synthesizer returned no audio".to_string(),
            },
            Err(e) => {
                warn!(error = %e, "Speech synthesis failed");
                SynthesisResult::SynthesisFailure {
                    cause: e.to_string(),
                }
            }
        }
    }
}
