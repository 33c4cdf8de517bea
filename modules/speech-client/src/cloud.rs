//! Google Cloud Text-to-Speech `text:synthesize`.

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{http_client, Result, SpeechError, SynthesisRequest};

const CLOUD_TTS_URL: &str = "https://texttospeech.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: Option<String>,
}

pub struct CloudTts {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CloudTts {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(SpeechError::Config("API key must not be empty".to_string()));
        }
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.to_string(),
            base_url: CLOUD_TTS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Synthesize `request.text` and return MP3 bytes.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        if request.text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let url = format!("{}/v1/text:synthesize", self.base_url);
        debug!(
            language = %request.language_code,
            rate = request.speaking_rate,
            "Cloud TTS request"
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&build_body(request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SynthesizeResponse = resp
            .json()
            .await
            .map_err(|e| SpeechError::Decode(e.to_string()))?;
        let encoded = body
            .audio_content
            .ok_or_else(|| SpeechError::Decode("response has no audioContent".to_string()))?;

        Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
    }
}

fn build_body(request: &SynthesisRequest) -> Value {
    let mut voice = json!({ "languageCode": request.language_code });
    if let Some(ref name) = request.voice_name {
        voice["name"] = json!(name);
    }

    json!({
        "input": { "text": request.text },
        "voice": voice,
        "audioConfig": {
            "audioEncoding": "MP3",
            "speakingRate": request.speaking_rate.clamp(0.25, 4.0),
        },
    })
}
