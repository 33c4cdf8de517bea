use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::LabelError;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    /// Keyless translate-style endpoint.
    Translate,
    /// Google Cloud Text-to-Speech, needs `GOOGLE_TTS_API_KEY`.
    Cloud,
}

impl TtsProvider {
    pub fn default_language(self) -> &'static str {
        match self {
            TtsProvider::Translate => "zh-TW",
            TtsProvider::Cloud => "cmn-TW",
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Interpretation service
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: Option<String>,

    // Speech
    pub tts_provider: TtsProvider,
    pub google_tts_api_key: Option<String>,
    pub tts_language: String,
    pub tts_voice: Option<String>,

    // Reference data
    pub ingredients_path: Option<PathBuf>,

    pub http_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("tts_provider", &self.tts_provider)
            .field("tts_language", &self.tts_language)
            .field("tts_voice", &self.tts_voice)
            .field("ingredients_path", &self.ingredients_path)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing credentials are an error: nothing should be processed without them.
    pub fn from_env() -> Result<Self, LabelError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LabelError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                LabelError::Config(format!("{key} environment variable is required"))
            })
        };

        let tts_provider = match get("TTS_PROVIDER").as_deref().map(str::trim) {
            None | Some("translate") => TtsProvider::Translate,
            Some("cloud") => TtsProvider::Cloud,
            Some(other) => {
                return Err(LabelError::Config(format!(
                    "TTS_PROVIDER must be 'translate' or 'cloud', got '{other}'"
                )))
            }
        };

        let google_tts_api_key = match tts_provider {
            TtsProvider::Cloud => Some(required("GOOGLE_TTS_API_KEY")?),
            TtsProvider::Translate => get("GOOGLE_TTS_API_KEY"),
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                LabelError::Config(format!("HTTP_TIMEOUT_SECS must be a number, got '{raw}'"))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL"),
            tts_provider,
            google_tts_api_key,
            tts_language: get("TTS_LANGUAGE")
                .unwrap_or_else(|| tts_provider.default_language().to_string()),
            tts_voice: get("TTS_VOICE"),
            ingredients_path: get("INGREDIENTS_PATH").map(PathBuf::from),
            http_timeout: Duration::from_secs(http_timeout),
        })
    }

    /// Log the effective configuration without secret values.
    pub fn log_redacted(&self) {
        let tts_key = if self.google_tts_api_key.is_some() {
            "set"
        } else {
            "unset"
        };
        info!(
            gemini_model = %self.gemini_model,
            gemini_base_url = self.gemini_base_url.as_deref().unwrap_or("default"),
            gemini_api_key = "set",
            tts_provider = ?self.tts_provider,
            google_tts_api_key = tts_key,
            tts_language = %self.tts_language,
            tts_voice = self.tts_voice.as_deref().unwrap_or("default"),
            ingredients = ?self.ingredients_path,
            http_timeout_secs = self.http_timeout.as_secs(),
            "Configuration loaded"
        );
    }
}
