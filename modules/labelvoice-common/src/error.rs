use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Setup-level failures. These abort a run before any image is processed.
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingredient table error: {0}")]
    IngredientTable(String),
}

/// Per-image failures. Recorded into that image's outcome; never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineError {
    #[error("image is {size} bytes, limit is {limit}")]
    SizeExceeded { size: usize, limit: usize },

    #[error("unsupported image type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("could not decode image: {cause}")]
    DecodeError { cause: String },

    #[error("interpretation request failed: {cause}")]
    TransportError { cause: String },

    #[error("interpretation service returned status {status}")]
    ApiError { status: u16, body: Value },

    #[error("interpretation service returned no text")]
    EmptyResponse { body: Value },

    #[error("speech synthesis failed: {cause}")]
    SynthesisFailure { cause: String },

    #[error("processing exceeded {seconds}s")]
    TimedOut { seconds: u64 },
}

impl PipelineError {
    /// Short explanation for the end user (Traditional Chinese).
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::SizeExceeded { .. } => "檔案太大了，請上傳 5MB 以下的圖片。".to_string(),
            PipelineError::UnsupportedType { .. } => {
                "不支援的檔案格式，請上傳 JPG 或 PNG 圖片。".to_string()
            }
            PipelineError::DecodeError { cause } => format!("圖片處理失敗：{cause}"),
            PipelineError::TransportError { .. } => {
                "無法連線到解讀服務，請檢查網路後再試一次。".to_string()
            }
            PipelineError::ApiError { status, .. } => format!("請求錯誤（{status}）"),
            PipelineError::EmptyResponse { .. } => "成功回傳但沒有可用的說明文字。".to_string(),
            PipelineError::SynthesisFailure { .. } => {
                "語音產生失敗，請直接閱讀文字說明。".to_string()
            }
            PipelineError::TimedOut { .. } => "處理時間過長，請稍後再試。".to_string(),
        }
    }

    /// Raw service payload, for troubleshooting display.
    pub fn diagnostic(&self) -> Option<&Value> {
        match self {
            PipelineError::ApiError { body, .. } | PipelineError::EmptyResponse { body } => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SizeExceeded { .. } => "size_exceeded",
            PipelineError::UnsupportedType { .. } => "unsupported_type",
            PipelineError::DecodeError { .. } => "decode_error",
            PipelineError::TransportError { .. } => "transport_error",
            PipelineError::ApiError { .. } => "api_error",
            PipelineError::EmptyResponse { .. } => "empty_response",
            PipelineError::SynthesisFailure { .. } => "synthesis_failure",
            PipelineError::TimedOut { .. } => "timed_out",
        }
    }
}
