use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::PipelineError;

// =============================================================================
// Upload
// =============================================================================

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Declared MIME types accepted from the upload layer.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// One image as handed over by the upload layer, in upload order.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub name: String,
    pub bytes: Vec<u8>,
    pub declared_size: usize,
    pub mime_type: String,
    /// Set when the bytes could not be read; the image fails without decoding.
    pub read_error: Option<String>,
}

impl UploadedImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_size: bytes.len(),
            bytes,
            mime_type: mime_type.into(),
            read_error: None,
        }
    }

    /// An upload whose contents could not be read.
    pub fn unreadable(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            read_error: Some(cause.into()),
            ..Self::new(name, Vec::new(), mime_type)
        }
    }

    pub fn with_declared_size(mut self, declared_size: usize) -> Self {
        self.declared_size = declared_size;
        self
    }

    /// The larger of the declared size and the actual byte count.
    pub fn size(&self) -> usize {
        self.declared_size.max(self.bytes.len())
    }

    pub fn has_accepted_type(&self) -> bool {
        let mime = self.mime_type.to_ascii_lowercase();
        ACCEPTED_MIME_TYPES.contains(&mime.as_str())
    }
}

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingRate {
    #[default]
    Normal,
    Slow,
}

impl SpeakingRate {
    /// Multiplier passed to the synthesizer (1.0 is normal speed).
    pub fn factor(self) -> f32 {
        match self {
            SpeakingRate::Normal => 1.0,
            SpeakingRate::Slow => 0.75,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeakingRate::Normal => "normal",
            SpeakingRate::Slow => "slow",
        }
    }
}

impl FromStr for SpeakingRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(SpeakingRate::Normal),
            "slow" => Ok(SpeakingRate::Slow),
            other => Err(format!("unknown speaking rate '{other}' (expected normal or slow)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Normal,
    #[default]
    Large,
    ExtraLarge,
}

impl FontSize {
    pub fn css_px(self) -> u32 {
        match self {
            FontSize::Normal => 18,
            FontSize::Large => 24,
            FontSize::ExtraLarge => 32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontSize::Normal => "normal",
            FontSize::Large => "large",
            FontSize::ExtraLarge => "extra-large",
        }
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FontSize::Normal),
            "large" => Ok(FontSize::Large),
            "extra-large" | "xl" => Ok(FontSize::ExtraLarge),
            other => Err(format!(
                "unknown font size '{other}' (expected normal, large or extra-large)"
            )),
        }
    }
}

/// Which paragraph of the model output is narrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPolicy {
    /// The paragraph introduced by the summary keyword.
    #[default]
    KeywordSection,
    /// The last non-blank paragraph, regardless of keyword.
    LastParagraph,
}

impl SummaryPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryPolicy::KeywordSection => "keyword",
            SummaryPolicy::LastParagraph => "last-paragraph",
        }
    }
}

impl FromStr for SummaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "keyword-section" => Ok(SummaryPolicy::KeywordSection),
            "last-paragraph" | "last" => Ok(SummaryPolicy::LastParagraph),
            other => Err(format!(
                "unknown summary policy '{other}' (expected keyword or last-paragraph)"
            )),
        }
    }
}

/// Rendering and processing switches for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Process every uploaded image; when false only the first one.
    pub multi_image: bool,
    pub highlight_ingredients: bool,
    pub font_size: FontSize,
    pub speaking_rate: SpeakingRate,
    pub summary_policy: SummaryPolicy,
    /// Deadline applied to each image independently.
    pub per_image_timeout: Option<Duration>,
    /// Also produce one standalone card page per outcome.
    pub export_cards: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            multi_image: true,
            highlight_ingredients: true,
            font_size: FontSize::default(),
            speaking_rate: SpeakingRate::default(),
            summary_policy: SummaryPolicy::default(),
            per_image_timeout: None,
            export_cards: false,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SynthesisResult {
    Audio {
        #[serde(skip)]
        bytes: Vec<u8>,
        mime_type: String,
    },
    SynthesisFailure { cause: String },
}

/// A matched ingredient with its reference usage/risk, copied from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientAnnotation {
    pub name: String,
    pub usage: String,
    pub risk: String,
}

/// Byte range of one ingredient-name occurrence in `display_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    /// Index into `PipelineOutcome::annotations`.
    pub annotation: usize,
}

/// Everything derived from one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub index: usize,
    pub image_name: String,
    pub display_text: String,
    pub summary_text: String,
    pub annotations: Vec<IngredientAnnotation>,
    pub highlights: Vec<HighlightSpan>,
    pub audio: Option<SynthesisResult>,
    pub error: Option<PipelineError>,
}

impl PipelineOutcome {
    pub fn new(index: usize, image_name: impl Into<String>) -> Self {
        Self {
            index,
            image_name: image_name.into(),
            display_text: String::new(),
            summary_text: String::new(),
            annotations: Vec::new(),
            highlights: Vec::new(),
            audio: None,
            error: None,
        }
    }

    pub fn fail(mut self, error: PipelineError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True once interpretation succeeded, even if narration later failed.
    pub fn has_text(&self) -> bool {
        !self.display_text.is_empty()
    }

    pub fn audio_bytes(&self) -> Option<&[u8]> {
        match self.audio {
            Some(SynthesisResult::Audio { ref bytes, .. }) => Some(bytes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_uses_larger_of_declared_and_actual() {
        let image = UploadedImage::new("a.jpg", vec![0; 10], "image/jpeg");
        assert_eq!(image.size(), 10);
        assert_eq!(image.clone().with_declared_size(MAX_UPLOAD_BYTES + 1).size(), MAX_UPLOAD_BYTES + 1);
        assert_eq!(image.with_declared_size(2).size(), 10);
    }

    #[test]
    fn accepted_types_are_case_insensitive() {
        assert!(UploadedImage::new("a", vec![], "IMAGE/PNG").has_accepted_type());
        assert!(UploadedImage::new("a", vec![], "image/jpg").has_accepted_type());
        assert!(!UploadedImage::new("a", vec![], "image/gif").has_accepted_type());
    }

    #[test]
    fn option_enums_parse_and_display() {
        assert_eq!("slow".parse::<SpeakingRate>(), Ok(SpeakingRate::Slow));
        assert_eq!("XL".parse::<FontSize>(), Ok(FontSize::ExtraLarge));
        assert_eq!(FontSize::ExtraLarge.as_str(), "extra-large");
        assert_eq!("last".parse::<SummaryPolicy>(), Ok(SummaryPolicy::LastParagraph));
        assert_eq!(SummaryPolicy::KeywordSection.as_str(), "keyword");
        assert!("fast".parse::<SpeakingRate>().is_err());
    }

    #[test]
    fn slow_rate_is_slower() {
        assert!(SpeakingRate::Slow.factor() < SpeakingRate::Normal.factor());
    }

    #[test]
    fn audio_bytes_only_for_audio() {
        let mut outcome = PipelineOutcome::new(0, "a.jpg");
        assert!(outcome.audio_bytes().is_none());

        outcome.audio = Some(SynthesisResult::Audio {
            bytes: vec![1, 2],
            mime_type: "audio/mpeg".into(),
        });
        assert_eq!(outcome.audio_bytes(), Some(&[1u8, 2][..]));

        outcome.audio = Some(SynthesisResult::SynthesisFailure {
            cause: "quota".into(),
        });
        assert!(outcome.audio_bytes().is_none());
    }

    #[test]
    fn audio_bytes_are_not_serialized() {
        let result = SynthesisResult::Audio {
            bytes: vec![9; 4],
            mime_type: "audio/mpeg".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "audio");
        assert!(value.get("bytes").is_none());
    }
}
