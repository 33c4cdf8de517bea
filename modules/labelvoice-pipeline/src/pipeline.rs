//! Per-image pipeline and sequential batch orchestration.
//!
//! normalize → interpret → extract summary → annotate → synthesize.
//! Every failure is captured into that image's [`PipelineOutcome`]; nothing
//! an individual image does can stop the rest of the batch.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, info_span, warn, Instrument};

use labelvoice_common::{
    IngredientTable, PipelineError, PipelineOptions, PipelineOutcome, SynthesisResult,
    UploadedImage,
};

use crate::annotate::annotate;
use crate::normalize::{normalize, JPEG_MIME};
use crate::prompt::{build_prompt, PROMPT_VERSION};
use crate::summary::extract_summary;
use crate::traits::{InterpretationRequest, InterpretationResult, Interpreter, Synthesizer};

pub struct Pipeline {
    interpreter: Arc<dyn Interpreter>,
    synthesizer: Arc<dyn Synthesizer>,
    ingredients: Arc<IngredientTable>,
    prompt: String,
}

impl Pipeline {
    pub fn new(
        interpreter: Arc<dyn Interpreter>,
        synthesizer: Arc<dyn Synthesizer>,
        ingredients: Arc<IngredientTable>,
    ) -> Self {
        Self {
            interpreter,
            synthesizer,
            ingredients,
            prompt: build_prompt(),
        }
    }

    /// Process images one after another; outcomes are in input order.
    ///
    /// When `options.multi_image` is false only the first image is processed.
    pub async fn run_batch(
        &self,
        images: &[UploadedImage],
        options: &PipelineOptions,
    ) -> Vec<PipelineOutcome> {
        let selected = select_images(images, options.multi_image);
        let mut outcomes = Vec::with_capacity(selected.len());

        for (index, image) in selected.iter().enumerate() {
            let span = info_span!("label", index, name = %image.name);
            let outcome = self.process(index, image, options).instrument(span).await;
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            total = outcomes.len(),
            failed,
            prompt_version = PROMPT_VERSION,
            "Batch complete"
        );
        outcomes
    }

    /// Run one image through every stage, applying the per-image deadline if set.
    pub async fn process(
        &self,
        index: usize,
        image: &UploadedImage,
        options: &PipelineOptions,
    ) -> PipelineOutcome {
        let Some(limit) = options.per_image_timeout else {
            return self.process_stages(index, image, options).await;
        };

        match tokio::time::timeout(limit, self.process_stages(index, image, options)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(seconds = limit.as_secs(), "Image processing timed out");
                PipelineOutcome::new(index, &image.name).fail(PipelineError::TimedOut {
                    seconds: limit.as_secs(),
                })
            }
        }
    }

    async fn process_stages(
        &self,
        index: usize,
        image: &UploadedImage,
        options: &PipelineOptions,
    ) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::new(index, &image.name);

        // The normalized pixels are dropped as soon as the request is built.
        let request = match normalize(image) {
            Ok(normalized) => {
                info!(
                    width = normalized.width(),
                    height = normalized.height(),
                    jpeg_bytes = normalized.jpeg().len(),
                    prompt_version = PROMPT_VERSION,
                    "Image normalized, requesting interpretation"
                );
                InterpretationRequest::new(self.prompt.as_str(), normalized.jpeg(), JPEG_MIME)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Image rejected");
                return outcome.fail(e);
            }
        };

        let raw_text = match interpretation_text(self.interpreter.interpret(&request).await) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Interpretation failed");
                return outcome.fail(e);
            }
        };

        outcome.display_text = raw_text.trim().to_string();
        outcome.summary_text = extract_summary(&raw_text, options.summary_policy);

        if options.highlight_ingredients {
            let annotations = annotate(&outcome.display_text, &self.ingredients);
            outcome.annotations = annotations.entries;
            outcome.highlights = annotations.highlights;
        }

        info!(
            display_chars = outcome.display_text.chars().count(),
            summary_chars = outcome.summary_text.chars().count(),
            ingredients = outcome.annotations.len(),
            "Interpretation processed"
        );

        let audio = self
            .synthesizer
            .synthesize(&outcome.summary_text, options.speaking_rate)
            .await;
        if let SynthesisResult::SynthesisFailure { ref cause } = audio {
            outcome.error = Some(PipelineError::SynthesisFailure {
                cause: cause.clone(),
            });
        }
        outcome.audio = Some(audio);

        outcome
    }
}

/// Map an interpretation result onto the pipeline's error kinds.
///
/// A 200 without usable text is `EmptyResponse`; any other status is `ApiError`.
pub fn interpretation_text(result: InterpretationResult) -> Result<String, PipelineError> {
    match result {
        InterpretationResult::Success(text) if !text.trim().is_empty() => Ok(text),
        InterpretationResult::Success(text) => Err(PipelineError::EmptyResponse {
            body: json!({ "raw_text": text }),
        }),
        InterpretationResult::ApiError { status: 200, body } => {
            Err(PipelineError::EmptyResponse { body })
        }
        InterpretationResult::ApiError { status, body } => {
            Err(PipelineError::ApiError { status, body })
        }
        InterpretationResult::TransportError(cause) => Err(PipelineError::TransportError { cause }),
    }
}

fn select_images(images: &[UploadedImage], multi_image: bool) -> &[UploadedImage] {
    if !multi_image && images.len() > 1 {
        warn!(
            uploaded = images.len(),
            "Multi-image mode is off; processing only the first image"
        );
        return &images[..1];
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_text_passes_through() {
        let text = interpretation_text(InterpretationResult::Success("食品".into())).unwrap();
        assert_eq!(text, "食品");
    }

    #[test]
    fn blank_success_is_empty_response() {
        assert!(matches!(
            interpretation_text(InterpretationResult::Success("  ".into())),
            Err(PipelineError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn status_200_without_text_is_empty_response() {
        let body = json!({ "candidates": [] });
        assert_eq!(
            interpretation_text(InterpretationResult::ApiError {
                status: 200,
                body: body.clone()
            }),
            Err(PipelineError::EmptyResponse { body })
        );
    }

    #[test]
    fn api_error_body_is_carried_unchanged() {
        let body = json!({ "error": { "code": 429, "message": "quota" } });
        assert_eq!(
            interpretation_text(InterpretationResult::ApiError {
                status: 429,
                body: body.clone()
            }),
            Err(PipelineError::ApiError { status: 429, body })
        );
    }

    #[test]
    fn transport_error_maps_through() {
        assert_eq!(
            interpretation_text(InterpretationResult::TransportError("timeout".into())),
            Err(PipelineError::TransportError {
                cause: "timeout".into()
            })
        );
    }

    #[test]
    fn single_image_mode_keeps_first() {
        let images = vec![
            UploadedImage::new("a", vec![], "image/png"),
            UploadedImage::new("b", vec![], "image/png"),
        ];
        assert_eq!(select_images(&images, false).len(), 1);
        assert_eq!(select_images(&images, true).len(), 2);
        assert!(select_images(&[], false).is_empty());
    }
}
