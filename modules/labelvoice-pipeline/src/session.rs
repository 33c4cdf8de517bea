use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use labelvoice_common::{PipelineOptions, PipelineOutcome, UploadedImage};

use crate::pipeline::Pipeline;

/// One user's current batch: selected options plus the outcomes of the last run.
///
/// Nothing here outlives the session; `reset` starts over with the same options.
#[derive(Debug, Clone)]
pub struct BatchSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    options: PipelineOptions,
    outcomes: Vec<PipelineOutcome>,
}

impl BatchSession {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            options,
            outcomes: Vec::new(),
        }
    }

    /// Discard every outcome and return a fresh session with the same options.
    pub fn reset(&self) -> Self {
        info!(
            session = %self.id,
            discarded = self.outcomes.len(),
            "Batch session reset"
        );
        Self::new(self.options.clone())
    }

    /// Run `images` through `pipeline`, replacing any previous outcomes.
    pub async fn run(
        &mut self,
        pipeline: &Pipeline,
        images: &[UploadedImage],
    ) -> &[PipelineOutcome] {
        info!(session = %self.id, images = images.len(), "Batch started");
        self.outcomes = pipeline.run_batch(images, &self.options).await;
        &self.outcomes
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn outcomes(&self) -> &[PipelineOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes that produced readable text (narration may still have failed).
    pub fn readable_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.has_text()).count()
    }
}
