pub mod config;
pub mod error;
pub mod ingredients;
pub mod types;

pub use config::{Config, TtsProvider};
pub use error::{LabelError, PipelineError};
pub use ingredients::{IngredientRecord, IngredientTable};
pub use types::*;
