pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{ArtifactRow, PredictionRecord, RunSummary, SampleRef};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Segmenter, Storage};
pub use crate::utils::error::Result;
