pub mod bundle;
pub mod config;
pub mod core;
pub mod dataset;
pub mod domain;
pub mod manifest;
pub mod model;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{ExperimentConfig, LocalStorage};
pub use core::{engine::PredictEngine, pipeline::SegPredictPipeline};
pub use manifest::ProjectManifest;
pub use model::OnnxSegmenter;
pub use utils::error::{PredictError, Result};
