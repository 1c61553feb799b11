use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One dataset sample. `index` is the position in the full, sorted dataset,
/// not in the selected subset; artifact filenames are derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRef {
    pub index: usize,
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

/// Inference output for a single image, before persistence.
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub index: usize,
    pub image_path: String,
    /// Softmax probabilities, H x W x C.
    pub probabilities: Array3<f32>,
    /// Per-pixel argmax class ids, H x W.
    pub prediction: Array2<u32>,
    /// Ground-truth class ids, H x W.
    pub ground_truth: Array2<u32>,
}

/// One row of the run index, describing a written artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRow {
    pub index: usize,
    pub image_path: String,
    pub artifact: String,
    pub height: usize,
    pub width: usize,
    pub classes: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub samples: usize,
    pub index_path: String,
    pub run_record_path: String,
    pub elapsed: Duration,
}
