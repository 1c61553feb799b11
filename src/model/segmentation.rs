//! Semantic segmentation inference via ONNX Runtime.

use crate::domain::ports::Segmenter;
use crate::utils::error::{PredictError, Result};
use ndarray::{Array4, Ix4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// Segmentation network loaded from an ONNX export.
///
/// The session is kept behind a mutex so the model can be shared by the
/// pipeline while `run` takes the session mutably.
pub struct OnnxSegmenter {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxSegmenter {
    pub fn new(
        model_path: &str,
        input_name: &str,
        output_name: &str,
        intra_threads: usize,
    ) -> Result<Self> {
        debug!("Loading segmentation model from: {}", model_path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        debug!("Segmentation model loaded successfully");
        Ok(Self {
            session: Mutex::new(session),
            input_name: input_name.to_string(),
            output_name: output_name.to_string(),
        })
    }
}

impl Segmenter for OnnxSegmenter {
    fn predict(&self, input: Array4<f32>) -> Result<Array4<f32>> {
        debug!("Running segmentation on tensor of shape {:?}", input.shape());

        let mut session = self.session.lock().map_err(|_| PredictError::Processing {
            message: "Segmentation session lock poisoned".to_string(),
        })?;

        let outputs = session.run(ort::inputs![
            self.input_name.as_str() => Tensor::from_array(input)?
        ])?;

        let logits = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;

        debug!("Got logits of shape {:?}", logits.shape());

        logits
            .to_owned()
            .into_dimensionality::<Ix4>()
            .map_err(|e| PredictError::Processing {
                message: format!("Expected [N, C, H, W] logits: {}", e),
            })
    }
}
