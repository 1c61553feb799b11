use crate::domain::model::{ArtifactRow, PredictionRecord, RunSummary, SampleRef};
use crate::utils::error::Result;
use async_trait::async_trait;
use ndarray::Array4;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn experiment_name(&self) -> &str;
    fn experiment_version(&self) -> &str;
    fn dataset_root(&self) -> &str;
    fn image_dir(&self) -> &str;
    fn label_dir(&self) -> &str;
    fn num_classes(&self) -> usize;
    fn mean(&self) -> [f32; 3];
    fn std(&self) -> [f32; 3];
    fn class_index(&self) -> Option<u32>;
    fn sample_index_file(&self) -> Option<&str>;
    fn max_samples(&self) -> Option<usize>;
    fn output_dir(&self) -> &str;
    fn index_filename(&self) -> &str;
    fn run_record_filename(&self) -> &str;
    fn manifest_path(&self) -> Option<&str>;
}

/// Seam around the segmentation network: [1, 3, H, W] input to [1, C, H, W] logits.
pub trait Segmenter: Send + Sync {
    fn predict(&self, input: Array4<f32>) -> Result<Array4<f32>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn discover(&self) -> Result<Vec<SampleRef>>;
    async fn infer(&self, sample: &SampleRef) -> Result<PredictionRecord>;
    async fn persist(&self, record: PredictionRecord) -> Result<ArtifactRow>;
    async fn finalize(&self, rows: Vec<ArtifactRow>, elapsed: Duration) -> Result<RunSummary>;
}
