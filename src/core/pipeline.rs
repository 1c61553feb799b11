use crate::bundle::{self, ExperimentStamp};
use crate::dataset::{self, SampleIndex};
use crate::domain::model::{ArtifactRow, PredictionRecord, RunSummary, SampleRef};
use crate::domain::ports::{ConfigProvider, Pipeline, Segmenter, Storage};
use crate::manifest::ProjectManifest;
use crate::model::{ops, preprocessing};
use crate::utils::error::{PredictError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
struct ManifestProvenance {
    name: String,
    version: String,
}

/// Production pipeline: dataset discovery, per-image inference and
/// artifact persistence, and the run records written at the end.
pub struct SegPredictPipeline<S: Storage, C: ConfigProvider, M: Segmenter> {
    storage: S,
    config: C,
    model: M,
    provenance: Option<ManifestProvenance>,
}

impl<S: Storage, C: ConfigProvider, M: Segmenter> SegPredictPipeline<S, C, M> {
    /// Builds the pipeline. When the configuration points at a project
    /// manifest, it is parsed and validated up front so an inconsistent
    /// manifest fails the run before any inference happens.
    pub fn new(storage: S, config: C, model: M) -> Result<Self> {
        let provenance = match config.manifest_path() {
            Some(path) => {
                let manifest = ProjectManifest::from_file(path)?;
                manifest.validate()?;
                Some(ManifestProvenance {
                    name: manifest.project.name.clone(),
                    version: manifest.project.version.clone(),
                })
            }
            None => None,
        };

        Ok(Self {
            storage,
            config,
            model,
            provenance,
        })
    }

    fn stamp(&self) -> ExperimentStamp {
        ExperimentStamp {
            name: self.config.experiment_name().to_string(),
            version: self.config.experiment_version().to_string(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, M: Segmenter> Pipeline for SegPredictPipeline<S, C, M> {
    async fn discover(&self) -> Result<Vec<SampleRef>> {
        let root = Path::new(self.config.dataset_root());
        let all = dataset::discover_samples(root, self.config.image_dir(), self.config.label_dir())?;

        let index = match self.config.sample_index_file() {
            Some(path) => Some(SampleIndex::from_file(path)?),
            None => None,
        };

        dataset::select_samples(
            all,
            self.config.class_index(),
            index.as_ref(),
            self.config.max_samples(),
        )
    }

    async fn infer(&self, sample: &SampleRef) -> Result<PredictionRecord> {
        debug!("Running inference on: {}", sample.image_path.display());

        let image = dataset::load_image(&sample.image_path)?;
        let ground_truth = dataset::load_label(&sample.label_path)?;

        let input =
            preprocessing::image_to_tensor(&image, self.config.mean(), self.config.std());
        let logits = self.model.predict(input)?;

        let classes = logits.dim().1;
        if classes != self.config.num_classes() {
            return Err(PredictError::Processing {
                message: format!(
                    "Model produced {} classes, configuration declares {}",
                    classes,
                    self.config.num_classes()
                ),
            });
        }

        let probs = ops::softmax_channels(&logits)?;
        let prediction = ops::argmax_channels(&probs)?;
        let probabilities = ops::probabilities_hwc(&probs)?;

        if ground_truth.dim() != prediction.dim() {
            return Err(PredictError::Processing {
                message: format!(
                    "Annotation {:?} does not match prediction {:?} for '{}'",
                    ground_truth.dim(),
                    prediction.dim(),
                    sample.label_path.display()
                ),
            });
        }

        Ok(PredictionRecord {
            index: sample.index,
            image_path: sample.image_path.display().to_string(),
            probabilities,
            prediction,
            ground_truth,
        })
    }

    async fn persist(&self, record: PredictionRecord) -> Result<ArtifactRow> {
        let (height, width, classes) = record.probabilities.dim();
        let artifact = bundle::artifact_name(record.index);

        let bytes = bundle::write_artifact(&record, &self.stamp())?;
        debug!("Writing artifact '{}' ({} bytes)", artifact, bytes.len());
        self.storage.write_file(&artifact, &bytes).await?;

        Ok(ArtifactRow {
            index: record.index,
            image_path: record.image_path,
            artifact,
            height,
            width,
            classes,
        })
    }

    async fn finalize(&self, rows: Vec<ArtifactRow>, elapsed: Duration) -> Result<RunSummary> {
        let index_path = self.config.index_filename().to_string();
        let run_record_path = self.config.run_record_filename().to_string();

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &rows {
            writer.serialize(row)?;
        }
        let index_data = writer.into_inner().map_err(|e| PredictError::Processing {
            message: format!("Run index assembly failed: {}", e),
        })?;
        self.storage.write_file(&index_path, &index_data).await?;

        let finished = Utc::now();
        let started = finished
            - chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        let run_record = serde_json::json!({
            "experiment": {
                "name": self.config.experiment_name(),
                "version": self.config.experiment_version(),
            },
            "project": &self.provenance,
            "dataset": {
                "root": self.config.dataset_root(),
                "num_classes": self.config.num_classes(),
                "class_index": self.config.class_index(),
                "max_samples": self.config.max_samples(),
            },
            "samples": rows.len(),
            "started": started,
            "finished": finished,
        });
        self.storage
            .write_file(&run_record_path, serde_json::to_string_pretty(&run_record)?.as_bytes())
            .await?;

        Ok(RunSummary {
            samples: rows.len(),
            index_path,
            run_record_path,
            elapsed,
        })
    }
}
