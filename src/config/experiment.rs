use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PredictError, Result};
use crate::utils::validation::{
    validate_channel_stats, validate_file_extension, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub experiment: ExperimentSection,
    pub dataset: DatasetSection,
    pub model: ModelSection,
    pub inference: Option<InferenceSection>,
    pub output: OutputSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSection {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    /// Optional project manifest recorded as run provenance.
    pub manifest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSection {
    pub name: String,
    pub root: String,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    #[serde(default = "default_label_dir")]
    pub label_dir: String,
    pub num_classes: usize,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub class_index: Option<u32>,
    pub index_file: Option<String>,
    pub max_samples: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    pub name: String,
    pub weights: String,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSection {
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub dir: String,
    #[serde(default = "default_index_filename")]
    pub index_filename: String,
    #[serde(default = "default_run_filename")]
    pub run_filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
}

fn default_image_dir() -> String {
    "images".to_string()
}

fn default_label_dir() -> String {
    "labels".to_string()
}

fn default_input_name() -> String {
    "image".to_string()
}

fn default_output_name() -> String {
    "logits".to_string()
}

fn default_index_filename() -> String {
    "run_index.csv".to_string()
}

fn default_run_filename() -> String {
    "run.json".to_string()
}

impl ExperimentConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PredictError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PredictError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` references with environment values. Unknown
    /// variables are left in place so validation reports them in context.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("experiment.name", &self.experiment.name)?;
        validate_non_empty_string("experiment.version", &self.experiment.version)?;

        validate_path("dataset.root", &self.dataset.root)?;
        validate_non_empty_string("dataset.image_dir", &self.dataset.image_dir)?;
        validate_non_empty_string("dataset.label_dir", &self.dataset.label_dir)?;
        validate_range("dataset.num_classes", self.dataset.num_classes, 2, 255)?;
        validate_channel_stats("dataset.mean", &self.dataset.mean, false)?;
        validate_channel_stats("dataset.std", &self.dataset.std, true)?;

        validate_path("model.weights", &self.model.weights)?;
        validate_file_extension("model.weights", &self.model.weights, &["onnx"])?;
        validate_non_empty_string("model.input_name", &self.model.input_name)?;
        validate_non_empty_string("model.output_name", &self.model.output_name)?;

        validate_path("output.dir", &self.output.dir)?;
        validate_positive_number("inference.workers", self.workers(), 1)?;

        if let Some(index_file) = &self.dataset.index_file {
            validate_file_extension("dataset.index_file", index_file, &["json"])?;
        }

        if self.dataset.class_index.is_some() && self.dataset.index_file.is_none() {
            return Err(PredictError::MissingConfig {
                field: "dataset.index_file".to_string(),
            });
        }

        if let Some(manifest) = &self.experiment.manifest {
            validate_file_extension("experiment.manifest", manifest, &["toml"])?;
        }

        Ok(())
    }

    pub fn workers(&self) -> usize {
        self.inference
            .as_ref()
            .and_then(|i| i.workers)
            .unwrap_or(4)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for ExperimentConfig {
    fn experiment_name(&self) -> &str {
        &self.experiment.name
    }

    fn experiment_version(&self) -> &str {
        &self.experiment.version
    }

    fn dataset_root(&self) -> &str {
        &self.dataset.root
    }

    fn image_dir(&self) -> &str {
        &self.dataset.image_dir
    }

    fn label_dir(&self) -> &str {
        &self.dataset.label_dir
    }

    fn num_classes(&self) -> usize {
        self.dataset.num_classes
    }

    fn mean(&self) -> [f32; 3] {
        [self.dataset.mean[0], self.dataset.mean[1], self.dataset.mean[2]]
    }

    fn std(&self) -> [f32; 3] {
        [self.dataset.std[0], self.dataset.std[1], self.dataset.std[2]]
    }

    fn class_index(&self) -> Option<u32> {
        self.dataset.class_index
    }

    fn sample_index_file(&self) -> Option<&str> {
        self.dataset.index_file.as_deref()
    }

    fn max_samples(&self) -> Option<usize> {
        self.dataset.max_samples
    }

    fn output_dir(&self) -> &str {
        &self.output.dir
    }

    fn index_filename(&self) -> &str {
        &self.output.index_filename
    }

    fn run_record_filename(&self) -> &str {
        &self.output.run_filename
    }

    fn manifest_path(&self) -> Option<&str> {
        self.experiment.manifest.as_deref()
    }
}

impl Validate for ExperimentConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
