pub mod experiment;
pub mod storage;

pub use experiment::ExperimentConfig;
pub use storage::LocalStorage;

#[cfg(feature = "cli")]
use clap::Parser;

/// Command-line surface: a configuration file plus a few run-time overrides.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ood-predict",
    about = "Run semantic segmentation inference and export per-image prediction artifacts",
    version
)]
pub struct CliConfig {
    /// Experiment configuration file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: std::path::PathBuf,

    /// Override the artifact output directory
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Override the number of intra-op inference threads
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Only process images containing this class (needs a per-class sample index)
    #[arg(long, value_name = "CLASS")]
    pub class_index: Option<u32>,

    /// Process at most this many samples
    #[arg(long, value_name = "N")]
    pub max_samples: Option<usize>,

    /// Enable system monitoring during the run
    #[arg(long)]
    pub monitor: bool,

    /// Verbose logging (can be repeated: -v, -vv)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Merges CLI overrides into a loaded experiment configuration.
    pub fn apply_to(&self, config: &mut ExperimentConfig) {
        if let Some(output_dir) = &self.output_dir {
            config.output.dir = output_dir.clone();
        }
        if let Some(workers) = self.workers {
            config.inference = Some(experiment::InferenceSection {
                workers: Some(workers),
            });
        }
        if let Some(class_index) = self.class_index {
            config.dataset.class_index = Some(class_index);
        }
        if let Some(max_samples) = self.max_samples {
            config.dataset.max_samples = Some(max_samples);
        }
        if self.monitor {
            config.monitoring = Some(experiment::MonitoringSection { enabled: true });
        }
    }
}
