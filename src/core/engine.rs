use crate::domain::model::RunSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;
use std::time::Instant;
use tracing::{info, warn};

const MONITOR_LOG_INTERVAL: usize = 10;

/// Drives a pipeline run: discovery, the per-image inference loop and
/// the final run records.
pub struct PredictEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> PredictEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();

        info!("Discovering samples");
        let samples = self.pipeline.discover().await?;
        let total = samples.len();

        if total == 0 {
            warn!("Sample selection is empty, writing run records only");
            let summary = self.pipeline.finalize(Vec::new(), started.elapsed()).await?;
            return Ok(summary);
        }

        info!("Predicting {} images", total);
        self.monitor.log_stats("startup");

        #[cfg(feature = "cli")]
        let progress = {
            let bar = indicatif::ProgressBar::new(total as u64);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                    .progress_chars("█▓░"),
            );
            bar
        };

        let mut rows = Vec::with_capacity(total);
        for (i, sample) in samples.iter().enumerate() {
            let record = self.pipeline.infer(sample).await?;
            let row = self.pipeline.persist(record).await?;

            #[cfg(feature = "cli")]
            {
                progress.set_message(row.artifact.clone());
                progress.inc(1);
            }

            rows.push(row);
            self.monitor.record_image();

            info!("Image {}/{}", i + 1, total);
            if (i + 1) % MONITOR_LOG_INTERVAL == 0 {
                self.monitor.log_stats("inference");
            }
        }

        #[cfg(feature = "cli")]
        progress.finish_and_clear();

        info!("Writing run records");
        let summary = self.pipeline.finalize(rows, started.elapsed()).await?;

        self.monitor.log_final_stats();
        info!(
            "Run complete: {} artifacts in {:?}",
            summary.samples, summary.elapsed
        );

        Ok(summary)
    }
}
