use clap::Parser;
use ood_predict::utils::{logger, validation::Validate};
use ood_predict::{
    CliConfig, ExperimentConfig, LocalStorage, OnnxSegmenter, PredictEngine, SegPredictPipeline,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting ood-predict");
    if cli.verbose > 0 {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match ExperimentConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    cli.apply_to(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitoring_enabled() || cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    tracing::info!(
        "Experiment '{}' on dataset '{}' ({} classes)",
        config.experiment.name,
        config.dataset.name,
        config.dataset.num_classes
    );

    let model = match OnnxSegmenter::new(
        &config.model.weights,
        &config.model.input_name,
        &config.model.output_name,
        config.workers(),
    ) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("❌ Model loading failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(3);
        }
    };
    tracing::info!("Loading of model weights successful");

    let storage = LocalStorage::new(config.output.dir.clone());
    let output_dir = config.output.dir.clone();
    let pipeline = match SegPredictPipeline::new(storage, config, model) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ Pipeline setup failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let engine = PredictEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Prediction export completed successfully!");
            tracing::info!(
                "📁 {} artifacts, index at {}/{}",
                summary.samples,
                output_dir,
                summary.index_path
            );
            println!("✅ Prediction export completed successfully!");
            println!(
                "📁 {} artifacts written to {} (index: {}, run record: {})",
                summary.samples, output_dir, summary.index_path, summary.run_record_path
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Prediction export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ood_predict::utils::error::ErrorSeverity::Low => 0,
                ood_predict::utils::error::ErrorSeverity::Medium => 2,
                ood_predict::utils::error::ErrorSeverity::High => 1,
                ood_predict::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
