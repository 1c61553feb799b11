use ndarray::Array4;
use ood_predict::bundle::PredictionArtifact;
use ood_predict::domain::ports::Segmenter;
use ood_predict::utils::error::Result;
use ood_predict::utils::validation::Validate;
use ood_predict::{ExperimentConfig, LocalStorage, PredictEngine, SegPredictPipeline};
use std::path::Path;
use tempfile::TempDir;

const CLASSES: usize = 4;

/// Deterministic stand-in for the network: class x % 4 wins at every pixel.
struct StripeSegmenter;

impl Segmenter for StripeSegmenter {
    fn predict(&self, input: Array4<f32>) -> Result<Array4<f32>> {
        let (_, _, h, w) = input.dim();
        let mut logits = Array4::<f32>::zeros((1, CLASSES, h, w));
        for y in 0..h {
            for x in 0..w {
                logits[[0, x % CLASSES, y, x]] = 3.0;
            }
        }
        Ok(logits)
    }
}

fn write_dataset(root: &Path, samples: usize) {
    std::fs::create_dir_all(root.join("images")).unwrap();
    std::fs::create_dir_all(root.join("labels")).unwrap();

    for i in 0..samples {
        let img = image::RgbImage::from_pixel(6, 4, image::Rgb([32, 64, 96]));
        img.save(root.join(format!("images/frame_{:03}.png", i)))
            .unwrap();

        let lbl = image::GrayImage::from_pixel(6, 4, image::Luma([(i % CLASSES) as u8]));
        lbl.save(root.join(format!("labels/frame_{:03}.png", i)))
            .unwrap();
    }
}

fn experiment_config(root: &Path, output: &Path, extra_dataset_lines: &str) -> ExperimentConfig {
    let toml = format!(
        r#"
[experiment]
name = "integration-run"
version = "0.1.0"

[dataset]
name = "synthetic"
root = "{root}"
num_classes = {classes}
mean = [0.0, 0.0, 0.0]
std = [1.0, 1.0, 1.0]
{extra}

[model]
name = "stub"
weights = "./models/stub.onnx"

[inference]
workers = 1

[output]
dir = "{output}"
"#,
        root = root.display(),
        classes = CLASSES,
        extra = extra_dataset_lines,
        output = output.display(),
    );

    let config = ExperimentConfig::from_toml_str(&toml).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn full_run_writes_artifacts_and_run_records() {
    let data_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_dataset(data_dir.path(), 3);

    let config = experiment_config(data_dir.path(), out_dir.path(), "");
    let storage = LocalStorage::new(out_dir.path());
    let pipeline = SegPredictPipeline::new(storage, config, StripeSegmenter).unwrap();
    let engine = PredictEngine::new(pipeline);

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.samples, 3);

    for i in 0..3 {
        assert!(out_dir.path().join(format!("input{}.zip", i)).exists());
    }

    // Read one artifact back and check the stripe prediction
    let bytes = std::fs::read(out_dir.path().join("input1.zip")).unwrap();
    let artifact = PredictionArtifact::read(&bytes).unwrap();

    assert_eq!(artifact.meta.height, 4);
    assert_eq!(artifact.meta.width, 6);
    assert_eq!(artifact.meta.classes, CLASSES);
    assert_eq!(artifact.meta.experiment.name, "integration-run");
    assert!(artifact.meta.image_path.ends_with("frame_001.png"));

    for x in 0..6 {
        assert_eq!(artifact.prediction[[0, x]], (x % CLASSES) as u32);
    }
    assert_eq!(artifact.ground_truth[[0, 0]], 1);

    // Probabilities sum to one per pixel
    let sum: f32 = (0..CLASSES)
        .map(|c| artifact.probabilities[[2, 3, c]])
        .sum();
    assert!((sum - 1.0).abs() < 1e-5);

    // Run index: header plus one row per artifact
    let index = std::fs::read_to_string(out_dir.path().join("run_index.csv")).unwrap();
    let lines: Vec<&str> = index.trim().lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("index,image_path,artifact,height,width,classes"));
    assert!(lines[2].contains("input1.zip"));

    let run: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.path().join("run.json")).unwrap())
            .unwrap();
    assert_eq!(run["experiment"]["name"], "integration-run");
    assert_eq!(run["samples"], 3);
}

#[tokio::test]
async fn flat_sample_index_selects_by_dataset_index() {
    let data_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_dataset(data_dir.path(), 4);

    let index_path = data_dir.path().join("selection.json");
    std::fs::write(&index_path, "[3, 0]").unwrap();

    let extra = format!("index_file = \"{}\"", index_path.display());
    let config = experiment_config(data_dir.path(), out_dir.path(), &extra);
    let storage = LocalStorage::new(out_dir.path());
    let pipeline = SegPredictPipeline::new(storage, config, StripeSegmenter).unwrap();
    let engine = PredictEngine::new(pipeline);

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.samples, 2);

    // Artifact names keep the full-dataset indices
    assert!(out_dir.path().join("input3.zip").exists());
    assert!(out_dir.path().join("input0.zip").exists());
    assert!(!out_dir.path().join("input1.zip").exists());
}

#[tokio::test]
async fn per_class_sample_index_with_class_override() {
    let data_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_dataset(data_dir.path(), 4);

    let index_path = data_dir.path().join("classes.json");
    std::fs::write(&index_path, r#"{"2": [2], "3": [1, 3]}"#).unwrap();

    let extra = format!(
        "class_index = 3\nindex_file = \"{}\"",
        index_path.display()
    );
    let config = experiment_config(data_dir.path(), out_dir.path(), &extra);
    let storage = LocalStorage::new(out_dir.path());
    let pipeline = SegPredictPipeline::new(storage, config, StripeSegmenter).unwrap();
    let engine = PredictEngine::new(pipeline);

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.samples, 2);
    assert!(out_dir.path().join("input1.zip").exists());
    assert!(out_dir.path().join("input3.zip").exists());
}

#[tokio::test]
async fn max_samples_truncates_the_run() {
    let data_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_dataset(data_dir.path(), 5);

    let config = experiment_config(data_dir.path(), out_dir.path(), "max_samples = 2");
    let storage = LocalStorage::new(out_dir.path());
    let pipeline = SegPredictPipeline::new(storage, config, StripeSegmenter).unwrap();
    let engine = PredictEngine::new(pipeline);

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.samples, 2);
    assert!(out_dir.path().join("input0.zip").exists());
    assert!(out_dir.path().join("input1.zip").exists());
    assert!(!out_dir.path().join("input2.zip").exists());
}

#[tokio::test]
async fn empty_selection_still_writes_run_records() {
    let data_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_dataset(data_dir.path(), 2);

    let index_path = data_dir.path().join("empty.json");
    std::fs::write(&index_path, "[]").unwrap();

    let extra = format!("index_file = \"{}\"", index_path.display());
    let config = experiment_config(data_dir.path(), out_dir.path(), &extra);
    let storage = LocalStorage::new(out_dir.path());
    let pipeline = SegPredictPipeline::new(storage, config, StripeSegmenter).unwrap();
    let engine = PredictEngine::new(pipeline);

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.samples, 0);
    assert!(out_dir.path().join("run_index.csv").exists());
    assert!(out_dir.path().join("run.json").exists());
}
