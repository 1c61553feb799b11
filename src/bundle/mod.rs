//! Per-image prediction artifacts.
//!
//! Each processed image becomes one `input{index}.zip` archive holding the
//! softmax probability volume, the argmax prediction, the ground-truth
//! annotation and a metadata record. `index` is the sample's position in
//! the full dataset, so artifacts stay addressable when a subset is run.

use crate::domain::model::PredictionRecord;
use crate::utils::error::{PredictError, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::ZipArchive;

pub const PROBABILITIES_ENTRY: &str = "probabilities.bin";
pub const PREDICTION_ENTRY: &str = "prediction.png";
pub const GROUND_TRUTH_ENTRY: &str = "ground_truth.png";
pub const META_ENTRY: &str = "meta.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentStamp {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub image_path: String,
    pub index: usize,
    pub height: usize,
    pub width: usize,
    pub classes: usize,
    pub created: DateTime<Utc>,
    pub experiment: ExperimentStamp,
}

pub fn artifact_name(index: usize) -> String {
    format!("input{}.zip", index)
}

/// Assembles the artifact archive for one prediction record.
pub fn write_artifact(record: &PredictionRecord, stamp: &ExperimentStamp) -> Result<Vec<u8>> {
    let (height, width, classes) = record.probabilities.dim();

    if record.prediction.dim() != (height, width) {
        return Err(PredictError::Processing {
            message: format!(
                "Prediction shape {:?} does not match probabilities {}x{}",
                record.prediction.dim(),
                height,
                width
            ),
        });
    }
    if record.ground_truth.dim() != (height, width) {
        return Err(PredictError::Processing {
            message: format!(
                "Ground truth shape {:?} does not match probabilities {}x{}",
                record.ground_truth.dim(),
                height,
                width
            ),
        });
    }

    let meta = ArtifactMeta {
        image_path: record.image_path.clone(),
        index: record.index,
        height,
        width,
        classes,
        created: Utc::now(),
        experiment: stamp.clone(),
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(PROBABILITIES_ENTRY, FileOptions::default())?;
    zip.write_all(&encode_probabilities(&record.probabilities))?;

    zip.start_file::<_, ()>(PREDICTION_ENTRY, FileOptions::default())?;
    zip.write_all(&encode_plane(&record.prediction)?)?;

    zip.start_file::<_, ()>(GROUND_TRUTH_ENTRY, FileOptions::default())?;
    zip.write_all(&encode_plane(&record.ground_truth)?)?;

    zip.start_file::<_, ()>(META_ENTRY, FileOptions::default())?;
    zip.write_all(serde_json::to_string_pretty(&meta)?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// An artifact read back from storage.
#[derive(Debug, Clone)]
pub struct PredictionArtifact {
    pub meta: ArtifactMeta,
    pub probabilities: Array3<f32>,
    pub prediction: Array2<u32>,
    pub ground_truth: Array2<u32>,
}

impl PredictionArtifact {
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let meta: ArtifactMeta = {
            let mut entry = archive.by_name(META_ENTRY)?;
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            serde_json::from_str(&content)?
        };

        let probabilities = {
            let mut entry = archive.by_name(PROBABILITIES_ENTRY)?;
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            decode_probabilities(&raw, meta.height, meta.width, meta.classes)?
        };

        let prediction = read_plane(&mut archive, PREDICTION_ENTRY, &meta)?;
        let ground_truth = read_plane(&mut archive, GROUND_TRUTH_ENTRY, &meta)?;

        Ok(Self {
            meta,
            probabilities,
            prediction,
            ground_truth,
        })
    }
}

fn encode_probabilities(probabilities: &Array3<f32>) -> Vec<u8> {
    let mut raw = Vec::with_capacity(probabilities.len() * 4);
    for v in probabilities.iter() {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    raw
}

fn decode_probabilities(
    raw: &[u8],
    height: usize,
    width: usize,
    classes: usize,
) -> Result<Array3<f32>> {
    if raw.len() != height * width * classes * 4 {
        return Err(PredictError::Processing {
            message: format!(
                "Probability payload of {} bytes does not match {}x{}x{}",
                raw.len(),
                height,
                width,
                classes
            ),
        });
    }

    let values: Vec<f32> = raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Array3::from_shape_vec((height, width, classes), values).map_err(|e| {
        PredictError::Processing {
            message: format!("Probability volume reshape failed: {}", e),
        }
    })
}

fn encode_plane(plane: &Array2<u32>) -> Result<Vec<u8>> {
    let (height, width) = plane.dim();

    let mut pixels = Vec::with_capacity(height * width);
    for v in plane.iter() {
        if *v > u8::MAX as u32 {
            return Err(PredictError::Processing {
                message: format!("Class id {} does not fit an 8-bit plane", v),
            });
        }
        pixels.push(*v as u8);
    }

    let img = image::GrayImage::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
        PredictError::Processing {
            message: "Plane buffer does not match its dimensions".to_string(),
        }
    })?;

    let mut encoded = Vec::new();
    img.write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)?;
    Ok(encoded)
}

fn read_plane(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    entry_name: &str,
    meta: &ArtifactMeta,
) -> Result<Array2<u32>> {
    let mut entry = archive.by_name(entry_name)?;
    let mut raw = Vec::new();
    entry.read_to_end(&mut raw)?;

    let img = image::load_from_memory_with_format(&raw, image::ImageFormat::Png)?.to_luma8();
    if (img.height() as usize, img.width() as usize) != (meta.height, meta.width) {
        return Err(PredictError::Processing {
            message: format!(
                "Entry '{}' is {}x{}, metadata says {}x{}",
                entry_name,
                img.width(),
                img.height(),
                meta.width,
                meta.height
            ),
        });
    }

    let mut out = Array2::<u32>::zeros((meta.height, meta.width));
    for (x, y, pixel) in img.enumerate_pixels() {
        out[[y as usize, x as usize]] = pixel[0] as u32;
    }
    Ok(out)
}
