//! Dataset enumeration, subset selection and decoding.
//!
//! A dataset root holds two parallel directories: one with images and one
//! with 8-bit grayscale class-id annotations sharing the image file stems.
//! Subsets are described by a JSON sample index, either a flat list of
//! dataset indices or a map from class index to dataset indices.

use crate::domain::model::SampleRef;
use crate::utils::error::{PredictError, Result};
use image::DynamicImage;
use ndarray::Array2;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Enumerates image/label pairs under `root`, sorted by image file name.
/// The position in this full listing is the sample's dataset index.
pub fn discover_samples(root: &Path, image_dir: &str, label_dir: &str) -> Result<Vec<SampleRef>> {
    let images_root = root.join(image_dir);
    let labels_root = root.join(label_dir);

    if !images_root.is_dir() {
        return Err(PredictError::InvalidConfigValue {
            field: "dataset.root".to_string(),
            value: images_root.display().to_string(),
            reason: "Image directory does not exist".to_string(),
        });
    }

    let mut image_paths = Vec::new();
    for entry in std::fs::read_dir(&images_root)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_image {
            image_paths.push(path);
        }
    }
    image_paths.sort();

    let mut samples = Vec::with_capacity(image_paths.len());
    for (index, image_path) in image_paths.into_iter().enumerate() {
        let stem = image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PredictError::Processing {
                message: format!("Invalid image file name: {}", image_path.display()),
            })?;

        let label_path = labels_root.join(format!("{}.png", stem));
        if !label_path.is_file() {
            return Err(PredictError::Processing {
                message: format!(
                    "No annotation found for image '{}' (expected {})",
                    image_path.display(),
                    label_path.display()
                ),
            });
        }

        samples.push(SampleRef {
            index,
            image_path,
            label_path,
        });
    }

    debug!("Discovered {} image/label pairs", samples.len());
    Ok(samples)
}

/// Saved subset description.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SampleIndex {
    /// Class index (as string key) to dataset indices.
    PerClass(HashMap<String, Vec<usize>>),
    /// Flat list of dataset indices.
    Flat(Vec<usize>),
}

impl SampleIndex {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(PredictError::Serialization)
    }
}

/// Applies subset selection to the full sample listing.
///
/// With a class index, the sample index must be per-class and the entry for
/// that class selects the images; a flat index selects directly; without an
/// index every sample is kept. `max_samples` truncates the result.
pub fn select_samples(
    all: Vec<SampleRef>,
    class_index: Option<u32>,
    index: Option<&SampleIndex>,
    max_samples: Option<usize>,
) -> Result<Vec<SampleRef>> {
    let mut selected = match (class_index, index) {
        (Some(ci), Some(SampleIndex::PerClass(map))) => {
            let indices =
                map.get(&ci.to_string())
                    .ok_or_else(|| PredictError::InvalidConfigValue {
                        field: "dataset.class_index".to_string(),
                        value: ci.to_string(),
                        reason: "No entry for this class in the sample index".to_string(),
                    })?;
            let subset = pick(&all, indices)?;
            info!(
                "Specified class: {} // Number of images containing this class: {}",
                ci,
                subset.len()
            );
            subset
        }
        (Some(ci), _) => {
            return Err(PredictError::InvalidConfigValue {
                field: "dataset.class_index".to_string(),
                value: ci.to_string(),
                reason: "A per-class sample index file is required for class selection".to_string(),
            });
        }
        (None, Some(SampleIndex::Flat(indices))) => pick(&all, indices)?,
        (None, Some(SampleIndex::PerClass(_))) => {
            return Err(PredictError::MissingConfig {
                field: "dataset.class_index".to_string(),
            });
        }
        (None, None) => all,
    };

    if let Some(max) = max_samples {
        selected.truncate(max);
    }

    Ok(selected)
}

fn pick(all: &[SampleRef], indices: &[usize]) -> Result<Vec<SampleRef>> {
    indices
        .iter()
        .map(|&i| {
            all.get(i).cloned().ok_or_else(|| PredictError::InvalidConfigValue {
                field: "dataset.index_file".to_string(),
                value: i.to_string(),
                reason: format!("Index out of range for dataset of {} samples", all.len()),
            })
        })
        .collect()
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Decodes an 8-bit grayscale annotation into per-pixel class ids.
pub fn load_label(path: &Path) -> Result<Array2<u32>> {
    let label = image::open(path)?.to_luma8();
    let (width, height) = (label.width() as usize, label.height() as usize);

    let mut out = Array2::<u32>::zeros((height, width));
    for (x, y, pixel) in label.enumerate_pixels() {
        out[[y as usize, x as usize]] = pixel[0] as u32;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32, value: u8) {
        let img = image::GrayImage::from_pixel(width, height, image::Luma([value]));
        img.save(path).unwrap();
    }

    fn build_dataset(samples: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&labels).unwrap();

        for i in 0..samples {
            write_png(&images.join(format!("frame_{:03}.png", i)), 4, 3, 100);
            write_png(&labels.join(format!("frame_{:03}.png", i)), 4, 3, i as u8);
        }
        dir
    }

    fn sample(index: usize) -> SampleRef {
        SampleRef {
            index,
            image_path: PathBuf::from(format!("img{}.png", index)),
            label_path: PathBuf::from(format!("lbl{}.png", index)),
        }
    }

    #[test]
    fn test_discover_sorts_and_indexes() {
        let dir = build_dataset(3);
        let samples = discover_samples(dir.path(), "images", "labels").unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].index, 0);
        assert_eq!(samples[2].index, 2);
        assert!(samples[0].image_path.ends_with("frame_000.png"));
        assert!(samples[2].image_path.ends_with("frame_002.png"));
    }

    #[test]
    fn test_discover_fails_on_missing_label() {
        let dir = build_dataset(2);
        std::fs::remove_file(dir.path().join("labels/frame_001.png")).unwrap();

        let result = discover_samples(dir.path(), "images", "labels");
        assert!(matches!(result, Err(PredictError::Processing { .. })));
    }

    #[test]
    fn test_discover_fails_on_missing_image_dir() {
        let dir = TempDir::new().unwrap();
        assert!(discover_samples(dir.path(), "images", "labels").is_err());
    }

    #[test]
    fn test_select_all_without_index() {
        let all = vec![sample(0), sample(1), sample(2)];
        let selected = select_samples(all.clone(), None, None, None).unwrap();
        assert_eq!(selected, all);
    }

    #[test]
    fn test_select_flat_index_keeps_dataset_indices() {
        let all = vec![sample(0), sample(1), sample(2), sample(3)];
        let index = SampleIndex::Flat(vec![3, 1]);

        let selected = select_samples(all, None, Some(&index), None).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].index, 3);
        assert_eq!(selected[1].index, 1);
    }

    #[test]
    fn test_select_per_class_index() {
        let all = vec![sample(0), sample(1), sample(2)];
        let mut map = HashMap::new();
        map.insert("7".to_string(), vec![0, 2]);
        let index = SampleIndex::PerClass(map);

        let selected = select_samples(all, Some(7), Some(&index), None).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].index, 2);
    }

    #[test]
    fn test_select_unknown_class_fails() {
        let all = vec![sample(0)];
        let index = SampleIndex::PerClass(HashMap::new());
        assert!(select_samples(all, Some(7), Some(&index), None).is_err());
    }

    #[test]
    fn test_select_class_without_per_class_index_fails() {
        let all = vec![sample(0)];
        let flat = SampleIndex::Flat(vec![0]);
        assert!(select_samples(all.clone(), Some(7), Some(&flat), None).is_err());
        assert!(select_samples(all, Some(7), None, None).is_err());
    }

    #[test]
    fn test_select_out_of_range_index_fails() {
        let all = vec![sample(0)];
        let index = SampleIndex::Flat(vec![5]);
        assert!(select_samples(all, None, Some(&index), None).is_err());
    }

    #[test]
    fn test_select_max_samples_truncates() {
        let all = vec![sample(0), sample(1), sample(2)];
        let selected = select_samples(all, None, None, Some(2)).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_sample_index_from_json() {
        let dir = TempDir::new().unwrap();

        let flat_path = dir.path().join("flat.json");
        std::fs::write(&flat_path, "[0, 2, 4]").unwrap();
        assert!(matches!(
            SampleIndex::from_file(&flat_path).unwrap(),
            SampleIndex::Flat(v) if v == vec![0, 2, 4]
        ));

        let class_path = dir.path().join("classes.json");
        std::fs::write(&class_path, r#"{"12": [1, 3]}"#).unwrap();
        assert!(matches!(
            SampleIndex::from_file(&class_path).unwrap(),
            SampleIndex::PerClass(_)
        ));
    }

    #[test]
    fn test_load_label_values() {
        let dir = build_dataset(1);
        let label = load_label(&dir.path().join("labels/frame_000.png")).unwrap();
        assert_eq!(label.dim(), (3, 4));
        assert_eq!(label[[0, 0]], 0);
    }
}
