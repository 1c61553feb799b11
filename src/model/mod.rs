//! Model loading, preprocessing and output post-processing.

pub mod ops;
pub mod preprocessing;
pub mod segmentation;

pub use segmentation::OnnxSegmenter;
