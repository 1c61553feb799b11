//! Tensor operations applied to raw network outputs.

use crate::utils::error::{PredictError, Result};
use ndarray::{Array2, Array3, Array4, Axis};

/// Numerically stable softmax over the class axis of a [N, C, H, W] tensor.
pub fn softmax_channels(logits: &Array4<f32>) -> Result<Array4<f32>> {
    let (n, c, h, w) = logits.dim();
    if c == 0 {
        return Err(PredictError::Processing {
            message: "Logits tensor has no class channels".to_string(),
        });
    }

    let mut out = logits.clone();
    for b in 0..n {
        for y in 0..h {
            for x in 0..w {
                let mut max = f32::NEG_INFINITY;
                for k in 0..c {
                    max = max.max(out[[b, k, y, x]]);
                }

                let mut sum = 0.0f32;
                for k in 0..c {
                    let e = (out[[b, k, y, x]] - max).exp();
                    out[[b, k, y, x]] = e;
                    sum += e;
                }

                for k in 0..c {
                    out[[b, k, y, x]] /= sum;
                }
            }
        }
    }

    Ok(out)
}

/// Squeezes the batch axis and reorders a [1, C, H, W] volume to H x W x C.
pub fn probabilities_hwc(probs: &Array4<f32>) -> Result<Array3<f32>> {
    let (n, _, _, _) = probs.dim();
    if n != 1 {
        return Err(PredictError::Processing {
            message: format!("Expected batch size 1, got {}", n),
        });
    }

    let chw = probs.index_axis(Axis(0), 0);
    Ok(chw.permuted_axes([1, 2, 0]).to_owned())
}

/// Per-pixel argmax over the class axis of a [1, C, H, W] tensor.
/// Ties resolve to the lowest class id.
pub fn argmax_channels(probs: &Array4<f32>) -> Result<Array2<u32>> {
    let (n, c, h, w) = probs.dim();
    if n != 1 {
        return Err(PredictError::Processing {
            message: format!("Expected batch size 1, got {}", n),
        });
    }
    if c == 0 {
        return Err(PredictError::Processing {
            message: "Probability tensor has no class channels".to_string(),
        });
    }

    let mut out = Array2::<u32>::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut best = 0usize;
            let mut best_value = probs[[0, 0, y, x]];
            for k in 1..c {
                let v = probs[[0, k, y, x]];
                if v > best_value {
                    best = k;
                    best_value = v;
                }
            }
            out[[y, x]] = best as u32;
        }
    }

    Ok(out)
}
