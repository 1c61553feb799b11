//! Image-to-tensor conversion for the segmentation network.

use image::DynamicImage;
use ndarray::Array4;
use tracing::debug;

/// Converts an image to a [1, 3, H, W] tensor with per-channel normalization:
/// `(x / 255 - mean) / std`. The image keeps its native resolution.
pub fn image_to_tensor(image: &DynamicImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    debug!(
        "Converting image to tensor: {}x{}",
        image.width(),
        image.height()
    );

    let rgb = image.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let mut array = Array4::<f32>::zeros((1, 3, height, width));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let x = x as usize;
        let y = y as usize;
        for c in 0..3 {
            array[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }

    array
}
