//! Preprocessing and Fusion Pipeline
//!
//! Deterministic transform from raw image bytes to the exact 4-channel tensor
//! the classifier expects:
//!
//! 1. Decode bytes, convert to RGB
//! 2. Resize a copy to the mask network resolution, scale to [0,1]
//! 3. Run the mask network, sigmoid the logits into a probability map
//! 4. Resize the probability map to the classifier resolution
//! 5. Independently resize the original image to the classifier resolution,
//!    scale to [0,1]
//! 6. Concatenate [R, G, B, mask] and add the batch dimension
//!
//! The resolutions and the interpolation filter mirror the transforms used at
//! training time and must not be tuned per deployment.

pub mod preprocess;

use burn::tensor::{activation::sigmoid, backend::Backend, Tensor};
use image::imageops::FilterType;
use tracing::debug;

use crate::model::masknet::MaskNet;
use crate::utils::error::{LeafsightError, Result};

pub use preprocess::{decode_image, fuse, resize_mask, resize_rgb, to_unit_tensor};

/// Input resolution of the mask network (square)
pub const MASK_INPUT_SIZE: usize = 256;

/// Input resolution of the classifier (square)
pub const CLASSIFIER_INPUT_SIZE: usize = 299;

/// Interpolation filter for every resize in the pipeline (bilinear)
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Build the fused classifier input from raw image bytes.
///
/// Runs the full preprocessing sequence, invoking the mask network on the
/// way. The result always has shape
/// `[1, 4, CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE]` with every value
/// in [0, 1], regardless of the input image's resolution or aspect ratio.
pub fn fused_input<B: Backend>(
    bytes: &[u8],
    mask_net: &MaskNet<B>,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let original = preprocess::decode_image(bytes)?;
    let (width, height) = original.dimensions();
    debug!("decoded image {}x{}", width, height);

    // Mask branch: 256x256 copy -> saliency probabilities
    let mask_view = preprocess::resize_rgb(
        &original,
        MASK_INPUT_SIZE as u32,
        MASK_INPUT_SIZE as u32,
    );
    let mask_input = preprocess::to_unit_tensor::<B>(&mask_view, device);
    let mask = sigmoid(mask_net.forward(mask_input));
    let mask = preprocess::resize_mask(mask, CLASSIFIER_INPUT_SIZE);

    // Classifier branch: resize the original image, not the 256x256 copy
    let rgb_view = preprocess::resize_rgb(
        &original,
        CLASSIFIER_INPUT_SIZE as u32,
        CLASSIFIER_INPUT_SIZE as u32,
    );
    let rgb = preprocess::to_unit_tensor::<B>(&rgb_view, device);

    let fused = preprocess::fuse(rgb, mask)?;

    let dims = fused.dims();
    let expected = [1, 4, CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE];
    if dims != expected {
        return Err(LeafsightError::ShapeMismatch {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", dims),
        });
    }

    Ok(fused)
}
