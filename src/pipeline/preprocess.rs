//! Preprocessing Steps
//!
//! Individual deterministic transforms used by the fusion pipeline: image
//! decoding with an explicit RGB channel policy, resizing under the fixed
//! interpolation filter, [0,1] scaling into CHW tensors, mask resizing, and
//! the channel fusion itself.
//!
//! These steps replicate the transforms the classifier weights were trained
//! with; changing the filter or channel order silently degrades accuracy
//! without raising errors, so both are fixed constants here.

use burn::tensor::{
    backend::Backend,
    module::interpolate,
    ops::{InterpolateMode, InterpolateOptions},
    Tensor,
};
use image::RgbImage;

use crate::pipeline::RESIZE_FILTER;
use crate::utils::error::{LeafsightError, Result};

/// Decode raw image bytes into an 8-bit RGB pixel grid.
///
/// Channel policy: the decoded image is converted to red-green-blue order.
/// Inputs with an alpha channel or a single luma channel are auto-converted
/// (alpha dropped, luma replicated) rather than rejected.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(LeafsightError::Decode("empty image payload".to_string()));
    }

    let decoded = image::load_from_memory(bytes)?;
    Ok(decoded.to_rgb8())
}

/// Resize an RGB image to the target dimensions with the fixed filter
pub fn resize_rgb(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    image::imageops::resize(image, width, height, RESIZE_FILTER)
}

/// Scale an RGB image from u8 [0,255] to f32 [0,1] and lay it out as a
/// CHW tensor with a leading batch dimension: [1, 3, height, width].
pub fn to_unit_tensor<B: Backend>(image: &RgbImage, device: &B::Device) -> Tensor<B, 4> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut pixels: Vec<f32> = Vec::with_capacity(3 * h * w);
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let pixel = image.get_pixel(x as u32, y as u32);
                pixels.push(pixel[c] as f32 / 255.0);
            }
        }
    }

    Tensor::<B, 1>::from_floats(pixels.as_slice(), device).reshape([1, 3, h, w])
}

/// Resize a single-channel probability map to a new square resolution using
/// bilinear interpolation, staying on the tensor device.
pub fn resize_mask<B: Backend>(mask: Tensor<B, 4>, size: usize) -> Tensor<B, 4> {
    interpolate(
        mask,
        [size, size],
        InterpolateOptions::new(InterpolateMode::Bilinear),
    )
}

/// Concatenate normalized RGB channels with the mask probability channel into
/// the 4-channel tensor the classifier expects.
pub fn fuse<B: Backend>(rgb: Tensor<B, 4>, mask: Tensor<B, 4>) -> Result<Tensor<B, 4>> {
    let [rb, rc, rh, rw] = rgb.dims();
    let [mb, mc, mh, mw] = mask.dims();

    if rc != 3 {
        return Err(LeafsightError::ShapeMismatch {
            expected: format!("[{}, 3, {}, {}]", rb, rh, rw),
            actual: format!("[{}, {}, {}, {}]", rb, rc, rh, rw),
        });
    }
    if mb != rb || mc != 1 || mh != rh || mw != rw {
        return Err(LeafsightError::ShapeMismatch {
            expected: format!("[{}, 1, {}, {}]", rb, rh, rw),
            actual: format!("[{}, {}, {}, {}]", mb, mc, mh, mw),
        });
    }

    Ok(Tensor::cat(vec![rgb, mask], 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    type TestBackend = NdArray;

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, LeafsightError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        let err = decode_image(&[]).unwrap_err();
        assert!(matches!(err, LeafsightError::Decode(_)));
    }

    #[test]
    fn test_decode_valid_png() {
        let img = RgbImage::from_pixel(20, 10, Rgb([10, 20, 30]));
        let bytes = encode_png(DynamicImage::ImageRgb8(img));

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_decode_converts_rgba_and_grayscale() {
        let rgba = image::RgbaImage::from_pixel(8, 8, image::Rgba([50, 100, 150, 128]));
        let decoded = decode_image(&encode_png(DynamicImage::ImageRgba8(rgba))).unwrap();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([50, 100, 150]));

        let gray = image::GrayImage::from_pixel(8, 8, image::Luma([77]));
        let decoded = decode_image(&encode_png(DynamicImage::ImageLuma8(gray))).unwrap();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([77, 77, 77]));
    }

    #[test]
    fn test_resize_solid_color_stays_solid() {
        let img = RgbImage::from_pixel(100, 60, Rgb([120, 60, 240]));
        let resized = resize_rgb(&img, 256, 256);

        assert_eq!(resized.dimensions(), (256, 256));
        assert_eq!(resized.get_pixel(128, 128), &Rgb([120, 60, 240]));
    }

    #[test]
    fn test_to_unit_tensor_layout_and_scale() {
        let device = Default::default();
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 0, 51]));

        let tensor = to_unit_tensor::<TestBackend>(&img, &device);
        assert_eq!(tensor.dims(), [1, 3, 4, 4]);

        let values: Vec<f32> = tensor.into_data().to_vec().unwrap();
        // CHW layout: first 16 values red, then green, then blue
        assert!((values[0] - 1.0).abs() < 1e-6);
        assert!((values[16] - 0.0).abs() < 1e-6);
        assert!((values[32] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_resize_mask_shape_and_range() {
        let device = Default::default();
        let mask = Tensor::<TestBackend, 4>::full([1, 1, 256, 256], 0.5, &device);

        let resized = resize_mask(mask, 299);
        assert_eq!(resized.dims(), [1, 1, 299, 299]);

        let values: Vec<f32> = resized.into_data().to_vec().unwrap();
        assert!(values.iter().all(|&v| (v - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_fuse_produces_four_channels() {
        let device = Default::default();
        let rgb = Tensor::<TestBackend, 4>::zeros([1, 3, 299, 299], &device);
        let mask = Tensor::<TestBackend, 4>::full([1, 1, 299, 299], 0.5, &device);

        let fused = fuse(rgb, mask).unwrap();
        assert_eq!(fused.dims(), [1, 4, 299, 299]);

        // The fourth channel is the mask, untouched by fusion.
        let values: Vec<f32> = fused.into_data().to_vec().unwrap();
        let channel = 299 * 299;
        assert!(values[3 * channel..].iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_fuse_rejects_mismatched_shapes() {
        let device = Default::default();
        let rgb = Tensor::<TestBackend, 4>::zeros([1, 3, 299, 299], &device);
        let mask = Tensor::<TestBackend, 4>::zeros([1, 1, 256, 256], &device);

        let err = fuse(rgb, mask).unwrap_err();
        assert!(matches!(err, LeafsightError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_fuse_rejects_multi_channel_mask() {
        let device = Default::default();
        let rgb = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let mask = Tensor::<TestBackend, 4>::zeros([1, 2, 32, 32], &device);

        let err = fuse(rgb, mask).unwrap_err();
        assert!(matches!(err, LeafsightError::ShapeMismatch { .. }));
    }
}
