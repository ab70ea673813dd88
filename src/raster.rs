//! Luma plane extraction.
//!
//! The hashing core consumes row-major `f32` luma planes; decoding stays
//! outside. These helpers produce that plane from the two raw layouts that
//! actually occur, interleaved 8-bit RGB and 8-bit grayscale, with the
//! fixed Rec. 601 weights, so a hash never depends on a decoder's own
//! grayscale conversion. The `image` feature adds a `DynamicImage` front
//! end and one-call photo hashing on top.

pub const LUMA_FROM_R_COEFF: f32 = 0.299;
pub const LUMA_FROM_G_COEFF: f32 = 0.587;
pub const LUMA_FROM_B_COEFF: f32 = 0.114;

/// Fill `luma` from interleaved RGB8, row-major.
///
/// # Panics
///
/// Panics if `rgb.len() != rows·cols·3` or `luma.len() != rows·cols`.
pub fn fill_luma_from_rgb8(rgb: &[u8], num_rows: usize, num_cols: usize, luma: &mut [f32]) {
    assert_eq!(rgb.len(), num_rows * num_cols * 3, "rgb must be rows × cols × 3");
    assert_eq!(luma.len(), num_rows * num_cols, "luma must be rows × cols");
    for (px, out) in rgb.chunks_exact(3).zip(luma.iter_mut()) {
        *out = LUMA_FROM_R_COEFF * px[0] as f32
            + LUMA_FROM_G_COEFF * px[1] as f32
            + LUMA_FROM_B_COEFF * px[2] as f32;
    }
}

/// Fill `luma` from 8-bit grayscale, row-major. Direct cast.
///
/// # Panics
///
/// Panics if buffer lengths disagree with `rows·cols`.
pub fn fill_luma_from_gray8(gray: &[u8], num_rows: usize, num_cols: usize, luma: &mut [f32]) {
    assert_eq!(gray.len(), num_rows * num_cols, "gray must be rows × cols");
    assert_eq!(luma.len(), num_rows * num_cols, "luma must be rows × cols");
    for (&g, out) in gray.iter().zip(luma.iter_mut()) {
        *out = g as f32;
    }
}

/// Allocating variant of [`fill_luma_from_rgb8`].
pub fn luma_from_rgb8(rgb: &[u8], num_rows: usize, num_cols: usize) -> Vec<f32> {
    let mut luma = vec![0.0f32; num_rows * num_cols];
    fill_luma_from_rgb8(rgb, num_rows, num_cols, &mut luma);
    luma
}

/// Allocating variant of [`fill_luma_from_gray8`].
pub fn luma_from_gray8(gray: &[u8], num_rows: usize, num_cols: usize) -> Vec<f32> {
    let mut luma = vec![0.0f32; num_rows * num_cols];
    fill_luma_from_gray8(gray, num_rows, num_cols, &mut luma);
    luma
}

// ============================================================================
// Decoded-image front end (feature = "image")
// ============================================================================

/// Luma plane of a decoded image as `(rows, cols, plane)`.
///
/// Luma8 sources cast directly; everything else converts through RGB8 and
/// the fixed coefficients above.
#[cfg(feature = "image")]
pub fn luma_from_image(img: &image::DynamicImage) -> (usize, usize, Vec<f32>) {
    match img {
        image::DynamicImage::ImageLuma8(gray) => {
            let (rows, cols) = (gray.height() as usize, gray.width() as usize);
            (rows, cols, luma_from_gray8(gray.as_raw(), rows, cols))
        }
        other => {
            let rgb = other.to_rgb8();
            let (rows, cols) = (rgb.height() as usize, rgb.width() as usize);
            (rows, cols, luma_from_rgb8(rgb.as_raw(), rows, cols))
        }
    }
}

/// Fingerprint a decoded image in one call.
#[cfg(feature = "image")]
pub fn hash_image(img: &image::DynamicImage) -> (crate::Hash256, u32) {
    let (rows, cols, mut luma) = luma_from_image(img);
    let mut scratch = vec![0.0f32; rows * cols];
    crate::hashing::hash256_from_float_luma(&mut luma, &mut scratch, rows, cols)
}

/// All eight orientation hashes of a decoded image in one call.
#[cfg(feature = "image")]
pub fn dihedral_hash_image(img: &image::DynamicImage) -> (crate::hashing::DihedralHashes, u32) {
    let (rows, cols, mut luma) = luma_from_image(img);
    let mut scratch = vec![0.0f32; rows * cols];
    crate::hashing::dihedral_hashes_from_float_luma(&mut luma, &mut scratch, rows, cols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_uses_the_fixed_weights() {
        let rgb = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let luma = luma_from_rgb8(&rgb, 1, 4);
        assert!((luma[0] - 255.0 * 0.299).abs() < 1e-4);
        assert!((luma[1] - 255.0 * 0.587).abs() < 1e-4);
        assert!((luma[2] - 255.0 * 0.114).abs() < 1e-4);
        assert!((luma[3] - 255.0).abs() < 1e-3);
    }

    #[test]
    fn gray_casts_directly() {
        let gray = [0u8, 1, 127, 255];
        let luma = luma_from_gray8(&gray, 2, 2);
        assert_eq!(luma, vec![0.0, 1.0, 127.0, 255.0]);
    }

    #[test]
    #[should_panic(expected = "rgb must be rows × cols × 3")]
    fn rgb_length_mismatch_panics() {
        let _ = luma_from_rgb8(&[0u8; 10], 2, 2);
    }

    #[cfg(feature = "image")]
    #[test]
    fn decoded_gray_and_rgb_gray_agree() {
        // A gray ramp stored as Luma8 and as RGB8 must hash identically.
        let (rows, cols) = (32u32, 48u32);
        let gray = image::GrayImage::from_fn(cols, rows, |x, y| {
            image::Luma([((x * 5 + y * 3) % 256) as u8])
        });
        let rgb = image::RgbImage::from_fn(cols, rows, |x, y| {
            let v = ((x * 5 + y * 3) % 256) as u8;
            image::Rgb([v, v, v])
        });
        let (h_gray, q_gray) = hash_image(&image::DynamicImage::ImageLuma8(gray));
        let (h_rgb, q_rgb) = hash_image(&image::DynamicImage::ImageRgb8(rgb));
        // R+G+B weights sum to 1.0, so a neutral pixel keeps its value
        // up to float rounding.
        assert!(h_gray.hamming_distance(&h_rgb) <= 2);
        assert!(q_gray.abs_diff(q_rgb) <= 1);
    }
}
