//! The raster-to-fingerprint transform.
//!
//! Pipeline: float luma plane → Jarosz box filtering → 64×64 decimation →
//! 16×16 DCT block → median threshold → 256 bits, with an image-domain
//! quality score read off the downsample. The seven rotated/flipped
//! variants are derived from the same DCT block at O(256) each, so hashing
//! all eight orientations costs one transform plus pocket change.
//!
//! The transform is synchronous, never allocates beyond its small fixed
//! intermediates, and works in two caller-provided rows×cols buffers. It
//! never logs and never fails: rasters under 5×5 yield the cleared hash
//! with quality 0.

pub mod dct;
pub mod downscale;
pub mod torben;

pub use dct::{DCT_DIM, DctOutput, Dihedral, DihedralHashes};
pub use downscale::DOWNSAMPLE_DIM;

use serde::{Deserialize, Serialize};

use crate::hash::Hash256;

/// Rasters with either side below this yield the cleared hash and quality 0.
pub const MIN_HASHABLE_DIM: usize = 5;

/// X-Y box passes; two passes make the tent response.
const NUM_JAROSZ_XY_PASSES: usize = 2;

// ============================================================================
// Pipeline
// ============================================================================

/// Downscale and transform, stopping at the coefficient block.
///
/// `luma` is both input and working storage; `scratch` must have the same
/// length. Returns `None` when the raster is below the 5×5 floor.
///
/// # Panics
///
/// Panics if either buffer length differs from `num_rows * num_cols`.
pub fn dct_from_float_luma(
    luma: &mut [f32],
    scratch: &mut [f32],
    num_rows: usize,
    num_cols: usize,
) -> Option<(DctOutput, u32)> {
    assert_eq!(luma.len(), num_rows * num_cols, "luma must be rows × cols");
    assert_eq!(scratch.len(), num_rows * num_cols, "scratch must be rows × cols");

    if num_rows < MIN_HASHABLE_DIM || num_cols < MIN_HASHABLE_DIM {
        return None;
    }

    let window_along_rows = downscale::jarosz_window_size(num_cols);
    let window_along_cols = downscale::jarosz_window_size(num_rows);
    downscale::jarosz_filter(
        luma,
        scratch,
        num_rows,
        num_cols,
        window_along_rows,
        window_along_cols,
        NUM_JAROSZ_XY_PASSES,
    );

    let buffer64 = downscale::decimate(luma, num_rows, num_cols);
    let quality = image_domain_quality(&buffer64);
    Some((dct::dct_64_to_16(&buffer64), quality))
}

/// 256-bit fingerprint plus quality from a row-major float luma plane.
///
/// The failure-free contract: rasters below 5×5 return the all-zero hash
/// with quality 0.
pub fn hash256_from_float_luma(
    luma: &mut [f32],
    scratch: &mut [f32],
    num_rows: usize,
    num_cols: usize,
) -> (Hash256, u32) {
    match dct_from_float_luma(luma, scratch, num_rows, num_cols) {
        Some((block, quality)) => (block.to_hash(), quality),
        None => (Hash256::new(), 0),
    }
}

/// All eight orientation hashes plus quality, sharing one DCT.
///
/// Below the 5×5 floor every hash comes back cleared and quality is 0.
pub fn dihedral_hashes_from_float_luma(
    luma: &mut [f32],
    scratch: &mut [f32],
    num_rows: usize,
    num_cols: usize,
) -> (DihedralHashes, u32) {
    match dct_from_float_luma(luma, scratch, num_rows, num_cols) {
        Some((block, quality)) => (DihedralHashes::from_dct(&block), quality),
        None => (DihedralHashes::default(), 0),
    }
}

// ============================================================================
// Quality
// ============================================================================

/// Gradient density of the 64×64 downsample, scaled into 0..=100.
///
/// Sums `|trunc((u - v)·100/255)|` over all vertically and horizontally
/// adjacent pairs, then divides by 90 and clamps. The quantization counts
/// significant gradients rather than accumulating many tiny ones; the
/// truncation order is load-bearing for reproducing published values.
pub fn image_domain_quality(b: &[[f32; DOWNSAMPLE_DIM]; DOWNSAMPLE_DIM]) -> u32 {
    let mut gradient_sum = 0i32;

    for i in 0..DOWNSAMPLE_DIM - 1 {
        for j in 0..DOWNSAMPLE_DIM {
            let d = ((b[i][j] - b[i + 1][j]) * 100.0 / 255.0) as i32;
            gradient_sum += d.abs();
        }
    }
    for i in 0..DOWNSAMPLE_DIM {
        for j in 0..DOWNSAMPLE_DIM - 1 {
            let d = ((b[i][j] - b[i][j + 1]) * 100.0 / 255.0) as i32;
            gradient_sum += d.abs();
        }
    }

    (gradient_sum / 90).min(100) as u32
}

// ============================================================================
// Hasher capability
// ============================================================================

/// The contract between frame producers and hash consumers: turn a luma
/// buffer into a fingerprint and a quality score.
///
/// `luma` is consumed as working storage; `scratch` must match its length.
pub trait BufferHasher: Send + Sync {
    fn hash_buffer(
        &self,
        luma: &mut [f32],
        scratch: &mut [f32],
        num_rows: usize,
        num_cols: usize,
    ) -> (Hash256, u32);
}

/// The PDQ transform, the one hasher this crate ships.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdqHasher;

impl BufferHasher for PdqHasher {
    fn hash_buffer(
        &self,
        luma: &mut [f32],
        scratch: &mut [f32],
        num_rows: usize,
        num_cols: usize,
    ) -> (Hash256, u32) {
        hash256_from_float_luma(luma, scratch, num_rows, num_cols)
    }
}

/// Tag for selecting a hasher implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    Pdq,
}

impl HasherKind {
    pub fn hasher(self) -> &'static dyn BufferHasher {
        match self {
            HasherKind::Pdq => &PdqHasher,
        }
    }
}
