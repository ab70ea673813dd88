//! Per-frame video fingerprints.
//!
//! A video's fingerprint is simply the sequence of frame hashes with their
//! quality scores and timestamps: demuxing and frame decode live outside,
//! each decoded frame's luma plane comes through the buffer hasher, and two
//! such sequences are compared pairwise. Frames whose quality falls below a
//! caller threshold (near-blank or over-blurred material) are left out of
//! the comparison on both sides.
//!
//! Matching follows the family-wide tolerance convention: a pair of frames
//! matches when their Hamming distance is **strictly less than** the
//! distance tolerance.

use serde::{Deserialize, Serialize};

use crate::hash::Hash256;
use crate::hashing::{BufferHasher, PdqHasher};

/// Fingerprint of one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoFeature {
    /// Index of the frame in decode order.
    pub frame_number: u64,
    pub hash: Hash256,
    /// Gradient-density quality of the frame, 0..=100.
    pub quality: u32,
    /// Presentation time in seconds.
    pub timestamp: f64,
}

/// Hash one decoded frame. `luma` is consumed as working storage.
pub fn hash_frame(
    luma: &mut [f32],
    scratch: &mut [f32],
    num_rows: usize,
    num_cols: usize,
    frame_number: u64,
    timestamp: f64,
) -> VideoFeature {
    let (hash, quality) = PdqHasher.hash_buffer(luma, scratch, num_rows, num_cols);
    VideoFeature { frame_number, hash, quality, timestamp }
}

// ============================================================================
// Brute-force stream comparison
// ============================================================================

/// Outcome of comparing two fingerprint streams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamMatch {
    /// Percentage of the query's qualified frames that match some qualified
    /// target frame, 0.0..=100.0.
    pub query_matched: f64,
    /// Percentage of the target's qualified frames that match some
    /// qualified query frame.
    pub target_matched: f64,
}

/// Compare two fingerprint streams pairwise.
///
/// Frames with `quality < quality_tolerance` are dropped from both streams
/// before comparison; a frame matches when some surviving frame on the
/// other side lies strictly under `distance_tolerance` bits away. A stream
/// with no surviving frames scores 0.
pub fn match_two_feature_streams_brute(
    query: &[VideoFeature],
    target: &[VideoFeature],
    distance_tolerance: u32,
    quality_tolerance: u32,
) -> StreamMatch {
    let q: Vec<&VideoFeature> =
        query.iter().filter(|f| f.quality >= quality_tolerance).collect();
    let t: Vec<&VideoFeature> =
        target.iter().filter(|f| f.quality >= quality_tolerance).collect();

    StreamMatch {
        query_matched: matched_fraction(&q, &t, distance_tolerance),
        target_matched: matched_fraction(&t, &q, distance_tolerance),
    }
}

fn matched_fraction(from: &[&VideoFeature], to: &[&VideoFeature], tolerance: u32) -> f64 {
    if from.is_empty() {
        return 0.0;
    }
    let matched = from
        .iter()
        .filter(|f| to.iter().any(|g| f.hash.hamming_distance(&g.hash) < tolerance))
        .count();
    matched as f64 * 100.0 / from.len() as f64
}
