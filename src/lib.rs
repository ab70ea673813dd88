//! # pdq-rs — PDQ Perceptual Hashing in Clean Rust
//!
//! A reimplementation of the PDQ 256-bit perceptual image fingerprint and
//! its multi-index Hamming search structure.
//!
//! ## Design Principles
//!
//! 1. **Values, not handles**: [`Hash256`] is a plain `Copy` value. Build it,
//!    compare it, print it
//! 2. **Caller-owned buffers**: the hasher works in two caller-provided
//!    rows×cols float planes and never allocates on the hot path
//! 3. **Capability, not class tree**: [`BufferHasher`] is the contract between
//!    frame producers and hash consumers; implementations are picked by tag
//! 4. **Exact search only**: [`Mih256`] answers radius-bounded Hamming queries
//!    precisely, with no approximation and no ranking model
//!
//! ## Quick Start
//!
//! ```rust
//! use pdq_rs::{hashing, raster, Mih256};
//!
//! # fn example() -> pdq_rs::Result<()> {
//! // Hash an already-decoded grayscale raster (rows × cols, 8-bit).
//! let (rows, cols) = (480usize, 640usize);
//! let pixels = vec![0u8; rows * cols];
//! let mut luma = raster::luma_from_gray8(&pixels, rows, cols);
//! let mut scratch = vec![0.0f32; rows * cols];
//! let (hash, quality) = hashing::hash256_from_float_luma(&mut luma, &mut scratch, rows, cols);
//!
//! // Index it, then look for near-duplicates within 31 bits.
//! let mut index = Mih256::new();
//! index.insert(hash, "frame-0001".to_string());
//! let matches = index.query(&hash, 31)?;
//! assert_eq!(*matches[0].metadata, "frame-0001");
//! let _ = quality;
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! | Component | Module | Description |
//! |-----------|--------|-------------|
//! | `Hash256` | `hash` | 256-bit fingerprint value: bits, distance, text form |
//! | Downscaler + PDQ transform | `hashing` | Jarosz filter, 64×64 decimation, DCT, median bits, dihedral variants |
//! | MIH | `index` | Sub-linear radius-bounded Hamming search |
//! | Hash I/O | `io` | Hash-per-line and video fingerprint text formats |
//! | Video | `video` | Per-frame fingerprints and brute-force stream matching |

// ============================================================================
// Modules
// ============================================================================

pub mod hash;
pub mod hashing;
pub mod index;
pub mod io;
pub mod raster;
pub mod video;

// ============================================================================
// Re-exports: Hash value
// ============================================================================

pub use hash::Hash256;

// ============================================================================
// Re-exports: Hashing
// ============================================================================

pub use hashing::{
    BufferHasher, DctOutput, Dihedral, DihedralHashes, HasherKind, PdqHasher,
    MIN_HASHABLE_DIM,
};

// ============================================================================
// Re-exports: Index
// ============================================================================

pub use index::{Flat256, Mih256, QueryMatch, SharedMih256};

// ============================================================================
// Re-exports: Video
// ============================================================================

pub use video::{StreamMatch, VideoFeature};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hash text failed to parse: wrong length, a non-hex byte, or
    /// trailing input.
    #[error("malformed hash: {message}")]
    MalformedHash { message: String },

    /// MIH query radius outside 0..=256.
    #[error("bad radius {radius}: must be within 0..=256")]
    BadRadius { radius: u32 },

    /// A hash or video-feature record ended before all its fields.
    #[error("truncated record at line {line}: {message}")]
    Truncated { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
