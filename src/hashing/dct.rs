//! The 16×64 DCT basis and the 16×16 coefficient block.
//!
//! Only the sixteen lowest AC frequencies of the full 64-point DCT-II are
//! ever needed, so the transform multiplies with a fixed 16×64 slice of the
//! basis instead of running a fast full-size DCT: `B = D · A · Dᵀ` with one
//! 16×64 intermediate. Row `i` of `D` is frequency `i + 1` with the uniform
//! `√(2/64)` normalization. There is no DC row, which is also what keeps
//! the dihedral sign templates below exact under transpose and mirroring.
//!
//! The matrix is a process-wide constant published once through `OnceLock`;
//! initialization is value-only and idempotent, so a first-call race is
//! harmless.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::torben::torben;
use crate::hash::Hash256;

/// Side length of the coefficient block.
pub const DCT_DIM: usize = 16;

static DCT_MATRIX: OnceLock<[[f32; 64]; 16]> = OnceLock::new();

/// `D[i][j] = √(2/64) · cos((π/128) · (i+1) · (2j+1))`, computed in f64 and
/// stored as f32.
fn dct_matrix() -> &'static [[f32; 64]; 16] {
    DCT_MATRIX.get_or_init(|| {
        let scale = (2.0f64 / 64.0).sqrt();
        let mut d = [[0.0f32; 64]; 16];
        for (i, row) in d.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                let angle =
                    std::f64::consts::PI / 128.0 * ((i + 1) as f64) * ((2 * j + 1) as f64);
                *v = (scale * angle.cos()) as f32;
            }
        }
        d
    })
}

/// Low-frequency 2-D DCT of the 64×64 downsample.
///
/// Straight matrix products with sequential accumulation over `k`; computing
/// only the needed 16×64 and 16×16 slices beats clever full-size transforms
/// at this shape.
pub fn dct_64_to_16(a: &[[f32; 64]; 64]) -> DctOutput {
    let d = dct_matrix();

    // T = D · A
    let mut t = [[0.0f32; 64]; 16];
    for i in 0..DCT_DIM {
        for j in 0..64 {
            let mut sum = 0.0f32;
            for (k, row) in a.iter().enumerate() {
                sum += d[i][k] * row[j];
            }
            t[i][j] = sum;
        }
    }

    // B = T · Dᵀ
    let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
    for i in 0..DCT_DIM {
        for j in 0..DCT_DIM {
            let mut sum = 0.0f32;
            for k in 0..64 {
                sum += t[i][k] * d[j][k];
            }
            b[i][j] = sum;
        }
    }

    DctOutput(b)
}

// ============================================================================
// Coefficient block
// ============================================================================

/// The 16×16 DCT coefficient block: the shared intermediate all eight
/// orientation hashes are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DctOutput(pub [[f32; DCT_DIM]; DCT_DIM]);

impl DctOutput {
    /// Threshold against the block's own median: bit `i·16 + j` is set iff
    /// the coefficient is strictly greater. Ties fall to zero, which is why
    /// the median must be an element of the block (Torben) rather than an
    /// interpolated midpoint.
    pub fn to_hash(&self) -> Hash256 {
        let mut flat = [0.0f32; DCT_DIM * DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            flat[i * DCT_DIM..(i + 1) * DCT_DIM].copy_from_slice(row);
        }
        let median = torben(&flat);

        let mut hash = Hash256::new();
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                if c > median {
                    hash.set_bit(i * DCT_DIM + j);
                }
            }
        }
        hash
    }

    /// The block of the given orientation, by sign-and-transpose template.
    /// O(256); the expensive DCT is shared across all eight.
    pub fn transformed(&self, d: Dihedral) -> DctOutput {
        match d {
            Dihedral::Original => *self,
            Dihedral::Rotate90 => self.rotate90(),
            Dihedral::Rotate180 => self.rotate180(),
            Dihedral::Rotate270 => self.rotate270(),
            Dihedral::FlipX => self.flip_x(),
            Dihedral::FlipY => self.flip_y(),
            Dihedral::FlipPlus => self.flip_plus(),
            Dihedral::FlipMinus => self.flip_minus(),
        }
    }

    /// Hash of the given orientation, re-thresholded against that
    /// orientation's own median.
    pub fn hash_for(&self, d: Dihedral) -> Hash256 {
        self.transformed(d).to_hash()
    }

    // The sign templates. `+` copies, `-` negates; the transposing variants
    // write B[j][i].
    //
    // orig      rot90     rot180    rot270
    // noxpose   xpose     noxpose   xpose
    // + + + +   - + - +   + - + -   - - - -
    // + + + +   - + - +   - + - +   + + + +
    // + + + +   - + - +   + - + -   - - - -
    // + + + +   - + - +   - + - +   + + + +
    //
    // flipx     flipy     flipplus  flipminus
    // noxpose   noxpose   xpose     xpose
    // - - - -   - + - +   + + + +   + - + -
    // + + + +   - + - +   + + + +   - + - +
    // - - - -   - + - +   + + + +   + - + -
    // + + + +   - + - +   + + + +   - + - +

    fn rotate90(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[j][i] = if j & 1 != 0 { c } else { -c };
            }
        }
        DctOutput(b)
    }

    fn rotate180(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[i][j] = if (i + j) & 1 != 0 { -c } else { c };
            }
        }
        DctOutput(b)
    }

    fn rotate270(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[j][i] = if i & 1 != 0 { c } else { -c };
            }
        }
        DctOutput(b)
    }

    fn flip_x(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[i][j] = if i & 1 != 0 { c } else { -c };
            }
        }
        DctOutput(b)
    }

    fn flip_y(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[i][j] = if j & 1 != 0 { c } else { -c };
            }
        }
        DctOutput(b)
    }

    fn flip_plus(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[j][i] = c;
            }
        }
        DctOutput(b)
    }

    fn flip_minus(&self) -> DctOutput {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                b[j][i] = if (i + j) & 1 != 0 { -c } else { c };
            }
        }
        DctOutput(b)
    }
}

// ============================================================================
// Orientations
// ============================================================================

/// The eight orientations of a square raster: identity, three rotations,
/// four reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dihedral {
    Original,
    Rotate90,
    Rotate180,
    Rotate270,
    /// Mirror top-to-bottom.
    FlipX,
    /// Mirror left-to-right.
    FlipY,
    /// Reflect across the main diagonal (transpose).
    FlipPlus,
    /// Reflect across the anti-diagonal.
    FlipMinus,
}

impl Dihedral {
    pub const ALL: [Dihedral; 8] = [
        Dihedral::Original,
        Dihedral::Rotate90,
        Dihedral::Rotate180,
        Dihedral::Rotate270,
        Dihedral::FlipX,
        Dihedral::FlipY,
        Dihedral::FlipPlus,
        Dihedral::FlipMinus,
    ];
}

/// All eight orientation hashes of one raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DihedralHashes {
    pub original: Hash256,
    pub rotate90: Hash256,
    pub rotate180: Hash256,
    pub rotate270: Hash256,
    pub flip_x: Hash256,
    pub flip_y: Hash256,
    pub flip_plus: Hash256,
    pub flip_minus: Hash256,
}

impl DihedralHashes {
    /// Derive all eight from one coefficient block.
    pub fn from_dct(dct: &DctOutput) -> Self {
        Self {
            original: dct.hash_for(Dihedral::Original),
            rotate90: dct.hash_for(Dihedral::Rotate90),
            rotate180: dct.hash_for(Dihedral::Rotate180),
            rotate270: dct.hash_for(Dihedral::Rotate270),
            flip_x: dct.hash_for(Dihedral::FlipX),
            flip_y: dct.hash_for(Dihedral::FlipY),
            flip_plus: dct.hash_for(Dihedral::FlipPlus),
            flip_minus: dct.hash_for(Dihedral::FlipMinus),
        }
    }

    pub fn get(&self, d: Dihedral) -> Hash256 {
        match d {
            Dihedral::Original => self.original,
            Dihedral::Rotate90 => self.rotate90,
            Dihedral::Rotate180 => self.rotate180,
            Dihedral::Rotate270 => self.rotate270,
            Dihedral::FlipX => self.flip_x,
            Dihedral::FlipY => self.flip_y,
            Dihedral::FlipPlus => self.flip_plus,
            Dihedral::FlipMinus => self.flip_minus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_rows_are_orthonormal() {
        let d = dct_matrix();
        for i in 0..DCT_DIM {
            let norm: f64 = d[i].iter().map(|&v| (v as f64) * (v as f64)).sum();
            assert!((norm - 1.0).abs() < 1e-4, "row {i} norm {norm}");
            for j in (i + 1)..DCT_DIM {
                let dot: f64 = d[i]
                    .iter()
                    .zip(&d[j])
                    .map(|(&a, &b)| (a as f64) * (b as f64))
                    .sum();
                assert!(dot.abs() < 1e-4, "rows {i},{j} dot {dot}");
            }
        }
    }

    #[test]
    fn matrix_first_entry_is_lowest_frequency() {
        let d = dct_matrix();
        let expected = (2.0f64 / 64.0).sqrt() * (std::f64::consts::PI / 128.0).cos();
        assert!((d[0][0] as f64 - expected).abs() < 1e-6);
        // No DC row: every row alternates sign somewhere.
        for (i, row) in d.iter().enumerate() {
            assert!(row.iter().any(|&v| v < 0.0), "row {i} never goes negative");
        }
    }

    #[test]
    fn dct_of_single_basis_pattern_concentrates() {
        // A[k][j] following basis row 2 in k should light up B[2][?] only
        // through the j-profile; use a separable product so exactly one
        // coefficient dominates.
        let d = dct_matrix();
        let mut a = [[0.0f32; 64]; 64];
        for (k, row) in a.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = d[2][k] * d[5][j];
            }
        }
        let b = dct_64_to_16(&a).0;
        assert!((b[2][5] - 1.0).abs() < 1e-3, "b[2][5] = {}", b[2][5]);
        for (i, row) in b.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if (i, j) != (2, 5) {
                    assert!(v.abs() < 1e-3, "b[{i}][{j}] = {v}");
                }
            }
        }
    }

    #[test]
    fn half_high_half_low_block_has_popcount_128() {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in b.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = if (i * DCT_DIM + j) < 128 { 0.0 } else { 1.0 };
            }
        }
        let h = DctOutput(b).to_hash();
        assert_eq!(h.popcount(), 128);
    }

    #[test]
    fn distinct_block_bisects_at_the_median() {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in b.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                // 256 distinct values in a scrambled order.
                let k = (i * DCT_DIM + j) ^ 0x95;
                *v = k as f32 * 1.5 - 200.0;
            }
        }
        let h = DctOutput(b).to_hash();
        assert_eq!(h.popcount(), 128);
    }

    #[test]
    fn templates_are_involutions_or_cycles() {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in b.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (i * 16 + j) as f32 * 0.5 - 60.0;
            }
        }
        let orig = DctOutput(b);

        let r = orig.transformed(Dihedral::Rotate90);
        let r2 = r.transformed(Dihedral::Rotate90);
        let r3 = r2.transformed(Dihedral::Rotate90);
        let r4 = r3.transformed(Dihedral::Rotate90);
        assert_eq!(r4, orig);

        for d in [
            Dihedral::Rotate180,
            Dihedral::FlipX,
            Dihedral::FlipY,
            Dihedral::FlipPlus,
            Dihedral::FlipMinus,
        ] {
            assert_eq!(orig.transformed(d).transformed(d), orig, "{d:?} twice");
        }
    }

    #[test]
    fn hash_for_original_is_to_hash() {
        let mut b = [[0.0f32; DCT_DIM]; DCT_DIM];
        for (i, row) in b.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = ((i as f32) - 7.5) * ((j as f32) - 3.25);
            }
        }
        let dct = DctOutput(b);
        assert_eq!(dct.hash_for(Dihedral::Original), dct.to_hash());
        let all = DihedralHashes::from_dct(&dct);
        for d in Dihedral::ALL {
            assert_eq!(all.get(d), dct.hash_for(d));
        }
    }
}
