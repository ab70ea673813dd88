//! Box-filter downscaling (Jarosz).
//!
//! Two X-Y passes of a 1-D box filter produce a 2-D tent (triangular)
//! low-pass response; center-sampling the filtered plane then yields the
//! 64×64 grid the transform works on. The filter runs in place across the
//! two caller-provided buffers; nothing here allocates.
//!
//! Boundary policy is clamp-on-short-tap: windows that hang off an edge
//! average over the samples that exist. No padding, no reflection.

/// Side length of the downsampled grid.
pub const DOWNSAMPLE_DIM: usize = 64;

/// A full-resolution dimension is split into this many windows per pass.
/// Two passes with half-block windows accumulate a full block of support
/// per output pixel.
const WINDOW_SIZE_DIVISOR: usize = 128;

/// Box window for one pass along a dimension of the given length.
#[inline]
pub fn jarosz_window_size(dimension: usize) -> usize {
    (dimension / WINDOW_SIZE_DIVISOR).max(2)
}

/// One 1-D box pass over a strided lane of `input`, writing the same lane of
/// `output`. Four phases: grow the window, emit with the growing window,
/// slide at full width, then emit with the shrinking window. Partial
/// windows divide by the live sample count.
fn box_1d(
    input: &[f32],
    output: &mut [f32],
    offset: usize,
    length: usize,
    stride: usize,
    window: usize,
) {
    debug_assert!(window <= length);
    let half = (window + 2) / 2;

    let grow_taps = half - 1;
    let head_taps = window - half + 1;
    let slide_taps = length - window;
    let tail_taps = half - 1;

    let mut li = 0usize; // left edge of the read window
    let mut ri = 0usize; // right edge of the read window
    let mut oi = 0usize; // write position

    let mut sum = 0.0f32;
    let mut live = 0usize;

    for _ in 0..grow_taps {
        sum += input[offset + ri * stride];
        live += 1;
        ri += 1;
    }
    for _ in 0..head_taps {
        sum += input[offset + ri * stride];
        live += 1;
        output[offset + oi * stride] = sum / live as f32;
        ri += 1;
        oi += 1;
    }
    for _ in 0..slide_taps {
        sum += input[offset + ri * stride];
        sum -= input[offset + li * stride];
        output[offset + oi * stride] = sum / live as f32;
        ri += 1;
        li += 1;
        oi += 1;
    }
    for _ in 0..tail_taps {
        sum -= input[offset + li * stride];
        live -= 1;
        output[offset + oi * stride] = sum / live as f32;
        li += 1;
        oi += 1;
    }
}

/// Box-filter every row of a rows×cols plane.
fn box_along_rows(input: &[f32], output: &mut [f32], rows: usize, cols: usize, window: usize) {
    for i in 0..rows {
        box_1d(input, output, i * cols, cols, 1, window);
    }
}

/// Box-filter every column of a rows×cols plane.
fn box_along_cols(input: &[f32], output: &mut [f32], rows: usize, cols: usize, window: usize) {
    for j in 0..cols {
        box_1d(input, output, j, rows, cols, window);
    }
}

/// The full X-Y-X-Y filter: `passes` repetitions of a row pass into
/// `scratch` followed by a column pass back into `luma`. The filtered plane
/// ends up in `luma`.
pub fn jarosz_filter(
    luma: &mut [f32],
    scratch: &mut [f32],
    rows: usize,
    cols: usize,
    window_along_rows: usize,
    window_along_cols: usize,
    passes: usize,
) {
    assert_eq!(luma.len(), rows * cols, "luma buffer must be rows × cols");
    assert_eq!(scratch.len(), rows * cols, "scratch buffer must be rows × cols");
    for _ in 0..passes {
        box_along_rows(luma, scratch, rows, cols, window_along_rows);
        box_along_cols(scratch, luma, rows, cols, window_along_cols);
    }
}

/// Center-sample the filtered plane down to 64×64:
/// `B[i][j] = A[(2i+1)·rows/128][(2j+1)·cols/128]`.
pub fn decimate(input: &[f32], rows: usize, cols: usize) -> [[f32; DOWNSAMPLE_DIM]; DOWNSAMPLE_DIM] {
    let mut out = [[0.0f32; DOWNSAMPLE_DIM]; DOWNSAMPLE_DIM];
    for (i, row) in out.iter_mut().enumerate() {
        let ini = ((2 * i + 1) * rows) / (2 * DOWNSAMPLE_DIM);
        for (j, v) in row.iter_mut().enumerate() {
            let inj = ((2 * j + 1) * cols) / (2 * DOWNSAMPLE_DIM);
            *v = input[ini * cols + inj];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference box filter: recompute each window sum from scratch.
    /// Output `oi` covers input `[oi + half - window, oi + half)` clamped to
    /// the vector, averaged over however many samples survive the clamp.
    fn box_1d_naive(input: &[f32], window: usize) -> Vec<f32> {
        let n = input.len();
        let half = (window + 2) / 2;
        let mut out = vec![0.0f32; n];
        for (oi, v) in out.iter_mut().enumerate() {
            let lo = (oi + half).saturating_sub(window);
            let hi = (oi + half).min(n);
            let slice = &input[lo..hi];
            *v = slice.iter().sum::<f32>() / slice.len() as f32;
        }
        out
    }

    #[test]
    fn window_size_floors_at_two() {
        assert_eq!(jarosz_window_size(5), 2);
        assert_eq!(jarosz_window_size(64), 2);
        assert_eq!(jarosz_window_size(255), 2);
        assert_eq!(jarosz_window_size(256), 2);
        assert_eq!(jarosz_window_size(384), 3);
        assert_eq!(jarosz_window_size(1024), 8);
    }

    #[test]
    fn box_pass_preserves_constant_input() {
        let input = vec![42.0f32; 37];
        let mut output = vec![0.0f32; 37];
        box_1d(&input, &mut output, 0, 37, 1, 4);
        for &v in &output {
            assert_eq!(v, 42.0);
        }
    }

    #[test]
    fn box_pass_matches_naive_reference() {
        let mut state = 0xdead_beef_u64;
        let input: Vec<f32> = (0..101)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 256) as f32
            })
            .collect();
        for window in [2usize, 3, 5, 8] {
            let mut output = vec![0.0f32; input.len()];
            box_1d(&input, &mut output, 0, input.len(), 1, window);
            let expected = box_1d_naive(&input, window);
            // Sliding-sum rounding drifts a little against the fresh-sum
            // reference; misalignment would be off by tens.
            for (a, b) in output.iter().zip(&expected) {
                assert!((a - b).abs() < 0.05, "window {window}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn column_pass_equals_row_pass_on_transpose() {
        let (rows, cols) = (9, 7);
        let input: Vec<f32> = (0..rows * cols).map(|k| (k * k % 83) as f32).collect();
        let mut by_cols = vec![0.0f32; rows * cols];
        box_along_cols(&input, &mut by_cols, rows, cols, 3);

        // Transpose, filter rows, transpose back.
        let mut transposed = vec![0.0f32; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                transposed[j * rows + i] = input[i * cols + j];
            }
        }
        let mut filtered = vec![0.0f32; rows * cols];
        box_along_rows(&transposed, &mut filtered, cols, rows, 3);
        for i in 0..rows {
            for j in 0..cols {
                assert_eq!(by_cols[i * cols + j], filtered[j * rows + i]);
            }
        }
    }

    #[test]
    fn jarosz_filter_preserves_constant_plane() {
        let (rows, cols) = (50, 80);
        let mut luma = vec![128.0f32; rows * cols];
        let mut scratch = vec![0.0f32; rows * cols];
        jarosz_filter(&mut luma, &mut scratch, rows, cols, 2, 2, 2);
        for &v in &luma {
            assert_eq!(v, 128.0);
        }
    }

    #[test]
    fn decimate_samples_block_centers() {
        let (rows, cols) = (128, 128);
        let input: Vec<f32> = (0..rows * cols).map(|k| k as f32).collect();
        let out = decimate(&input, rows, cols);
        // (2i+1)·128/128 = 2i+1: the center of each 2×2 block.
        for i in 0..DOWNSAMPLE_DIM {
            for j in 0..DOWNSAMPLE_DIM {
                assert_eq!(out[i][j], ((2 * i + 1) * cols + 2 * j + 1) as f32);
            }
        }
    }

    #[test]
    fn decimate_upsamples_small_planes() {
        // 5×5 input: every output cell must come from a valid input cell.
        let input: Vec<f32> = (0..25).map(|k| k as f32).collect();
        let out = decimate(&input, 5, 5);
        assert_eq!(out[0][0], 0.0);
        assert_eq!(out[63][63], 24.0);
        for row in &out {
            for &v in row {
                assert!((0.0..25.0).contains(&v));
            }
        }
    }
}
