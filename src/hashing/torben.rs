//! Torben's median selection.
//!
//! Finds the median by bisecting on value rather than sorting: each round
//! counts elements on either side of a guess and tightens the bracket to an
//! actual element of the input. No allocation, no mutation of the input, and
//! the returned value is always an element of the set (value-preserving),
//! which is what keeps the downstream strict-greater threshold well defined
//! under ties.

/// Median of `values`: the element at rank `(n + 1) / 2` (lower middle for
/// even `n`), in stable tie order.
///
/// # Panics
///
/// Panics if `values` is empty.
pub fn torben(values: &[f32]) -> f32 {
    assert!(!values.is_empty(), "median of empty set");
    let n = values.len();
    let half = n.div_ceil(2);

    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    loop {
        let guess = (min + max) / 2.0;
        let mut less = 0usize;
        let mut greater = 0usize;
        let mut equal = 0usize;
        let mut max_lt_guess = min;
        let mut min_gt_guess = max;

        for &v in values {
            if v < guess {
                less += 1;
                if v > max_lt_guess {
                    max_lt_guess = v;
                }
            } else if v > guess {
                greater += 1;
                if v < min_gt_guess {
                    min_gt_guess = v;
                }
            } else {
                equal += 1;
            }
        }

        if less <= half && greater <= half {
            // Bracket closed: the rank-half element is on one of the three
            // sides of the guess.
            return if less >= half {
                max_lt_guess
            } else if less + equal >= half {
                guess
            } else {
                min_gt_guess
            };
        } else if less > greater {
            max = max_lt_guess;
        } else {
            min = min_gt_guess;
        }
    }
}
