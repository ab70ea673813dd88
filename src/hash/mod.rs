//! The 256-bit fingerprint value.
//!
//! [`Hash256`] is sixteen 16-bit words. Bit `k` lives in word `(k >> 4) & 15`
//! at position `k & 15`; every one of the 2²⁵⁶ values is legal. Hamming
//! distance between two perceptually similar images is small (tools in this
//! family treat "< tolerance" as a match); unrelated images land near the
//! 128-bit random baseline.
//!
//! The text form is 64 lowercase hex characters, most-significant word
//! first, so the string reads as one big-endian 256-bit integer.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// 256-bit perceptual fingerprint.
///
/// A plain value: `Copy`, order-free, no normalization constraints.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256 {
    pub words: [u16; 16],
}

impl Hash256 {
    pub const BITS: usize = 256;
    pub const WORDS: usize = 16;
    /// Length of the text form in characters.
    pub const TEXT_LENGTH: usize = 64;

    /// All-zero fingerprint; also the sentinel for unhashable inputs.
    #[inline]
    pub fn new() -> Self {
        Self { words: [0u16; 16] }
    }

    /// Reset to all zeros.
    #[inline]
    pub fn clear(&mut self) {
        self.words = [0u16; 16];
    }

    /// Toggle bit `k` (XOR). Callers building a hash from the cleared state
    /// only ever touch bits that are still zero, where toggle and set
    /// coincide.
    ///
    /// # Panics
    ///
    /// Panics if `k >= 256`.
    #[inline]
    pub fn set_bit(&mut self, k: usize) {
        assert!(k < Self::BITS, "bit index {k} out of range");
        self.words[(k >> 4) & 15] ^= 1 << (k & 15);
    }

    /// Read bit `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= 256`.
    #[inline]
    pub fn get_bit(&self, k: usize) -> bool {
        assert!(k < Self::BITS, "bit index {k} out of range");
        (self.words[(k >> 4) & 15] >> (k & 15)) & 1 != 0
    }

    /// The 16-bit slot at position `s`, the unit the multi-index partitions
    /// a code into.
    #[inline]
    pub fn word(&self, s: usize) -> u16 {
        self.words[s]
    }

    /// Hamming distance (number of differing bits), in 0..=256.
    ///
    /// One XOR and one popcount per word; no branches. This is the hot path
    /// of candidate verification, executed once per index candidate.
    #[inline]
    pub fn hamming_distance(&self, other: &Hash256) -> u32 {
        let mut dist = 0u32;
        for i in 0..Self::WORDS {
            dist += (self.words[i] ^ other.words[i]).count_ones();
        }
        dist
    }

    /// Population count (number of set bits).
    #[inline]
    pub fn popcount(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// True if all bits are zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Deterministic pseudo-random fingerprint from a seed
    /// (SplitMix64 seeding + xorshift64 stream).
    ///
    /// Used to build synthetic corpora and query loads; unrelated to the
    /// image transform.
    pub fn random(seed: u64) -> Self {
        let mut state = splitmix64(seed) | 1;
        let mut words = [0u16; 16];
        for chunk in words.chunks_mut(4) {
            state = xorshift64(state);
            let w = state;
            chunk[0] = w as u16;
            chunk[1] = (w >> 16) as u16;
            chunk[2] = (w >> 32) as u16;
            chunk[3] = (w >> 48) as u16;
        }
        Self { words }
    }

    /// Copy of `self` with exactly `n` distinct bits flipped, chosen by a
    /// seeded stream. `hamming_distance(self, result) == n`.
    ///
    /// # Panics
    ///
    /// Panics if `n > 256`.
    pub fn with_flipped_bits(&self, n: usize, seed: u64) -> Self {
        assert!(n <= Self::BITS, "cannot flip {n} of 256 bits");
        let mut out = *self;
        let mut flipped = [false; Self::BITS];
        let mut state = splitmix64(seed ^ 0xa076_1d64_78bd_642f) | 1;
        let mut remaining = n;
        while remaining > 0 {
            state = xorshift64(state);
            let k = (state % Self::BITS as u64) as usize;
            if !flipped[k] {
                flipped[k] = true;
                out.set_bit(k);
                remaining -= 1;
            }
        }
        out
    }
}

#[inline]
fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[inline]
fn xorshift64(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

// ============================================================================
// Text form
// ============================================================================

impl fmt::Display for Hash256 {
    /// 64 lowercase hex chars, `words[15]` printed first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for w in self.words.iter().rev() {
            write!(f, "{w:04x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

impl FromStr for Hash256 {
    type Err = Error;

    /// Inverse of `Display`. Accepts upper and lower case; rejects any other
    /// length, any non-hex byte, and (implicitly) trailing input.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::TEXT_LENGTH {
            return Err(Error::MalformedHash {
                message: format!("expected {} hex chars, got {}", Self::TEXT_LENGTH, s.len()),
            });
        }
        if let Some(bad) = s.bytes().position(|b| !b.is_ascii_hexdigit()) {
            return Err(Error::MalformedHash {
                message: format!("non-hex character at offset {bad}"),
            });
        }
        let mut words = [0u16; 16];
        for i in 0..Self::WORDS {
            // Validated ASCII hex above, so both the slice and the parse
            // are infallible here.
            let chunk = &s[i * 4..i * 4 + 4];
            words[15 - i] = u16::from_str_radix(chunk, 16).expect("validated hex");
        }
        Ok(Self { words })
    }
}

// ============================================================================
// Serde: hashes travel as their text form
// ============================================================================

impl serde::Serialize for Hash256 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Hash256 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct HexVisitor;

        impl serde::de::Visitor<'_> for HexVisitor {
            type Value = Hash256;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a 64-character hex string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Hash256, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_is_all_zero() {
        let h = Hash256::new();
        assert!(h.is_zero());
        assert_eq!(h.popcount(), 0);
        assert_eq!(h, Hash256::default());
    }

    #[test]
    fn set_get_roundtrip() {
        let mut h = Hash256::new();
        for k in [0usize, 1, 15, 16, 17, 127, 128, 240, 255] {
            assert!(!h.get_bit(k));
            h.set_bit(k);
            assert!(h.get_bit(k));
        }
        assert_eq!(h.popcount(), 9);
    }

    #[test]
    fn set_bit_is_a_toggle() {
        // XOR semantics: setting twice returns to the cleared state.
        let mut h = Hash256::new();
        h.set_bit(100);
        h.set_bit(100);
        assert!(h.is_zero());
    }

    #[test]
    fn clear_resets() {
        let mut h = Hash256::random(7);
        assert!(!h.is_zero());
        h.clear();
        assert!(h.is_zero());
    }

    #[test]
    fn bit_position_maps_into_expected_word() {
        let mut h = Hash256::new();
        h.set_bit(0);
        assert_eq!(h.words[0], 0x0001);
        let mut h = Hash256::new();
        h.set_bit(31);
        assert_eq!(h.words[1], 0x8000);
        let mut h = Hash256::new();
        h.set_bit(255);
        assert_eq!(h.words[15], 0x8000);
    }

    #[test]
    fn hamming_distance_basics() {
        let a = Hash256::random(1);
        let b = Hash256::random(2);
        assert_eq!(a.hamming_distance(&a), 0);
        assert_eq!(a.hamming_distance(&b), b.hamming_distance(&a));

        let zero = Hash256::new();
        let ones = Hash256 { words: [0xffff; 16] };
        assert_eq!(zero.hamming_distance(&ones), 256);
    }

    #[test]
    fn random_hashes_sit_near_the_128_bit_baseline() {
        let a = Hash256::random(11);
        let b = Hash256::random(12);
        let d = a.hamming_distance(&b);
        assert!((90..=166).contains(&d), "distance {d} implausible for random codes");
    }

    #[test]
    fn random_is_deterministic() {
        assert_eq!(Hash256::random(42), Hash256::random(42));
        assert_ne!(Hash256::random(42), Hash256::random(43));
        assert!(!Hash256::random(0).is_zero());
    }

    #[test]
    fn flipped_bits_land_at_exact_distance() {
        let h = Hash256::random(5);
        for n in [0usize, 1, 20, 32, 200, 256] {
            let noisy = h.with_flipped_bits(n, 99);
            assert_eq!(h.hamming_distance(&noisy) as usize, n);
        }
    }

    #[test]
    fn format_prints_most_significant_word_first() {
        let mut words = [0u16; 16];
        for (i, w) in words.iter_mut().enumerate() {
            *w = i as u16;
        }
        let h = Hash256 { words };
        assert_eq!(
            h.to_string(),
            "000f000e000d000c000b000a0009000800070006000500040003000200010000"
        );
    }

    #[test]
    fn parse_accepts_both_cases() {
        let lower = "000f000e000d000c000b000a0009000800070006000500040003000200010000";
        let upper = lower.to_uppercase();
        let a: Hash256 = lower.parse().unwrap();
        let b: Hash256 = upper.parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.words[15], 0x000f);
        assert_eq!(a.words[0], 0x0000);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("".parse::<Hash256>().is_err());
        assert!("abc".parse::<Hash256>().is_err());
        // 63 and 65 chars
        assert!("0".repeat(63).parse::<Hash256>().is_err());
        assert!("0".repeat(65).parse::<Hash256>().is_err());
        // non-hex bytes, including a sign that from_str_radix alone would take
        assert!(format!("z{}", "0".repeat(63)).parse::<Hash256>().is_err());
        assert!(format!("+{}", "0".repeat(63)).parse::<Hash256>().is_err());
        assert!(format!(" {}", "0".repeat(63)).parse::<Hash256>().is_err());
    }

    #[test]
    fn serde_roundtrips_as_hex_string() {
        let h = Hash256::random(314);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{h}\""));
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    proptest! {
        #[test]
        fn parse_format_roundtrip(words in proptest::array::uniform16(any::<u16>())) {
            let h = Hash256 { words };
            let parsed: Hash256 = h.to_string().parse().unwrap();
            prop_assert_eq!(h, parsed);
        }

        #[test]
        fn hamming_is_symmetric_and_bounded(
            a in proptest::array::uniform16(any::<u16>()),
            b in proptest::array::uniform16(any::<u16>()),
        ) {
            let (a, b) = (Hash256 { words: a }, Hash256 { words: b });
            prop_assert_eq!(a.hamming_distance(&b), b.hamming_distance(&a));
            prop_assert!(a.hamming_distance(&b) <= 256);
            prop_assert_eq!(a.hamming_distance(&a), 0);
        }
    }
}
