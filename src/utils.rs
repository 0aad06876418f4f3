pub trait MyHash {
    /// Hash used for bucket selection in hand-rolled tables.
    fn hash(&self) -> u64;
}

const MIX_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Mixes one more word into a running hash.
///
/// Multiply-rotate in the style of FxHash: cheap, and good enough for bucket
/// indices taken from the low bits.
#[inline]
pub fn mix(hash: u64, word: u64) -> u64 {
    (hash.rotate_left(5) ^ word).wrapping_mul(MIX_MULTIPLIER)
}

/// Hashes a packed slice of ids.
pub fn hash_words(words: &[u32]) -> u64 {
    let h = words
        .iter()
        .fold(words.len() as u64, |h, &w| mix(h, w as u64));
    // Finalizer: spread high bits down so that masking with small tables works.
    h ^ (h >> 29)
}

impl MyHash for [u32] {
    fn hash(&self) -> u64 {
        hash_words(self)
    }
}
