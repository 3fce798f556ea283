//! Short non-cryptographic fingerprints for cache keys.
//!
//! A 32-bit rolling hash is plenty for telling apart the few million distinct
//! queries a day this sees. It must never guard anything security-sensitive.

/// `h = h * 31 + unit` over the UTF-16 code units of `input`, wrapping.
pub fn rolling_hash(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// [`rolling_hash`] rendered as eight lowercase hex digits.
pub fn fingerprint(input: &str) -> String {
    format!("{:08x}", rolling_hash(input))
}
