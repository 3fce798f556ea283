//! Edit-distance based string and set similarity.

/// Threshold used by [`fuzzy_includes`] callers that have no better idea.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

// == Levenshtein ==
/// Edit distance between two strings, counted in UTF-16 code units.
///
/// Same unit as [`rolling_hash`](super::rolling_hash), so a character outside
/// the BMP (most emoji) costs two edits.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<u16> = a.encode_utf16().collect();
    let b: Vec<u16> = b.encode_utf16().collect();
    levenshtein_units(&a, &b)
}

fn levenshtein_units(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows of the DP table are enough.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// == String Similarity ==
/// Case-insensitive similarity in `[0, 1]`: `1 - distance / longest`.
///
/// Two empty strings are identical. Lengths are UTF-16 code units taken after
/// lowercasing, so a case fold that changes length cannot push the score out
/// of range.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<u16> = a.to_lowercase().encode_utf16().collect();
    let b: Vec<u16> = b.to_lowercase().encode_utf16().collect();

    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let distance = levenshtein_units(&a, &b);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}

// == Fuzzy Includes ==
/// True if some element of `set` is strictly more similar to `item` than `threshold`.
pub fn fuzzy_includes<S: AsRef<str>>(set: &[S], item: &str, threshold: f64) -> bool {
    set.iter()
        .any(|candidate| string_similarity(candidate.as_ref(), item) > threshold)
}

// == Set Similarity ==
/// Fraction of `a` that fuzzy-matches something in `b`.
///
/// Driven by `a`'s coverage, so `set_similarity(a, b)` and `set_similarity(b, a)`
/// may differ. Either side empty scores `0.0`.
pub fn set_similarity<S: AsRef<str>, T: AsRef<str>>(a: &[S], b: &[T], threshold: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let matched = a
        .iter()
        .filter(|item| {
            let item: &str = (*item).as_ref();
            fuzzy_includes(b, item, threshold)
        })
        .count();
    matched as f64 / a.len() as f64
}
