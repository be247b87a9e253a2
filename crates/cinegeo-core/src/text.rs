//! Label canonicalization for cross-source comparison.
//!
//! Output is only ever compared, never displayed; callers keep the original
//! string for presentation.

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a label for comparison.
///
/// - Unicode NFKD decomposition, combining marks dropped (`é` -> `e`)
/// - ligatures folded (`œ` -> `oe`, `æ` -> `ae`, `ß` -> `ss`)
/// - lowercase
/// - anything outside `[a-z0-9]` becomes a space
/// - whitespace collapsed and trimmed
///
/// ```
/// use cinegeo_core::normalize;
///
/// assert_eq!(normalize("Café de l'Opéra"), "cafe de l opera");
/// assert_eq!(normalize("  UGC  Ciné-Cité  "), "ugc cine cite");
/// ```
#[must_use]
pub fn normalize(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'œ' | 'Œ' => folded.push_str("oe"),
            'æ' | 'Æ' => folded.push_str("ae"),
            'ß' => folded.push_str("ss"),
            _ => {
                for lower in c.to_lowercase() {
                    if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
                        folded.push(lower);
                    } else {
                        folded.push(' ');
                    }
                }
            }
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized whitespace-separated token set.
#[must_use]
pub fn tokens(s: &str) -> HashSet<String> {
    normalize(s).split(' ').filter(|t| !t.is_empty()).map(str::to_owned).collect()
}
