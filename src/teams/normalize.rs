//! Team-name normalization.
//!
//! Names are compared after canonical decomposition (NFD), with Latin
//! diacritics (the Combining Diacritical Marks block, U+0300..=U+036F)
//! removed and everything lower-cased, so "São Paulo", "SAO PAULO" and
//! "sao paulo" are the same team. Combining signs of other scripts carry
//! meaning and are kept.

use std::ops::RangeInclusive;
use unicode_normalization::UnicodeNormalization;

const DIACRITICS: RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Strip diacritics and case from a team name.
///
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(name: &str) -> String {
    // Lower-casing can produce new decomposable characters, so decompose last.
    name.to_lowercase()
        .nfd()
        .filter(|c| !DIACRITICS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_accents_and_case() {
        assert_eq!(normalize("São Paulo"), normalize("sao paulo"));
        assert_eq!(normalize("Atlético Mineiro"), "atletico mineiro");
        assert_eq!(normalize("GRÊMIO"), "gremio");
    }

    #[test]
    fn test_idempotent() {
        for s in ["São Paulo", "Bayern München", "Ñandú FC", "", "İstanbul", "ǅemal"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_precomposed_and_decomposed_agree() {
        // "é" as one code point vs "e" + U+0301
        assert_eq!(normalize("Café"), normalize("Cafe\u{0301}"));
    }

    #[test]
    fn test_different_teams_differ() {
        assert_ne!(normalize("Real Madrid"), normalize("Barcelona"));
    }

    #[test]
    fn test_non_latin_combining_signs_kept() {
        // Devanagari vowel sign AA (U+093E) and Hebrew point QAMATS (U+05B8)
        assert_eq!(normalize("मोहन बागान"), "मोहन बागान".nfd().collect::<String>());
        assert_ne!(normalize("का"), normalize("क"));
        assert_ne!(normalize("\u{05D1}\u{05B8}"), normalize("\u{05D1}"));
    }
}
