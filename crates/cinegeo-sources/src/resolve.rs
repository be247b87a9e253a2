//! Fuzzy matching of a place name against a foreign catalog's entries.

use cinegeo_core::{normalize, tokens, CatalogEntry, EntityMatch};

pub const DEFAULT_MATCH_THRESHOLD: u32 = 2;

/// Score reported for an exact normalized-name match.
pub const EXACT_MATCH_SCORE: u32 = 100;

const SUBSTRING_SCORE: u32 = 3;
const REGION_HINT_SCORE: u32 = 1;

/// Picks the best catalog entry for a label, or nothing when no candidate
/// reaches the acceptance threshold.
#[derive(Debug, Clone, Copy)]
pub struct EntityResolver {
    threshold: u32,
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl EntityResolver {
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Scoring, on normalized labels:
    /// - exact equality wins immediately
    /// - containment either way: +3
    /// - +1 per shared token
    /// - +1 when the candidate address mentions `region_hint`
    ///
    /// Ties keep the earliest candidate.
    #[must_use]
    pub fn resolve(
        &self,
        target_label: &str,
        region_hint: Option<&str>,
        candidates: &[CatalogEntry],
    ) -> Option<EntityMatch> {
        let target = normalize(target_label);
        if target.is_empty() {
            return None;
        }
        let target_tokens = tokens(target_label);
        let hint = region_hint.map(normalize).filter(|h| !h.is_empty());

        let mut best: Option<(&CatalogEntry, u32)> = None;

        for candidate in candidates {
            let name = normalize(&candidate.display_name);
            if name.is_empty() {
                continue;
            }
            if name == target {
                return Some(EntityMatch {
                    entry: candidate.clone(),
                    score: EXACT_MATCH_SCORE,
                });
            }

            let mut score = 0;
            if name.contains(&target) || target.contains(&name) {
                score += SUBSTRING_SCORE;
            }
            let overlap = tokens(&candidate.display_name)
                .intersection(&target_tokens)
                .count();
            score += u32::try_from(overlap).unwrap_or(u32::MAX);

            if let (Some(hint), Some(address)) = (hint.as_deref(), candidate.address.as_deref()) {
                if normalize(address).contains(hint) {
                    score += REGION_HINT_SCORE;
                }
            }

            if best.is_none_or(|(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }

        best.filter(|(_, score)| *score >= self.threshold)
            .map(|(entry, score)| EntityMatch {
                entry: entry.clone(),
                score,
            })
    }
}

/// Label-only lookup: exact normalized match first, then containment in
/// either direction, first in source order.
pub fn resolve_label<'a, T, F>(label: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let target = normalize(label);
    if target.is_empty() {
        return None;
    }

    let named: Vec<(&T, String)> = candidates
        .iter()
        .map(|c| (c, normalize(name_of(c))))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    named
        .iter()
        .find(|(_, name)| *name == target)
        .or_else(|| {
            named
                .iter()
                .find(|(_, name)| name.contains(&target) || target.contains(name.as_str()))
        })
        .map(|(c, _)| *c)
}

#[cfg(test)]
mod tests {
    use cinegeo_core::CatalogLocation;

    use super::*;

    fn entry(id: &str, name: &str, address: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            display_name: name.to_string(),
            address: address.map(str::to_string),
        }
    }

    #[test]
    fn exact_normalized_match_wins_over_higher_partial_scores() {
        let candidates = vec![
            entry("P1", "Pathé Wepler Paris Clichy Grand Écran", Some("Paris")),
            entry("P2", "PATHE WEPLER", None),
        ];
        let found = EntityResolver::default()
            .resolve("Pathé Wepler", Some("Paris"), &candidates)
            .unwrap();
        assert_eq!(found.entry.id, "P2");
        assert_eq!(found.score, EXACT_MATCH_SCORE);
    }

    #[test]
    fn substring_and_overlap_accumulate() {
        let candidates = vec![entry("C1", "UGC Ciné Cité Les Halles", None)];
        let found = EntityResolver::default()
            .resolve("UGC Ciné Cité", None, &candidates)
            .unwrap();
        // contains (+3) and three shared tokens (+3)
        assert_eq!(found.score, 6);
    }

    #[test]
    fn overlap_counts_normalized_tokens_across_punctuation() {
        let candidates = vec![entry("U", "Utopia, cinéma de Saint-Ouen", None)];
        let found = EntityResolver::default()
            .resolve("L'Utopia Saint-Ouen", None, &candidates)
            .unwrap();
        // utopia, saint, ouen
        assert_eq!(found.score, 3);
    }

    #[test]
    fn single_token_overlap_is_below_threshold() {
        let candidates = vec![entry("X", "Cinéma Le Royal", None)];
        assert!(EntityResolver::default()
            .resolve("Le Méliès", None, &candidates)
            .is_none());
    }

    #[test]
    fn region_hint_tips_a_weak_match_over_the_threshold() {
        let candidates = vec![entry(
            "V",
            "Cinéma Rex",
            Some("12 rue Émile Zola, 31000 Toulouse"),
        )];
        let resolver = EntityResolver::default();
        assert!(resolver.resolve("Le Rex", None, &candidates).is_none());
        let found = resolver
            .resolve("Le Rex", Some("Toulouse"), &candidates)
            .unwrap();
        assert_eq!(found.score, 2);
    }

    #[test]
    fn ties_keep_first_candidate() {
        let candidates = vec![
            entry("first", "Studio Nord Lumière", None),
            entry("second", "Lumière Sud Studio", None),
        ];
        let found = EntityResolver::default()
            .resolve("Le Studio Lumière", None, &candidates)
            .unwrap();
        assert_eq!(found.entry.id, "first");
        assert_eq!(found.score, 2);
    }

    #[test]
    fn empty_names_never_match() {
        let candidates = vec![entry("blank", "  -- ", None)];
        assert!(EntityResolver::default()
            .resolve("Rex", None, &candidates)
            .is_none());
        assert!(EntityResolver::default()
            .resolve("!!", None, &[entry("a", "Rex", None)])
            .is_none());
    }

    #[test]
    fn custom_threshold_is_honored() {
        let candidates = vec![entry("C1", "UGC Ciné Cité Les Halles", None)];
        let strict = EntityResolver::new(10);
        assert!(strict.resolve("UGC Ciné Cité", None, &candidates).is_none());
    }

    #[test]
    fn resolve_label_prefers_exact_over_earlier_substring() {
        let locations = vec![
            CatalogLocation {
                id: "ville-1".to_string(),
                name: "Saint-Paul-lès-Paris".to_string(),
            },
            CatalogLocation {
                id: "ville-115755".to_string(),
                name: "Paris".to_string(),
            },
        ];
        let found = resolve_label("paris", &locations, |l| l.name.as_str()).unwrap();
        assert_eq!(found.id, "ville-115755");
    }

    #[test]
    fn resolve_label_falls_back_to_containment() {
        let locations = vec![CatalogLocation {
            id: "ville-31555".to_string(),
            name: "Toulouse (31)".to_string(),
        }];
        let found = resolve_label("Toulouse", &locations, |l| l.name.as_str()).unwrap();
        assert_eq!(found.id, "ville-31555");
        assert!(resolve_label("Bordeaux", &locations, |l| l.name.as_str()).is_none());
    }
}
