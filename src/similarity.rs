// 🔤 Similarity Scorer - fuzzy comparison of institution names
//
// Names vary by abbreviation, punctuation and word order far more than by
// typos, so comparisons run on normalized token sets rather than raw strings:
// - "MIT" vs "M.I.T."                          → 100 (punctuation)
// - "Oxford University" vs "University Oxford" → 100 (word order)
// - "MIT" vs "MIT Sloan School"                → 100 (containment)
// - "MIT" vs "Massachusetts Inst. of Tech."    → 100 (initialism)
//
// Every score is an integer in [0, 100], symmetric, and 100 for identical input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use strsim::normalized_levenshtein;

/// Words ignored when building the initials of a multi-word name
const STOP_WORDS: &[&str] = &["of", "the", "and", "at", "for", "in", "de"];

/// Length bounds for a single token to be treated as a possible acronym.
/// Two-letter tokens ("UC", "NC") match too many unrelated names.
const MIN_ACRONYM_LEN: usize = 3;
const MAX_ACRONYM_LEN: usize = 8;

// ============================================================================
// SCORER TRAIT
// ============================================================================

/// Anything that can compare two names on a 0-100 scale.
///
/// Implementations must be symmetric and return 100 for identical names;
/// the resolver's cluster-separation guarantee relies on both.
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> u8;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&str, &str) -> u8,
{
    fn score(&self, a: &str, b: &str) -> u8 {
        self(a, b)
    }
}

// ============================================================================
// SCORER KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScorerKind {
    /// Token-set ratio with containment and initialism support
    #[default]
    TokenSet,

    /// Sorted-token edit ratio (stricter, no containment)
    TokenSort,
}

impl ScorerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerKind::TokenSet => "token-set",
            ScorerKind::TokenSort => "token-sort",
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "token-set" | "tokenset" => Ok(ScorerKind::TokenSet),
            "token-sort" | "tokensort" => Ok(ScorerKind::TokenSort),
            other => Err(format!(
                "unknown scorer '{}' (expected token-set or token-sort)",
                other
            )),
        }
    }
}

impl SimilarityScorer for ScorerKind {
    fn score(&self, a: &str, b: &str) -> u8 {
        match self {
            ScorerKind::TokenSet => token_set_score(a, b),
            ScorerKind::TokenSort => token_sort_ratio(a, b),
        }
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize a name for comparison
///
/// Lowercases, drops periods and apostrophes ("M.I.T." → "mit"), turns any
/// other non-alphanumeric character into a space, collapses whitespace.
pub fn normalize(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());

    for c in name.chars() {
        match c {
            '.' | '\'' | '\u{2019}' => continue,
            c if c.is_alphanumeric() => cleaned.extend(c.to_lowercase()),
            _ => cleaned.push(' '),
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// RATIOS
// ============================================================================

/// Edit-distance ratio of two already-normalized strings, 0-100
fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    (normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Join two token runs with a single space, skipping empty sides
fn join_runs(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

fn sorted_tokens(normalized: &str) -> String {
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio of the two names after sorting their tokens
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    let a = sorted_tokens(&normalize(a));
    let b = sorted_tokens(&normalize(b));
    ratio(&a, &b)
}

/// Token-set ratio
///
/// Splits both names into the shared tokens and each side's leftovers, then
/// compares "shared" against "shared + leftovers" on each side. A name whose
/// tokens are all contained in the other scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let na = normalize(a);
    let nb = normalize(b);

    let tokens_a: BTreeSet<&str> = na.split(' ').filter(|t| !t.is_empty()).collect();
    let tokens_b: BTreeSet<&str> = nb.split(' ').filter(|t| !t.is_empty()).collect();

    let common = tokens_a.intersection(&tokens_b).copied().collect::<Vec<_>>().join(" ");
    let rest_a = tokens_a.difference(&tokens_b).copied().collect::<Vec<_>>().join(" ");
    let rest_b = tokens_b.difference(&tokens_a).copied().collect::<Vec<_>>().join(" ");

    let combined_a = join_runs(&common, &rest_a);
    let combined_b = join_runs(&common, &rest_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !common.is_empty() {
        best = best
            .max(ratio(&common, &combined_a))
            .max(ratio(&common, &combined_b));
    }
    best
}

/// Initials of a multi-word name, or None if it has fewer than two significant words
fn initials(tokens: &[&str]) -> Option<String> {
    let significant: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !STOP_WORDS.contains(t))
        .collect();

    if significant.len() < 2 {
        return None;
    }

    Some(significant.iter().filter_map(|t| t.chars().next()).collect())
}

/// Compare a single-token name against the initials of the other name
fn initialism_ratio(short: &str, long: &str) -> u8 {
    let short_tokens: Vec<&str> = short.split(' ').filter(|t| !t.is_empty()).collect();
    let long_tokens: Vec<&str> = long.split(' ').filter(|t| !t.is_empty()).collect();

    let [acronym] = short_tokens.as_slice() else {
        return 0;
    };

    let len = acronym.chars().count();
    if !(MIN_ACRONYM_LEN..=MAX_ACRONYM_LEN).contains(&len) {
        return 0;
    }

    match initials(&long_tokens) {
        Some(init) => ratio(acronym, &init),
        None => 0,
    }
}

/// Default institution-name score: best of token-set, token-sort and initialism
pub fn token_set_score(a: &str, b: &str) -> u8 {
    let na = normalize(a);
    let nb = normalize(b);

    // Initialism is checked in both directions to keep the score symmetric
    let acronym = initialism_ratio(&na, &nb).max(initialism_ratio(&nb, &na));

    token_set_ratio(a, b)
        .max(token_sort_ratio(a, b))
        .max(acronym)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("M.I.T."), "mit");
        assert_eq!(normalize("  Harvard   University "), "harvard university");
        assert_eq!(normalize("Texas A&M University"), "texas a m university");
        assert_eq!(normalize("St. John's College"), "st johns college");
        assert_eq!(normalize("..."), "");
    }

    #[test]
    fn test_reflexive_maximum() {
        for name in ["MIT", "Harvard University", "Zhejiang University", ""] {
            assert_eq!(token_set_score(name, name), 100);
            assert_eq!(token_sort_ratio(name, name), 100);
        }
    }

    #[test]
    fn test_case_punctuation_and_whitespace_insensitive() {
        assert_eq!(token_set_score("MIT", "M.I.T."), 100);
        assert_eq!(token_set_score("harvard university", "HARVARD   University"), 100);
        assert_eq!(token_sort_ratio("Duke University", " duke university "), 100);
    }

    #[test]
    fn test_word_order_insensitive() {
        assert_eq!(token_sort_ratio("Oxford University", "University Oxford"), 100);
        assert_eq!(token_set_score("Oxford University", "University, Oxford"), 100);
    }

    #[test]
    fn test_containment_scores_high() {
        assert_eq!(token_set_ratio("MIT", "MIT Sloan School"), 100);
        // Token sort has no notion of containment
        assert!(token_sort_ratio("MIT", "MIT Sloan School") < 50);
    }

    #[test]
    fn test_initialism() {
        assert_eq!(token_set_score("MIT", "Massachusetts Inst. of Tech."), 100);
        assert_eq!(token_set_score("Massachusetts Institute of Technology", "M.I.T."), 100);
        // Single significant word has no initials
        assert!(token_set_score("MIT", "Mittelschule") < 87);
    }

    #[test]
    fn test_two_letter_token_is_not_an_acronym() {
        assert!(token_set_score("UC", "University of Colorado") < 87);
        assert!(token_set_score("University of California", "UC") < 87);
        assert_eq!(initialism_ratio("uc", "university of colorado"), 0);
        assert_eq!(initialism_ratio("ucb", "university of california berkeley"), 100);
    }

    #[test]
    fn test_dissimilar_names_score_low() {
        assert_eq!(token_set_score("MIT", "Harvard"), 0);
        assert!(token_set_score("Tsinghua University", "Peking University") < 87);
        assert!(token_set_score("Duke University", "Rice University") < 87);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("MIT", "Massachusetts Inst. of Tech."),
            ("MIT", "MIT Sloan School"),
            ("Tsinghua University", "Peking University"),
            ("Univ of Colorado Boulder", "University of Colorado"),
            ("", "Harvard"),
        ];

        for (a, b) in pairs {
            assert_eq!(token_set_score(a, b), token_set_score(b, a), "{} / {}", a, b);
            assert_eq!(token_sort_ratio(a, b), token_sort_ratio(b, a), "{} / {}", a, b);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(token_set_score("", ""), 100);
        assert_eq!(token_set_score("", "MIT"), 0);
        assert_eq!(token_sort_ratio("...", "MIT"), 0);
    }

    #[test]
    fn test_typo_tolerance() {
        assert!(token_set_score("Carnegie Mellon University", "Carnegie Melon University") >= 87);
    }

    #[test]
    fn test_scorer_kind_dispatch() {
        assert_eq!(ScorerKind::TokenSet.score("MIT", "MIT Sloan School"), 100);
        assert!(ScorerKind::TokenSort.score("MIT", "MIT Sloan School") < 50);
    }

    #[test]
    fn test_scorer_kind_parse() {
        assert_eq!("token-set".parse::<ScorerKind>(), Ok(ScorerKind::TokenSet));
        assert_eq!("Token_Sort".parse::<ScorerKind>(), Ok(ScorerKind::TokenSort));
        assert!("soundex".parse::<ScorerKind>().is_err());
        assert_eq!(ScorerKind::default(), ScorerKind::TokenSet);
    }

    #[test]
    fn test_closure_scorer() {
        let fixed = |_: &str, _: &str| 42u8;
        assert_eq!(fixed.score("a", "b"), 42);
    }
}
