//! Token-set fuzzy matching used to re-rank search results

use std::collections::BTreeSet;

use rapidfuzz::fuzz;

/// Weight of the description score in the combined ranking
pub const DESCRIPTION_WEIGHT: f64 = 0.6;
/// Weight of the amenities score in the combined ranking
pub const AMENITY_WEIGHT: f64 = 0.4;

fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Normalized indel similarity in 0..=100
pub fn ratio(a: &str, b: &str) -> f64 {
    100.0 * fuzz::ratio(a.chars(), b.chars())
}

fn join(parts: &[&String]) -> String {
    parts.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
}

/// Similarity of the token sets of `a` and `b`, ignoring order and duplicates
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let common: Vec<&String> = ta.intersection(&tb).collect();
    let only_a: Vec<&String> = ta.difference(&tb).collect();
    let only_b: Vec<&String> = tb.difference(&ta).collect();

    // One set contained in the other is a perfect match
    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = join(&common);
    let diff_a = join(&only_a);
    let diff_b = join(&only_b);

    let combined_a = if sect.is_empty() { diff_a } else { format!("{} {}", sect, diff_a) };
    let combined_b = if sect.is_empty() { diff_b } else { format!("{} {}", sect, diff_b) };

    let mut best = ratio(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined_a))
            .max(ratio(&sect, &combined_b));
    }
    best
}

/// Combined description/amenity relevance of a listing to the query
pub fn relevance(query: &str, description: &str, amenities: &str) -> f64 {
    token_set_ratio(query, description) * DESCRIPTION_WEIGHT
        + token_set_ratio(query, amenities) * AMENITY_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert!((ratio("this is a test", "this is a test!") - 96.55).abs() < 0.01);
        assert!((ratio("kitten", "sitting") - 61.538).abs() < 0.01);
    }

    #[test]
    fn test_token_set_ratio_ignores_order_and_duplicates() {
        assert_eq!(token_set_ratio("garden wifi", "WiFi, Garden, garden"), 100.0);
        assert_eq!(token_set_ratio("pool", "a house with a pool and parking"), 100.0);
        assert_eq!(token_set_ratio("", "anything"), 0.0);
    }

    #[test]
    fn test_token_set_ratio_partial_overlap() {
        let close = token_set_ratio("house with garden in avondale", "garden cottage avondale");
        let far = token_set_ratio("house with garden in avondale", "penthouse downtown");
        assert!(close > far);
        assert!(close > 50.0);
    }

    #[test]
    fn test_relevance_weights() {
        let score = relevance("wifi", "wifi", "");
        assert!((score - 60.0).abs() < 1e-9);
    }
}
