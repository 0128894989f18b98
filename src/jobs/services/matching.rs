// src/jobs/services/matching.rs
//! Heading-to-title matching for job recommendations

/// Lower-cased words of an applicant heading longer than three characters
pub fn heading_keywords(heading: &str) -> Vec<String> {
    heading
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

/// Number of keywords contained in the title, case-insensitively
pub fn match_score(title: &str, keywords: &[String]) -> usize {
    let title = title.to_lowercase();
    keywords.iter().filter(|word| title.contains(word.as_str())).count()
}

/// Keeps titles with at least one match, best matches first, at most `limit`.
/// Ties keep their input order.
pub fn rank_by_keywords<T, F>(items: Vec<T>, keywords: &[String], title_of: F, limit: usize) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut scored: Vec<(usize, T)> = items
        .into_iter()
        .map(|item| (match_score(title_of(&item), keywords), item))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, item)| item).collect()
}
