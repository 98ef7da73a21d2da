// Language aggregation: histograms -> totals -> displayed selection
// Author: kelexine (https://github.com/kelexine)

use super::colors::language_color;
use crate::models::{
    AggregateOptions, LanguageEntry, LanguageHistogram, LanguageReport, LanguageSummary,
    SubjectProfile,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Default)]
struct Tally {
    bytes: u64,
    repositories: BTreeSet<String>,
}

/// Merge per-repository histograms into one entry per language.
///
/// Entries are sorted by descending bytes (ties by name) and carry their
/// share of the total. A zero total produces an empty list.
pub fn summarize(histograms: &[LanguageHistogram], profile: SubjectProfile) -> LanguageSummary {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut contributing = BTreeSet::new();

    for histogram in histograms {
        for (language, &bytes) in &histogram.languages {
            let tally = tallies.entry(language.as_str()).or_default();
            tally.bytes = tally.bytes.saturating_add(bytes);
            if bytes > 0 {
                tally.repositories.insert(histogram.repository.clone());
                contributing.insert(histogram.repository.as_str());
            }
        }
    }

    let total_bytes = tallies
        .values()
        .fold(0u64, |total, t| total.saturating_add(t.bytes));
    let estimated_repositories = histograms
        .iter()
        .filter(|h| h.estimated && h.total_bytes() > 0)
        .count();

    let mut languages: Vec<LanguageEntry> = if total_bytes == 0 {
        Vec::new()
    } else {
        tallies
            .into_iter()
            .filter(|(_, tally)| tally.bytes > 0)
            .map(|(name, tally)| LanguageEntry {
                name: name.to_string(),
                bytes: tally.bytes,
                percentage: tally.bytes as f64 / total_bytes as f64 * 100.0,
                color: language_color(name),
                repo_count: tally.repositories.len(),
            })
            .collect()
    };

    languages.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));

    debug!(
        "Aggregated {} languages ({} bytes) from {} repositories",
        languages.len(),
        total_bytes,
        contributing.len()
    );

    LanguageSummary {
        profile,
        languages,
        total_bytes,
        total_repositories: contributing.len(),
        estimated_repositories,
    }
}

/// Apply the display options to a summary.
///
/// Percentages keep their pre-filter values; the displayed subset is not
/// rescaled to 100%.
pub fn select(summary: &LanguageSummary, options: &AggregateOptions) -> LanguageReport {
    let options = AggregateOptions::new(options.min_percentage, options.max_languages);

    let languages = summary
        .languages
        .iter()
        .filter(|entry| entry.percentage >= options.min_percentage)
        .take(options.max_languages)
        .cloned()
        .collect();

    LanguageReport {
        profile: summary.profile.clone(),
        languages,
        total_bytes: summary.total_bytes,
        total_languages: summary.languages.len(),
        total_repositories: summary.total_repositories,
        estimated_repositories: summary.estimated_repositories,
    }
}

/// Aggregate histograms and select the displayed languages in one step.
pub fn aggregate(histograms: &[LanguageHistogram], options: &AggregateOptions) -> Vec<LanguageEntry> {
    select(&summarize(histograms, SubjectProfile::default()), options).languages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(repo: &str, languages: &[(&str, u64)]) -> LanguageHistogram {
        LanguageHistogram::new(
            repo,
            languages
                .iter()
                .map(|(name, bytes)| (name.to_string(), *bytes))
                .collect(),
        )
    }

    #[test]
    fn test_huge_byte_counts_saturate() {
        let half = u64::MAX / 2 + 1;
        let histograms = vec![
            histogram("a", &[("C", half)]),
            histogram("b", &[("C", half), ("Rust", 10)]),
        ];
        let summary = summarize(&histograms, SubjectProfile::default());

        assert_eq!(summary.total_bytes, u64::MAX);
        assert_eq!(summary.languages[0].name, "C");
        assert_eq!(summary.languages[0].bytes, u64::MAX);
        assert!(summary.languages[0].percentage <= 100.0);
    }

    #[test]
    fn test_repo_count_tracks_distinct_repositories() {
        let histograms = vec![
            histogram("a", &[("Rust", 100), ("Shell", 10)]),
            histogram("b", &[("Rust", 50)]),
        ];
        let summary = summarize(&histograms, SubjectProfile::default());

        assert_eq!(summary.languages[0].name, "Rust");
        assert_eq!(summary.languages[0].repo_count, 2);
        assert_eq!(summary.languages[1].repo_count, 1);
        assert_eq!(summary.total_repositories, 2);
    }

    #[test]
    fn test_ties_are_ordered_by_name() {
        let histograms = vec![histogram("a", &[("Zig", 10), ("Ada", 10)])];
        let names: Vec<_> = aggregate(&histograms, &AggregateOptions::default())
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Zig"]);
    }

    #[test]
    fn test_zero_bytes_yields_empty_list() {
        let histograms = vec![histogram("a", &[("Rust", 0)]), histogram("b", &[])];
        let summary = summarize(&histograms, SubjectProfile::default());

        assert!(summary.languages.is_empty());
        assert_eq!(summary.total_bytes, 0);
        assert_eq!(summary.total_repositories, 0);
    }

    #[test]
    fn test_select_filters_without_renormalizing() {
        let histograms = vec![histogram(
            "a",
            &[("Rust", 700), ("Go", 200), ("Shell", 80), ("Make", 20)],
        )];
        let summary = summarize(&histograms, SubjectProfile::default());
        let report = select(&summary, &AggregateOptions::new(5.0, 2));

        assert_eq!(report.languages.len(), 2);
        assert_eq!(report.total_languages, 4);
        let shown: f64 = report.languages.iter().map(|e| e.percentage).sum();
        assert!((shown - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_options_clamp_max_languages() {
        assert_eq!(AggregateOptions::new(0.0, 42).max_languages, 8);
        assert_eq!(AggregateOptions::new(0.0, 0).max_languages, 1);
        assert_eq!(AggregateOptions::new(f64::NAN, 3).min_percentage, 0.0);
    }
}
