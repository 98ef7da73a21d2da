// Language aggregation data types
// Author: kelexine (https://github.com/kelexine)

use super::github::{Repository, SubjectProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-repository language byte histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageHistogram {
    pub repository: String,
    pub languages: BTreeMap<String, u64>,
    /// True when the host call failed and the primary-language estimate was used.
    #[serde(default)]
    pub estimated: bool,
}

impl LanguageHistogram {
    pub fn new(repository: impl Into<String>, languages: BTreeMap<String, u64>) -> Self {
        Self {
            repository: repository.into(),
            languages,
            estimated: false,
        }
    }

    /// Single-language estimate built from the repository's primary language
    /// and total size.
    pub fn estimate(repo: &Repository) -> Self {
        let mut languages = BTreeMap::new();
        if let Some(language) = &repo.language {
            languages.insert(language.clone(), repo.size_bytes);
        }
        Self {
            repository: repo.name.clone(),
            languages,
            estimated: true,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.languages
            .values()
            .fold(0u64, |total, &bytes| total.saturating_add(bytes))
    }
}

/// Everything the fetcher learned about one subject.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub profile: SubjectProfile,
    pub repositories: Vec<Repository>,
    pub histograms: Vec<LanguageHistogram>,
}

/// One language in the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub name: String,
    pub bytes: u64,
    /// Share of all bytes, 0-100, computed before any filtering.
    pub percentage: f64,
    pub color: String,
    pub repo_count: usize,
}

/// Options applied when selecting which languages to display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    pub min_percentage: f64,
    pub max_languages: usize,
}

impl AggregateOptions {
    /// Upper bound on displayed languages.
    pub const MAX_LANGUAGES: usize = 8;

    pub fn new(min_percentage: f64, max_languages: usize) -> Self {
        Self {
            min_percentage: if min_percentage.is_finite() {
                min_percentage.clamp(0.0, 100.0)
            } else {
                0.0
            },
            max_languages: max_languages.clamp(1, Self::MAX_LANGUAGES),
        }
    }
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self::new(0.0, Self::MAX_LANGUAGES)
    }
}

/// Complete, unfiltered aggregate for a subject. This is the cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSummary {
    pub profile: SubjectProfile,
    /// All languages, sorted by descending bytes.
    pub languages: Vec<LanguageEntry>,
    pub total_bytes: u64,
    pub total_repositories: usize,
    pub estimated_repositories: usize,
}

/// Displayed subset of a summary plus the pre-filter totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageReport {
    pub profile: SubjectProfile,
    pub languages: Vec<LanguageEntry>,
    pub total_bytes: u64,
    pub total_languages: usize,
    pub total_repositories: usize,
    pub estimated_repositories: usize,
}
