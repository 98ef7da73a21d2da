//! Data models for the GitHub API and the language aggregate.
//!
//! This module contains:
//! - Wire types for the upstream GitHub REST API (`github`)
//! - Histogram, entry, summary and report types used by aggregation,
//!   caching and rendering (`languages`)

// Author: kelexine (https://github.com/kelexine)

pub mod github;
pub mod languages;

pub use github::{Repository, SubjectProfile};
pub use languages::{
    AggregateOptions, FetchOutcome, LanguageEntry, LanguageHistogram, LanguageReport,
    LanguageSummary,
};
