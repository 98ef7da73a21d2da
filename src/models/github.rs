// GitHub REST API type definitions
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Repository object as returned by `GET /users/{user}/repos`.
///
/// Only the fields the aggregation needs are decoded; GitHub sends many more.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoResponse {
    pub name: String,
    #[serde(default)]
    pub owner: Option<OwnerResponse>,
    #[serde(default)]
    pub language: Option<String>,
    /// Repository size in kilobytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerResponse {
    pub login: String,
}

/// Subject metadata as returned by `GET /users/{user}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
}

/// Body of `GET /repos/{owner}/{repo}/languages`: language name to bytes.
pub type LanguagesResponse = BTreeMap<String, u64>;

/// Error document GitHub attaches to non-success responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: Option<String>,
}

/// A repository owned by the subject, reduced to what aggregation uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub language: Option<String>,
    pub size_bytes: u64,
    pub fork: bool,
}

impl Repository {
    /// Build a repository from the API object; `subject` is used when the
    /// payload omits the owner.
    pub fn from_response(response: RepoResponse, subject: &str) -> Self {
        Self {
            owner: response
                .owner
                .map(|o| o.login)
                .unwrap_or_else(|| subject.to_string()),
            name: response.name,
            language: response.language.filter(|l| !l.trim().is_empty()),
            size_bytes: response.size.saturating_mul(1024),
            fork: response.fork,
        }
    }

    /// Whether the repository takes part in aggregation.
    pub fn is_countable(&self) -> bool {
        !self.fork && self.language.is_some()
    }
}

/// Subject metadata carried alongside the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProfile {
    pub login: String,
    pub name: Option<String>,
    pub public_repos: u64,
}

impl From<UserResponse> for SubjectProfile {
    fn from(user: UserResponse) -> Self {
        Self {
            login: user.login,
            name: user.name.filter(|n| !n.trim().is_empty()),
            public_repos: user.public_repos,
        }
    }
}
