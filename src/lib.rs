// langstats - GitHub language statistics cards with a two-tier cache
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod languages;
pub mod metrics;
pub mod models;
pub mod server;
pub mod stats;
pub mod utils;
