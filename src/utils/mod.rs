//! Utility functions and helpers for langstats.
//!
//! This module provides cross-cutting concerns like structured logging,
//! token sanitization, fixed-backoff retries and display formatting.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Bounded retries with a constant delay (durable store connect).
//! - `format`: Human-readable byte sizes and percentages.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod format;
pub mod logging;
pub mod retry;
