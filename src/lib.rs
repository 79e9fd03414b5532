//! Engagement Quota Library
//!
//! Budget allocation for automated social engagement: a per-scope budget of
//! likes and comments shared between a feed and a few keyword or community
//! targets, with commit-time validation, persistence and configuration.

pub mod config;
pub mod logging;
pub mod quota;
