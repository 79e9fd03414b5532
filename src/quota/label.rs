//! Target Label Rules
//!
//! Community-style labels (subreddits) and generic keyword/hashtag labels
//! follow different formats. Normalization happens before validation.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{LabelIssue, QuotaResult, ValidationError};

/// Prefix stripped from community names
pub const COMMUNITY_PREFIX: &str = "r/";

const COMMUNITY_MIN_LEN: usize = 2;
const COMMUNITY_MAX_LEN: usize = 21;

lazy_static! {
    static ref COMMUNITY_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_]{2,21}$").unwrap();
    static ref COMMUNITY_CHARSET: Regex = Regex::new(r"^[A-Za-z0-9_]*$").unwrap();
}

/// Label format family of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Free-form single word, optional leading '#'
    Keyword,
    /// Community name such as a subreddit
    Community,
}

/// Normalize and validate a label, returning the stored form.
pub fn normalize_label(raw: &str, style: LabelStyle) -> QuotaResult<String> {
    match style {
        LabelStyle::Keyword => normalize_keyword(raw),
        LabelStyle::Community => normalize_community(raw),
    }
    .map_err(|reason| ValidationError::LabelFormatInvalid { reason })
}

fn normalize_keyword(raw: &str) -> Result<String, LabelIssue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LabelIssue::Empty);
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(LabelIssue::ContainsWhitespace);
    }
    if trimmed == "#" {
        return Err(LabelIssue::BareHashtag);
    }
    Ok(trimmed.to_string())
}

fn normalize_community(raw: &str) -> Result<String, LabelIssue> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix(COMMUNITY_PREFIX).unwrap_or(trimmed);
    let name: String = name.chars().filter(|&c| c != '/').collect();

    if COMMUNITY_PATTERN.is_match(&name) {
        return Ok(name);
    }

    // Pick the most specific reason
    if name.is_empty() {
        Err(LabelIssue::Empty)
    } else if !COMMUNITY_CHARSET.is_match(&name) {
        Err(LabelIssue::InvalidCharacters)
    } else if name.len() < COMMUNITY_MIN_LEN {
        Err(LabelIssue::TooShort)
    } else {
        debug_assert!(name.len() > COMMUNITY_MAX_LEN);
        Err(LabelIssue::TooLong)
    }
}
