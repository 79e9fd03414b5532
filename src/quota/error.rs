//! Allocator Error Types
//!
//! Every allocator and registry operation that can fail returns one of these
//! values. They are never panics: the caller decides whether to surface,
//! log, or ignore them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::model::TargetId;

/// Result type alias for allocator operations
pub type QuotaResult<T> = Result<T, ValidationError>;

/// Budget dimension that a proposal can violate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Likes budget
    Likes,
    /// Comments budget
    Comments,
}

impl Dimension {
    /// Check order used when a proposal violates several dimensions.
    ///
    /// Likes are always reported before comments.
    pub const CHECK_ORDER: [Dimension; 2] = [Dimension::Likes, Dimension::Comments];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Likes => "likes",
            Dimension::Comments => "comments",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a label was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelIssue {
    /// Nothing left after trimming/normalization
    Empty,
    /// Keyword labels must be a single word
    ContainsWhitespace,
    /// "#" with nothing after it
    BareHashtag,
    /// Community name shorter than 2 characters
    TooShort,
    /// Community name longer than 21 characters
    TooLong,
    /// Community name with characters outside [A-Za-z0-9_]
    InvalidCharacters,
}

impl fmt::Display for LabelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            LabelIssue::Empty => "label is empty",
            LabelIssue::ContainsWhitespace => "only single words are allowed",
            LabelIssue::BareHashtag => "label cannot be just a hashtag",
            LabelIssue::TooShort => "community name must be at least 2 characters",
            LabelIssue::TooLong => "community name cannot exceed 21 characters",
            LabelIssue::InvalidCharacters => {
                "community name can only contain letters, numbers, and underscores"
            }
        };
        f.write_str(msg)
    }
}

/// Validation failures reported to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A proposed allocation would break the global budget invariant.
    ///
    /// `requested` is the consumer's own amount on `dimension`; `available`
    /// is the effective max with that consumer excluded. `projected_total`
    /// is the hypothetical sum that tripped `limit`.
    #[error("{dimension} quota exceeded: requested {requested}, only {available} available (total {projected_total} of {limit})")]
    QuotaExceeded {
        dimension: Dimension,
        requested: u32,
        available: u32,
        projected_total: u32,
        limit: u32,
    },

    /// Maximum number of target consumers already reached
    #[error("target limit reached: at most {max} targets allowed")]
    LimitReached { max: usize },

    /// Label fails the platform-specific pattern
    #[error("invalid label: {reason}")]
    LabelFormatInvalid { reason: LabelIssue },

    /// Referenced target does not exist in the configuration
    #[error("target not found: {id}")]
    NotFound { id: TargetId },
}

impl ValidationError {
    /// Dimension of a quota violation, if this is one
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            ValidationError::QuotaExceeded { dimension, .. } => Some(*dimension),
            _ => None,
        }
    }

    /// Whether callers may treat this error as a no-op (remove of a missing id)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ValidationError::NotFound { .. })
    }
}
