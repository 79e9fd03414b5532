//! Quota Model
//!
//! Entity definitions for the engagement budget: the per-scope [`Budget`],
//! the consumers that hold a share of it, and the immutable
//! [`Configuration`] value that the allocator transforms.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::Dimension;

/// Default likes cap per configuration scope
pub const DEFAULT_MAX_LIKES: u32 = 10;
/// Default comments cap per configuration scope
pub const DEFAULT_MAX_COMMENTS: u32 = 10;
/// Default number of target consumers per configuration
pub const DEFAULT_MAX_CONSUMERS: usize = 3;

/// Fixed global cap on likes and comments for a configuration scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum likes across all consumers
    pub max_likes: u32,

    /// Maximum comments across all consumers
    pub max_comments: u32,
}

impl Budget {
    pub const fn new(max_likes: u32, max_comments: u32) -> Self {
        Self {
            max_likes,
            max_comments,
        }
    }

    /// Cap for a single dimension
    pub fn limit(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Likes => self.max_likes,
            Dimension::Comments => self.max_comments,
        }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LIKES, DEFAULT_MAX_COMMENTS)
    }
}

/// Likes and comments held by one consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub likes: u32,
    pub comments: u32,
}

impl Allocation {
    pub const ZERO: Allocation = Allocation {
        likes: 0,
        comments: 0,
    };

    pub const fn new(likes: u32, comments: u32) -> Self {
        Self { likes, comments }
    }

    pub fn get(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Likes => self.likes,
            Dimension::Comments => self.comments,
        }
    }
}

/// Derived sums over every consumer of a configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub likes: u32,
    pub comments: u32,
}

impl Totals {
    pub fn get(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Likes => self.likes,
            Dimension::Comments => self.comments,
        }
    }
}

/// Budget left for one consumer once all others are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headroom {
    pub max_likes: u32,
    pub max_comments: u32,
}

impl Headroom {
    pub fn get(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Likes => self.max_likes,
            Dimension::Comments => self.max_comments,
        }
    }

    /// Nothing left on either dimension
    pub fn is_exhausted(&self) -> bool {
        self.max_likes == 0 && self.max_comments == 0
    }
}

/// Namespace of ids derived for stored targets without one
const DERIVED_ID_NAMESPACE: Uuid = Uuid::from_u128(0x5b1c_3f0e_8a2d_4c6b_9e7f_1d2a_3b4c_5d6e);

/// Stable identifier of a target consumer.
///
/// Minted by the registry when a target is created and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(Uuid);

impl TargetId {
    /// Mint a fresh id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id that is the same every time it is derived from `seed`.
    ///
    /// Used for stored targets that carry no id, so repeated loads of the
    /// same record agree on their ids.
    pub fn derived(seed: &str) -> Self {
        Self(Uuid::new_v5(&DERIVED_ID_NAMESPACE, seed.as_bytes()))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TargetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity of a consumer inside a configuration.
///
/// The feed has no id of its own; it is always addressed by slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerRef {
    Feed,
    Target(TargetId),
}

impl From<TargetId> for ConsumerRef {
    fn from(id: TargetId) -> Self {
        ConsumerRef::Target(id)
    }
}

/// Keyword or community scoped consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,

    /// Keyword, hashtag or community name
    pub label: String,

    pub allocation: Allocation,
}

impl Target {
    pub fn new(id: TargetId, label: impl Into<String>, allocation: Allocation) -> Self {
        Self {
            id,
            label: label.into(),
            allocation,
        }
    }
}

/// Entity holding a share of the budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumer {
    /// Default-timeline engagement; mandatory and never removable
    Feed(Allocation),
    /// User-added keyword or community consumer
    Target(Target),
}

impl Consumer {
    pub fn reference(&self) -> ConsumerRef {
        match self {
            Consumer::Feed(_) => ConsumerRef::Feed,
            Consumer::Target(target) => ConsumerRef::Target(target.id),
        }
    }

    pub fn allocation(&self) -> Allocation {
        match self {
            Consumer::Feed(allocation) => *allocation,
            Consumer::Target(target) => target.allocation,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Consumer::Feed(_) => None,
            Consumer::Target(target) => Some(&target.label),
        }
    }
}

/// Errors raised when a configuration is built from external data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeCount { field: String, value: i64 },

    #[error("{field} is out of range: {value}")]
    CountOutOfRange { field: String, value: i64 },

    #[error("duplicate target id: {0}")]
    DuplicateTargetId(TargetId),
}

/// Immutable allocation state for one configuration scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    budget: Budget,
    feed: Allocation,
    targets: Vec<Target>,
}

impl Configuration {
    /// Build a configuration, rejecting duplicate target ids.
    ///
    /// Over-budget input is accepted here; see [`super::allocator::audit`].
    pub fn new(budget: Budget, feed: Allocation, targets: Vec<Target>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(targets.len());
        for target in &targets {
            if !seen.insert(target.id) {
                return Err(ModelError::DuplicateTargetId(target.id));
            }
        }

        Ok(Self {
            budget,
            feed,
            targets,
        })
    }

    /// Configuration holding only the feed consumer
    pub fn with_feed(budget: Budget, feed: Allocation) -> Self {
        Self {
            budget,
            feed,
            targets: Vec::new(),
        }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn feed(&self) -> Allocation {
        self.feed
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Current allocation of a consumer, if present
    pub fn allocation_of(&self, consumer: ConsumerRef) -> Option<Allocation> {
        match consumer {
            ConsumerRef::Feed => Some(self.feed),
            ConsumerRef::Target(id) => self.target(id).map(|t| t.allocation),
        }
    }

    /// Every consumer in display order: feed first, then targets
    pub fn consumers(&self) -> impl Iterator<Item = Consumer> + '_ {
        std::iter::once(Consumer::Feed(self.feed))
            .chain(self.targets.iter().cloned().map(Consumer::Target))
    }

    pub(crate) fn replacing_feed(&self, feed: Allocation) -> Self {
        Self {
            feed,
            ..self.clone()
        }
    }

    /// Replace the target with the same id in place, or append it
    pub(crate) fn upserting_target(&self, target: Target) -> Self {
        let mut targets = self.targets.clone();
        match targets.iter_mut().find(|t| t.id == target.id) {
            Some(slot) => *slot = target,
            None => targets.push(target),
        }
        Self {
            targets,
            ..self.clone()
        }
    }

    pub(crate) fn without_target(&self, id: TargetId) -> Self {
        Self {
            targets: self.targets.iter().filter(|t| t.id != id).cloned().collect(),
            ..self.clone()
        }
    }
}
