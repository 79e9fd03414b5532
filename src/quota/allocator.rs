//! Budget Allocator
//!
//! Pure functions over [`Configuration`] values: totals, effective headroom,
//! commit-time validation and removal. Nothing here mutates its input; every
//! change produces a new configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{Dimension, QuotaResult, ValidationError};
use super::model::{
    Allocation, Configuration, Consumer, ConsumerRef, Headroom, TargetId, Totals,
};

/// Sum every consumer's allocation.
pub fn totals(config: &Configuration) -> Totals {
    let (likes, comments) = used(config, None);
    Totals {
        likes: saturate(likes),
        comments: saturate(comments),
    }
}

/// Budget remaining once every *other* consumer is counted.
///
/// With `exclude = None` all existing consumers count against the budget
/// (sizing a brand new consumer). With `Some(consumer)` that consumer's own
/// allocation is left out so an editor sees how far it could grow. Each
/// dimension is clamped at zero, even for an over-budget configuration.
pub fn compute_effective_max(config: &Configuration, exclude: Option<ConsumerRef>) -> Headroom {
    let budget = config.budget();
    let (likes, comments) = used(config, exclude);
    Headroom {
        max_likes: saturate(u64::from(budget.max_likes).saturating_sub(likes)),
        max_comments: saturate(u64::from(budget.max_comments).saturating_sub(comments)),
    }
}

/// Validate and apply an insert-or-replace of `consumer`.
///
/// A target whose id already exists is replaced in place; otherwise it is
/// appended. The feed always replaces the feed slot. Dimensions are checked
/// in [`Dimension::CHECK_ORDER`], so likes are reported before comments when
/// both would overflow.
pub fn propose_upsert(config: &Configuration, consumer: Consumer) -> QuotaResult<Configuration> {
    let reference = consumer.reference();
    let requested = consumer.allocation();
    let budget = config.budget();
    let headroom = compute_effective_max(config, Some(reference));
    let (others_likes, others_comments) = used(config, Some(reference));

    for dimension in Dimension::CHECK_ORDER {
        let others = match dimension {
            Dimension::Likes => others_likes,
            Dimension::Comments => others_comments,
        };
        let amount = requested.get(dimension);
        let projected = others + u64::from(amount);
        let limit = budget.limit(dimension);

        if projected > u64::from(limit) {
            return Err(ValidationError::QuotaExceeded {
                dimension,
                requested: amount,
                available: headroom.get(dimension),
                projected_total: saturate(projected),
                limit,
            });
        }
    }

    Ok(match consumer {
        Consumer::Feed(allocation) => config.replacing_feed(allocation),
        Consumer::Target(target) => config.upserting_target(target),
    })
}

/// Drop a target. Removing an absent id is a no-op.
pub fn remove(config: &Configuration, id: TargetId) -> Configuration {
    config.without_target(id)
}

/// Outcome of the interactive soft clamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    pub allocation: Allocation,
    pub likes_clamped: bool,
    pub comments_clamped: bool,
}

impl Clamped {
    pub fn was_clamped(&self) -> bool {
        self.likes_clamped || self.comments_clamped
    }
}

/// Clamp a slider value into `[0, effective_max]`.
///
/// This only keeps interactive inputs responsive; [`propose_upsert`] still
/// re-validates at commit.
pub fn clamp_to_headroom(
    config: &Configuration,
    exclude: Option<ConsumerRef>,
    requested: Allocation,
) -> Clamped {
    let headroom = compute_effective_max(config, exclude);
    Clamped {
        allocation: Allocation::new(
            requested.likes.min(headroom.max_likes),
            requested.comments.min(headroom.max_comments),
        ),
        likes_clamped: requested.likes > headroom.max_likes,
        comments_clamped: requested.comments > headroom.max_comments,
    }
}

/// A limit broken by an externally loaded configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LimitViolation {
    OverBudget {
        dimension: Dimension,
        total: u32,
        limit: u32,
    },
    TooManyTargets {
        count: usize,
        max: usize,
    },
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitViolation::OverBudget {
                dimension,
                total,
                limit,
            } => write!(f, "{} total {} exceeds budget of {}", dimension, total, limit),
            LimitViolation::TooManyTargets { count, max } => {
                write!(f, "{} targets configured, at most {} allowed", count, max)
            }
        }
    }
}

/// Report every limit a configuration breaks without rejecting it.
///
/// Used on load, where stale data may predate a budget change.
pub fn audit(config: &Configuration, max_consumers: usize) -> Vec<LimitViolation> {
    let totals = totals(config);
    let budget = config.budget();
    let mut violations = Vec::new();

    for dimension in Dimension::CHECK_ORDER {
        let total = totals.get(dimension);
        let limit = budget.limit(dimension);
        if total > limit {
            violations.push(LimitViolation::OverBudget {
                dimension,
                total,
                limit,
            });
        }
    }

    if config.target_count() > max_consumers {
        violations.push(LimitViolation::TooManyTargets {
            count: config.target_count(),
            max: max_consumers,
        });
    }

    violations
}

fn used(config: &Configuration, exclude: Option<ConsumerRef>) -> (u64, u64) {
    config
        .consumers()
        .filter(|c| Some(c.reference()) != exclude)
        .map(|c| c.allocation())
        .fold((0, 0), |(likes, comments), a| {
            (likes + u64::from(a.likes), comments + u64::from(a.comments))
        })
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
