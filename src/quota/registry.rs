//! Consumer Registry
//!
//! Add/edit/remove orchestration on top of the allocator, adding the
//! cardinality and label-format rules of a configuration screen.

use tracing::{debug, info};

use super::allocator;
use super::error::{Dimension, QuotaResult, ValidationError};
use super::label::{normalize_label, LabelStyle};
use super::model::{
    Allocation, Configuration, Consumer, Headroom, Target, TargetId, DEFAULT_MAX_CONSUMERS,
};

/// Registry of target consumers for one configuration screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerRegistry {
    /// Maximum number of target consumers
    max_consumers: usize,
}

impl Default for ConsumerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONSUMERS)
    }
}

impl ConsumerRegistry {
    pub fn new(max_consumers: usize) -> Self {
        Self { max_consumers }
    }

    pub fn max_consumers(&self) -> usize {
        self.max_consumers
    }

    /// Gate run before an add dialog opens.
    ///
    /// Fails with `LimitReached` when the target slots are full, then with
    /// `QuotaExceeded` when neither likes nor comments remain. On success
    /// returns the headroom available to the new consumer.
    pub fn check_can_add(&self, config: &Configuration) -> QuotaResult<Headroom> {
        if config.target_count() >= self.max_consumers {
            debug!(
                targets = config.target_count(),
                max = self.max_consumers,
                "Target limit reached"
            );
            return Err(ValidationError::LimitReached {
                max: self.max_consumers,
            });
        }

        let headroom = allocator::compute_effective_max(config, None);
        if headroom.is_exhausted() {
            debug!("No likes or comments left for a new target");
            return Err(exhausted(config));
        }

        Ok(headroom)
    }

    /// Create a target with a freshly minted id.
    pub fn add(
        &self,
        config: &Configuration,
        label: &str,
        style: LabelStyle,
        allocation: Allocation,
    ) -> QuotaResult<(Configuration, TargetId)> {
        self.check_can_add(config)?;
        let label = normalize_label(label, style)?;

        let id = TargetId::generate();
        let target = Target::new(id, label.as_str(), allocation);
        let updated = allocator::propose_upsert(config, Consumer::Target(target))
            .inspect_err(|err| debug!(%label, %err, "Add rejected"))?;

        info!(%id, %label, likes = allocation.likes, comments = allocation.comments, "Target added");
        Ok((updated, id))
    }

    /// Replace an existing target's label and allocation.
    ///
    /// The edited target's own allocation is excluded from the headroom it
    /// is validated against.
    pub fn edit(
        &self,
        config: &Configuration,
        id: TargetId,
        label: &str,
        style: LabelStyle,
        allocation: Allocation,
    ) -> QuotaResult<Configuration> {
        if config.target(id).is_none() {
            return Err(ValidationError::NotFound { id });
        }
        let label = normalize_label(label, style)?;

        let target = Target::new(id, label.as_str(), allocation);
        let updated = allocator::propose_upsert(config, Consumer::Target(target))
            .inspect_err(|err| debug!(%id, %err, "Edit rejected"))?;

        info!(%id, %label, likes = allocation.likes, comments = allocation.comments, "Target updated");
        Ok(updated)
    }

    /// Change the feed consumer's allocation.
    pub fn edit_feed(
        &self,
        config: &Configuration,
        allocation: Allocation,
    ) -> QuotaResult<Configuration> {
        let updated = allocator::propose_upsert(config, Consumer::Feed(allocation))
            .inspect_err(|err| debug!(%err, "Feed edit rejected"))?;

        info!(likes = allocation.likes, comments = allocation.comments, "Feed updated");
        Ok(updated)
    }

    /// Remove a target.
    ///
    /// `NotFound` is informational; callers may treat it as a no-op. The
    /// feed cannot be named here.
    pub fn remove(&self, config: &Configuration, id: TargetId) -> QuotaResult<Configuration> {
        if config.target(id).is_none() {
            return Err(ValidationError::NotFound { id });
        }

        info!(%id, "Target removed");
        Ok(allocator::remove(config, id))
    }
}

/// Error for a configuration with no headroom left on either dimension.
///
/// Reported on likes, matching the commit-time check order.
fn exhausted(config: &Configuration) -> ValidationError {
    let budget = config.budget();
    ValidationError::QuotaExceeded {
        dimension: Dimension::Likes,
        requested: 0,
        available: 0,
        projected_total: allocator::totals(config).likes,
        limit: budget.max_likes,
    }
}
