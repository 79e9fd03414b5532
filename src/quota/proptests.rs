//! Property-Based Tests for the Allocator
//!
//! Random sequences of upserts and removals starting from a valid
//! configuration must never break the budget invariant.
//!
//! # Running the Tests
//!
//! ```bash
//! cargo test --lib quota::proptests
//! ```

use proptest::prelude::*;

use crate::quota::allocator::{compute_effective_max, propose_upsert, remove, totals};
use crate::quota::error::ValidationError;
use crate::quota::label::LabelStyle;
use crate::quota::model::{Allocation, Budget, Configuration, Consumer, Target, TargetId};
use crate::quota::registry::ConsumerRegistry;

#[derive(Debug, Clone)]
enum Op {
    /// Upsert a new target
    Create(u32, u32),
    /// Upsert over the n-th existing target (modulo count)
    Edit(usize, u32, u32),
    /// Replace the feed allocation
    Feed(u32, u32),
    /// Remove the n-th existing target (modulo count)
    Remove(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..8, 0u32..8).prop_map(|(l, c)| Op::Create(l, c)),
        (0usize..4, 0u32..12, 0u32..12).prop_map(|(i, l, c)| Op::Edit(i, l, c)),
        (0u32..12, 0u32..12).prop_map(|(l, c)| Op::Feed(l, c)),
        (0usize..4).prop_map(Op::Remove),
    ]
}

fn apply(config: &Configuration, op: &Op) -> Configuration {
    let nth = |i: usize| config.targets().get(i % config.target_count().max(1)).map(|t| t.id);

    let result = match *op {
        Op::Create(likes, comments) => propose_upsert(
            config,
            Consumer::Target(Target::new(
                TargetId::generate(),
                "#prop",
                Allocation::new(likes, comments),
            )),
        ),
        Op::Edit(i, likes, comments) => match nth(i) {
            Some(id) => propose_upsert(
                config,
                Consumer::Target(Target::new(id, "#prop", Allocation::new(likes, comments))),
            ),
            None => Ok(config.clone()),
        },
        Op::Feed(likes, comments) => {
            propose_upsert(config, Consumer::Feed(Allocation::new(likes, comments)))
        }
        Op::Remove(i) => Ok(match nth(i) {
            Some(id) => remove(config, id),
            None => config.clone(),
        }),
    };

    // A rejection leaves the configuration as it was
    result.unwrap_or_else(|_| config.clone())
}

proptest! {
    /// Totals never exceed the budget along any operation sequence
    #[test]
    fn prop_budget_invariant_holds(
        max_likes in 0u32..20,
        max_comments in 0u32..20,
        ops in prop::collection::vec(arb_op(), 0..40)
    ) {
        let mut config = Configuration::with_feed(Budget::new(max_likes, max_comments), Allocation::ZERO);
        for op in &ops {
            config = apply(&config, op);
            let t = totals(&config);
            prop_assert!(t.likes <= max_likes);
            prop_assert!(t.comments <= max_comments);
        }
    }

    /// Removing twice is the same as removing once
    #[test]
    fn prop_remove_idempotent(
        ops in prop::collection::vec(arb_op(), 0..20),
        pick in 0usize..4
    ) {
        let mut config = Configuration::with_feed(Budget::default(), Allocation::ZERO);
        for op in &ops {
            config = apply(&config, op);
        }
        let id = config
            .targets()
            .get(pick % config.target_count().max(1))
            .map(|t| t.id)
            .unwrap_or_else(TargetId::generate);

        let once = remove(&config, id);
        prop_assert_eq!(remove(&once, id), once);
    }

    /// A successful create consumes exactly its allocation from the add headroom
    #[test]
    fn prop_headroom_round_trip(
        feed_likes in 0u32..=10,
        feed_comments in 0u32..=10,
        likes in 0u32..=10,
        comments in 0u32..=10
    ) {
        let config = Configuration::with_feed(Budget::default(), Allocation::new(feed_likes, feed_comments));
        let before = compute_effective_max(&config, None);
        let target = Target::new(TargetId::generate(), "#prop", Allocation::new(likes, comments));

        match propose_upsert(&config, Consumer::Target(target.clone())) {
            Ok(updated) => {
                let after = compute_effective_max(&updated, None);
                prop_assert_eq!(after.max_likes, before.max_likes - likes);
                prop_assert_eq!(after.max_comments, before.max_comments - comments);
                prop_assert_eq!(compute_effective_max(&updated, Some(target.id.into())), before);
            }
            Err(ValidationError::QuotaExceeded { requested, available, .. }) => {
                prop_assert!(requested > available);
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    /// Accepted proposals are exactly those fitting the effective max
    #[test]
    fn prop_accept_iff_within_headroom(
        feed_likes in 0u32..=12,
        feed_comments in 0u32..=12,
        likes in 0u32..=12,
        comments in 0u32..=12
    ) {
        let config = Configuration::with_feed(Budget::default(), Allocation::new(feed_likes, feed_comments));
        let headroom = compute_effective_max(&config, None);
        let over_budget = feed_likes > 10 || feed_comments > 10;
        let fits = likes <= headroom.max_likes && comments <= headroom.max_comments && !over_budget;

        let target = Target::new(TargetId::generate(), "#prop", Allocation::new(likes, comments));
        prop_assert_eq!(propose_upsert(&config, Consumer::Target(target)).is_ok(), fits);
    }

    /// Community labels always normalize to the stored pattern or fail
    #[test]
    fn prop_community_label_normalized(raw in "(r/)?[A-Za-z0-9_/]{0,25}") {
        let registry = ConsumerRegistry::new(3);
        let config = Configuration::with_feed(Budget::default(), Allocation::ZERO);

        if let Ok((updated, id)) = registry.add(&config, &raw, LabelStyle::Community, Allocation::ZERO) {
            let label = &updated.target(id).unwrap().label;
            prop_assert!(!label.contains('/'));
            prop_assert!(label.len() >= 2 && label.len() <= 21);
        }
    }
}
