//! Engagement Quota Allocation Module
//!
//! Divides a small per-scope budget of likes and comments between a
//! mandatory feed consumer and up to N keyword/community targets, and keeps
//! the sum within the budget while targets are added, edited and removed.
//!
//! # Features
//!
//! - Pure headroom and totals computation over immutable configurations
//! - Commit-time validation with a typed error taxonomy
//! - Per-platform label rules and target cardinality limits
//! - Edit-session state machine with soft clamping for interactive inputs
//! - Async load/save boundary with the dashboard's JSON record shape
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              EditSession  /  MultiPlatformConfiguration      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     ConsumerRegistry                         │
//! │        (cardinality, label format, pre-emptive checks)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        Allocator                             │
//! │   totals · compute_effective_max · propose_upsert · remove   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Model (Budget, Configuration, Consumer)  │ ValidationError  │
//! └─────────────────────────────────────────────────────────────┘
//!               ▲ load                     │ save
//!               └──── ConfigurationStore ◄─┘
//! ```

pub mod allocator;
pub mod error;
pub mod label;
pub mod model;
pub mod platform;
pub mod registry;
pub mod session;
pub mod store;

#[cfg(test)]
mod proptests;

pub use allocator::{compute_effective_max, propose_upsert, remove, totals, LimitViolation};
pub use error::{Dimension, LabelIssue, QuotaResult, ValidationError};
pub use label::LabelStyle;
pub use model::{
    Allocation, Budget, Configuration, Consumer, ConsumerRef, Headroom, ModelError, Target,
    TargetId, Totals,
};
pub use platform::{MultiPlatformConfiguration, Platform};
pub use registry::ConsumerRegistry;
pub use session::{CommitOutcome, EditMode, EditSession, SessionState};
pub use store::{ConfigurationRecord, ConfigurationStore, InMemoryStore, JsonFileStore};
