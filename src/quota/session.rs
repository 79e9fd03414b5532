// Consumer Edit Session
//
// Drives the add/edit dialog of a target consumer:
//
//   Closed -> Open(New | Edit(id)) -> Validating -> Committed -> Closed
//                     ^                          \
//                     +------ Rejected (error) <--+
//
// Sliders are soft-clamped to the effective max while the dialog is open;
// the commit step re-validates against the full configuration.

use tracing::{debug, info};

use super::allocator;
use super::error::{QuotaResult, ValidationError};
use super::label::LabelStyle;
use super::model::{Allocation, Configuration, ConsumerRef, Headroom, TargetId};
use super::registry::ConsumerRegistry;

/// Default likes seeded into a new target draft
pub const NEW_DRAFT_LIKES: u32 = 5;
/// Default comments seeded into a new target draft
pub const NEW_DRAFT_COMMENTS: u32 = 3;

/// What the open dialog is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    New,
    Edit(TargetId),
}

impl EditMode {
    fn exclude(&self) -> Option<ConsumerRef> {
        match self {
            EditMode::New => None,
            EditMode::Edit(id) => Some(ConsumerRef::Target(*id)),
        }
    }
}

/// Values being edited in the dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub label: String,
    pub allocation: Allocation,
}

/// Current session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open {
        mode: EditMode,
        draft: Draft,
        /// Error from the last rejected commit
        error: Option<ValidationError>,
    },
    Validating {
        mode: EditMode,
        draft: Draft,
    },
}

/// Result of a commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// New configuration; the session is closed again
    Committed(Configuration),
    /// Session stays open in the same mode with the error attached
    Rejected(ValidationError),
}

/// One add/edit dialog over a configuration
#[derive(Debug, Clone)]
pub struct EditSession {
    registry: ConsumerRegistry,
    style: LabelStyle,
    state: SessionState,
    /// Draft as it was when the dialog opened
    initial: Option<Draft>,
}

impl EditSession {
    pub fn new(registry: ConsumerRegistry, style: LabelStyle) -> Self {
        Self {
            registry,
            style,
            state: SessionState::Closed,
            initial: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open { .. })
    }

    pub fn mode(&self) -> Option<EditMode> {
        match &self.state {
            SessionState::Open { mode, .. } | SessionState::Validating { mode, .. } => Some(*mode),
            SessionState::Closed => None,
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            SessionState::Open { draft, .. } | SessionState::Validating { draft, .. } => {
                Some(draft)
            }
            SessionState::Closed => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match &self.state {
            SessionState::Open { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    /// Open the dialog for a new target.
    ///
    /// Runs the registry's pre-emptive checks; on failure the session stays
    /// closed. The draft is seeded with up to 5 likes and 3 comments, bounded
    /// by the available headroom.
    pub fn open_new(&mut self, config: &Configuration) -> QuotaResult<Headroom> {
        let headroom = self.registry.check_can_add(config)?;
        let draft = Draft {
            label: String::new(),
            allocation: Allocation::new(
                NEW_DRAFT_LIKES.min(headroom.max_likes),
                NEW_DRAFT_COMMENTS.min(headroom.max_comments),
            ),
        };

        debug!(?headroom, "Opening new target dialog");
        self.open(EditMode::New, draft);
        Ok(headroom)
    }

    /// Open the dialog on an existing target.
    pub fn open_edit(&mut self, config: &Configuration, id: TargetId) -> QuotaResult<Headroom> {
        let target = config
            .target(id)
            .ok_or(ValidationError::NotFound { id })?;
        let draft = Draft {
            label: target.label.clone(),
            allocation: target.allocation,
        };

        debug!(%id, "Opening edit dialog");
        self.open(EditMode::Edit(id), draft);
        Ok(allocator::compute_effective_max(config, Some(id.into())))
    }

    fn open(&mut self, mode: EditMode, draft: Draft) {
        self.initial = Some(draft.clone());
        self.state = SessionState::Open {
            mode,
            draft,
            error: None,
        };
    }

    /// Headroom the open dialog may grow into
    pub fn headroom(&self, config: &Configuration) -> Option<Headroom> {
        self.mode()
            .map(|mode| allocator::compute_effective_max(config, mode.exclude()))
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        if let SessionState::Open { draft, .. } = &mut self.state {
            draft.label = label.into();
        }
    }

    /// Set the likes slider, soft-clamped. Returns whether it was clamped.
    pub fn set_likes(&mut self, config: &Configuration, likes: u32) -> bool {
        self.set_allocation(config, |a| a.likes = likes)
    }

    /// Set the comments slider, soft-clamped. Returns whether it was clamped.
    pub fn set_comments(&mut self, config: &Configuration, comments: u32) -> bool {
        self.set_allocation(config, |a| a.comments = comments)
    }

    fn set_allocation(&mut self, config: &Configuration, update: impl FnOnce(&mut Allocation)) -> bool {
        let SessionState::Open { mode, draft, .. } = &mut self.state else {
            return false;
        };

        let mut requested = draft.allocation;
        update(&mut requested);
        let clamped = allocator::clamp_to_headroom(config, mode.exclude(), requested);
        draft.allocation = clamped.allocation;
        clamped.was_clamped()
    }

    /// Whether the dialog differs from what it opened with
    pub fn has_changes(&self) -> bool {
        match (&self.state, &self.initial) {
            (SessionState::Open { mode: EditMode::New, draft, .. }, _) => {
                !draft.label.trim().is_empty()
            }
            (SessionState::Open { draft, .. }, Some(initial)) => draft != initial,
            _ => false,
        }
    }

    /// Validate the draft against the full configuration.
    ///
    /// Returns `None` when no dialog is open.
    pub fn commit(&mut self, config: &Configuration) -> Option<CommitOutcome> {
        let (mode, draft) = match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Open { mode, draft, .. } => (mode, draft),
            other => {
                self.state = other;
                return None;
            }
        };

        self.state = SessionState::Validating {
            mode,
            draft: draft.clone(),
        };

        let result = match mode {
            EditMode::New => self
                .registry
                .add(config, &draft.label, self.style, draft.allocation)
                .map(|(updated, _)| updated),
            EditMode::Edit(id) => {
                self.registry
                    .edit(config, id, &draft.label, self.style, draft.allocation)
            }
        };

        match result {
            Ok(updated) => {
                info!(?mode, "Edit session committed");
                self.state = SessionState::Closed;
                self.initial = None;
                Some(CommitOutcome::Committed(updated))
            }
            Err(err) => {
                debug!(?mode, %err, "Edit session rejected");
                self.state = SessionState::Open {
                    mode,
                    draft,
                    error: Some(err.clone()),
                };
                Some(CommitOutcome::Rejected(err))
            }
        }
    }

    /// Discard the draft. The configuration is left unchanged.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            debug!("Edit session discarded");
        }
        self.state = SessionState::Closed;
        self.initial = None;
    }
}
