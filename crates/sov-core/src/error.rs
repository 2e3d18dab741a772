use crate::event::EventId;
use crate::policy::PolicyId;
use crate::resource::Resource;

/// Alias for `Result<T, SovError>`.
pub type SovResult<T> = Result<T, SovError>;

/// Errors raised by the reign model and content catalogs.
///
/// State errors leave the [`ReignState`](crate::ReignState) untouched; the
/// attempted action is simply rejected.
#[derive(Debug, thiserror::Error)]
pub enum SovError {
    /// The crown cannot pay for the action.
    #[error("insufficient {resource}: requires {required}, have {available}")]
    InsufficientResources {
        /// The resource that ran short.
        resource: Resource,
        /// Amount required.
        required: i32,
        /// Amount available.
        available: i32,
    },

    /// The policy excludes a policy that is already active.
    #[error("law \"{policy}\" is incompatible with active law \"{conflicts_with}\"")]
    PolicyConflict {
        /// The policy being enacted.
        policy: PolicyId,
        /// The active policy it conflicts with.
        conflicts_with: PolicyId,
    },

    /// The policy is already in force.
    #[error("law \"{0}\" is already in force")]
    PolicyAlreadyActive(PolicyId),

    /// The policy is not in force.
    #[error("law \"{0}\" is not in force")]
    PolicyNotActive(PolicyId),

    /// The policy was enacted too recently to be revoked.
    #[error("law \"{policy}\" cannot be revoked for {turns_remaining} more turn(s)")]
    PolicyLocked {
        /// The locked policy.
        policy: PolicyId,
        /// Turns until it may be revoked.
        turns_remaining: u32,
    },

    /// The chosen option costs more than the realm has.
    #[error("option {index} of event \"{event}\" is out of reach: {reason}")]
    OptionBlocked {
        /// The event being resolved.
        event: EventId,
        /// The requested index.
        index: usize,
        /// What is missing.
        reason: String,
    },

    /// The chosen option index does not exist on the event.
    #[error("invalid option {index} for event \"{event}\" ({count} option(s))")]
    InvalidOption {
        /// The event being resolved.
        event: EventId,
        /// The requested index.
        index: usize,
        /// How many options the event has.
        count: usize,
    },

    /// The reign is over and accepts no further actions.
    #[error("the reign has ended")]
    ReignEnded,

    /// No policy with this id exists in the catalog.
    #[error("unknown law: {0}")]
    UnknownPolicy(PolicyId),

    /// No event with this id exists in the catalog.
    #[error("unknown event: {0}")]
    UnknownEvent(EventId),

    /// Two events share an id.
    #[error("duplicate event id: {0}")]
    DuplicateEvent(EventId),

    /// Two policies share an id.
    #[error("duplicate law id: {0}")]
    DuplicatePolicy(PolicyId),

    /// An event offers no options.
    #[error("event \"{0}\" has no options")]
    EmptyOptions(EventId),

    /// An event has a drama weight of zero.
    #[error("event \"{0}\" must have a positive drama weight")]
    ZeroDramaWeight(EventId),

    /// A law's activation cost is negative. Costs are amounts deducted, so
    /// a negative field would pay out.
    #[error("law \"{policy}\" has a negative {resource} cost ({amount}); write costs as positive amounts")]
    NegativeCost {
        /// The law.
        policy: PolicyId,
        /// The offending resource.
        resource: Resource,
        /// The negative amount.
        amount: i32,
    },

    /// A save file was written by an incompatible version.
    #[error("unsupported save format version {found} (expected {expected})")]
    UnsupportedSaveVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// Filesystem failure while loading content or saves.
    #[error("{path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Malformed JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SovError {
    /// Whether this is a rejected player action (as opposed to a content or
    /// I/O problem).
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            SovError::InsufficientResources { .. }
                | SovError::PolicyConflict { .. }
                | SovError::PolicyAlreadyActive(_)
                | SovError::PolicyNotActive(_)
                | SovError::PolicyLocked { .. }
                | SovError::InvalidOption { .. }
                | SovError::OptionBlocked { .. }
                | SovError::ReignEnded
        )
    }
}
