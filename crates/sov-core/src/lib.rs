//! Core model for Sovereign: resources, tags, laws, events, and the reign.
//!
//! This crate owns every rule about how a reign changes. It knows nothing
//! about how events are chosen; that is the director's job. A
//! [`ReignState`] can be driven directly, or loaded from a [`SaveGame`].

/// Immutable, id-indexed event and policy catalogs.
pub mod catalog;
/// Resolving event options against the reign.
pub mod effects;
/// Error types used throughout the crate.
pub mod error;
/// Events, options, and resource preconditions.
pub mod event;
/// Laws: costs, passive effects, and incompatibilities.
pub mod policy;
/// The six kingdom resources and bounded arithmetic on them.
pub mod resource;
/// Data-driven tuning shared by every reign.
pub mod rules;
/// Versioned save files.
pub mod save;
/// The mutable state of a reign.
pub mod state;
/// Narrative tags and status tag rules.
pub mod tag;

/// Re-export catalog types.
pub use catalog::{Catalog, CatalogWarning};
/// Re-export option resolution.
pub use effects::{AppliedOption, OfferedOption, apply_offered, apply_option, offered_options};
/// Re-export error types.
pub use error::{SovError, SovResult};
/// Re-export event types.
pub use event::{Event, EventId, EventOption, ResourceCondition};
/// Re-export policy types.
pub use policy::{Policy, PolicyId};
/// Re-export resource types.
pub use resource::{RESOURCE_MAX, RESOURCE_MIN, Resource, ResourceVector};
/// Re-export rules.
pub use rules::RulesConfig;
/// Re-export save types.
pub use save::{SAVE_FORMAT_VERSION, SaveGame};
/// Re-export state types.
pub use state::{HistoryEntry, ReignEnding, ReignState};
/// Re-export tag types.
pub use tag::{StatusTagRule, Tag, TagSet, describe_tags, status_tags, tag_set};
