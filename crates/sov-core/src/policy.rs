//! Laws the crown can enact.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::EventId;
use crate::resource::ResourceVector;
use crate::tag::TagSet;

/// Identifier of a [`Policy`] in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// Create a policy id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn default_category() -> String {
    "others".to_string()
}

/// A named law with a one-time cost and per-turn effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique id.
    pub id: PolicyId,
    /// Display name.
    pub name: String,
    /// Grouping used by the law book (e.g. `economy`, `military`).
    #[serde(default = "default_category")]
    pub category: String,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
    /// Amounts deducted once on activation. Fields are non-negative.
    #[serde(default)]
    pub activation_cost: ResourceVector,
    /// Deltas applied every turn while active.
    #[serde(default)]
    pub passive_effects: ResourceVector,
    /// Tags granted on activation.
    #[serde(default)]
    pub permanent_tags: TagSet,
    /// Policies that cannot be active at the same time as this one.
    #[serde(default)]
    pub incompatible_with: BTreeSet<PolicyId>,
    /// Events that cannot be drawn while this policy is active.
    #[serde(default)]
    pub blocks_events: BTreeSet<EventId>,
    /// Event themes that cannot be drawn while this policy is active.
    #[serde(default)]
    pub blocks_themes: BTreeSet<String>,
    /// Reputation tags that make enacting or revoking this law harder.
    #[serde(default)]
    pub aversion: TagSet,
}

impl Policy {
    /// A policy with no cost, effects, or constraints.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PolicyId::new(id),
            name: name.into(),
            category: default_category(),
            description: String::new(),
            activation_cost: ResourceVector::default(),
            passive_effects: ResourceVector::default(),
            permanent_tags: TagSet::new(),
            incompatible_with: BTreeSet::new(),
            blocks_events: BTreeSet::new(),
            blocks_themes: BTreeSet::new(),
            aversion: TagSet::new(),
        }
    }

    /// Whether this policy and `other` exclude each other.
    ///
    /// Either side declaring the incompatibility is enough.
    pub fn conflicts_with(&self, other: &Policy) -> bool {
        self.incompatible_with.contains(&other.id) || other.incompatible_with.contains(&self.id)
    }

    /// Whether this policy keeps the given event out of the pool.
    pub fn blocks_event(&self, id: &EventId, theme: &str) -> bool {
        self.blocks_events.contains(id) || self.blocks_themes.contains(theme)
    }
}
