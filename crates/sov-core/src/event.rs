//! Narrative events and their options.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceVector};
use crate::tag::TagSet;

/// Identifier of an [`Event`] in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Create an event id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Theme used when an event does not declare one.
pub const DEFAULT_THEME: &str = "general";

/// Drama weight used when an event does not declare one.
pub const DEFAULT_DRAMA_WEIGHT: u32 = 50;

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_drama_weight() -> u32 {
    DEFAULT_DRAMA_WEIGHT
}

/// Inclusive bounds on one resource that must hold for an event to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCondition {
    /// The resource inspected.
    pub resource: Resource,
    /// Minimum value (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_least: Option<i32>,
    /// Maximum value (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_most: Option<i32>,
}

impl ResourceCondition {
    /// Require `resource >= value`.
    pub fn at_least(resource: Resource, value: i32) -> Self {
        Self {
            resource,
            at_least: Some(value),
            at_most: None,
        }
    }

    /// Require `resource <= value`.
    pub fn at_most(resource: Resource, value: i32) -> Self {
        Self {
            resource,
            at_least: None,
            at_most: Some(value),
        }
    }

    /// Whether the condition holds.
    pub fn holds(&self, resources: &ResourceVector) -> bool {
        let value = resources.get(self.resource);
        self.at_least.is_none_or(|min| value >= min) && self.at_most.is_none_or(|max| value <= max)
    }
}

impl fmt::Display for ResourceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.at_least, self.at_most) {
            (Some(min), Some(max)) => write!(f, "{min} <= {} <= {max}", self.resource),
            (Some(min), None) => write!(f, "{} >= {min}", self.resource),
            (None, Some(max)) => write!(f, "{} <= {max}", self.resource),
            (None, None) => write!(f, "{} unconstrained", self.resource),
        }
    }
}

/// One choice offered by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOption {
    /// Text shown to the player.
    pub text: String,
    /// Resource deltas applied when chosen.
    #[serde(default)]
    pub effects: ResourceVector,
    /// Narrative outcome shown after choosing.
    #[serde(default)]
    pub outcome: String,
    /// Tags granted when chosen.
    #[serde(default)]
    pub adds_tags: TagSet,
}

impl EventOption {
    /// An option with no effects.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            effects: ResourceVector::default(),
            outcome: String::new(),
            adds_tags: TagSet::new(),
        }
    }
}

/// A static narrative event from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id.
    pub id: EventId,
    /// Headline.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub description: String,
    /// Narrative theme, used by cooldowns and policy blocklists.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Higher means more narratively significant.
    #[serde(default = "default_drama_weight")]
    pub drama_weight: u32,
    /// Tags that must all be present.
    #[serde(default)]
    pub requires_tags: TagSet,
    /// Tags that must all be absent.
    #[serde(default)]
    pub blocks_tags: TagSet,
    /// Resource thresholds that must all hold.
    #[serde(default)]
    pub preconditions: Vec<ResourceCondition>,
    /// The choices, in display order.
    pub options: Vec<EventOption>,
}

impl Event {
    /// An unconstrained event with default theme and weight.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: EventId::new(id),
            title: title.into(),
            description: String::new(),
            theme: default_theme(),
            drama_weight: DEFAULT_DRAMA_WEIGHT,
            requires_tags: TagSet::new(),
            blocks_tags: TagSet::new(),
            preconditions: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Builder: set the theme.
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Builder: set the drama weight.
    pub fn with_drama(mut self, weight: u32) -> Self {
        self.drama_weight = weight;
        self
    }

    /// Builder: append an option.
    pub fn with_option(mut self, option: EventOption) -> Self {
        self.options.push(option);
        self
    }

    /// Whether the event declares no tag or resource preconditions.
    pub fn is_unconstrained(&self) -> bool {
        self.requires_tags.is_empty() && self.blocks_tags.is_empty() && self.preconditions.is_empty()
    }
}
