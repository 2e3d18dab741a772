//! Reputation tags.
//!
//! Tags granted by options and laws are stored in the reign state and never
//! revoked. Status tags are derived on demand from the current resources by
//! [`StatusTagRule`]s and never stored.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceVector};

/// A reputation marker such as `tyrant`, `saint`, or `generous`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Create a tag. Surrounding whitespace is trimmed and the name lowercased.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// The tag name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag::new(s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::new(s)
    }
}

/// An unordered, duplicate-free set of tags with deterministic iteration.
pub type TagSet = BTreeSet<Tag>;

/// Build a [`TagSet`] from string literals.
pub fn tag_set<I, S>(names: I) -> TagSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(Tag::new).collect()
}

/// Comma-separated rendering of a tag set, or `none` when empty.
pub fn describe_tags(tags: &TagSet) -> String {
    if tags.is_empty() {
        return "none".to_string();
    }
    tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(", ")
}

/// Direction of a [`StatusTagRule`] threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Strictly greater than the threshold.
    Above,
    /// Strictly less than the threshold.
    Below,
}

/// Grants `tags` while `resource` is above or below `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTagRule {
    /// The resource inspected.
    pub resource: Resource,
    /// Threshold direction.
    pub comparison: Comparison,
    /// Threshold value (exclusive).
    pub threshold: i32,
    /// Tags granted while the rule holds.
    pub tags: TagSet,
}

impl StatusTagRule {
    /// Rule granting `tags` while `resource > threshold`.
    pub fn above(resource: Resource, threshold: i32, tags: &[&str]) -> Self {
        Self {
            resource,
            comparison: Comparison::Above,
            threshold,
            tags: tag_set(tags),
        }
    }

    /// Rule granting `tags` while `resource < threshold`.
    pub fn below(resource: Resource, threshold: i32, tags: &[&str]) -> Self {
        Self {
            resource,
            comparison: Comparison::Below,
            threshold,
            tags: tag_set(tags),
        }
    }

    /// Whether the rule holds for these resources.
    pub fn holds(&self, resources: &ResourceVector) -> bool {
        let value = resources.get(self.resource);
        match self.comparison {
            Comparison::Above => value > self.threshold,
            Comparison::Below => value < self.threshold,
        }
    }
}

/// The standard status tags of the kingdom.
pub fn default_status_rules() -> Vec<StatusTagRule> {
    vec![
        StatusTagRule::above(Resource::Treasury, 75, &["midas", "rich"]),
        StatusTagRule::below(Resource::Treasury, 10, &["bankrupt"]),
        StatusTagRule::below(Resource::Treasury, 25, &["poor"]),
        StatusTagRule::above(Resource::Military, 75, &["spartan"]),
        StatusTagRule::below(Resource::Military, 25, &["vulnerable"]),
        StatusTagRule::below(Resource::Popularity, 25, &["unpopular", "hated", "oppressor"]),
        StatusTagRule::above(Resource::Popularity, 75, &["beloved"]),
        StatusTagRule::below(Resource::Stability, 25, &["chaos"]),
    ]
}

/// Evaluate `rules` against `resources`.
pub fn status_tags(rules: &[StatusTagRule], resources: &ResourceVector) -> TagSet {
    rules
        .iter()
        .filter(|rule| rule.holds(resources))
        .flat_map(|rule| rule.tags.iter().cloned())
        .collect()
}
