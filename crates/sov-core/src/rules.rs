//! Data-driven tuning for a reign.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::event::EventOption;
use crate::policy::PolicyId;
use crate::resource::{Resource, ResourceVector};
use crate::tag::{StatusTagRule, default_status_rules};

/// Starting value of every resource.
pub const DEFAULT_INITIAL_RESOURCE: i32 = 50;

fn initial_resources_over_default<'de, D>(deserializer: D) -> Result<ResourceVector, D::Error>
where
    D: Deserializer<'de>,
{
    let given = BTreeMap::<Resource, i32>::deserialize(deserializer)?;
    let mut resources = ResourceVector::splat(DEFAULT_INITIAL_RESOURCE);
    for (resource, value) in given {
        resources.set(resource, value);
    }
    Ok(resources.clamped())
}

fn non_negative<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    i32::deserialize(deserializer).map(|toll| toll.max(0))
}

/// Rules shared by every reign in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Resources at the start of a reign. Resources left out of a config
    /// file start at [`DEFAULT_INITIAL_RESOURCE`].
    #[serde(deserialize_with = "initial_resources_over_default")]
    pub initial_resources: ResourceVector,
    /// Laws in force at the start of a reign (enacted without cost).
    pub initial_policies: Vec<PolicyId>,
    /// Tags derived from the current resources.
    pub status_tags: Vec<StatusTagRule>,
    /// How many past decisions block a repeated theme. 0 disables the cooldown.
    pub theme_cooldown: usize,
    /// Themes never subject to the cooldown.
    pub cooldown_exempt_themes: BTreeSet<String>,
    /// Stability paid to enact or revoke a law. Never negative.
    #[serde(deserialize_with = "non_negative")]
    pub enactment_toll: i32,
    /// Turns a freshly enacted law stays locked in force.
    pub policy_lock_turns: u32,
    /// Offered when every option of an event is out of reach. Never blocked.
    pub collapse_option: EventOption,
}

fn default_collapse_option() -> EventOption {
    let mut option = EventOption::new("The government is paralysed. Do nothing.");
    option.effects = ResourceVector::default()
        .with(Resource::Stability, -15)
        .with(Resource::Popularity, -10);
    option.outcome = "The crown fails to act. Chaos rises.".to_string();
    option
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            initial_resources: ResourceVector::splat(DEFAULT_INITIAL_RESOURCE),
            initial_policies: Vec::new(),
            status_tags: default_status_rules(),
            theme_cooldown: 0,
            cooldown_exempt_themes: ["management", "game_over"]
                .into_iter()
                .map(String::from)
                .collect(),
            enactment_toll: 10,
            policy_lock_turns: 8,
            collapse_option: default_collapse_option(),
        }
    }
}

impl RulesConfig {
    /// Set the starting resources (clamped into bounds).
    pub fn with_initial_resources(mut self, resources: ResourceVector) -> Self {
        self.initial_resources = resources.clamped();
        self
    }

    /// Set the laws in force at the start.
    pub fn with_initial_policies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_policies = ids.into_iter().map(PolicyId::new).collect();
        self
    }

    /// Set the theme cooldown window.
    pub fn with_theme_cooldown(mut self, turns: usize) -> Self {
        self.theme_cooldown = turns;
        self
    }

    /// Set the stability toll for changing the law (negative values become 0).
    pub fn with_enactment_toll(mut self, toll: i32) -> Self {
        self.enactment_toll = toll.max(0);
        self
    }

    /// Set how long enacted laws stay locked.
    pub fn with_policy_lock_turns(mut self, turns: u32) -> Self {
        self.policy_lock_turns = turns;
        self
    }

    /// Set the option offered when nothing else can be afforded.
    pub fn with_collapse_option(mut self, option: EventOption) -> Self {
        self.collapse_option = option;
        self
    }

    /// Replace the status tag rules.
    pub fn with_status_tags(mut self, rules: Vec<StatusTagRule>) -> Self {
        self.status_tags = rules;
        self
    }

    /// Whether `theme` is subject to the cooldown.
    pub fn theme_cools_down(&self, theme: &str) -> bool {
        self.theme_cooldown > 0 && !self.cooldown_exempt_themes.contains(theme)
    }
}
