//! Immutable, id-indexed event and policy catalogs.
//!
//! Catalogs are loaded once per session and shared between reigns. Event
//! order is preserved because the drama ranker breaks ties by catalog
//! position.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{SovError, SovResult};
use crate::event::{Event, EventId};
use crate::policy::{Policy, PolicyId};
use crate::tag::{StatusTagRule, Tag, TagSet};

/// File name of the event catalog inside a data directory.
pub const EVENTS_FILE: &str = "events.json";

/// File name of the policy catalog inside a data directory.
pub const POLICIES_FILE: &str = "policies.json";

/// The static content of a game: every event and every law.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    events: Vec<Event>,
    policies: Vec<Policy>,

    // Indexes
    event_index: HashMap<EventId, usize>,
    policy_index: HashMap<PolicyId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids, option-less events, zero
    /// drama weights, and negative law costs.
    pub fn new(events: Vec<Event>, policies: Vec<Policy>) -> SovResult<Self> {
        let mut event_index = HashMap::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            if event.options.is_empty() {
                return Err(SovError::EmptyOptions(event.id.clone()));
            }
            if event.drama_weight == 0 {
                return Err(SovError::ZeroDramaWeight(event.id.clone()));
            }
            if event_index.insert(event.id.clone(), i).is_some() {
                return Err(SovError::DuplicateEvent(event.id.clone()));
            }
        }

        let mut policy_index = HashMap::with_capacity(policies.len());
        for (i, policy) in policies.iter().enumerate() {
            if policy_index.insert(policy.id.clone(), i).is_some() {
                return Err(SovError::DuplicatePolicy(policy.id.clone()));
            }
            if let Some((resource, amount)) = policy.activation_cost.iter().find(|(_, v)| *v < 0) {
                return Err(SovError::NegativeCost {
                    policy: policy.id.clone(),
                    resource,
                    amount,
                });
            }
        }

        Ok(Self {
            events,
            policies,
            event_index,
            policy_index,
        })
    }

    /// Parse both catalogs from JSON arrays.
    pub fn from_json(events_json: &str, policies_json: &str) -> SovResult<Self> {
        let events: Vec<Event> = serde_json::from_str(events_json)?;
        let policies: Vec<Policy> = serde_json::from_str(policies_json)?;
        Self::new(events, policies)
    }

    /// Load `events.json` and `policies.json` from a data directory.
    ///
    /// A missing policy file yields an empty law book; a missing event file
    /// is an error.
    pub fn load_dir(dir: &Path) -> SovResult<Self> {
        let events_path = dir.join(EVENTS_FILE);
        let events_json = read_file(&events_path)?;

        let policies_path = dir.join(POLICIES_FILE);
        let policies_json = if policies_path.exists() {
            read_file(&policies_path)?
        } else {
            warn!(path = %policies_path.display(), "no policy catalog found, law book is empty");
            "[]".to_string()
        };

        let catalog = Self::from_json(&events_json, &policies_json)?;
        debug!(
            events = catalog.events.len(),
            policies = catalog.policies.len(),
            dir = %dir.display(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// All events in catalog order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// All policies in catalog order.
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Look up an event by id.
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.event_index.get(id).map(|&i| &self.events[i])
    }

    /// Look up an event, failing with [`SovError::UnknownEvent`].
    pub fn require_event(&self, id: &EventId) -> SovResult<&Event> {
        self.event(id).ok_or_else(|| SovError::UnknownEvent(id.clone()))
    }

    /// Position of an event in catalog order.
    pub fn event_position(&self, id: &EventId) -> Option<usize> {
        self.event_index.get(id).copied()
    }

    /// Look up a policy by id.
    pub fn policy(&self, id: &PolicyId) -> Option<&Policy> {
        self.policy_index.get(id).map(|&i| &self.policies[i])
    }

    /// Look up a policy, failing with [`SovError::UnknownPolicy`].
    pub fn require_policy(&self, id: &PolicyId) -> SovResult<&Policy> {
        self.policy(id).ok_or_else(|| SovError::UnknownPolicy(id.clone()))
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every tag some option, law, or status rule can produce.
    pub fn obtainable_tags(&self, status_rules: &[StatusTagRule]) -> TagSet {
        let from_options = self
            .events
            .iter()
            .flat_map(|e| e.options.iter())
            .flat_map(|o| o.adds_tags.iter());
        let from_policies = self.policies.iter().flat_map(|p| p.permanent_tags.iter());
        let from_status = status_rules.iter().flat_map(|r| r.tags.iter());
        from_options
            .chain(from_policies)
            .chain(from_status)
            .cloned()
            .collect()
    }

    /// Report authoring problems that do not prevent loading.
    pub fn lint(&self, status_rules: &[StatusTagRule]) -> Vec<CatalogWarning> {
        let mut warnings = Vec::new();
        let obtainable = self.obtainable_tags(status_rules);

        for event in &self.events {
            for tag in &event.requires_tags {
                if !obtainable.contains(tag) {
                    warnings.push(CatalogWarning::UnobtainableTag {
                        event: event.id.clone(),
                        tag: tag.clone(),
                    });
                }
            }
            for cond in &event.preconditions {
                if matches!((cond.at_least, cond.at_most), (Some(min), Some(max)) if min > max) {
                    warnings.push(CatalogWarning::EmptyCondition {
                        event: event.id.clone(),
                        condition: cond.to_string(),
                    });
                }
            }
        }

        let mut reported: BTreeSet<(PolicyId, PolicyId)> = BTreeSet::new();
        for policy in &self.policies {
            for other_id in &policy.incompatible_with {
                match self.policy(other_id) {
                    None => warnings.push(CatalogWarning::UnknownPolicyReference {
                        policy: policy.id.clone(),
                        referenced: other_id.clone(),
                    }),
                    Some(other) if !other.incompatible_with.contains(&policy.id) => {
                        let key = (policy.id.clone(), other_id.clone());
                        if reported.insert(key) {
                            warnings.push(CatalogWarning::OneSidedIncompatibility {
                                declared_by: policy.id.clone(),
                                other: other_id.clone(),
                            });
                        }
                    }
                    Some(_) => {}
                }
            }
            for event_id in &policy.blocks_events {
                if self.event(event_id).is_none() {
                    warnings.push(CatalogWarning::UnknownEventReference {
                        policy: policy.id.clone(),
                        referenced: event_id.clone(),
                    });
                }
            }
        }

        warnings
    }
}

fn read_file(path: &Path) -> SovResult<String> {
    std::fs::read_to_string(path).map_err(|source| SovError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// A content problem found by [`Catalog::lint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// An event requires a tag nothing can grant, so it can never be drawn.
    UnobtainableTag {
        /// The event.
        event: EventId,
        /// The required tag.
        tag: Tag,
    },
    /// A resource condition whose minimum exceeds its maximum.
    EmptyCondition {
        /// The event.
        event: EventId,
        /// Rendering of the condition.
        condition: String,
    },
    /// A law lists an incompatibility the other law does not list back.
    OneSidedIncompatibility {
        /// The law declaring the incompatibility.
        declared_by: PolicyId,
        /// The law it names.
        other: PolicyId,
    },
    /// A law names a law that does not exist.
    UnknownPolicyReference {
        /// The declaring law.
        policy: PolicyId,
        /// The missing id.
        referenced: PolicyId,
    },
    /// A law blocks an event that does not exist.
    UnknownEventReference {
        /// The declaring law.
        policy: PolicyId,
        /// The missing id.
        referenced: EventId,
    },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::UnobtainableTag { event, tag } => {
                write!(f, "event \"{event}\" requires tag \"{tag}\" which nothing grants")
            }
            CatalogWarning::EmptyCondition { event, condition } => {
                write!(f, "event \"{event}\" has an unsatisfiable condition: {condition}")
            }
            CatalogWarning::OneSidedIncompatibility { declared_by, other } => write!(
                f,
                "law \"{declared_by}\" is incompatible with \"{other}\" but not the other way round"
            ),
            CatalogWarning::UnknownPolicyReference { policy, referenced } => {
                write!(f, "law \"{policy}\" references unknown law \"{referenced}\"")
            }
            CatalogWarning::UnknownEventReference { policy, referenced } => {
                write!(f, "law \"{policy}\" blocks unknown event \"{referenced}\"")
            }
        }
    }
}
