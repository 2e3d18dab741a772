//! The mutable record of a single reign.
//!
//! `ReignState` is a closed value type: everything needed to resume a reign
//! is in here and it round-trips through serde losslessly. It is owned by
//! exactly one session; other components only ever see `&ReignState`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{SovError, SovResult};
use crate::event::{EventId, EventOption};
use crate::policy::{Policy, PolicyId};
use crate::resource::{RESOURCE_MIN, Resource, ResourceVector};
use crate::rules::RulesConfig;
use crate::tag::{Tag, TagSet, status_tags};

/// Why a reign ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReignEnding {
    /// Stability reached zero.
    Anarchy,
    /// Popularity reached zero.
    Revolution,
    /// Military reached zero.
    Conquest,
}

impl ReignEnding {
    /// The terminal predicate: `Some` iff stability, popularity, or military
    /// is at the lower bound. The other resources are irrelevant.
    pub fn check(resources: &ResourceVector) -> Option<Self> {
        if resources.stability <= RESOURCE_MIN {
            Some(ReignEnding::Anarchy)
        } else if resources.popularity <= RESOURCE_MIN {
            Some(ReignEnding::Revolution)
        } else if resources.military <= RESOURCE_MIN {
            Some(ReignEnding::Conquest)
        } else {
            None
        }
    }

    /// The exhausted resource.
    pub fn resource(self) -> Resource {
        match self {
            ReignEnding::Anarchy => Resource::Stability,
            ReignEnding::Revolution => Resource::Popularity,
            ReignEnding::Conquest => Resource::Military,
        }
    }

    /// Chronicle epitaph.
    pub fn epitaph(self) -> &'static str {
        match self {
            ReignEnding::Anarchy => "Total anarchy. The realm collapsed.",
            ReignEnding::Revolution => "Popular revolution. The guillotine awaits.",
            ReignEnding::Conquest => "External conquest. Foreign banners fly over the keep.",
        }
    }
}

impl fmt::Display for ReignEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReignEnding::Anarchy => "Anarchy",
            ReignEnding::Revolution => "Revolution",
            ReignEnding::Conquest => "Conquest",
        };
        f.write_str(s)
    }
}

/// One resolved decision in the chronicle. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Year the decision was made.
    pub year: u32,
    /// The event resolved.
    pub event_id: EventId,
    /// Theme of that event.
    pub theme: String,
    /// Index of the chosen option.
    pub option_index: usize,
    /// Text of the chosen option.
    pub option_text: String,
    /// Effective (post-clamp) resource change.
    pub deltas: ResourceVector,
    /// Tags first granted by this decision.
    pub new_tags: Vec<Tag>,
}

/// The full state of one reign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReignState {
    resources: ResourceVector,
    active_policies: BTreeSet<PolicyId>,
    policy_locks: BTreeMap<PolicyId, u32>,
    tags: TagSet,
    history: Vec<HistoryEntry>,
    year: u32,
    ending: Option<ReignEnding>,
}

impl ReignState {
    /// A fresh reign in year 1 with the given resources (clamped) and no
    /// tags, laws, or history.
    pub fn new(initial: ResourceVector) -> Self {
        let resources = initial.clamped();
        Self {
            resources,
            active_policies: BTreeSet::new(),
            policy_locks: BTreeMap::new(),
            tags: TagSet::new(),
            history: Vec::new(),
            year: 1,
            ending: ReignEnding::check(&resources),
        }
    }

    /// A fresh reign configured by `rules`: initial resources plus the
    /// initial laws, enacted free of cost and unlocked.
    pub fn from_rules(rules: &RulesConfig, catalog: &Catalog) -> SovResult<Self> {
        let mut state = Self::new(rules.initial_resources);
        for id in &rules.initial_policies {
            let policy = catalog.require_policy(id)?;
            state.ensure_compatible(policy, catalog)?;
            state.active_policies.insert(policy.id.clone());
            state.tags.extend(policy.permanent_tags.iter().cloned());
        }
        Ok(state)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current resources.
    pub fn resources(&self) -> &ResourceVector {
        &self.resources
    }

    /// Granted tags.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Granted tags plus the status tags derived from current resources.
    pub fn effective_tags(&self, rules: &RulesConfig) -> TagSet {
        let mut tags = self.tags.clone();
        tags.extend(status_tags(&rules.status_tags, &self.resources));
        tags
    }

    /// Ids of the laws in force.
    pub fn active_policies(&self) -> &BTreeSet<PolicyId> {
        &self.active_policies
    }

    /// Whether a law is in force.
    pub fn is_active(&self, id: &PolicyId) -> bool {
        self.active_policies.contains(id)
    }

    /// Turns before `id` may be revoked (0 when unlocked).
    pub fn lock_remaining(&self, id: &PolicyId) -> u32 {
        self.policy_locks.get(id).copied().unwrap_or(0)
    }

    /// The chronicle so far.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Current year, starting at 1.
    pub fn year(&self) -> u32 {
        self.year
    }

    /// How the reign ended, if it has.
    pub fn ending(&self) -> Option<ReignEnding> {
        self.ending
    }

    /// Whether the reign is over.
    pub fn is_terminal(&self) -> bool {
        self.ending.is_some()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Apply signed deltas, clamping each resource into bounds. Never fails.
    ///
    /// Returns the effective change and re-evaluates the terminal condition.
    pub fn apply_deltas(&mut self, delta: &ResourceVector) -> ResourceVector {
        let effective = self.resources.apply_clamped(delta);
        self.update_ending();
        effective
    }

    /// Why `option` cannot be taken right now, if it cannot.
    ///
    /// An option is out of reach when one of its costs is larger than what
    /// the realm holds. Gains never block.
    pub fn option_block_reason(&self, option: &EventOption) -> Option<String> {
        option
            .effects
            .nonzero()
            .find(|&(resource, delta)| delta < 0 && self.resources.get(resource) + delta < RESOURCE_MIN)
            .map(|(resource, delta)| {
                format!(
                    "requires {} {resource}, have {}",
                    -delta,
                    self.resources.get(resource)
                )
            })
    }

    /// Union `tags` into the granted set. Returns the tags that were new.
    pub fn grant_tags<I>(&mut self, tags: I) -> Vec<Tag>
    where
        I: IntoIterator<Item = Tag>,
    {
        tags.into_iter()
            .filter(|tag| self.tags.insert(tag.clone()))
            .collect()
    }

    /// Stability paid to enact or revoke `policy`. Doubled when the policy
    /// runs against the crown's reputation.
    pub fn enactment_toll(&self, policy: &Policy, rules: &RulesConfig) -> i32 {
        let tags = self.effective_tags(rules);
        let averse = policy.aversion.iter().any(|t| tags.contains(t));
        if averse {
            rules.enactment_toll.saturating_mul(2)
        } else {
            rules.enactment_toll
        }
    }

    /// Enact a law.
    ///
    /// Fails, leaving the state unchanged, if the reign is over, the law is
    /// already in force, it conflicts with a law in force, or the crown
    /// cannot pay the activation cost plus the stability toll. Otherwise the
    /// cost and toll are deducted, the law's tags granted, and the law locked
    /// for `rules.policy_lock_turns` turns. Passive effects start with the
    /// next [`advance_turn`](Self::advance_turn).
    pub fn activate_policy(
        &mut self,
        policy: &Policy,
        catalog: &Catalog,
        rules: &RulesConfig,
    ) -> SovResult<()> {
        self.ensure_running()?;
        if self.is_active(&policy.id) {
            return Err(SovError::PolicyAlreadyActive(policy.id.clone()));
        }
        self.ensure_compatible(policy, catalog)?;

        let toll = self.enactment_toll(policy, rules);
        let mut price = policy.activation_cost;
        price.stability = price.stability.saturating_add(toll);
        self.ensure_affordable(&price)?;

        self.apply_deltas(&price.negated());
        self.grant_tags(policy.permanent_tags.iter().cloned());
        self.active_policies.insert(policy.id.clone());
        if rules.policy_lock_turns > 0 {
            self.policy_locks
                .insert(policy.id.clone(), rules.policy_lock_turns);
        }
        info!(policy = %policy.id, year = self.year, toll, "law enacted");
        Ok(())
    }

    /// Revoke a law. Its passive effects stop; tags it granted remain.
    ///
    /// Fails, leaving the state unchanged, if the reign is over, the law is
    /// not in force, still locked, or the toll cannot be paid.
    pub fn revoke_policy(&mut self, policy: &Policy, rules: &RulesConfig) -> SovResult<()> {
        self.ensure_running()?;
        if !self.is_active(&policy.id) {
            return Err(SovError::PolicyNotActive(policy.id.clone()));
        }
        let turns_remaining = self.lock_remaining(&policy.id);
        if turns_remaining > 0 {
            return Err(SovError::PolicyLocked {
                policy: policy.id.clone(),
                turns_remaining,
            });
        }

        let toll = self.enactment_toll(policy, rules);
        let price = ResourceVector::default().with(Resource::Stability, toll);
        self.ensure_affordable(&price)?;

        self.apply_deltas(&price.negated());
        self.active_policies.remove(&policy.id);
        info!(policy = %policy.id, year = self.year, toll, "law revoked");
        Ok(())
    }

    /// Close the year: apply each active law's passive effects once (in id
    /// order), tick down law locks, and advance the year.
    ///
    /// Returns the combined effective change.
    pub fn advance_turn(&mut self, catalog: &Catalog) -> SovResult<ResourceVector> {
        self.ensure_running()?;

        let mut total = ResourceVector::default();
        let active: Vec<PolicyId> = self.active_policies.iter().cloned().collect();
        for id in &active {
            if let Some(policy) = catalog.policy(id) {
                let effective = self.resources.apply_clamped(&policy.passive_effects);
                total = total.saturating_add(&effective);
            }
        }

        self.policy_locks.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });

        self.year += 1;
        self.update_ending();
        debug!(year = self.year, passive = %total.delta_summary(), "turn advanced");
        Ok(total)
    }

    pub(crate) fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    pub(crate) fn ensure_running(&self) -> SovResult<()> {
        if self.is_terminal() {
            Err(SovError::ReignEnded)
        } else {
            Ok(())
        }
    }

    fn ensure_compatible(&self, policy: &Policy, catalog: &Catalog) -> SovResult<()> {
        for active_id in &self.active_policies {
            let conflict = match catalog.policy(active_id) {
                Some(active) => policy.conflicts_with(active),
                None => policy.incompatible_with.contains(active_id),
            };
            if conflict {
                return Err(SovError::PolicyConflict {
                    policy: policy.id.clone(),
                    conflicts_with: active_id.clone(),
                });
            }
        }
        Ok(())
    }

    fn ensure_affordable(&self, price: &ResourceVector) -> SovResult<()> {
        for (resource, required) in price.iter() {
            let available = self.resources.get(resource);
            if required > available {
                return Err(SovError::InsufficientResources {
                    resource,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    fn update_ending(&mut self) {
        if self.ending.is_none() {
            self.ending = ReignEnding::check(&self.resources);
            if let Some(ending) = self.ending {
                info!(%ending, year = self.year, "reign ended");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::tag_set;
    use proptest::prelude::*;

    fn catalog_with(policies: Vec<Policy>) -> Catalog {
        Catalog::new(vec![], policies).unwrap()
    }

    fn serfdom() -> Policy {
        let mut p = Policy::new("serfdom", "Serfdom");
        p.incompatible_with.insert(PolicyId::new("free_peasants"));
        p.permanent_tags = tag_set(["feudal"]);
        p.passive_effects = ResourceVector::default()
            .with(Resource::Agriculture, 2)
            .with(Resource::Popularity, -1);
        p
    }

    fn free_peasants() -> Policy {
        let mut p = Policy::new("free_peasants", "Free Peasants");
        p.activation_cost = ResourceVector::default().with(Resource::Treasury, 20);
        p
    }

    #[test]
    fn new_state_is_year_one() {
        let s = ReignState::new(ResourceVector::splat(50));
        assert_eq!(s.year(), 1);
        assert!(s.tags().is_empty());
        assert!(s.history().is_empty());
        assert!(!s.is_terminal());
    }

    #[test]
    fn apply_deltas_clamps() {
        let mut s = ReignState::new(ResourceVector::splat(50).with(Resource::Treasury, 10));
        s.apply_deltas(&ResourceVector::default().with(Resource::Treasury, -1000));
        assert_eq!(s.resources().treasury, 0);
        assert!(!s.is_terminal(), "treasury alone never ends a reign");

        s.apply_deltas(&ResourceVector::default().with(Resource::Military, 1000));
        assert_eq!(s.resources().military, 100);
    }

    #[test]
    fn costs_beyond_reserves_block_an_option() {
        let s = ReignState::new(ResourceVector::splat(50).with(Resource::Treasury, 10));
        let mut bribe = EventOption::new("Bribe the barons");
        bribe.effects = ResourceVector::default()
            .with(Resource::Treasury, -20)
            .with(Resource::Stability, 15);
        assert_eq!(
            s.option_block_reason(&bribe).as_deref(),
            Some("requires 20 treasury, have 10")
        );

        // Spending everything is allowed; gains never block.
        bribe.effects = ResourceVector::default()
            .with(Resource::Treasury, -10)
            .with(Resource::Military, 90);
        assert_eq!(s.option_block_reason(&bribe), None);
    }

    #[test]
    fn stability_exhaustion_is_anarchy() {
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.apply_deltas(&ResourceVector::default().with(Resource::Stability, -50));
        assert_eq!(s.ending(), Some(ReignEnding::Anarchy));
        // The ending sticks even if stability recovers.
        s.apply_deltas(&ResourceVector::default().with(Resource::Stability, 30));
        assert!(s.is_terminal());
    }

    #[test]
    fn grant_tags_is_idempotent() {
        let mut s = ReignState::new(ResourceVector::splat(50));
        let new = s.grant_tags(tag_set(["saint", "generous"]));
        assert_eq!(new.len(), 2);
        let new = s.grant_tags(tag_set(["saint"]));
        assert!(new.is_empty());
        assert_eq!(s.tags().len(), 2);
    }

    #[test]
    fn effective_tags_include_status() {
        let mut s = ReignState::new(ResourceVector::splat(50).with(Resource::Treasury, 5));
        s.grant_tags(tag_set(["saint"]));
        let tags = s.effective_tags(&RulesConfig::default());
        assert_eq!(tags, tag_set(["saint", "bankrupt", "poor"]));
        assert_eq!(s.tags().len(), 1);
    }

    #[test]
    fn activate_policy_pays_cost_and_toll() {
        let catalog = catalog_with(vec![free_peasants()]);
        let rules = RulesConfig::default();
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&free_peasants(), &catalog, &rules).unwrap();
        assert_eq!(s.resources().treasury, 30);
        assert_eq!(s.resources().stability, 40);
        assert!(s.is_active(&PolicyId::new("free_peasants")));
        assert_eq!(s.lock_remaining(&PolicyId::new("free_peasants")), 8);
    }

    #[test]
    fn activate_policy_grants_tags() {
        let catalog = catalog_with(vec![serfdom()]);
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&serfdom(), &catalog, &RulesConfig::default())
            .unwrap();
        assert!(s.tags().contains(&Tag::new("feudal")));
    }

    #[test]
    fn incompatible_policy_rejected_and_state_unchanged() {
        let catalog = catalog_with(vec![serfdom(), free_peasants()]);
        let rules = RulesConfig::default();
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&serfdom(), &catalog, &rules).unwrap();
        let before = s.clone();

        let err = s
            .activate_policy(&free_peasants(), &catalog, &rules)
            .unwrap_err();
        assert!(matches!(
            err,
            SovError::PolicyConflict { ref policy, ref conflicts_with }
                if policy.as_str() == "free_peasants" && conflicts_with.as_str() == "serfdom"
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn insufficient_treasury_rejected() {
        let catalog = catalog_with(vec![free_peasants()]);
        let mut s = ReignState::new(ResourceVector::splat(50).with(Resource::Treasury, 10));
        let before = s.clone();
        let err = s
            .activate_policy(&free_peasants(), &catalog, &RulesConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SovError::InsufficientResources { resource: Resource::Treasury, required: 20, available: 10 }
        ));
        assert_eq!(s, before);
    }

    #[test]
    fn aversion_doubles_toll() {
        let mut purge = Policy::new("purge", "The Purge");
        purge.aversion = tag_set(["saint"]);
        let catalog = catalog_with(vec![purge.clone()]);
        let rules = RulesConfig::default();

        let mut s = ReignState::new(ResourceVector::splat(50));
        s.grant_tags(tag_set(["saint"]));
        assert_eq!(s.enactment_toll(&purge, &rules), 20);
        s.activate_policy(&purge, &catalog, &rules).unwrap();
        assert_eq!(s.resources().stability, 30);
    }

    #[test]
    fn toll_requires_stability() {
        let catalog = catalog_with(vec![serfdom()]);
        let mut s = ReignState::new(ResourceVector::splat(50).with(Resource::Stability, 5));
        let err = s
            .activate_policy(&serfdom(), &catalog, &RulesConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SovError::InsufficientResources { resource: Resource::Stability, .. }
        ));
    }

    #[test]
    fn double_activation_rejected() {
        let catalog = catalog_with(vec![serfdom()]);
        let rules = RulesConfig::default();
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&serfdom(), &catalog, &rules).unwrap();
        assert!(matches!(
            s.activate_policy(&serfdom(), &catalog, &rules),
            Err(SovError::PolicyAlreadyActive(_))
        ));
    }

    #[test]
    fn locked_policy_cannot_be_revoked_until_lock_expires() {
        let catalog = catalog_with(vec![serfdom()]);
        let rules = RulesConfig::default().with_policy_lock_turns(2);
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&serfdom(), &catalog, &rules).unwrap();

        assert!(matches!(
            s.revoke_policy(&serfdom(), &rules),
            Err(SovError::PolicyLocked { turns_remaining: 2, .. })
        ));
        s.advance_turn(&catalog).unwrap();
        assert_eq!(s.lock_remaining(&serfdom().id), 1);
        s.advance_turn(&catalog).unwrap();
        assert_eq!(s.lock_remaining(&serfdom().id), 0);

        s.revoke_policy(&serfdom(), &rules).unwrap();
        assert!(!s.is_active(&serfdom().id));
        assert!(s.tags().contains(&Tag::new("feudal")), "tags persist");
    }

    #[test]
    fn revoke_inactive_policy_rejected() {
        let mut s = ReignState::new(ResourceVector::splat(50));
        assert!(matches!(
            s.revoke_policy(&serfdom(), &RulesConfig::default()),
            Err(SovError::PolicyNotActive(_))
        ));
    }

    #[test]
    fn advance_turn_applies_passive_effects() {
        let catalog = catalog_with(vec![serfdom()]);
        let rules = RulesConfig::default().with_enactment_toll(0);
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&serfdom(), &catalog, &rules).unwrap();
        let passive = s.advance_turn(&catalog).unwrap();
        assert_eq!(passive.agriculture, 2);
        assert_eq!(passive.popularity, -1);
        assert_eq!(s.resources().agriculture, 52);
        assert_eq!(s.year(), 2);
    }

    #[test]
    fn advance_turn_on_ended_reign_rejected() {
        let catalog = catalog_with(vec![]);
        let mut s = ReignState::new(ResourceVector::splat(50).with(Resource::Military, 0));
        assert!(s.is_terminal());
        assert!(matches!(s.advance_turn(&catalog), Err(SovError::ReignEnded)));
        assert_eq!(s.year(), 1);
    }

    #[test]
    fn from_rules_enacts_initial_policies_free() {
        let catalog = catalog_with(vec![serfdom(), free_peasants()]);
        let rules = RulesConfig::default().with_initial_policies(["serfdom"]);
        let s = ReignState::from_rules(&rules, &catalog).unwrap();
        assert!(s.is_active(&PolicyId::new("serfdom")));
        assert_eq!(s.resources().stability, 50);
        assert_eq!(s.lock_remaining(&PolicyId::new("serfdom")), 0);

        let bad = RulesConfig::default().with_initial_policies(["serfdom", "free_peasants"]);
        assert!(matches!(
            ReignState::from_rules(&bad, &catalog),
            Err(SovError::PolicyConflict { .. })
        ));
        let unknown = RulesConfig::default().with_initial_policies(["ghost"]);
        assert!(matches!(
            ReignState::from_rules(&unknown, &catalog),
            Err(SovError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn serde_round_trip_is_lossless() {
        let catalog = catalog_with(vec![serfdom()]);
        let mut s = ReignState::new(ResourceVector::splat(50));
        s.activate_policy(&serfdom(), &catalog, &RulesConfig::default())
            .unwrap();
        s.grant_tags(tag_set(["generous"]));
        s.push_history(HistoryEntry {
            year: 1,
            event_id: EventId::new("feast"),
            theme: "general".to_string(),
            option_index: 0,
            option_text: "Feast".to_string(),
            deltas: ResourceVector::default().with(Resource::Treasury, -5),
            new_tags: vec![Tag::new("generous")],
        });
        s.advance_turn(&catalog).unwrap();

        let json = serde_json::to_string(&s).unwrap();
        let back: ReignState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    fn resource_value() -> impl Strategy<Value = i32> {
        RESOURCE_MIN..=crate::resource::RESOURCE_MAX
    }

    proptest! {
        #[test]
        fn terminal_iff_a_vital_resource_is_zero(
            treasury in resource_value(),
            military in resource_value(),
            popularity in resource_value(),
            stability in resource_value(),
            agriculture in resource_value(),
            commerce in resource_value(),
        ) {
            let v = ResourceVector { treasury, military, popularity, stability, agriculture, commerce };
            let expected = stability == 0 || popularity == 0 || military == 0;
            prop_assert_eq!(ReignEnding::check(&v).is_some(), expected);
            prop_assert_eq!(ReignState::new(v).is_terminal(), expected);
        }

        #[test]
        fn conflicting_policy_never_enters_active_set(order in any::<bool>()) {
            let catalog = catalog_with(vec![serfdom(), free_peasants()]);
            let rules = RulesConfig::default().with_enactment_toll(0);
            let (first, second) = if order {
                (serfdom(), free_peasants())
            } else {
                (free_peasants(), serfdom())
            };
            let mut s = ReignState::new(ResourceVector::splat(80));
            s.activate_policy(&first, &catalog, &rules).unwrap();
            let active_before = s.active_policies().clone();
            let is_conflict = matches!(
                s.activate_policy(&second, &catalog, &rules),
                Err(SovError::PolicyConflict { .. })
            );
            prop_assert!(is_conflict);
            prop_assert_eq!(s.active_policies(), &active_before);
        }
    }
}
