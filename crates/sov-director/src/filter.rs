//! The rules layer: which events may be drawn at all.

use std::fmt;

use sov_core::{
    Catalog, Event, EventId, PolicyId, ReignState, ResourceCondition, RulesConfig, Tag, TagSet,
};
use tracing::debug;

/// Why an event is not feasible. Only the first failed condition is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A required tag is absent.
    MissingTag(Tag),
    /// A blocking tag is present.
    BlockedByTag(Tag),
    /// A resource threshold does not hold.
    ConditionFailed(ResourceCondition),
    /// An active law forbids the event or its theme.
    BlockedByPolicy(PolicyId),
    /// The theme appeared too recently.
    ThemeCooldown(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingTag(tag) => write!(f, "requires tag \"{tag}\""),
            Rejection::BlockedByTag(tag) => write!(f, "blocked by tag \"{tag}\""),
            Rejection::ConditionFailed(cond) => write!(f, "requires {cond}"),
            Rejection::BlockedByPolicy(id) => write!(f, "forbidden by law \"{id}\""),
            Rejection::ThemeCooldown(theme) => write!(f, "theme \"{theme}\" is cooling down"),
        }
    }
}

/// Deterministic, side-effect-free feasibility predicate over a catalog.
#[derive(Debug, Clone, Copy)]
pub struct FeasibilityFilter<'c, 'r> {
    catalog: &'c Catalog,
    rules: &'r RulesConfig,
}

impl<'c, 'r> FeasibilityFilter<'c, 'r> {
    /// Create a filter over `catalog`. Results borrow from the catalog only.
    pub fn new(catalog: &'c Catalog, rules: &'r RulesConfig) -> Self {
        Self { catalog, rules }
    }

    /// Every feasible event, in catalog order.
    pub fn filter(&self, state: &ReignState) -> Vec<&'c Event> {
        let tags = state.effective_tags(self.rules);
        let feasible: Vec<&'c Event> = self
            .catalog
            .events()
            .iter()
            .filter(|event| self.check_with_tags(event, state, &tags).is_ok())
            .collect();
        debug!(
            year = state.year(),
            feasible = feasible.len(),
            total = self.catalog.len(),
            "feasibility filter"
        );
        feasible
    }

    /// Whether `event` is feasible, or the first reason it is not.
    pub fn check(&self, event: &Event, state: &ReignState) -> Result<(), Rejection> {
        self.check_with_tags(event, state, &state.effective_tags(self.rules))
    }

    /// Every event in the catalog that is not feasible, with its reason.
    pub fn rejections(&self, state: &ReignState) -> Vec<(&'c EventId, Rejection)> {
        let tags = state.effective_tags(self.rules);
        self.catalog
            .events()
            .iter()
            .filter_map(|event| {
                self.check_with_tags(event, state, &tags)
                    .err()
                    .map(|r| (&event.id, r))
            })
            .collect()
    }

    fn check_with_tags(
        &self,
        event: &Event,
        state: &ReignState,
        tags: &TagSet,
    ) -> Result<(), Rejection> {
        if let Some(tag) = event.requires_tags.iter().find(|t| !tags.contains(*t)) {
            return Err(Rejection::MissingTag(tag.clone()));
        }
        if let Some(tag) = event.blocks_tags.iter().find(|t| tags.contains(*t)) {
            return Err(Rejection::BlockedByTag(tag.clone()));
        }
        if let Some(cond) = event
            .preconditions
            .iter()
            .find(|c| !c.holds(state.resources()))
        {
            return Err(Rejection::ConditionFailed(*cond));
        }
        for id in state.active_policies() {
            let blocked = self
                .catalog
                .policy(id)
                .is_some_and(|p| p.blocks_event(&event.id, &event.theme));
            if blocked {
                return Err(Rejection::BlockedByPolicy(id.clone()));
            }
        }
        if self.rules.theme_cools_down(&event.theme) {
            let repeated = state
                .history()
                .iter()
                .rev()
                .take(self.rules.theme_cooldown)
                .any(|h| h.theme == event.theme);
            if repeated {
                return Err(Rejection::ThemeCooldown(event.theme.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sov_core::{EventOption, Policy, Resource, ResourceVector, apply_option, tag_set};

    fn event(id: &str) -> Event {
        Event::new(id, id).with_option(EventOption::new("Proceed"))
    }

    fn catalog(events: Vec<Event>, policies: Vec<Policy>) -> Catalog {
        Catalog::new(events, policies).unwrap()
    }

    fn fresh() -> ReignState {
        ReignState::new(ResourceVector::splat(50))
    }

    #[test]
    fn unconstrained_event_is_feasible() {
        let cat = catalog(vec![event("a")], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);
        assert_eq!(filter.filter(&fresh()).len(), 1);
    }

    #[test]
    fn feasible_events_borrow_only_the_catalog() {
        let cat = catalog(vec![event("a"), event("b")], vec![]);
        let feasible = {
            let rules = RulesConfig::default().with_theme_cooldown(1);
            FeasibilityFilter::new(&cat, &rules).filter(&fresh())
        };
        let ids: Vec<&str> = feasible.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn required_tag_must_be_present() {
        let mut saintly = event("pilgrimage");
        saintly.requires_tags = tag_set(["saint"]);
        let cat = catalog(vec![saintly.clone()], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);

        let mut state = fresh();
        assert!(filter.filter(&state).is_empty());
        assert_eq!(
            filter.check(&saintly, &state),
            Err(Rejection::MissingTag(Tag::new("saint")))
        );

        state.grant_tags(tag_set(["saint"]));
        assert_eq!(filter.filter(&state).len(), 1);
    }

    #[test]
    fn blocking_tag_must_be_absent() {
        let mut alms = event("alms");
        alms.blocks_tags = tag_set(["tyrant"]);
        let cat = catalog(vec![alms.clone()], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);

        let mut state = fresh();
        assert!(filter.check(&alms, &state).is_ok());
        state.grant_tags(tag_set(["tyrant"]));
        assert_eq!(
            filter.check(&alms, &state),
            Err(Rejection::BlockedByTag(Tag::new("tyrant")))
        );
    }

    #[test]
    fn status_tags_count_as_present() {
        let mut palace = event("palace");
        palace.requires_tags = tag_set(["rich"]);
        let cat = catalog(vec![palace], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);

        assert!(filter.filter(&fresh()).is_empty());
        let rich = ReignState::new(ResourceVector::splat(50).with(Resource::Treasury, 90));
        assert_eq!(filter.filter(&rich).len(), 1);
    }

    #[test]
    fn resource_preconditions() {
        let mut palace = event("palace");
        palace.preconditions = vec![ResourceCondition::at_least(Resource::Treasury, 60)];
        let cat = catalog(vec![palace.clone()], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);

        assert!(matches!(
            filter.check(&palace, &fresh()),
            Err(Rejection::ConditionFailed(_))
        ));
        let state = ReignState::new(ResourceVector::splat(60));
        assert!(filter.check(&palace, &state).is_ok());
    }

    #[test]
    fn active_policy_blocks_event_and_theme() {
        let mut crusade = event("crusade");
        crusade.theme = "war".to_string();
        let mut pacifism = Policy::new("pacifism", "Pacifism");
        pacifism.blocks_themes.insert("war".to_string());
        let mut censorship = Policy::new("censorship", "Censorship");
        censorship.blocks_events.insert(EventId::new("pamphlets"));

        let cat = catalog(
            vec![crusade.clone(), event("pamphlets"), event("harvest")],
            vec![pacifism.clone(), censorship.clone()],
        );
        let rules = RulesConfig::default().with_enactment_toll(0);
        let filter = FeasibilityFilter::new(&cat, &rules);

        let mut state = fresh();
        assert_eq!(filter.filter(&state).len(), 3);

        state.activate_policy(&pacifism, &cat, &rules).unwrap();
        state.activate_policy(&censorship, &cat, &rules).unwrap();
        let ids: Vec<&str> = filter.filter(&state).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["harvest"]);
        assert_eq!(
            filter.check(&crusade, &state),
            Err(Rejection::BlockedByPolicy(PolicyId::new("pacifism")))
        );
    }

    #[test]
    fn theme_cooldown_blocks_recent_themes() {
        let war = event("border_raid").with_theme("war");
        let budget = event("budget").with_theme("management");
        let cat = catalog(vec![war.clone(), budget.clone()], vec![]);
        let rules = RulesConfig::default().with_theme_cooldown(2);
        let filter = FeasibilityFilter::new(&cat, &rules);

        let mut state = fresh();
        apply_option(&mut state, &war, 0).unwrap();
        assert_eq!(
            filter.check(&war, &state),
            Err(Rejection::ThemeCooldown("war".to_string()))
        );

        apply_option(&mut state, &budget, 0).unwrap();
        assert!(filter.check(&war, &state).is_err(), "still within two turns");
        assert!(filter.check(&budget, &state).is_ok(), "management is exempt");

        apply_option(&mut state, &budget, 0).unwrap();
        assert!(filter.check(&war, &state).is_ok());
    }

    #[test]
    fn cooldown_is_off_by_default() {
        let war = event("border_raid").with_theme("war");
        let cat = catalog(vec![war.clone()], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);
        let mut state = fresh();
        apply_option(&mut state, &war, 0).unwrap();
        assert!(filter.check(&war, &state).is_ok());
    }

    #[test]
    fn filter_preserves_catalog_order() {
        let cat = catalog(vec![event("c"), event("a"), event("b")], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);
        let ids: Vec<&str> = filter.filter(&fresh()).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn rejections_explain_each_infeasible_event() {
        let mut saintly = event("pilgrimage");
        saintly.requires_tags = tag_set(["saint"]);
        let cat = catalog(vec![event("harvest"), saintly], vec![]);
        let rules = RulesConfig::default();
        let filter = FeasibilityFilter::new(&cat, &rules);
        let rejections = filter.rejections(&fresh());
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].0.as_str(), "pilgrimage");
        assert_eq!(rejections[0].1.to_string(), "requires tag \"saint\"");
    }

    const TAG_POOL: [&str; 5] = ["saint", "tyrant", "generous", "feudal", "pious"];

    fn tags_strategy() -> impl Strategy<Value = Vec<&'static str>> {
        proptest::sample::subsequence(TAG_POOL.to_vec(), 0..=TAG_POOL.len())
    }

    proptest! {
        /// Adding a tag the event does not block never makes it infeasible.
        #[test]
        fn adding_unblocked_tags_is_monotone(
            requires in tags_strategy(),
            blocks in tags_strategy(),
            held in tags_strategy(),
            extra in proptest::sample::select(TAG_POOL.to_vec()),
        ) {
            let mut ev = event("omen");
            ev.requires_tags = tag_set(requires);
            ev.blocks_tags = tag_set(blocks);
            let cat = catalog(vec![ev.clone()], vec![]);
            let rules = RulesConfig::default();
            let filter = FeasibilityFilter::new(&cat, &rules);

            let mut state = fresh();
            state.grant_tags(tag_set(held));
            let before = filter.check(&ev, &state).is_ok();

            prop_assume!(!ev.blocks_tags.contains(&Tag::new(extra)));
            state.grant_tags(tag_set([extra]));
            let after = filter.check(&ev, &state).is_ok();
            prop_assert!(!before || after);
        }
    }
}
