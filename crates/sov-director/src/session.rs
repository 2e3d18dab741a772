//! Reign session management.
//!
//! `ReignSession` is the boundary a front end talks to: it owns the
//! [`ReignState`], holds the pending event, and runs the director between
//! decisions. Rejected actions leave the reign exactly as it was.

use std::sync::Arc;

use sov_core::{
    Catalog, Event, EventId, OfferedOption, PolicyId, ReignEnding, ReignState, ResourceVector,
    SaveGame, SovError, Tag, apply_offered, offered_options,
};
use tracing::info;

use crate::chronicle::Chronicle;
use crate::config::SessionConfig;
use crate::director::{Director, SelectionMethod};
use crate::error::{DirectorError, DirectorResult};
use crate::scorer::NarrativeScorer;

/// Why a reign stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReignEnd {
    /// A vital resource ran out.
    Collapsed(ReignEnding),
    /// The reign survives, but no event can be drawn.
    ContentExhausted,
}

/// What a decision did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReignOutcome {
    /// Year the decision was taken in.
    pub year: u32,
    /// Resources after the decision and the turn's passive effects.
    pub resources: ResourceVector,
    /// Effective change from the chosen option.
    pub option_effects: ResourceVector,
    /// Effective change from laws at the turn's close.
    pub passive_effects: ResourceVector,
    /// The option's outcome text.
    pub narrative: String,
    /// Tags granted for the first time.
    pub new_tags: Vec<Tag>,
    /// Set when the reign cannot continue.
    pub ended: Option<ReignEnd>,
}

/// An interactive reign.
pub struct ReignSession {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    director: Director,
    state: ReignState,
    pending: Option<EventId>,
    last_method: Option<SelectionMethod>,
}

impl ReignSession {
    /// Start a new reign from the configured initial resources and laws.
    pub fn new(
        catalog: Arc<Catalog>,
        config: SessionConfig,
        scorer: Option<Box<dyn NarrativeScorer>>,
    ) -> DirectorResult<Self> {
        let state = ReignState::from_rules(&config.rules, &catalog)?;
        info!(
            events = catalog.events().len(),
            laws = catalog.policies().len(),
            resources = %state.resources().summary(),
            "reign begins"
        );
        let director = Director::new(config.director.clone(), scorer);
        Ok(Self {
            catalog,
            config,
            director,
            state,
            pending: None,
            last_method: None,
        })
    }

    /// Resume a saved reign. The pending event, if any, is presented again.
    pub fn resume(
        catalog: Arc<Catalog>,
        config: SessionConfig,
        scorer: Option<Box<dyn NarrativeScorer>>,
        save: SaveGame,
    ) -> DirectorResult<Self> {
        if let Some(id) = &save.pending_event {
            catalog.require_event(id)?;
        }
        for id in save.state.active_policies() {
            catalog.require_policy(id)?;
        }
        info!(year = save.state.year(), saved_at = %save.saved_at, "reign resumed");
        let director = Director::new(config.director.clone(), scorer);
        Ok(Self {
            catalog,
            config,
            director,
            state: save.state,
            pending: save.pending_event,
            last_method: None,
        })
    }

    /// The reign.
    pub fn state(&self) -> &ReignState {
        &self.state
    }

    /// The content.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The director, for mode and statistics.
    pub fn director(&self) -> &Director {
        &self.director
    }

    /// How the current event was chosen (unknown after a resume).
    pub fn last_method(&self) -> Option<SelectionMethod> {
        self.last_method
    }

    /// Whether the reign has ended.
    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    /// The event awaiting a decision, if one has been drawn.
    pub fn current_event(&self) -> Option<&Event> {
        self.pending.as_ref().and_then(|id| self.catalog.event(id))
    }

    /// The pending event's options as they stand, blocked ones included. Empty
    /// when no event is pending.
    pub fn offered_options(&self) -> Vec<OfferedOption<'_>> {
        self.current_event()
            .map(|event| offered_options(&self.state, event, &self.config.rules))
            .unwrap_or_default()
    }

    /// The event awaiting a decision, drawing one if necessary.
    pub fn next_event(&mut self) -> DirectorResult<&Event> {
        if self.state.is_terminal() {
            return Err(SovError::ReignEnded.into());
        }
        if self.pending.is_none() {
            let selection = self
                .director
                .select(&self.catalog, &self.config.rules, &self.state)?;
            self.pending = Some(selection.event.id.clone());
            self.last_method = Some(selection.method);
        }
        self.current_event().ok_or(DirectorError::NoPendingEvent)
    }

    /// Resolve the pending event with entry `index` of
    /// [`offered_options`](Self::offered_options), close the year, and draw
    /// the next event if the reign goes on.
    pub fn choose_option(&mut self, index: usize) -> DirectorResult<ReignOutcome> {
        let id = self.pending.clone().ok_or(DirectorError::NoPendingEvent)?;
        let catalog = Arc::clone(&self.catalog);
        let event = catalog.require_event(&id)?;

        let year = self.state.year();
        let applied = apply_offered(&mut self.state, event, index, &self.config.rules)?;
        self.pending = None;
        self.last_method = None;

        let mut passive_effects = ResourceVector::default();
        let ended = match applied.ending {
            Some(ending) => Some(ReignEnd::Collapsed(ending)),
            None => {
                passive_effects = self.state.advance_turn(&catalog)?;
                match self.state.ending() {
                    Some(ending) => Some(ReignEnd::Collapsed(ending)),
                    None => match self.next_event() {
                        Ok(_) => None,
                        Err(DirectorError::NoFeasibleEvent { .. }) => {
                            Some(ReignEnd::ContentExhausted)
                        }
                        Err(e) => return Err(e),
                    },
                }
            }
        };
        if let Some(end) = ended {
            info!(year = self.state.year(), ?end, "reign over");
        }

        Ok(ReignOutcome {
            year,
            resources: *self.state.resources(),
            option_effects: applied.effective,
            passive_effects,
            narrative: applied.outcome,
            new_tags: applied.new_tags,
            ended,
        })
    }

    /// Enact a law.
    pub fn enact_policy(&mut self, id: &PolicyId) -> DirectorResult<()> {
        let policy = self.catalog.require_policy(id)?;
        self.state
            .activate_policy(policy, &self.catalog, &self.config.rules)?;
        Ok(())
    }

    /// Revoke a law.
    pub fn revoke_policy(&mut self, id: &PolicyId) -> DirectorResult<()> {
        let policy = self.catalog.require_policy(id)?;
        self.state.revoke_policy(policy, &self.config.rules)?;
        Ok(())
    }

    /// Snapshot the reign for saving.
    pub fn save(&self) -> SaveGame {
        SaveGame::new(self.state.clone(), self.pending.clone())
    }

    /// The reign's chronicle.
    pub fn chronicle(&self) -> Chronicle<'_> {
        Chronicle::new(&self.state, &self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectorConfig;
    use sov_core::{EventOption, Policy, Resource, RulesConfig, tag_set};

    fn generous_feast() -> Event {
        let mut option = EventOption::new("Host a feast");
        option.effects = ResourceVector::default()
            .with(Resource::Treasury, 10)
            .with(Resource::Popularity, -5);
        option.adds_tags = tag_set(["generous"]);
        option.outcome = "The nobles dine well.".to_string();
        Event::new("feast", "A Royal Feast").with_option(option)
    }

    fn session(events: Vec<Event>, policies: Vec<Policy>, config: SessionConfig) -> ReignSession {
        let catalog = Arc::new(Catalog::new(events, policies).unwrap());
        ReignSession::new(catalog, config, None).unwrap()
    }

    #[test]
    fn single_decision_end_to_end() {
        let mut s = session(vec![generous_feast()], vec![], SessionConfig::default());
        assert_eq!(s.next_event().unwrap().id.as_str(), "feast");

        let outcome = s.choose_option(0).unwrap();
        assert_eq!(s.state().resources().treasury, 60);
        assert_eq!(s.state().resources().popularity, 45);
        assert_eq!(s.state().tags(), &tag_set(["generous"]));
        assert_eq!(s.state().history().len(), 1);

        assert_eq!(outcome.year, 1);
        assert_eq!(outcome.narrative, "The nobles dine well.");
        assert_eq!(outcome.new_tags, vec![Tag::new("generous")]);
        assert!(outcome.ended.is_none());
        assert_eq!(s.state().year(), 2);
        assert!(s.current_event().is_some(), "next event drawn");
    }

    #[test]
    fn nothing_feasible_reports_exhaustion() {
        let mut pilgrimage = Event::new("pilgrimage", "The Pilgrimage")
            .with_option(EventOption::new("Go"));
        pilgrimage.requires_tags = tag_set(["saint"]);
        let mut s = session(vec![pilgrimage], vec![], SessionConfig::default());
        assert!(matches!(
            s.next_event(),
            Err(DirectorError::NoFeasibleEvent { year: 1 })
        ));
        assert!(s.current_event().is_none());
    }

    #[test]
    fn nothing_feasible_uses_fallback() {
        let mut pilgrimage = Event::new("pilgrimage", "The Pilgrimage")
            .with_option(EventOption::new("Go"));
        pilgrimage.requires_tags = tag_set(["saint"]);
        let mut quiet = Event::new("quiet_year", "A Quiet Year")
            .with_option(EventOption::new("Rest"));
        quiet.requires_tags = tag_set(["unreachable"]);
        let config = SessionConfig::default()
            .with_director(DirectorConfig::default().with_fallback_event("quiet_year"));
        let mut s = session(vec![pilgrimage, quiet], vec![], config);
        assert_eq!(s.next_event().unwrap().id.as_str(), "quiet_year");
        assert_eq!(s.last_method(), Some(SelectionMethod::LastResort));
    }

    #[test]
    fn exhaustion_after_a_decision_is_reported() {
        let mut once = EventOption::new("Crown yourself");
        once.adds_tags = tag_set(["crowned"]);
        let mut coronation = Event::new("coronation", "Coronation").with_option(once);
        coronation.blocks_tags = tag_set(["crowned"]);
        let mut s = session(vec![coronation], vec![], SessionConfig::default());

        s.next_event().unwrap();
        let outcome = s.choose_option(0).unwrap();
        assert_eq!(outcome.ended, Some(ReignEnd::ContentExhausted));
        assert!(!s.is_over());
    }

    #[test]
    fn fatal_decision_ends_reign() {
        let mut coup = EventOption::new("Dissolve the council");
        coup.effects = ResourceVector::default().with(Resource::Stability, -50);
        let event = Event::new("coup", "The Council Rebels").with_option(coup);
        let mut s = session(vec![event], vec![], SessionConfig::default());

        s.next_event().unwrap();
        let outcome = s.choose_option(0).unwrap();
        assert_eq!(outcome.ended, Some(ReignEnd::Collapsed(ReignEnding::Anarchy)));
        assert!(s.is_over());
        assert_eq!(s.state().year(), 1, "no turn advance after collapse");
        assert!(matches!(
            s.next_event(),
            Err(DirectorError::Rejected(SovError::ReignEnded))
        ));
    }

    #[test]
    fn choose_without_pending_event() {
        let mut s = session(vec![generous_feast()], vec![], SessionConfig::default());
        assert!(matches!(s.choose_option(0), Err(DirectorError::NoPendingEvent)));
    }

    #[test]
    fn invalid_option_leaves_state_unchanged() {
        let mut s = session(vec![generous_feast()], vec![], SessionConfig::default());
        s.next_event().unwrap();
        let before = s.state().clone();
        let err = s.choose_option(3).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(s.state(), &before);
        assert!(s.current_event().is_some(), "event still pending");
    }

    #[test]
    fn unaffordable_choice_is_refused_and_collapse_is_the_way_out() {
        let mut muster = EventOption::new("Muster the host");
        muster.effects = ResourceVector::default().with(Resource::Military, -60);
        let war = Event::new("war", "War in the North").with_option(muster);
        let mut s = session(vec![war], vec![], SessionConfig::default());
        s.next_event().unwrap();

        let offered = s.offered_options();
        assert_eq!(offered.len(), 2);
        assert_eq!(
            offered[0].blocked.as_deref(),
            Some("requires 60 military, have 50")
        );
        assert!(offered[1].blocked.is_none());

        let before = s.state().clone();
        assert!(matches!(
            s.choose_option(0),
            Err(DirectorError::Rejected(SovError::OptionBlocked { .. }))
        ));
        assert_eq!(s.state(), &before);

        let outcome = s.choose_option(1).unwrap();
        assert_eq!(outcome.option_effects.stability, -15);
        assert_eq!(outcome.option_effects.popularity, -10);
        assert_eq!(s.state().year(), 2);
    }

    #[test]
    fn nothing_offered_without_a_pending_event() {
        let s = session(vec![generous_feast()], vec![], SessionConfig::default());
        assert!(s.offered_options().is_empty());
    }

    #[test]
    fn policies_through_the_session() {
        let mut tithe = Policy::new("tithe", "The Tithe");
        tithe.passive_effects = ResourceVector::default().with(Resource::Treasury, 3);
        let rules = RulesConfig::default().with_policy_lock_turns(1);
        let config = SessionConfig::default().with_rules(rules);
        let mut s = session(vec![generous_feast()], vec![tithe], config);

        let id = PolicyId::new("tithe");
        s.enact_policy(&id).unwrap();
        assert!(matches!(
            s.revoke_policy(&id),
            Err(DirectorError::Rejected(SovError::PolicyLocked { .. }))
        ));
        assert!(matches!(
            s.enact_policy(&PolicyId::new("ghost")),
            Err(DirectorError::Rejected(SovError::UnknownPolicy(_)))
        ));

        s.next_event().unwrap();
        let outcome = s.choose_option(0).unwrap();
        assert_eq!(outcome.passive_effects.treasury, 3);
        assert_eq!(s.state().resources().treasury, 63);

        s.revoke_policy(&id).unwrap();
        assert!(!s.state().is_active(&id));
    }

    #[test]
    fn save_and_resume() {
        let catalog = Arc::new(Catalog::new(vec![generous_feast()], vec![]).unwrap());
        let mut s = ReignSession::new(catalog.clone(), SessionConfig::default(), None).unwrap();
        s.next_event().unwrap();
        s.choose_option(0).unwrap();

        let json = s.save().to_json().unwrap();
        let save = SaveGame::from_json(&json).unwrap();
        let resumed =
            ReignSession::resume(catalog, SessionConfig::default(), None, save).unwrap();
        assert_eq!(resumed.state(), s.state());
        assert_eq!(
            resumed.current_event().map(|e| e.id.clone()),
            s.current_event().map(|e| e.id.clone())
        );
        assert_eq!(resumed.chronicle().summary().decisions, 1);
    }

    #[test]
    fn resume_rejects_unknown_pending_event() {
        let catalog = Arc::new(Catalog::new(vec![generous_feast()], vec![]).unwrap());
        let save = SaveGame::new(
            ReignState::new(ResourceVector::splat(50)),
            Some(EventId::new("vanished")),
        );
        assert!(matches!(
            ReignSession::resume(catalog, SessionConfig::default(), None, save),
            Err(DirectorError::Rejected(SovError::UnknownEvent(_)))
        ));
    }
}
