//! Event selection: rules, then the optional scorer, then drama.
//!
//! The director never fails to pick an event while at least one is feasible.
//! Scorer problems of any kind are logged and absorbed; the drama ranker
//! takes over. The RNG is only touched when the scorer is actually consulted,
//! so a reign without a working scorer plays out exactly like one with no
//! scorer at all.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use sov_core::{Catalog, Event, ReignState, RulesConfig};
use tracing::{debug, info, warn};

use crate::config::DirectorConfig;
use crate::error::{DirectorError, DirectorResult};
use crate::filter::FeasibilityFilter;
use crate::ranker;
use crate::scorer::{NarrativeScorer, ScorerError};

/// Whether the scorer is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorMode {
    /// A scorer is present and available.
    Assisted,
    /// Drama ranking only.
    DramaOnly,
}

impl fmt::Display for DirectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DirectorMode::Assisted => "assisted",
            DirectorMode::DramaOnly => "drama only",
        })
    }
}

/// Which layer produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    /// The narrative scorer chose.
    Scorer,
    /// The drama ranker chose.
    Drama,
    /// Nothing was feasible; the configured catch-all was used.
    LastResort,
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionMethod::Scorer => "scorer",
            SelectionMethod::Drama => "drama",
            SelectionMethod::LastResort => "last resort",
        };
        f.write_str(s)
    }
}

/// The chosen event and how it was chosen.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// The event to present.
    pub event: &'a Event,
    /// Which layer picked it.
    pub method: SelectionMethod,
}

/// Selection counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorStats {
    /// Events picked by the scorer.
    pub by_scorer: u32,
    /// Events picked by the drama ranker.
    pub by_drama: u32,
    /// Last-resort events drawn.
    pub last_resort: u32,
    /// Scorer calls that produced no usable answer.
    pub scorer_failures: u32,
}

impl DirectorStats {
    fn record(&mut self, method: SelectionMethod) {
        match method {
            SelectionMethod::Scorer => self.by_scorer += 1,
            SelectionMethod::Drama => self.by_drama += 1,
            SelectionMethod::LastResort => self.last_resort += 1,
        }
    }

    /// Total events selected.
    pub fn total(&self) -> u32 {
        self.by_scorer + self.by_drama + self.last_resort
    }
}

/// Chooses the next event for a reign.
pub struct Director {
    config: DirectorConfig,
    scorer: Option<Box<dyn NarrativeScorer>>,
    mode: DirectorMode,
    rng: StdRng,
    stats: DirectorStats,
}

impl Director {
    /// Create a director. The mode is fixed here from the scorer's
    /// availability.
    pub fn new(config: DirectorConfig, scorer: Option<Box<dyn NarrativeScorer>>) -> Self {
        let mode = match scorer.as_deref() {
            Some(s) if s.is_available() => DirectorMode::Assisted,
            _ => DirectorMode::DramaOnly,
        };
        match scorer.as_deref() {
            Some(s) => info!(scorer = s.name(), ?mode, "director ready"),
            None => info!(?mode, "director ready"),
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            scorer,
            mode,
            rng,
            stats: DirectorStats::default(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> DirectorMode {
        self.mode
    }

    /// Selection counters.
    pub fn stats(&self) -> &DirectorStats {
        &self.stats
    }

    /// The configuration in use.
    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Name of the attached scorer, if any.
    pub fn scorer_name(&self) -> Option<&str> {
        self.scorer.as_deref().map(|s| s.name())
    }

    /// Choose the next event for `state`.
    ///
    /// Fails with [`DirectorError::NoFeasibleEvent`] only when nothing is
    /// feasible and no usable last-resort event is configured.
    pub fn select<'a>(
        &mut self,
        catalog: &'a Catalog,
        rules: &RulesConfig,
        state: &ReignState,
    ) -> DirectorResult<Selection<'a>> {
        let feasible = FeasibilityFilter::new(catalog, rules).filter(state);

        if feasible.is_empty() {
            return self.last_resort(catalog, state);
        }

        if self.mode == DirectorMode::Assisted && feasible.len() > 1 {
            if let Some(event) = self.consult_scorer(&feasible, state) {
                return Ok(self.finish(event, SelectionMethod::Scorer, state));
            }
        }

        let event = ranker::rank(&feasible, state.year())?;
        Ok(self.finish(event, SelectionMethod::Drama, state))
    }

    fn consult_scorer<'a>(
        &mut self,
        feasible: &[&'a Event],
        state: &ReignState,
    ) -> Option<&'a Event> {
        let scorer = self.scorer.as_deref()?;

        let amount = self.config.scorer_pool_size.max(1).min(feasible.len());
        let mut picks = index::sample(&mut self.rng, feasible.len(), amount).into_vec();
        picks.sort_unstable();
        let pool: Vec<&'a Event> = picks.into_iter().map(|i| feasible[i]).collect();
        debug!(pool = pool.len(), feasible = feasible.len(), "consulting scorer");

        let failure = match scorer.select_event(&pool, state) {
            Ok(id) => match pool.iter().find(|e| e.id == id) {
                Some(event) => return Some(*event),
                None => format!("contract violation: \"{id}\" was not a candidate"),
            },
            Err(ScorerError::Disconnected(reason)) => {
                warn!(scorer = scorer.name(), %reason, "scorer disconnected, drama only from now on");
                self.mode = DirectorMode::DramaOnly;
                format!("disconnected: {reason}")
            }
            Err(e) => e.to_string(),
        };
        warn!(scorer = scorer.name(), %failure, "scorer failed, falling back to drama");
        self.stats.scorer_failures += 1;
        None
    }

    fn last_resort<'a>(
        &mut self,
        catalog: &'a Catalog,
        state: &ReignState,
    ) -> DirectorResult<Selection<'a>> {
        let fallback = self
            .config
            .fallback_event
            .as_ref()
            .and_then(|id| catalog.event(id));
        match fallback {
            Some(event) => {
                warn!(year = state.year(), event = %event.id, "no feasible event, using last resort");
                Ok(self.finish(event, SelectionMethod::LastResort, state))
            }
            None => {
                warn!(year = state.year(), "no feasible event and no last resort");
                Err(DirectorError::NoFeasibleEvent { year: state.year() })
            }
        }
    }

    fn finish<'a>(
        &mut self,
        event: &'a Event,
        method: SelectionMethod,
        state: &ReignState,
    ) -> Selection<'a> {
        self.stats.record(method);
        info!(year = state.year(), event = %event.id, %method, "event selected");
        Selection { event, method }
    }
}
