//! Resolving a chosen event option against the reign.

use tracing::debug;

use crate::error::{SovError, SovResult};
use crate::event::{Event, EventId, EventOption};
use crate::resource::ResourceVector;
use crate::rules::RulesConfig;
use crate::state::{HistoryEntry, ReignEnding, ReignState};
use crate::tag::Tag;

/// What happened when an option was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOption {
    /// The resolved event.
    pub event_id: EventId,
    /// Index of the chosen option.
    pub option_index: usize,
    /// Effective (post-clamp) resource change.
    pub effective: ResourceVector,
    /// Tags granted for the first time.
    pub new_tags: Vec<Tag>,
    /// The option's narrative outcome.
    pub outcome: String,
    /// Set if this decision ended the reign.
    pub ending: Option<ReignEnding>,
}

/// One choice as presented to the ruler.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferedOption<'e> {
    /// Index to pass to [`apply_offered`].
    pub index: usize,
    /// The option itself.
    pub option: &'e EventOption,
    /// Why it cannot be taken right now.
    pub blocked: Option<String>,
}

/// The options of `event` with their affordability. When every one of them
/// is out of reach, the rules' collapse option is appended so the reign can
/// always move on.
pub fn offered_options<'e>(
    state: &ReignState,
    event: &'e Event,
    rules: &'e RulesConfig,
) -> Vec<OfferedOption<'e>> {
    let mut offered: Vec<OfferedOption<'e>> = event
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| OfferedOption {
            index,
            option,
            blocked: state.option_block_reason(option),
        })
        .collect();
    if offered.iter().all(|o| o.blocked.is_some()) {
        offered.push(OfferedOption {
            index: event.options.len(),
            option: &rules.collapse_option,
            blocked: None,
        });
    }
    offered
}

/// Apply option `index` of `event`: deltas first, then tags, then a history
/// entry.
///
/// An out-of-range index, an option the realm cannot afford, or an ended
/// reign is rejected without touching the state.
pub fn apply_option(
    state: &mut ReignState,
    event: &Event,
    index: usize,
) -> SovResult<AppliedOption> {
    state.ensure_running()?;
    let option = event.options.get(index).ok_or_else(|| SovError::InvalidOption {
        event: event.id.clone(),
        index,
        count: event.options.len(),
    })?;
    if let Some(reason) = state.option_block_reason(option) {
        return Err(SovError::OptionBlocked {
            event: event.id.clone(),
            index,
            reason,
        });
    }
    Ok(resolve(state, event, index, option))
}

/// Apply entry `index` of [`offered_options`]. Past the event's own options
/// this is the collapse option, available only while nothing else is.
pub fn apply_offered(
    state: &mut ReignState,
    event: &Event,
    index: usize,
    rules: &RulesConfig,
) -> SovResult<AppliedOption> {
    if index < event.options.len() {
        return apply_option(state, event, index);
    }
    state.ensure_running()?;
    let offered = offered_options(state, event, rules);
    let collapse = offered
        .iter()
        .find(|o| o.index == index)
        .map(|o| o.option)
        .ok_or_else(|| SovError::InvalidOption {
            event: event.id.clone(),
            index,
            count: offered.len(),
        })?;
    debug!(event = %event.id, "every option out of reach, the realm drifts");
    Ok(resolve(state, event, index, collapse))
}

fn resolve(
    state: &mut ReignState,
    event: &Event,
    index: usize,
    option: &EventOption,
) -> AppliedOption {
    let effective = state.apply_deltas(&option.effects);
    let new_tags = state.grant_tags(option.adds_tags.iter().cloned());

    state.push_history(HistoryEntry {
        year: state.year(),
        event_id: event.id.clone(),
        theme: event.theme.clone(),
        option_index: index,
        option_text: option.text.clone(),
        deltas: effective,
        new_tags: new_tags.clone(),
    });
    debug!(
        event = %event.id,
        option = index,
        change = %effective.delta_summary(),
        "option applied"
    );

    AppliedOption {
        event_id: event.id.clone(),
        option_index: index,
        effective,
        new_tags,
        outcome: option.outcome.clone(),
        ending: state.ending(),
    }
}
