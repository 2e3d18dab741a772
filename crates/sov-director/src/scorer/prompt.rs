//! Prompt construction and answer parsing for language-model scorers.

use std::fmt;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex_lite::Regex;
use sov_core::{Event, ReignState, TagSet, describe_tags};

/// How many recent decisions feed the momentum and the prompt.
const RECENT_WINDOW: usize = 3;

/// Net change over the window that counts as a trend.
const MOMENTUM_THRESHOLD: i32 = 5;

static CHOICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Choice:.*?#?(\d+)").expect("valid regex"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b").expect("valid regex"));

/// Direction the kingdom has been heading recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Momentum {
    /// Recent decisions have net improved the realm.
    Rising,
    /// Recent decisions have net hurt the realm.
    Falling,
    /// No clear trend.
    Steady,
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Momentum::Rising => "Rising (hubris beckons)",
            Momentum::Falling => "Falling (desperation sets in)",
            Momentum::Steady => "Steady",
        };
        f.write_str(s)
    }
}

/// Momentum from the summed deltas of the last few decisions.
pub fn momentum(state: &ReignState) -> Momentum {
    let net: i32 = state
        .history()
        .iter()
        .rev()
        .take(RECENT_WINDOW)
        .flat_map(|h| h.deltas.iter().map(|(_, v)| v))
        .fold(0i32, i32::saturating_add);
    if net > MOMENTUM_THRESHOLD {
        Momentum::Rising
    } else if net < -MOMENTUM_THRESHOLD {
        Momentum::Falling
    } else {
        Momentum::Steady
    }
}

/// Render the director prompt for `candidates`, numbered from 1.
pub fn build_prompt(candidates: &[&Event], state: &ReignState, tags: &TagSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### SYSTEM: GAME DIRECTOR");
    let _ = writeln!(
        out,
        "You direct a grim medieval kingdom simulation. You do not play; you choose \
         which challenge the ruler faces next. Read the state of the realm and pick \
         the event that makes the strongest story."
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "### STATE OF THE REALM");
    let _ = writeln!(out, "Year: {}", state.year());
    let reputation = if tags.is_empty() {
        "Neutral".to_string()
    } else {
        describe_tags(tags)
    };
    let _ = writeln!(out, "Ruler's tags (reputation): {reputation}");
    let _ = writeln!(out, "Current stats: {}", state.resources().summary());
    let _ = writeln!(out, "Momentum: {}", momentum(state));

    let recent: Vec<_> = state.history().iter().rev().take(RECENT_WINDOW).collect();
    if !recent.is_empty() {
        let _ = writeln!(out, "Recent decisions:");
        for entry in recent.iter().rev() {
            let _ = writeln!(
                out,
                "- Year {}: {} -> \"{}\"",
                entry.year, entry.event_id, entry.option_text
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "### CANDIDATES");
    for (i, event) in candidates.iter().enumerate() {
        let _ = writeln!(
            out,
            "#{} [Theme: {}] {}",
            i + 1,
            event.theme.to_uppercase(),
            event.title
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "### THINK IT THROUGH");
    let _ = writeln!(out, "1. Is the realm rising or falling? Which event fits that?");
    let _ = writeln!(out, "2. Does any event contradict what already happened?");
    let _ = writeln!(out, "3. Which event forces the hardest choice for THIS ruler?");
    let _ = writeln!(out, "4. Pick the number of the winning event.");
    let _ = writeln!(out);

    let _ = writeln!(out, "### YOUR ANSWER");
    let _ = writeln!(out, "Reasoning: <one short paragraph>");
    let _ = write!(out, "Choice: #<number>");
    out
}

/// Extract a 0-based candidate index from a model answer.
///
/// Looks for `Choice: #n` first (case-insensitive), otherwise takes the last
/// standalone number. Numbers are 1-based in the text; anything outside
/// `1..=count` is rejected.
pub fn extract_decision(text: &str, count: usize) -> Option<usize> {
    let raw = CHOICE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .or_else(|| {
            NUMBER_RE
                .captures_iter(text)
                .last()
                .and_then(|c| c.get(1))
        })?
        .as_str();
    let n: usize = raw.parse().ok()?;
    if (1..=count).contains(&n) {
        Some(n - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sov_core::{EventOption, Resource, ResourceVector, apply_option, tag_set};

    fn event(id: &str, theme: &str, title: &str) -> Event {
        Event::new(id, title)
            .with_theme(theme)
            .with_option(EventOption::new("Proceed"))
    }

    #[test]
    fn explicit_choice_wins() {
        assert_eq!(extract_decision("Reasoning: #1 is dull.\nChoice: #3", 5), Some(2));
        assert_eq!(extract_decision("choice: 2", 5), Some(1));
        assert_eq!(extract_decision("CHOICE: event #4 for drama", 5), Some(3));
    }

    #[test]
    fn falls_back_to_last_number() {
        assert_eq!(extract_decision("I like 1 but 2 is better", 3), Some(1));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(extract_decision("Choice: #0", 3), None);
        assert_eq!(extract_decision("Choice: #9", 3), None);
        assert_eq!(extract_decision("no idea", 3), None);
        assert_eq!(extract_decision("", 3), None);
    }

    #[test]
    fn momentum_tracks_recent_deltas() {
        let mut boon = EventOption::new("Take it");
        boon.effects = ResourceVector::default().with(Resource::Treasury, 10);
        let mut bane = EventOption::new("Suffer it");
        bane.effects = ResourceVector::default().with(Resource::Popularity, -10);
        let ev = Event::new("fortune", "Fortune")
            .with_option(boon)
            .with_option(bane);

        let mut state = ReignState::new(ResourceVector::splat(50));
        assert_eq!(momentum(&state), Momentum::Steady);
        apply_option(&mut state, &ev, 0).unwrap();
        assert_eq!(momentum(&state), Momentum::Rising);
        apply_option(&mut state, &ev, 1).unwrap();
        apply_option(&mut state, &ev, 1).unwrap();
        assert_eq!(momentum(&state), Momentum::Falling);
    }

    #[test]
    fn prompt_lists_numbered_candidates() {
        let a = event("raid", "war", "Border Raid");
        let b = event("feast", "festival", "The Harvest Feast");
        let state = ReignState::new(ResourceVector::splat(50));
        let prompt = build_prompt(&[&a, &b], &state, &tag_set(["saint"]));

        assert!(prompt.contains("#1 [Theme: WAR] Border Raid"));
        assert!(prompt.contains("#2 [Theme: FESTIVAL] The Harvest Feast"));
        assert!(prompt.contains("Ruler's tags (reputation): saint"));
        assert!(prompt.contains("treasury:50"));
        assert!(prompt.ends_with("Choice: #<number>"));
    }

    #[test]
    fn prompt_without_tags_reads_neutral() {
        let a = event("raid", "war", "Border Raid");
        let state = ReignState::new(ResourceVector::splat(50));
        let prompt = build_prompt(&[&a], &state, &TagSet::new());
        assert!(prompt.contains("reputation): Neutral"));
    }
}
