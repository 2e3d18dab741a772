//! Chronicle export: the reign's history as a readable document.

use std::fmt;

use sov_core::{Catalog, HistoryEntry, ReignEnding, ReignState, ResourceVector, Tag};

/// Headline facts about a reign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReignSummary {
    /// Years on the throne (the current year counts).
    pub years: u32,
    /// Decisions taken.
    pub decisions: usize,
    /// Tags earned.
    pub tags: usize,
    /// Laws in force.
    pub laws: usize,
    /// Resources now.
    pub resources: ResourceVector,
    /// How it ended, if it has.
    pub ending: Option<ReignEnding>,
}

impl fmt::Display for ReignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} year(s), {} decision(s), {} tag(s), {} law(s) in force. ",
            self.years, self.decisions, self.tags, self.laws
        )?;
        match self.ending {
            Some(ending) => write!(f, "Ended in {ending}."),
            None => write!(f, "The reign continues."),
        }
    }
}

/// A read-only view over a reign's history.
pub struct Chronicle<'a> {
    state: &'a ReignState,
    catalog: &'a Catalog,
}

impl<'a> Chronicle<'a> {
    /// Chronicle of `state`, with event titles looked up in `catalog`.
    pub fn new(state: &'a ReignState, catalog: &'a Catalog) -> Self {
        Self { state, catalog }
    }

    /// Headline facts.
    pub fn summary(&self) -> ReignSummary {
        ReignSummary {
            years: self.state.year(),
            decisions: self.state.history().len(),
            tags: self.state.tags().len(),
            laws: self.state.active_policies().len(),
            resources: *self.state.resources(),
            ending: self.state.ending(),
        }
    }

    fn title(&self, entry: &'a HistoryEntry) -> &'a str {
        self.catalog
            .event(&entry.event_id)
            .map(|e| e.title.as_str())
            .unwrap_or(entry.event_id.as_str())
    }

    /// Export as markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Chronicle of the Reign\n\n");
        for entry in self.state.history() {
            out.push_str(&format!("## Year {}: {}\n\n", entry.year, self.title(entry)));
            out.push_str(&format!("**Decision**: {}\n\n", entry.option_text));
            out.push_str(&format!("*Effects*: {}\n", entry.deltas.delta_summary()));
            if !entry.new_tags.is_empty() {
                out.push_str(&format!("*Became known as*: {}\n", join_tags(&entry.new_tags)));
            }
            out.push('\n');
        }

        out.push_str("## Final State\n\n");
        for (resource, value) in self.state.resources().iter() {
            out.push_str(&format!("- {resource}: {value}\n"));
        }
        out.push('\n');
        match self.state.ending() {
            Some(ending) => out.push_str(&format!("**{ending}**: {}\n", ending.epitaph())),
            None => out.push_str("*The reign continues.*\n"),
        }
        out
    }

    /// Export as plain text.
    pub fn export_text(&self) -> String {
        let mut out = String::from("Chronicle of the Reign\n======================\n\n");
        for entry in self.state.history() {
            out.push_str(&format!(
                "Year {}: {} -> {}\n",
                entry.year,
                self.title(entry),
                entry.option_text
            ));
            out.push_str(&format!("  {}\n", entry.deltas.delta_summary()));
            if !entry.new_tags.is_empty() {
                out.push_str(&format!("  tags: {}\n", join_tags(&entry.new_tags)));
            }
        }
        out.push('\n');
        out.push_str(&format!("{}\n", self.summary()));
        if let Some(ending) = self.state.ending() {
            out.push_str(&format!("{}\n", ending.epitaph()));
        }
        out
    }
}

fn join_tags(tags: &[Tag]) -> String {
    tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sov_core::{Event, EventOption, Resource, apply_option, tag_set};

    fn setup() -> (Catalog, ReignState) {
        let mut feast = EventOption::new("Open the granaries");
        feast.effects = ResourceVector::default()
            .with(Resource::Treasury, 10)
            .with(Resource::Popularity, -5);
        feast.adds_tags = tag_set(["generous"]);
        let event = Event::new("harvest", "The Harvest Feast").with_option(feast);
        let catalog = Catalog::new(vec![event], vec![]).unwrap();

        let mut state = ReignState::new(ResourceVector::splat(50));
        let ev = catalog.events()[0].clone();
        apply_option(&mut state, &ev, 0).unwrap();
        (catalog, state)
    }

    #[test]
    fn markdown_lists_decisions() {
        let (catalog, state) = setup();
        let md = Chronicle::new(&state, &catalog).export_markdown();
        assert!(md.starts_with("# Chronicle of the Reign"));
        assert!(md.contains("## Year 1: The Harvest Feast"));
        assert!(md.contains("**Decision**: Open the granaries"));
        assert!(md.contains("treasury +10, popularity -5"));
        assert!(md.contains("*Became known as*: generous"));
        assert!(md.contains("The reign continues."));
    }

    #[test]
    fn text_export_and_summary() {
        let (catalog, mut state) = setup();
        state.apply_deltas(&ResourceVector::default().with(Resource::Military, -100));
        let chronicle = Chronicle::new(&state, &catalog);

        let summary = chronicle.summary();
        assert_eq!(summary.decisions, 1);
        assert_eq!(summary.tags, 1);
        assert_eq!(summary.ending, Some(ReignEnding::Conquest));

        let text = chronicle.export_text();
        assert!(text.contains("Year 1: The Harvest Feast -> Open the granaries"));
        assert!(text.contains("Ended in Conquest."));
        assert!(text.contains(ReignEnding::Conquest.epitaph()));
    }

    #[test]
    fn unknown_event_falls_back_to_id() {
        let (_, state) = setup();
        let empty = Catalog::default();
        let text = Chronicle::new(&state, &empty).export_text();
        assert!(text.contains("Year 1: harvest -> Open the granaries"));
    }
}
