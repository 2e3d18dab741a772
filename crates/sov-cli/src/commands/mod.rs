pub mod check;
pub mod play;
pub mod simulate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table};

use sov_core::{Catalog, RESOURCE_MAX, Resource, ResourceVector};
use sov_director::scorer::{LlmScorer, OllamaBackend};
use sov_director::{NarrativeScorer, SessionConfig};

/// File looked up next to the catalogs when no `--config` is given.
const CONFIG_FILE: &str = "sovereign.toml";

/// Where the content and configuration of a reign come from.
pub struct ReignOptions {
    pub dir: PathBuf,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub ollama: bool,
}

impl ReignOptions {
    /// Load the catalogs from the data directory.
    pub fn catalog(&self) -> Result<Arc<Catalog>, String> {
        Catalog::load_dir(&self.dir)
            .map(Arc::new)
            .map_err(|e| format!("failed to load catalogs: {e}"))
    }

    /// Resolve the session config: explicit file, then `<dir>/sovereign.toml`,
    /// then defaults. `--seed` wins over all of them.
    pub fn session_config(&self) -> Result<SessionConfig, String> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let candidate = self.dir.join(CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };
        let mut config = match path {
            Some(path) => SessionConfig::load(&path).map_err(|e| e.to_string())?,
            None => SessionConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.director.seed = seed;
        }
        Ok(config)
    }

    /// The narrative scorer, if one was requested.
    pub fn scorer(&self, config: &SessionConfig) -> Option<Box<dyn NarrativeScorer>> {
        if !self.ollama {
            return None;
        }
        let backend = Arc::new(OllamaBackend::from_env());
        let scorer = LlmScorer::new(backend, config.director.scorer_timeout())
            .with_status_rules(config.rules.status_tags.clone());
        Some(Box::new(scorer))
    }
}

/// A one-row table of the six resources, colored by danger.
fn resource_table(resources: &ResourceVector) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(Resource::ALL.iter().map(|r| r.as_str()));
    table.add_row(Resource::ALL.iter().map(|r| {
        let value = resources.get(*r);
        Cell::new(format!("{}/{RESOURCE_MAX}", colored_value(*r, value)))
    }));
    table
}

/// A resource value, red when low.
fn colored_value(resource: Resource, value: i32) -> String {
    let vital = matches!(
        resource,
        Resource::Stability | Resource::Popularity | Resource::Military
    );
    let text = value.to_string();
    if vital && value < 20 {
        text.red().bold().to_string()
    } else if value < 20 {
        text.yellow().to_string()
    } else {
        text
    }
}

/// `treasury +10, popularity -5` with gains green and losses red.
fn colored_deltas(delta: &ResourceVector) -> String {
    let parts: Vec<String> = delta
        .nonzero()
        .map(|(r, v)| {
            let s = format!("{r} {v:+}");
            if v > 0 {
                s.green().to_string()
            } else {
                s.red().to_string()
            }
        })
        .collect();
    if parts.is_empty() {
        "no change".dimmed().to_string()
    } else {
        parts.join(", ")
    }
}

fn data_dir_hint(dir: &Path) -> String {
    format!("(looked in '{}')", dir.display())
}
