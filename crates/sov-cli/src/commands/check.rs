use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use sov_core::{Catalog, ReignState};
use sov_director::{FeasibilityFilter, SessionConfig, ranker};

use super::ReignOptions;

pub fn run(dir: &Path, strict: bool, verbose: bool) -> Result<(), String> {
    let options = ReignOptions {
        dir: dir.to_path_buf(),
        config: None,
        seed: None,
        ollama: false,
    };
    let catalog = options
        .catalog()
        .map_err(|e| format!("{e} {}", super::data_dir_hint(dir)))?;
    let config = options.session_config()?;

    let missing_fallback = config
        .director
        .fallback_event
        .as_ref()
        .filter(|id| catalog.event(id).is_none());
    if let Some(id) = missing_fallback {
        return Err(format!("fallback event \"{id}\" is not in the catalog"));
    }
    for id in &config.rules.initial_policies {
        if catalog.policy(id).is_none() {
            return Err(format!("initial law \"{id}\" is not in the catalog"));
        }
    }

    let warnings = catalog.lint(&config.rules.status_tags);

    println!(
        "  {} events, {} laws",
        catalog.events().len(),
        catalog.policies().len()
    );
    if verbose {
        print_opening(&catalog, &config)?;
    }

    if warnings.is_empty() {
        println!("  All checks passed.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Warning"]);
    for (i, warning) in warnings.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), warning.to_string()]);
    }
    println!("{table}");
    println!(
        "  {} warning{}",
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" }
    );

    if strict {
        Err(format!("{} warning(s) in strict mode", warnings.len()))
    } else {
        println!("  {}", "Catalog is usable.".yellow());
        Ok(())
    }
}

/// What the director could draw in the first year, and why the rest is out.
fn print_opening(catalog: &Catalog, config: &SessionConfig) -> Result<(), String> {
    let state = ReignState::from_rules(&config.rules, catalog)
        .map_err(|e| format!("cannot start a reign: {e}"))?;
    let filter = FeasibilityFilter::new(catalog, &config.rules);

    let feasible = filter.filter(&state);
    let order: Vec<&str> = ranker::ordered(&feasible)
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    if order.is_empty() {
        println!("  Year 1 draw order: {}", "nothing is drawable".yellow());
    } else {
        println!("  Year 1 draw order: {}", order.join(", "));
    }

    let rejections = filter.rejections(&state);
    if !rejections.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Event", "Not drawable in year 1"]);
        for (id, rejection) in &rejections {
            table.add_row(vec![id.to_string(), rejection.to_string()]);
        }
        println!("{table}");
    }

    let open = catalog
        .events()
        .iter()
        .filter(|e| e.is_unconstrained())
        .count();
    println!("  {open} event(s) without preconditions");
    Ok(())
}
