use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tracing::debug;

use sov_director::{DirectorError, ReignEnd, ReignSession};

use super::ReignOptions;

pub fn run(
    options: &ReignOptions,
    turns: u32,
    verbose: bool,
    chronicle: Option<&str>,
) -> Result<(), String> {
    let unknown_format = chronicle.filter(|f| !matches!(*f, "markdown" | "md" | "text" | "json"));
    if let Some(format) = unknown_format {
        return Err(format!(
            "unknown chronicle format: {format} (use markdown, text, or json)"
        ));
    }

    let catalog = options.catalog()?;
    let config = options.session_config()?;
    let seed = config.director.seed;
    let scorer = options.scorer(&config);
    let mut session = ReignSession::new(catalog, config, scorer)
        .map_err(|e| format!("failed to start reign: {e}"))?;
    // The crown's own choices use a separate stream so the director's
    // sequence does not depend on them.
    let mut crown = StdRng::seed_from_u64(seed.wrapping_add(1));
    debug!(seed, turns, "simulation started");

    let mut end = None;
    let mut decisions = 0;
    while decisions < turns {
        let title = match session.next_event() {
            Ok(event) => event.title.clone(),
            Err(DirectorError::NoFeasibleEvent { .. }) => {
                end = Some(ReignEnd::ContentExhausted);
                break;
            }
            Err(e) => return Err(e.to_string()),
        };
        // The crown only picks what the realm can pay for.
        let open: Vec<usize> = session
            .offered_options()
            .iter()
            .filter(|o| o.blocked.is_none())
            .map(|o| o.index)
            .collect();
        if open.is_empty() {
            return Err(format!("\"{title}\" offers no option"));
        }
        let index = open[crown.random_range(0..open.len())];
        let outcome = session.choose_option(index).map_err(|e| e.to_string())?;
        decisions += 1;

        if verbose {
            let option_text = session
                .state()
                .history()
                .last()
                .map(|h| h.option_text.clone())
                .unwrap_or_default();
            println!(
                "  {} {} {} {}",
                format!("[year {:>3}]", outcome.year).dimmed(),
                title.bold(),
                "->".dimmed(),
                option_text
            );
            println!("             {}", super::colored_deltas(&outcome.option_effects));
        }

        if outcome.ended.is_some() {
            end = outcome.ended;
            break;
        }
    }

    if verbose {
        println!();
    }
    let summary = session.chronicle().summary();
    println!(
        "  {} {} decision(s), seed={seed}",
        "Simulation".bold(),
        summary.decisions
    );
    println!("{}", super::resource_table(&summary.resources));
    println!("  {summary}");
    match end {
        Some(ReignEnd::Collapsed(ending)) => {
            println!("  {} {}", ending.to_string().red().bold(), ending.epitaph());
        }
        Some(ReignEnd::ContentExhausted) => {
            println!("  {}", "No event could be drawn; the chronicle falls silent.".yellow());
        }
        None => {}
    }

    let stats = session.director().stats();
    println!(
        "  Director: {} by scorer, {} by drama, {} last resort, {} scorer failure(s)",
        stats.by_scorer, stats.by_drama, stats.last_resort, stats.scorer_failures
    );
    let director = session.director();
    match director.scorer_name() {
        Some(name) => println!(
            "  Scorer: {name}, pool of {}, {}",
            director.config().scorer_pool_size,
            director.mode()
        ),
        None => println!("  Scorer: none, drama ranking only"),
    }

    match chronicle {
        Some("markdown" | "md") => {
            println!();
            print!("{}", session.chronicle().export_markdown());
        }
        Some("json") => {
            println!();
            println!("{}", chronicle_json(&session, seed)?);
        }
        Some(_) => {
            println!();
            print!("{}", session.chronicle().export_text());
        }
        None => {}
    }

    Ok(())
}

fn chronicle_json(session: &ReignSession, seed: u64) -> Result<String, String> {
    let state = session.state();
    let export = serde_json::json!({
        "seed": seed,
        "year": state.year(),
        "ending": state.ending(),
        "resources": state.resources(),
        "tags": state.tags(),
        "laws": state.active_policies(),
        "history": state.history(),
    });
    serde_json::to_string_pretty(&export).map_err(|e| format!("JSON serialization error: {e}"))
}
