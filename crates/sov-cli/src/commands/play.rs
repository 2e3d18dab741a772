use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use tracing::debug;

use sov_core::{PolicyId, SaveGame, describe_tags};
use sov_director::{DirectorError, ReignEnd, ReignOutcome, ReignSession};

use super::ReignOptions;

const HELP: &str = "\
  <number>        choose an option
  status          show resources, tags, and laws in force
  laws            list every law
  enact <law>     enact a law
  revoke <law>    revoke a law
  chronicle       show the chronicle so far
  save <file>     save the reign
  quit            leave (unsaved progress is lost)";

/// One line of player input.
#[derive(Debug, PartialEq, Eq)]
enum PlayCommand {
    Choose(usize),
    Status,
    Laws,
    Enact(PolicyId),
    Revoke(PolicyId),
    Chronicle,
    Save(PathBuf),
    Help,
    Quit,
}

impl PlayCommand {
    fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        let (cmd, rest) = match trimmed.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (trimmed, ""),
        };

        if let Ok(n) = cmd.parse::<usize>() {
            return match n {
                0 => Err("options are numbered from 1".into()),
                n => Ok(PlayCommand::Choose(n - 1)),
            };
        }

        let need_arg = |what: &str| -> Result<&str, String> {
            if rest.is_empty() {
                Err(format!("usage: {} <{what}>", cmd.to_lowercase()))
            } else {
                Ok(rest)
            }
        };

        match cmd.to_lowercase().as_str() {
            "status" | "s" => Ok(PlayCommand::Status),
            "laws" | "l" => Ok(PlayCommand::Laws),
            "enact" => Ok(PlayCommand::Enact(PolicyId::new(need_arg("law")?))),
            "revoke" => Ok(PlayCommand::Revoke(PolicyId::new(need_arg("law")?))),
            "chronicle" => Ok(PlayCommand::Chronicle),
            "save" => Ok(PlayCommand::Save(PathBuf::from(need_arg("file")?))),
            "help" | "h" | "?" => Ok(PlayCommand::Help),
            "quit" | "q" | "exit" => Ok(PlayCommand::Quit),
            other => Err(format!("unknown command: {other} (type 'help')")),
        }
    }
}

pub fn run(options: &ReignOptions, load: Option<&Path>) -> Result<(), String> {
    let catalog = options.catalog()?;
    let config = options.session_config()?;
    let scorer = options.scorer(&config);

    let mut session = match load {
        Some(path) => {
            let save = SaveGame::read(path).map_err(|e| format!("failed to load save: {e}"))?;
            debug!(path = %path.display(), year = save.state.year(), "resuming reign");
            ReignSession::resume(catalog, config, scorer, save)
        }
        None => ReignSession::new(catalog, config, scorer),
    }
    .map_err(|e| format!("failed to start reign: {e}"))?;

    println!("  {} Long live the sovereign.", "Sovereign".bold());
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    if !present_next(&mut session) {
        return Ok(());
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match PlayCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}\n", e.yellow());
                continue;
            }
        };

        match command {
            PlayCommand::Choose(index) => match session.choose_option(index) {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    if outcome.ended.is_some() {
                        print_ending(&session, outcome.ended);
                        break;
                    }
                    if !present_next(&mut session) {
                        break;
                    }
                }
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
            PlayCommand::Status => print_status(&session),
            PlayCommand::Laws => print_laws(&session),
            PlayCommand::Enact(id) => match session.enact_policy(&id) {
                Ok(()) => println!("  The law \"{id}\" is proclaimed.\n"),
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
            PlayCommand::Revoke(id) => match session.revoke_policy(&id) {
                Ok(()) => println!("  The law \"{id}\" is struck down.\n"),
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
            PlayCommand::Chronicle => println!("{}", session.chronicle().export_text()),
            PlayCommand::Save(path) => match session.save().write(&path) {
                Ok(()) => println!("  Saved to {}.\n", path.display()),
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
            PlayCommand::Help => println!("{HELP}\n"),
            PlayCommand::Quit => break,
        }
    }

    Ok(())
}

/// Show the pending event, drawing one if needed. Returns false when the
/// reign cannot continue.
fn present_next(session: &mut ReignSession) -> bool {
    let year = session.state().year();
    let (title, description) = match session.next_event() {
        Ok(event) => (event.title.clone(), event.description.clone()),
        Err(DirectorError::NoFeasibleEvent { .. }) => {
            print_ending(session, Some(ReignEnd::ContentExhausted));
            return false;
        }
        Err(e) => {
            println!("{}\n", e.to_string().yellow());
            return false;
        }
    };

    println!("  {} {}", format!("Year {year}.").dimmed(), title.bold());
    if !description.is_empty() {
        println!("  {description}");
    }
    for offered in session.offered_options() {
        let number = offered.index + 1;
        match offered.blocked {
            Some(reason) => println!(
                "    {}",
                format!("{number}. {} ({reason})", offered.option.text).dimmed()
            ),
            None => println!("    {number}. {}", offered.option.text),
        }
    }
    println!();
    true
}

fn print_outcome(outcome: &ReignOutcome) {
    if !outcome.narrative.is_empty() {
        println!("  {}", outcome.narrative.italic());
    }
    println!("  {}", super::colored_deltas(&outcome.option_effects));
    if !outcome.passive_effects.is_zero() {
        println!(
            "  {} {}",
            "Laws:".dimmed(),
            super::colored_deltas(&outcome.passive_effects)
        );
    }
    for tag in &outcome.new_tags {
        println!("  You are now known as {}.", tag.as_str().cyan());
    }
    println!();
}

fn print_ending(session: &ReignSession, end: Option<ReignEnd>) {
    match end {
        Some(ReignEnd::Collapsed(ending)) => {
            println!("  {} {}", ending.to_string().red().bold(), ending.epitaph());
        }
        Some(ReignEnd::ContentExhausted) => {
            println!(
                "  {}",
                "Nothing more happens in this realm. The chronicle falls silent.".yellow()
            );
        }
        None => {}
    }
    println!("  {}\n", session.chronicle().summary());
}

fn print_status(session: &ReignSession) {
    let state = session.state();
    println!("{}", super::resource_table(state.resources()));
    let tags = state.effective_tags(&session.config().rules);
    println!("  Known as: {}", describe_tags(&tags));
    let laws: Vec<&str> = state.active_policies().iter().map(PolicyId::as_str).collect();
    if laws.is_empty() {
        println!("  Laws in force: none\n");
    } else {
        println!("  Laws in force: {}\n", laws.join(", "));
    }
}

fn print_laws(session: &ReignSession) {
    let state = session.state();
    let rules = &session.config().rules;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Cost", "Per year", "Status"]);
    for policy in session.catalog().policies() {
        let status = if state.is_active(&policy.id) {
            match state.lock_remaining(&policy.id) {
                0 => "in force".to_string(),
                n => format!("in force, locked {n}"),
            }
        } else {
            format!("toll {}", state.enactment_toll(policy, rules))
        };
        table.add_row(vec![
            policy.id.to_string(),
            policy.name.clone(),
            policy.activation_cost.delta_summary(),
            policy.passive_effects.delta_summary(),
            status,
        ]);
    }
    println!("{table}\n");
}
