//! CLI frontend for the Sovereign reign simulation.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::ReignOptions;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SOVEREIGN_LOG";

#[derive(Parser)]
#[command(
    name = "sov",
    about = "Sovereign: rule a medieval kingdom, one decision a year",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs a reign.
#[derive(Args, Clone)]
struct ReignArgs {
    /// Directory containing events.json and policies.json
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Session config file (default: <dir>/sovereign.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed, overriding the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Let an Ollama model direct events (OLLAMA_BASE_URL, OLLAMA_MODEL)
    #[arg(long)]
    ollama: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a reign interactively
    Play {
        #[command(flatten)]
        reign: ReignArgs,

        /// Resume from a save file
        #[arg(short, long)]
        load: Option<PathBuf>,
    },

    /// Let the crown decide on its own and report how the reign went
    Simulate {
        #[command(flatten)]
        reign: ReignArgs,

        /// Maximum number of decisions
        #[arg(short, long, default_value = "50")]
        turns: u32,

        /// Print every decision, not just the summary
        #[arg(short, long)]
        verbose: bool,

        /// Print the chronicle afterwards: markdown, text, or json
        #[arg(long)]
        chronicle: Option<String>,
    },

    /// Validate the event and law catalogs
    Check {
        /// Directory containing events.json and policies.json
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Also show what can be drawn in the first year
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play { reign, load } => {
            commands::play::run(&ReignOptions::from(reign), load.as_deref())
        }
        Commands::Simulate {
            reign,
            turns,
            verbose,
            chronicle,
        } => commands::simulate::run(
            &ReignOptions::from(reign),
            turns,
            verbose,
            chronicle.as_deref(),
        ),
        Commands::Check {
            dir,
            strict,
            verbose,
        } => commands::check::run(&dir, strict, verbose),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

impl From<ReignArgs> for ReignOptions {
    fn from(args: ReignArgs) -> Self {
        Self {
            dir: args.dir,
            config: args.config,
            seed: args.seed,
            ollama: args.ollama,
        }
    }
}
