#![forbid(unsafe_code)]

mod cmd;
mod output;
mod project;

use clap::{CommandFactory, Parser, Subcommand};
use journey_core::config;
use journey_core::error::ErrorCode;
use output::{CliError, OutputMode};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "journey: eight chapters, one choice",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode used before the config has been read.
    const fn fallback_output(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a journey project",
        long_about = "Create .journey/ with a default config.toml and an empty data directory.",
        after_help = "EXAMPLES:\n    # Start a journey in the current directory\n    journey init\n\n    # Rewrite the config with defaults\n    journey init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show progress",
        long_about = "Show the phase, every chapter's state, fragments, answers and the final choice.",
        after_help = "EXAMPLES:\n    # Summary\n    journey status\n\n    # Emit machine-readable output\n    journey status --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Read",
        about = "Check whether a page may be shown",
        long_about = "Ask the gate about a route and report whether it is allowed or where the visitor is redirected.",
        after_help = "EXAMPLES:\n    # Is the third chapter open?\n    journey open chapter:3\n\n    # Can the response page be shown?\n    journey open response --json"
    )]
    Open(cmd::open::OpenArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the unlock calendar",
        long_about = "List the date each chapter opens and whether the calendar currently holds it back.",
        after_help = "EXAMPLES:\n    # Show the calendar\n    journey timelock\n\n    # Check against a pinned date\n    JOURNEY_NOW=2026-02-09T12:00:00Z journey timelock"
    )]
    Timelock(cmd::timelock::TimelockArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Pass the entry gate",
        long_about = "Record that the entry gate was passed and start the journey clock.",
        after_help = "EXAMPLES:\n    journey grant"
    )]
    Grant(cmd::grant::GrantArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Complete a chapter",
        long_about = "Mark a chapter complete and open the next one.",
        after_help = "EXAMPLES:\n    # Finish the first chapter\n    journey complete 1\n\n    # Emit machine-readable output\n    journey complete 2 --json"
    )]
    Complete(cmd::complete::CompleteArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Record a hidden fragment",
        long_about = "Record that the hidden fragment in a chapter was found.",
        after_help = "EXAMPLES:\n    journey egg 4"
    )]
    Egg(cmd::egg::EggArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Save a reflection answer",
        long_about = "Save a reflection answer under a key, replacing any earlier answer.",
        after_help = "EXAMPLES:\n    # Free text\n    journey answer chapter3_1 \"the sea\"\n\n    # A scale answer built from scope and question number\n    journey answer chapter5 7 --question 2 --kind scale"
    )]
    Answer(cmd::answer::AnswerArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Make the final choice",
        long_about = "Make the final choice once every chapter is complete. The first choice is permanent.",
        after_help = "EXAMPLES:\n    journey choose accept"
    )]
    Choose(cmd::choose::ChooseArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Work with questionnaire notes",
        long_about = "Read and write long-form questionnaire answers kept beside the progress.",
        after_help = "EXAMPLES:\n    journey notes set hope \"more mornings like this\"\n    journey notes list"
    )]
    Notes(cmd::notes::NotesArgs),

    #[command(
        next_help_heading = "Preferences",
        about = "Show or change the sound preference",
        after_help = "EXAMPLES:\n    journey sound on\n    journey sound"
    )]
    Sound(cmd::sound::SoundArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Merge progress from another data directory",
        long_about = "Merge the progress saved in another data directory into this project. The other directory is only read.",
        after_help = "EXAMPLES:\n    # Merge a backup\n    journey sync --from ~/backup/journey"
    )]
    Sync(cmd::sync::SyncArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Erase all progress",
        long_about = "Erase every chapter, fragment, answer and the final choice. Other processes adopt the reset on their next sync.",
        after_help = "EXAMPLES:\n    journey reset --yes"
    )]
    Reset(cmd::reset::ResetArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    journey completions bash > ~/.local/share/bash-completion/completions/journey"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("JOURNEY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if quiet {
            "error"
        } else if verbose || env::var("DEBUG").is_ok() {
            "journey=debug,journey_core=debug,info"
        } else {
            "journey=info,journey_core=info,warn"
        })
    });

    let format = env::var("JOURNEY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let effective = match config::resolve_config(&project_root, cli.json) {
        Ok(effective) => effective,
        Err(err) => {
            return Err(output::failure(
                cli.fallback_output(),
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            ));
        }
    };
    let output = OutputMode::from_name(&effective.resolved_output);
    let project = &effective.project;

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &project_root, project),
        Commands::Status(ref args) => {
            cmd::status::run_status(args, output, &project_root, project)
        }
        Commands::Open(ref args) => cmd::open::run_open(args, output, &project_root, project),
        Commands::Timelock(ref args) => {
            cmd::timelock::run_timelock(args, output, &project_root, project)
        }
        Commands::Grant(ref args) => cmd::grant::run_grant(args, output, &project_root, project),
        Commands::Complete(ref args) => {
            cmd::complete::run_complete(args, output, &project_root, project)
        }
        Commands::Egg(ref args) => cmd::egg::run_egg(args, output, &project_root, project),
        Commands::Answer(ref args) => {
            cmd::answer::run_answer(args, output, &project_root, project)
        }
        Commands::Choose(ref args) => {
            cmd::choose::run_choose(args, output, &project_root, project)
        }
        Commands::Notes(ref args) => cmd::notes::run_notes(args, output, &project_root, project),
        Commands::Sound(ref args) => cmd::sound::run_sound(args, output, &project_root, project),
        Commands::Sync(ref args) => cmd::sync::run_sync(args, output, &project_root, project),
        Commands::Reset(ref args) => cmd::reset::run_reset(args, output, &project_root, project),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
