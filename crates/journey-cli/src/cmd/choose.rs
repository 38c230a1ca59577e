//! `journey choose`: record the final choice.

use std::io::Write;
use std::path::Path;

use clap::Args;
use journey_core::config::ProjectConfig;
use journey_core::error::ErrorCode;
use journey_core::gating::{Access, Route};
use journey_core::{Change, FinalChoice};
use serde::Serialize;

use crate::output::{CliError, OutputMode, fail, render_mode};
use crate::project::{change_label, ensure_saved, open_progress};

#[derive(Args, Debug)]
pub struct ChooseArgs {
    /// `accept` or `also-accept` (`yes` and `not_yet` are accepted too).
    pub choice: String,
}

#[derive(Debug, Serialize)]
struct ChooseOutput {
    choice: FinalChoice,
    change: &'static str,
}

pub fn run_choose(
    args: &ChooseArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let choice: FinalChoice = match args.choice.parse() {
        Ok(choice) => choice,
        Err(err) => {
            return fail(
                output,
                &CliError::from_code(ErrorCode::InvalidChoiceValue, format!("{err}")),
            );
        }
    };

    let mut store = open_progress(project_root, config, output)?;
    if let Access::Redirect(_) = store.guard(Route::FinalChoice) {
        return fail(
            output,
            &CliError::from_code(
                ErrorCode::FinalChoiceUnavailable,
                format!(
                    "the final choice opens after every chapter is complete ({} done)",
                    store.completed_count()
                ),
            ),
        );
    }

    if let Some(recorded) = store.final_choice().filter(|&recorded| recorded != choice) {
        return fail(
            output,
            &CliError::from_code(
                ErrorCode::FinalChoiceAlreadyMade,
                format!("the final choice was already made: {recorded}"),
            ),
        );
    }

    let change = store.make_final_choice(choice);
    if let Change::Rejected(code) = change {
        return fail(output, &CliError::from(code));
    }
    ensure_saved(output, store.last_persist_error())?;

    let payload = ChooseOutput {
        choice,
        change: change_label(change),
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "choice={} change={}", p.choice, p.change),
        |p, w| {
            writeln!(w, "✓ Final choice recorded: {}", p.choice)?;
            writeln!(w, "  `journey open response` is now available.")
        },
    )
}
