use std::path::Path;

use clap::Args;
use journey_core::config::ProjectConfig;

use crate::output::{CliError, OutputMode, fail, render_success};
use crate::project::{ensure_saved, open_progress};

#[derive(Args, Debug, Default)]
pub struct ResetArgs {
    /// Confirm that every chapter, fragment, answer and the final choice
    /// should be forgotten.
    #[arg(long)]
    pub yes: bool,
}

pub fn run_reset(
    args: &ResetArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    if !args.yes {
        return fail(
            output,
            &CliError::new("reset erases all progress and cannot be undone")
                .with_suggestion("Re-run as `journey reset --yes` to confirm."),
        );
    }

    let mut store = open_progress(project_root, config, output)?;
    store.reset_progress();
    ensure_saved(output, store.last_persist_error())?;
    render_success(output, "Progress reset. The journey starts over.")
}
