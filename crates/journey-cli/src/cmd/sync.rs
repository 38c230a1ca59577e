//! `journey sync --from DIR`: merge the progress stored in another data
//! directory (a backup, or a second profile) into this project.
//!
//! The other directory is only read. A blob there that does not decode is
//! reported and left as it is.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use journey_core::codec::{self, PROGRESS_KEY};
use journey_core::config::ProjectConfig;
use journey_core::storage::{FileStorage, Storage};
use serde::Serialize;

use crate::output::{CliError, OutputMode, fail, render_mode};
use crate::project::{change_label, ensure_saved, open_progress};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Data directory to merge from.
    #[arg(long, value_name = "DIR")]
    pub from: PathBuf,
}

#[derive(Debug, Serialize)]
struct SyncOutput {
    change: &'static str,
    source: String,
    epoch: u64,
    completed: usize,
    easter_eggs: usize,
}

pub fn run_sync(
    args: &SyncArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut store = open_progress(project_root, config, output)?;

    let dir = &args.from;
    let raw = match FileStorage::new(dir).read(PROGRESS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return fail(
                output,
                &CliError::new(format!("no saved progress in {}", dir.display())),
            );
        }
        Err(err) => return fail(output, &CliError::from_code(err.code(), err.to_string())),
    };
    let remote = match codec::decode(&raw) {
        Ok(remote) => remote,
        Err(error) => {
            return fail(
                output,
                &CliError::from_code(
                    error.code(),
                    format!("progress in {} is unreadable: {error}", dir.display()),
                ),
            );
        }
    };

    let change = store.reconcile_with(&remote);
    ensure_saved(output, store.last_persist_error())?;

    let payload = SyncOutput {
        change: change_label(change),
        source: dir.display().to_string(),
        epoch: store.state().epoch,
        completed: store.completed_count(),
        easter_eggs: store.easter_eggs_found().len(),
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "change={} epoch={} completed={}", p.change, p.epoch, p.completed),
        |p, w| {
            if p.change == "applied" {
                writeln!(w, "✓ Merged progress ({} chapters complete).", p.completed)
            } else {
                writeln!(w, "Already up to date.")
            }
        },
    )
}
