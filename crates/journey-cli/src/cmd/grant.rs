//! Entry gate.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use journey_core::config::ProjectConfig;
use serde::Serialize;

use crate::output::{OutputMode, render_mode};
use crate::project::{change_label, ensure_saved, open_progress};

#[derive(Args, Debug, Default)]
pub struct GrantArgs {}

#[derive(Debug, Serialize)]
struct GrantOutput {
    change: &'static str,
    access_granted: bool,
    start_time: Option<DateTime<Utc>>,
}

pub fn run_grant(
    _args: &GrantArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut store = open_progress(project_root, config, output)?;
    let change = store.grant_access();
    ensure_saved(output, store.last_persist_error())?;

    let payload = GrantOutput {
        change: change_label(change),
        access_granted: store.access_granted(),
        start_time: store.start_time(),
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "access_granted=true change={}", p.change),
        |p, w| {
            if change.is_applied() {
                writeln!(w, "✓ Access granted. Chapter 1 is open.")
            } else {
                writeln!(w, "Access was already granted ({}).", p.change)
            }
        },
    )
}
