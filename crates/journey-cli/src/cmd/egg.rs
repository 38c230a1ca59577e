//! `journey egg`: record a hidden fragment found in a chapter.

use std::io::Write;
use std::path::Path;

use clap::Args;
use journey_core::config::ProjectConfig;
use journey_core::{CHAPTER_COUNT, Change};
use serde::Serialize;

use super::complete::{require_chapter, require_open};
use crate::output::{CliError, OutputMode, fail, render_mode};
use crate::project::{change_label, ensure_saved, open_progress};

#[derive(Args, Debug)]
pub struct EggArgs {
    /// Chapter number the fragment was found in, 1 through 8.
    pub chapter: usize,
}

#[derive(Debug, Serialize)]
struct EggOutput {
    chapter: usize,
    change: &'static str,
    found: usize,
    total: usize,
}

pub fn run_egg(
    args: &EggArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let index = require_chapter(args.chapter, output)?;
    let mut store = open_progress(project_root, config, output)?;
    require_open(&store, index, output)?;

    let change = store.find_easter_egg(index);
    if let Change::Rejected(code) = change {
        return fail(output, &CliError::from(code));
    }
    ensure_saved(output, store.last_persist_error())?;

    let payload = EggOutput {
        chapter: args.chapter,
        change: change_label(change),
        found: store.easter_eggs_found().len(),
        total: CHAPTER_COUNT,
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "chapter={} change={} found={}/{}", p.chapter, p.change, p.found, p.total),
        |p, w| {
            if p.change == "applied" {
                writeln!(w, "✦ Fragment of chapter {} found ({} of {}).", p.chapter, p.found, p.total)
            } else {
                writeln!(w, "Fragment of chapter {} was already found.", p.chapter)
            }
        },
    )
}
