//! `journey complete`: finish a chapter.

use std::io::Write;
use std::path::Path;

use clap::Args;
use journey_core::config::ProjectConfig;
use journey_core::error::ErrorCode;
use journey_core::gating::{Access, Route};
use journey_core::{CHAPTER_COUNT, Change};
use serde::Serialize;

use crate::output::{CliError, OutputMode, fail, failure, render_mode};
use crate::project::{change_label, chapter_index, ensure_saved, open_progress};

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Chapter number, 1 through 8.
    pub chapter: usize,
}

#[derive(Debug, Serialize)]
struct CompleteOutput {
    chapter: usize,
    change: &'static str,
    completed: usize,
    total: usize,
    /// Chapter opened by this completion, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    unlocked: Option<usize>,
    all_completed: bool,
}

/// Reject anything outside `1..=CHAPTER_COUNT` with `E2001`.
pub fn require_chapter(number: usize, output: OutputMode) -> anyhow::Result<usize> {
    chapter_index(number).ok_or_else(|| {
        failure(
            output,
            &CliError::from_code(
                ErrorCode::ChapterOutOfRange,
                format!("there is no chapter {number} (chapters are 1-{CHAPTER_COUNT})"),
            ),
        )
    })
}

/// Fail with `E2002` unless the chapter page may be shown.
pub fn require_open<S: journey_core::storage::Storage>(
    store: &journey_core::ProgressStore<S>,
    index: usize,
    output: OutputMode,
) -> anyhow::Result<()> {
    match store.guard(Route::Chapter(index)) {
        Access::Allow => Ok(()),
        Access::Redirect(to) => {
            let mut error = CliError::from_code(
                ErrorCode::ChapterLocked,
                format!("chapter {} is not open", index + 1),
            );
            if store.access_granted() && store.chapters_unlocked()[index] {
                error = error.with_suggestion(format!(
                    "chapter {} opens in {}",
                    index + 1,
                    journey_core::timelock::format_remaining(store.time_until_unlock(index))
                ));
            } else if to == Route::Entry {
                error = error.with_suggestion("Run `journey grant` first.");
            }
            fail(output, &error)
        }
    }
}

pub fn run_complete(
    args: &CompleteArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let index = require_chapter(args.chapter, output)?;
    let mut store = open_progress(project_root, config, output)?;
    require_open(&store, index, output)?;

    let change = store.complete_chapter(index);
    if let Change::Rejected(code) = change {
        return fail(output, &CliError::from(code));
    }
    ensure_saved(output, store.last_persist_error())?;

    let next = index + 1;
    let payload = CompleteOutput {
        chapter: args.chapter,
        change: change_label(change),
        completed: store.completed_count(),
        total: CHAPTER_COUNT,
        unlocked: (change.is_applied() && next < CHAPTER_COUNT).then_some(next + 1),
        all_completed: store.all_completed(),
    };
    render_mode(
        output,
        &payload,
        |p, w| {
            writeln!(
                w,
                "chapter={} change={} completed={}/{}",
                p.chapter, p.change, p.completed, p.total
            )
        },
        |p, w| {
            writeln!(w, "✓ Chapter {} complete ({} of {}).", p.chapter, p.completed, p.total)?;
            if let Some(unlocked) = p.unlocked {
                writeln!(w, "  Chapter {unlocked} is now open.")?;
            }
            if p.all_completed {
                writeln!(w, "  Every chapter is done. `journey choose` is available.")?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CompleteArgs,
    }

    #[test]
    fn complete_args_parse_chapter_number() {
        let w = Wrapper::parse_from(["test", "3"]);
        assert_eq!(w.args.chapter, 3);
    }

    #[test]
    fn chapter_zero_is_rejected() {
        assert!(require_chapter(0, OutputMode::Json).is_err());
        assert_eq!(require_chapter(1, OutputMode::Json).unwrap(), 0);
    }
}
