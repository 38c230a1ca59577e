//! `journey timelock`: the calendar schedule and what it holds back.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use clap::Args;
use journey_core::CHAPTER_COUNT;
use journey_core::config::ProjectConfig;
use journey_core::timelock::{format_remaining, is_locked_at};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, yes_no};
use crate::project::open_progress;

#[derive(Args, Debug, Default)]
pub struct TimelockArgs {}

#[derive(Debug, Serialize)]
struct ScheduleRow {
    chapter: usize,
    unlock_at: DateTime<Utc>,
    /// The date has not arrived, whether or not that is enforced.
    date_pending: bool,
    /// The store currently holds the chapter back.
    locked: bool,
    remaining_seconds: i64,
}

#[derive(Debug, Serialize)]
struct TimelockOutput {
    enforced: bool,
    now: DateTime<Utc>,
    chapters: Vec<ScheduleRow>,
}

pub fn run_timelock(
    _args: &TimelockArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let store = open_progress(project_root, config, output)?;
    let now = store.now();
    let schedule = store.time_lock().schedule();

    let chapters = (0..CHAPTER_COUNT)
        .map(|index| ScheduleRow {
            chapter: index + 1,
            unlock_at: schedule.unlock_at(index),
            date_pending: is_locked_at(schedule, index, now),
            locked: store.is_time_locked(index),
            remaining_seconds: store.time_until_unlock(index).num_seconds(),
        })
        .collect();

    let payload = TimelockOutput {
        enforced: store.time_lock().is_enforced(),
        now,
        chapters,
    };
    render_mode(
        output,
        &payload,
        |p, w| {
            writeln!(w, "enforced={}", p.enforced)?;
            for row in &p.chapters {
                writeln!(
                    w,
                    "chapter{} {} locked={}",
                    row.chapter,
                    row.unlock_at.format("%Y-%m-%d"),
                    row.locked
                )?;
            }
            Ok(())
        },
        |p, w| {
            pretty_section(w, "Calendar")?;
            pretty_kv(w, "Enforced", yes_no(p.enforced))?;
            pretty_kv(w, "Now", p.now.format("%Y-%m-%d %H:%M UTC").to_string())?;
            writeln!(w)?;
            for row in &p.chapters {
                let status = if row.locked {
                    let remaining = Duration::seconds(row.remaining_seconds);
                    format!("opens in {}", format_remaining(remaining))
                } else if row.date_pending {
                    "date not reached (not enforced)".to_string()
                } else {
                    "open".to_string()
                };
                let date = row.unlock_at.format("%Y-%m-%d");
                writeln!(w, "  {:>2}  {date}  {status}", row.chapter)?;
            }
            Ok(())
        },
    )
}
