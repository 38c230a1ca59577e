//! `journey status`: where the journey stands.
//!
//! The first thing to run after opening a project: phase, per-chapter
//! state, fragments, answers and the final choice.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use journey_core::config::ProjectConfig;
use journey_core::storage::Storage;
use journey_core::timelock::format_remaining;
use journey_core::{CHAPTER_COUNT, ChapterState, FinalChoice, JourneyPhase, ProgressStore};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, yes_no};
use crate::project::{open_notes, open_progress};

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

#[derive(Debug, Serialize)]
struct ChapterRow {
    /// 1-based.
    chapter: usize,
    state: ChapterState,
    easter_egg: bool,
    time_locked: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    phase: JourneyPhase,
    access_granted: bool,
    completed: usize,
    total: usize,
    chapters: Vec<ChapterRow>,
    easter_eggs: usize,
    reflection_answers: usize,
    final_choice: Option<FinalChoice>,
    sound_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_seconds: Option<i64>,
    time_lock_enforced: bool,
    notes_answered: usize,
    epoch: u64,
}

fn collect<S: Storage>(store: &ProgressStore<S>, notes_answered: usize) -> StatusOutput {
    let chapters = (0..CHAPTER_COUNT)
        .map(|index| ChapterRow {
            chapter: index + 1,
            state: store.state().chapter_state(index),
            easter_egg: store.easter_eggs_found().contains(&index),
            time_locked: store.is_time_locked(index),
        })
        .collect();

    StatusOutput {
        phase: store.phase(),
        access_granted: store.access_granted(),
        completed: store.completed_count(),
        total: CHAPTER_COUNT,
        chapters,
        easter_eggs: store.easter_eggs_found().len(),
        reflection_answers: store.reflection_answers().len(),
        final_choice: store.final_choice(),
        sound_enabled: store.sound_enabled(),
        start_time: store.start_time(),
        elapsed_seconds: store.elapsed().map(|d| d.num_seconds()),
        time_lock_enforced: store.time_lock().is_enforced(),
        notes_answered,
        epoch: store.state().epoch,
    }
}

pub fn run_status(
    _args: &StatusArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let store = open_progress(project_root, config, output)?;
    let notes = open_notes(project_root, config, output)?;
    let payload = collect(&store, notes.answered_count());
    render_mode(output, &payload, render_status_text, render_status_pretty)
}

fn render_status_text(report: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "phase={}", report.phase)?;
    writeln!(w, "completed={}/{}", report.completed, report.total)?;
    for row in &report.chapters {
        let mut flags = Vec::new();
        if row.easter_egg {
            flags.push("egg");
        }
        if row.time_locked {
            flags.push("time-locked");
        }
        writeln!(w, "chapter{}={} {}", row.chapter, row.state, flags.join(","))?;
    }
    writeln!(w, "easter_eggs={}", report.easter_eggs)?;
    writeln!(w, "reflection_answers={}", report.reflection_answers)?;
    writeln!(
        w,
        "final_choice={}",
        report.final_choice.map_or("-", FinalChoice::as_str)
    )?;
    writeln!(w, "sound={}", if report.sound_enabled { "on" } else { "off" })
}

fn render_status_pretty(report: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Journey")?;
    pretty_kv(w, "Phase", report.phase.as_str())?;
    pretty_kv(w, "Access", yes_no(report.access_granted))?;
    pretty_kv(w, "Completed", format!("{} of {}", report.completed, report.total))?;
    if let Some(start) = report.start_time {
        pretty_kv(w, "Started", start.format("%Y-%m-%d %H:%M UTC").to_string())?;
    }
    if let Some(seconds) = report.elapsed_seconds {
        pretty_kv(w, "Elapsed", format_remaining(chrono::Duration::seconds(seconds)))?;
    }

    writeln!(w)?;
    pretty_section(w, "Chapters")?;
    for row in &report.chapters {
        let marker = match row.state {
            ChapterState::Completed => "●",
            ChapterState::Unlocked => "○",
            ChapterState::Locked => "·",
        };
        let egg = if row.easter_egg { "  ✦ fragment" } else { "" };
        let held = if row.time_locked { "  (not yet open)" } else { "" };
        writeln!(w, "  {marker} {:>2}  {:<10}{egg}{held}", row.chapter, row.state.as_str())?;
    }

    writeln!(w)?;
    pretty_kv(w, "Fragments", format!("{} of {CHAPTER_COUNT}", report.easter_eggs))?;
    pretty_kv(w, "Reflections", report.reflection_answers.to_string())?;
    pretty_kv(w, "Notes", report.notes_answered.to_string())?;
    pretty_kv(
        w,
        "Final choice",
        report.final_choice.map_or("not made", FinalChoice::as_str),
    )?;
    pretty_kv(w, "Sound", if report.sound_enabled { "on" } else { "off" })?;
    if report.time_lock_enforced {
        pretty_kv(w, "Time-lock", "enforced")?;
    }
    Ok(())
}
