//! `journey notes`: the long-form questionnaire.

use std::io::Write;
use std::path::Path;

use clap::{Args, Subcommand};
use journey_core::config::ProjectConfig;
use serde::Serialize;

use crate::output::{CliError, OutputMode, fail, render, render_success};
use crate::project::{ensure_saved, open_notes};

#[derive(Args, Debug)]
pub struct NotesArgs {
    #[command(subcommand)]
    pub command: NotesCommand,
}

#[derive(Subcommand, Debug)]
pub enum NotesCommand {
    /// List every answered question.
    List,
    /// Print one answer.
    Get {
        question: String,
    },
    /// Store an answer, replacing any earlier one.
    Set {
        question: String,
        text: String,
    },
    /// Remove an answer.
    Clear {
        question: String,
    },
}

#[derive(Debug, Serialize)]
struct NoteEntry {
    question: String,
    answer: String,
}

#[derive(Debug, Serialize)]
struct NotesListOutput {
    answered: usize,
    notes: Vec<NoteEntry>,
}

pub fn run_notes(
    args: &NotesArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut notes = open_notes(project_root, config, output)?;

    match &args.command {
        NotesCommand::List => {
            let payload = NotesListOutput {
                answered: notes.answered_count(),
                notes: notes
                    .answers()
                    .iter()
                    .map(|(question, answer)| NoteEntry {
                        question: question.clone(),
                        answer: answer.clone(),
                    })
                    .collect(),
            };
            render(output, &payload, |p, w| {
                for note in &p.notes {
                    writeln!(w, "{}: {}", note.question, note.answer)?;
                }
                if p.notes.is_empty() {
                    writeln!(w, "(no notes yet)")?;
                }
                Ok(())
            })
        }
        NotesCommand::Get { question } => match notes.answer(question) {
            Some(answer) => {
                let payload = NoteEntry {
                    question: question.clone(),
                    answer: answer.to_string(),
                };
                render(output, &payload, |p, w| writeln!(w, "{}", p.answer))
            }
            None => fail(
                output,
                &CliError::new(format!("no answer for '{question}'"))
                    .with_suggestion("Run `journey notes list` to see answered questions."),
            ),
        },
        NotesCommand::Set { question, text } => {
            notes.set_answer(question.clone(), text.clone());
            ensure_saved(output, notes.last_persist_error())?;
            render_success(output, &format!("Saved answer to '{question}'"))
        }
        NotesCommand::Clear { question } => {
            let removed = notes.clear_answer(question);
            ensure_saved(output, notes.last_persist_error())?;
            if removed {
                render_success(output, &format!("Cleared answer to '{question}'"))
            } else {
                render_success(output, &format!("'{question}' had no answer"))
            }
        }
    }
}
