//! `journey answer`: save a reflection answer.

use std::io::Write;
use std::path::Path;

use clap::{Args, ValueEnum};
use journey_core::config::ProjectConfig;
use journey_core::model::answer::{AnswerValue, answer_key};
use serde::Serialize;

use crate::output::{CliError, OutputMode, failure, render_mode};
use crate::project::{change_label, ensure_saved, open_progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AnswerKind {
    /// Free text.
    #[default]
    Text,
    /// A whole number on a scale.
    Scale,
    /// The label of a picked option.
    Choice,
}

#[derive(Args, Debug)]
pub struct AnswerArgs {
    /// Answer key, e.g. `chapter3_1`. With `--question`, the scope the key
    /// is built from (`<scope>_<question>`).
    pub key: String,

    /// The answer.
    pub value: String,

    /// How to store the value.
    #[arg(long, value_enum, default_value_t = AnswerKind::Text)]
    pub kind: AnswerKind,

    /// Question number; builds the key as `<key>_<question>`.
    #[arg(long)]
    pub question: Option<usize>,
}

impl AnswerArgs {
    fn resolved_key(&self) -> String {
        match self.question {
            Some(question) => answer_key(&self.key, question),
            None => self.key.clone(),
        }
    }
}

/// Build the stored value for `raw` according to `kind`.
pub fn parse_answer(kind: AnswerKind, raw: &str) -> Result<AnswerValue, String> {
    match kind {
        AnswerKind::Text => Ok(AnswerValue::Text(raw.to_string())),
        AnswerKind::Choice => Ok(AnswerValue::Choice(raw.to_string())),
        AnswerKind::Scale => raw
            .trim()
            .parse::<i64>()
            .map(AnswerValue::Scale)
            .map_err(|_| format!("'{raw}' is not a whole number")),
    }
}

#[derive(Debug, Serialize)]
struct AnswerOutput {
    key: String,
    value: AnswerValue,
    change: &'static str,
    answers: usize,
}

pub fn run_answer(
    args: &AnswerArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let value = parse_answer(args.kind, &args.value).map_err(|message| {
        failure(
            output,
            &CliError::new(message).with_suggestion("Scale answers must be integers, e.g. `--kind scale 7`."),
        )
    })?;
    let key = args.resolved_key();

    let mut store = open_progress(project_root, config, output)?;
    let change = store.save_reflection_answer(key.clone(), value.clone());
    ensure_saved(output, store.last_persist_error())?;

    let payload = AnswerOutput {
        key,
        value,
        change: change_label(change),
        answers: store.reflection_answers().len(),
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "key={} kind={} change={}", p.key, p.value.kind(), p.change),
        |p, w| writeln!(w, "✓ Saved {} = {}", p.key, p.value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: AnswerArgs,
    }

    #[test]
    fn answer_args_default_to_text() {
        let w = Wrapper::parse_from(["test", "chapter1_0", "the lake"]);
        assert_eq!(w.args.kind, AnswerKind::Text);
        assert_eq!(w.args.resolved_key(), "chapter1_0");
    }

    #[test]
    fn question_flag_builds_key() {
        let w = Wrapper::parse_from(["test", "chapter4", "7", "--kind", "scale", "--question", "2"]);
        assert_eq!(w.args.resolved_key(), "chapter4_2");
        assert_eq!(parse_answer(w.args.kind, &w.args.value), Ok(AnswerValue::Scale(7)));
    }

    #[test]
    fn non_numeric_scale_is_rejected() {
        assert!(parse_answer(AnswerKind::Scale, "lots").is_err());
        assert_eq!(
            parse_answer(AnswerKind::Choice, "stars"),
            Ok(AnswerValue::Choice("stars".into()))
        );
    }
}
