//! Long-form questionnaire answers.
//!
//! A second, independent blob of free-text answers keyed by question. It
//! shares the storage backend with the progress blob but has no bearing on
//! chapter gating.

use std::collections::BTreeMap;

use crate::codec::{self, DecodeError, LoadOutcome};
use crate::storage::{Storage, StorageError};

/// Storage key for the questionnaire blob.
pub const QUESTIONNAIRE_KEY: &str = "journey.questionnaire";

fn decode(raw: &str) -> Result<BTreeMap<String, String>, DecodeError> {
    Ok(serde_json::from_str(raw)?)
}

/// Free-text answers persisted under [`QUESTIONNAIRE_KEY`].
#[derive(Debug)]
pub struct QuestionnaireStore<S: Storage> {
    storage: S,
    answers: BTreeMap<String, String>,
    last_persist_error: Option<StorageError>,
}

impl<S: Storage> QuestionnaireStore<S> {
    /// Restore answers from `storage`, starting empty if none can be read.
    pub fn open(storage: S) -> Self {
        let loaded = codec::load_with(&storage, QUESTIONNAIRE_KEY, decode);
        if matches!(loaded.outcome, LoadOutcome::Restored) {
            tracing::debug!(answers = loaded.value.len(), "restored questionnaire");
        }
        Self {
            storage,
            answers: loaded.value,
            last_persist_error: None,
        }
    }

    #[must_use]
    pub fn answer(&self, question: &str) -> Option<&str> {
        self.answers.get(question).map(String::as_str)
    }

    #[must_use]
    pub const fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    /// Number of questions with a non-blank answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|text| !text.trim().is_empty()).count()
    }

    /// Store `text` as the answer to `question`.
    pub fn set_answer(&mut self, question: impl Into<String>, text: impl Into<String>) {
        let question = question.into();
        let text = text.into();
        if self.answers.get(&question) == Some(&text) {
            return;
        }
        self.answers.insert(question.clone(), text.clone());
        self.persist(&|answers| {
            answers.insert(question.clone(), text.clone());
        });
    }

    /// Drop the answer to `question`. Returns true if there was one.
    pub fn clear_answer(&mut self, question: &str) -> bool {
        let removed = self.answers.remove(question).is_some();
        if removed {
            self.persist(&|answers| {
                answers.remove(question);
            });
        }
        removed
    }

    /// Most recent write failure, cleared by the next successful write.
    #[must_use]
    pub const fn last_persist_error(&self) -> Option<&StorageError> {
        self.last_persist_error.as_ref()
    }

    /// Replay `edit` on the stored answers under the storage lock and write
    /// the result, so answers saved by another writer are kept.
    fn persist(&mut self, edit: &dyn Fn(&mut BTreeMap<String, String>)) {
        let answers = &mut self.answers;
        let result = self.storage.update(QUESTIONNAIRE_KEY, &mut |stored| {
            if let Some(mut current) = stored.as_deref().and_then(|raw| decode(raw).ok()) {
                edit(&mut current);
                *answers = current;
            }
            serde_json::to_string(answers)
                .inspect_err(|err| tracing::error!(error = %err, "questionnaire serialization failed"))
                .ok()
        });

        match result {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                tracing::warn!(error = %err, "questionnaire not saved; keeping answers in memory");
                self.last_persist_error = Some(err);
            }
        }
    }
}
