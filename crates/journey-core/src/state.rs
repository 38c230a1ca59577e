//! The persisted journey aggregate.
//!
//! [`JourneyState`] is plain data. All mutation goes through
//! [`crate::store::ProgressStore`], which is what upholds the ordering rules;
//! this module only knows how to derive views from the flags, repair a
//! decoded blob, and join two copies written by different processes.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::model::answer::AnswerValue;
use crate::model::chapter::{CHAPTER_COUNT, ChapterState, JourneyPhase};
use crate::model::choice::FinalChoice;
use crate::model::gset::GSet;

/// Everything the journey remembers between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JourneyState {
    pub access_granted: bool,
    #[serde(deserialize_with = "fixed_flags")]
    pub chapters_unlocked: [bool; CHAPTER_COUNT],
    #[serde(deserialize_with = "fixed_flags")]
    pub chapters_completed: [bool; CHAPTER_COUNT],
    pub easter_eggs_found: GSet<usize>,
    pub reflection_answers: BTreeMap<String, AnswerValue>,
    pub final_choice: Option<FinalChoice>,
    pub final_choice_made: bool,
    pub sound_enabled: bool,
    #[serde(deserialize_with = "flexible_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    /// Bumped by every reset so other writers can tell a reset from stale data.
    pub epoch: u64,
}

impl Default for JourneyState {
    fn default() -> Self {
        Self {
            access_granted: false,
            chapters_unlocked: [false; CHAPTER_COUNT],
            chapters_completed: [false; CHAPTER_COUNT],
            easter_eggs_found: GSet::new(),
            reflection_answers: BTreeMap::new(),
            final_choice: None,
            final_choice_made: false,
            sound_enabled: false,
            start_time: None,
            epoch: 0,
        }
    }
}

impl JourneyState {
    /// State of chapter `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= CHAPTER_COUNT`.
    #[must_use]
    pub const fn chapter_state(&self, index: usize) -> ChapterState {
        ChapterState::from_flags(self.chapters_unlocked[index], self.chapters_completed[index])
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.chapters_completed.iter().filter(|done| **done).count()
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.chapters_completed.iter().all(|done| *done)
    }

    #[must_use]
    pub fn phase(&self) -> JourneyPhase {
        if self.final_choice_made {
            JourneyPhase::ChoiceMade
        } else if self.all_completed() {
            JourneyPhase::AllComplete
        } else if self.access_granted {
            JourneyPhase::InProgress
        } else {
            JourneyPhase::Entry
        }
    }

    /// Restore the structural invariants on a decoded blob.
    ///
    /// Chapters open strictly in order, so only the leading run of completed
    /// chapters survives; completions after the first gap are dropped. The
    /// unlock flags are then rebuilt from that run: with access, every
    /// completed chapter and the one after it are unlocked, nothing else is.
    /// A completed chapter implies access was granted.
    ///
    /// Running it on a consistent state is a no-op. Returns the number of
    /// fields that had to change.
    pub fn repair(&mut self) -> usize {
        let mut fixes = 0;

        let prefix = self
            .chapters_completed
            .iter()
            .take_while(|done| **done)
            .count();
        for done in &mut self.chapters_completed[prefix..] {
            if *done {
                *done = false;
                fixes += 1;
            }
        }

        if prefix > 0 && !self.access_granted {
            self.access_granted = true;
            fixes += 1;
        }

        for (index, unlocked) in self.chapters_unlocked.iter_mut().enumerate() {
            let expected = self.access_granted && index <= prefix;
            if *unlocked != expected {
                *unlocked = expected;
                fixes += 1;
            }
        }

        match (self.final_choice, self.final_choice_made) {
            (Some(_), false) => {
                self.final_choice_made = true;
                fixes += 1;
            }
            (None, true) => {
                self.final_choice_made = false;
                fixes += 1;
            }
            _ => {}
        }

        let eggs_before = self.easter_eggs_found.len();
        self.easter_eggs_found.retain(|index| *index < CHAPTER_COUNT);
        fixes += eggs_before - self.easter_eggs_found.len();

        fixes
    }

    /// Fold a copy written by another process into this one.
    ///
    /// - A higher remote epoch means the other writer reset; the remote copy
    ///   replaces this one.
    /// - A lower remote epoch is stale and ignored.
    /// - Equal epochs join: flags are OR-ed, egg sets unioned, remote answers
    ///   win on key conflicts, an already recorded final choice is kept, the
    ///   earliest start time survives, and the sound preference follows the
    ///   remote copy.
    ///
    /// Returns true if `self` changed.
    pub fn reconcile(&mut self, remote: &Self) -> bool {
        if remote.epoch < self.epoch {
            return false;
        }
        if remote.epoch > self.epoch {
            let changed = self != remote;
            self.clone_from(remote);
            return changed;
        }

        let before = self.clone();

        self.access_granted |= remote.access_granted;
        for index in 0..CHAPTER_COUNT {
            self.chapters_unlocked[index] |= remote.chapters_unlocked[index];
            self.chapters_completed[index] |= remote.chapters_completed[index];
        }
        self.easter_eggs_found.merge(&remote.easter_eggs_found);
        for (key, value) in &remote.reflection_answers {
            self.reflection_answers.insert(key.clone(), value.clone());
        }
        if !self.final_choice_made && remote.final_choice_made {
            self.final_choice = remote.final_choice;
            self.final_choice_made = true;
        }
        self.start_time = match (self.start_time, remote.start_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.sound_enabled = remote.sound_enabled;
        self.repair();

        *self != before
    }
}

/// Accept any length of flag array, padding with `false` or dropping extras.
fn fixed_flags<'de, D>(deserializer: D) -> Result<[bool; CHAPTER_COUNT], D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Option<bool>>::deserialize(deserializer)?;
    let mut flags = [false; CHAPTER_COUNT];
    for (slot, value) in flags.iter_mut().zip(raw) {
        *slot = value.unwrap_or(false);
    }
    Ok(flags)
}

/// Accept RFC 3339 strings or epoch milliseconds.
fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(DateTime<Utc>),
        Millis(i64),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Text(at)) => Ok(Some(at)),
        Some(Raw::Millis(ms)) => Ok(Utc.timestamp_millis_opt(ms).single()),
    }
}
