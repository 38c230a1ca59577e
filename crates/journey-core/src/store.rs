//! The progress store: single owner of [`JourneyState`].
//!
//! Every read and write of journey progress goes through a
//! [`ProgressStore`]. It is built once at startup and handed to whatever
//! needs it; nothing here is global.
//!
//! # Guarantees
//!
//! - Chapter `i + 1` unlocks only when chapter `i` completes; chapter 0
//!   unlocks with access.
//! - Unlocks, completions and found fragments never revert, except through
//!   [`ProgressStore::reset_progress`].
//! - The final choice is written at most once.
//! - Every effective mutation is persisted immediately. A failed write is
//!   logged and kept in [`ProgressStore::last_persist_error`]; the in-memory
//!   state stays authoritative for the session.
//! - A write first merges the stored copy under the storage lock, so two
//!   stores sharing one backend never drop each other's progress. A reset
//!   stored by another writer wins over older progress.
//!
//! Out-of-range chapter indices are programming errors. Debug builds panic
//! on them; release builds log and ignore the call.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::clock::{Clock, SystemClock};
use crate::codec::{self, LoadOutcome, PROGRESS_KEY};
use crate::error::ErrorCode;
use crate::model::answer::AnswerValue;
use crate::model::chapter::{CHAPTER_COUNT, ChapterState, JourneyPhase, is_valid_index};
use crate::model::choice::FinalChoice;
use crate::model::gset::GSet;
use crate::state::JourneyState;
use crate::storage::{Storage, StorageError};
use crate::timelock::TimeLock;

/// What a mutation did.
///
/// Callers are free to ignore it; it exists so a front end can tell an
/// effect from a no-op without diffing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// State changed and a write was attempted.
    Applied,
    /// The call was valid but the state already matched.
    Unchanged,
    /// The call was refused; state is untouched.
    Rejected(ErrorCode),
}

impl Change {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    const fn from_flag(changed: bool) -> Self {
        if changed { Self::Applied } else { Self::Unchanged }
    }
}

/// Owner of the journey progress.
pub struct ProgressStore<S: Storage> {
    storage: S,
    state: JourneyState,
    clock: Box<dyn Clock>,
    time_lock: TimeLock,
    load_outcome: LoadOutcome,
    last_persist_error: Option<StorageError>,
}

impl<S: Storage> std::fmt::Debug for ProgressStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("state", &self.state)
            .field("time_lock", &self.time_lock)
            .field("load_outcome", &self.load_outcome)
            .field("last_persist_error", &self.last_persist_error)
            .finish_non_exhaustive()
    }
}

impl<S: Storage> ProgressStore<S> {
    /// Restore progress from `storage`.
    ///
    /// Never fails: missing, unreadable or unreachable data all start the
    /// session from defaults. [`Self::load_outcome`] tells which happened.
    pub fn open(storage: S) -> Self {
        let loaded = codec::load_progress(&storage);
        match &loaded.outcome {
            LoadOutcome::Restored => tracing::info!(
                completed = loaded.value.completed_count(),
                phase = %loaded.value.phase(),
                "restored journey progress"
            ),
            LoadOutcome::Fresh => tracing::info!("starting a new journey"),
            LoadOutcome::Recovered { .. } | LoadOutcome::Unavailable(_) => {}
        }

        Self {
            storage,
            state: loaded.value,
            clock: Box::new(SystemClock),
            time_lock: TimeLock::default(),
            load_outcome: loaded.outcome,
            last_persist_error: None,
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the calendar time-lock.
    #[must_use]
    pub fn with_time_lock(mut self, time_lock: TimeLock) -> Self {
        self.time_lock = time_lock;
        self
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Record that the entry puzzle was solved. Unlocks chapter 0 and stamps
    /// the start time the first time it runs.
    pub fn grant_access(&mut self) -> Change {
        let mut changed = false;
        if !self.state.access_granted {
            self.state.access_granted = true;
            changed = true;
        }
        if !self.state.chapters_unlocked[0] {
            self.state.chapters_unlocked[0] = true;
            changed = true;
        }
        if self.state.start_time.is_none() {
            self.state.start_time = Some(self.clock.now());
            changed = true;
        }

        if changed {
            tracing::info!("access granted");
            self.persist();
        }
        Change::from_flag(changed)
    }

    /// Mark chapter `index` completed and unlock its successor.
    ///
    /// A chapter that is not unlocked yet cannot be completed.
    pub fn complete_chapter(&mut self, index: usize) -> Change {
        if !Self::check_index(index, "complete_chapter") {
            return Change::Rejected(ErrorCode::ChapterOutOfRange);
        }

        if !self.state.chapters_unlocked[index] {
            tracing::warn!(chapter = index, "chapter is still locked; ignoring completion");
            return Change::Rejected(ErrorCode::ChapterLocked);
        }

        let mut changed = false;
        if !self.state.chapters_completed[index] {
            self.state.chapters_completed[index] = true;
            changed = true;
        }
        let next = index + 1;
        if next < CHAPTER_COUNT && !self.state.chapters_unlocked[next] {
            self.state.chapters_unlocked[next] = true;
            changed = true;
        }

        if changed {
            tracing::info!(
                chapter = index,
                completed = self.state.completed_count(),
                "chapter completed"
            );
            self.persist();
        }
        Change::from_flag(changed)
    }

    /// Record the hidden fragment of chapter `index` as found.
    pub fn find_easter_egg(&mut self, index: usize) -> Change {
        if !Self::check_index(index, "find_easter_egg") {
            return Change::Rejected(ErrorCode::ChapterOutOfRange);
        }

        let changed = self.state.easter_eggs_found.insert(index);
        if changed {
            tracing::info!(chapter = index, found = self.state.easter_eggs_found.len(), "fragment found");
            self.persist();
        }
        Change::from_flag(changed)
    }

    /// Store a reflection answer under `key`, replacing any earlier one.
    pub fn save_reflection_answer(&mut self, key: impl Into<String>, value: AnswerValue) -> Change {
        let key = key.into();
        if self.state.reflection_answers.get(&key) == Some(&value) {
            return Change::Unchanged;
        }

        tracing::debug!(key = %key, kind = value.kind(), "reflection answer saved");
        self.state.reflection_answers.insert(key, value);
        self.persist();
        Change::Applied
    }

    /// Record the final choice. Only the first call has any effect.
    pub fn make_final_choice(&mut self, choice: FinalChoice) -> Change {
        if self.state.final_choice_made {
            if self.state.final_choice == Some(choice) {
                return Change::Unchanged;
            }
            tracing::warn!(
                recorded = ?self.state.final_choice,
                attempted = %choice,
                "final choice already made; ignoring"
            );
            debug_assert!(
                false,
                "final choice already made as {:?}, refusing {choice}",
                self.state.final_choice
            );
            return Change::Rejected(ErrorCode::FinalChoiceAlreadyMade);
        }

        self.state.final_choice = Some(choice);
        self.state.final_choice_made = true;
        tracing::info!(choice = %choice, "final choice recorded");
        self.persist();
        Change::Applied
    }

    /// Flip the sound preference.
    pub fn toggle_sound(&mut self) -> Change {
        self.state.sound_enabled = !self.state.sound_enabled;
        tracing::debug!(enabled = self.state.sound_enabled, "sound toggled");
        self.persist();
        Change::Applied
    }

    /// Throw away all progress.
    ///
    /// Asking the user for confirmation is the caller's job.
    pub fn reset_progress(&mut self) -> Change {
        let epoch = self.state.epoch + 1;
        self.state = JourneyState {
            epoch,
            ..JourneyState::default()
        };
        tracing::info!(epoch, "progress reset");
        self.persist();
        Change::Applied
    }

    /// Re-read the durable copy after another writer changed it and fold it
    /// into this session. See [`JourneyState::reconcile`] for the rules.
    pub fn on_storage_changed(&mut self) -> Change {
        let loaded = codec::load_progress(&self.storage);
        match loaded.outcome {
            LoadOutcome::Restored => self.reconcile_with(&loaded.value),
            LoadOutcome::Fresh | LoadOutcome::Recovered { .. } => {
                tracing::debug!("durable copy missing or unreadable; rewriting from memory");
                self.persist();
                Change::Unchanged
            }
            LoadOutcome::Unavailable(err) => {
                tracing::warn!(error = %err, "could not re-read progress");
                Change::Unchanged
            }
        }
    }

    /// Fold `remote` into this session and write the result back if the
    /// durable copy would otherwise differ from it.
    pub fn reconcile_with(&mut self, remote: &JourneyState) -> Change {
        let changed = self.state.reconcile(remote);
        if changed {
            tracing::info!(epoch = self.state.epoch, "merged progress written elsewhere");
        }
        if self.state != *remote {
            self.persist();
        }
        Change::from_flag(changed)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn state(&self) -> &JourneyState {
        &self.state
    }

    #[must_use]
    pub const fn access_granted(&self) -> bool {
        self.state.access_granted
    }

    #[must_use]
    pub const fn chapters_unlocked(&self) -> &[bool; CHAPTER_COUNT] {
        &self.state.chapters_unlocked
    }

    #[must_use]
    pub const fn chapters_completed(&self) -> &[bool; CHAPTER_COUNT] {
        &self.state.chapters_completed
    }

    #[must_use]
    pub const fn easter_eggs_found(&self) -> &GSet<usize> {
        &self.state.easter_eggs_found
    }

    #[must_use]
    pub const fn reflection_answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.state.reflection_answers
    }

    #[must_use]
    pub fn reflection_answer(&self, key: &str) -> Option<&AnswerValue> {
        self.state.reflection_answers.get(key)
    }

    #[must_use]
    pub const fn final_choice(&self) -> Option<FinalChoice> {
        self.state.final_choice
    }

    #[must_use]
    pub const fn final_choice_made(&self) -> bool {
        self.state.final_choice_made
    }

    #[must_use]
    pub const fn sound_enabled(&self) -> bool {
        self.state.sound_enabled
    }

    #[must_use]
    pub const fn start_time(&self) -> Option<DateTime<Utc>> {
        self.state.start_time
    }

    /// Time since access was first granted.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.state
            .start_time
            .map(|start| (self.clock.now() - start).max(Duration::zero()))
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.state.completed_count()
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.state.all_completed()
    }

    #[must_use]
    pub fn phase(&self) -> JourneyPhase {
        self.state.phase()
    }

    /// Lifecycle state of chapter `index`, or `None` if there is no such
    /// chapter.
    #[must_use]
    pub const fn chapter_state(&self, index: usize) -> Option<ChapterState> {
        if is_valid_index(index) {
            Some(self.state.chapter_state(index))
        } else {
            None
        }
    }

    /// Whether the calendar still holds chapter `index` back.
    ///
    /// Completed chapters are never held back. With the default bypassed
    /// time-lock this is always false.
    #[must_use]
    pub fn is_time_locked(&self, index: usize) -> bool {
        if !is_valid_index(index) {
            return true;
        }
        if self.state.chapters_completed[index] {
            return false;
        }
        self.time_lock.is_locked(index, self.clock.now())
    }

    /// Wait before chapter `index` opens by date; zero when open.
    #[must_use]
    pub fn time_until_unlock(&self, index: usize) -> Duration {
        if !is_valid_index(index) || self.state.chapters_completed[index] {
            return Duration::zero();
        }
        self.time_lock.time_until_unlock(index, self.clock.now())
    }

    #[must_use]
    pub const fn time_lock(&self) -> &TimeLock {
        &self.time_lock
    }

    /// Current time according to the store's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// How the initial load went.
    #[must_use]
    pub const fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    /// Most recent write failure, cleared by the next successful write.
    #[must_use]
    pub const fn last_persist_error(&self) -> Option<&StorageError> {
        self.last_persist_error.as_ref()
    }

    /// The backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_index(index: usize, op: &'static str) -> bool {
        debug_assert!(
            is_valid_index(index),
            "{op}: chapter index {index} out of range (0..{CHAPTER_COUNT})"
        );
        if is_valid_index(index) {
            true
        } else {
            tracing::warn!(op, index, "chapter index out of range; ignoring");
            false
        }
    }

    /// Write the state back, first folding in whatever another writer stored
    /// since this session last looked. The read, merge and write happen under
    /// the storage's exclusive lock.
    fn persist(&mut self) {
        let state = &mut self.state;
        let result = self.storage.update(PROGRESS_KEY, &mut |stored| {
            if let Some(mut merged) = stored.as_deref().and_then(|raw| codec::decode(raw).ok()) {
                // Ours is the newest write, so fold it into the stored copy.
                merged.reconcile(state);
                if merged != *state {
                    tracing::debug!(epoch = merged.epoch, "folded in progress written elsewhere");
                    *state = merged;
                }
            }
            codec::encode(state)
                .inspect_err(|err| tracing::error!(error = %err, "progress serialization failed"))
                .ok()
        });

        match result {
            Ok(()) => {
                tracing::trace!("progress saved");
                self.last_persist_error = None;
            }
            Err(err) => {
                tracing::warn!(
                    code = %err.code(),
                    error = %err,
                    "progress not saved; keeping it in memory for this session"
                );
                self.last_persist_error = Some(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStorage;
    use crate::timelock::UnlockSchedule;
    use chrono::TimeZone;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    fn store() -> ProgressStore<MemoryStorage> {
        ProgressStore::open(MemoryStorage::new())
    }

    fn started() -> ProgressStore<MemoryStorage> {
        let mut store = store();
        store.grant_access();
        store
    }

    fn started_on(storage: &MemoryStorage) {
        ProgressStore::open(storage.clone()).grant_access();
    }

    #[test]
    fn grant_access_unlocks_first_chapter_only() {
        let store = started();
        assert_eq!(
            store.chapters_unlocked(),
            &[true, false, false, false, false, false, false, false]
        );
        assert_eq!(store.phase(), JourneyPhase::InProgress);
    }

    #[test]
    fn grant_access_stamps_start_time_once() {
        let clock = Rc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 7, 20, 0, 0).unwrap()));
        let mut store = store().with_clock(Rc::clone(&clock));

        assert_eq!(store.grant_access(), Change::Applied);
        let first = store.start_time();

        clock.advance(Duration::hours(2));
        assert_eq!(store.grant_access(), Change::Unchanged);
        assert_eq!(store.start_time(), first);
        assert_eq!(store.elapsed(), Some(Duration::hours(2)));
    }

    #[test]
    fn completing_unlocks_successor() {
        let mut store = started();
        assert_eq!(store.complete_chapter(0), Change::Applied);

        assert!(store.chapters_completed()[0]);
        assert!(store.chapters_unlocked()[1]);
        assert!(!store.chapters_unlocked()[2]);
        assert_eq!(store.chapter_state(1), Some(ChapterState::Unlocked));
    }

    #[test]
    fn completing_twice_is_idempotent() {
        let mut store = started();
        store.complete_chapter(0);
        let once = store.state().clone();

        assert_eq!(store.complete_chapter(0), Change::Unchanged);
        assert_eq!(store.state(), &once);
    }

    #[test]
    fn last_chapter_has_no_successor() {
        let mut store = started();
        for index in 0..CHAPTER_COUNT - 1 {
            store.complete_chapter(index);
        }
        assert!(!store.all_completed());

        store.complete_chapter(CHAPTER_COUNT - 1);
        assert!(store.all_completed());
        assert_eq!(store.completed_count(), CHAPTER_COUNT);
        assert_eq!(store.phase(), JourneyPhase::AllComplete);
    }

    #[test]
    fn locked_chapter_cannot_be_completed() {
        let mut store = started();
        assert_eq!(store.complete_chapter(2), Change::Rejected(ErrorCode::ChapterLocked));
        assert!(!store.chapters_completed()[2]);
        assert!(!store.chapters_unlocked()[3]);
    }

    #[test]
    fn easter_eggs_are_a_set() {
        let mut store = started();
        assert_eq!(store.find_easter_egg(3), Change::Applied);
        assert_eq!(store.find_easter_egg(3), Change::Unchanged);
        assert_eq!(store.easter_eggs_found().len(), 1);
        assert!(store.easter_eggs_found().contains(&3));
    }

    #[test]
    fn reflection_answers_upsert() {
        let mut store = started();
        store.save_reflection_answer("chapter1_0", AnswerValue::Text("rain".into()));
        store.save_reflection_answer("chapter1_0", AnswerValue::Scale(9));
        assert_eq!(
            store.save_reflection_answer("chapter1_0", AnswerValue::Scale(9)),
            Change::Unchanged
        );
        assert_eq!(store.reflection_answer("chapter1_0"), Some(&AnswerValue::Scale(9)));
        assert_eq!(store.reflection_answers().len(), 1);
    }

    #[test]
    fn repeating_the_final_choice_is_unchanged() {
        let mut store = started();
        assert_eq!(store.make_final_choice(FinalChoice::Accept), Change::Applied);
        assert_eq!(store.make_final_choice(FinalChoice::Accept), Change::Unchanged);
        assert_eq!(store.final_choice(), Some(FinalChoice::Accept));
        assert!(store.final_choice_made());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "final choice already made")]
    fn changing_the_final_choice_panics_in_debug() {
        let mut store = started();
        store.make_final_choice(FinalChoice::Accept);
        store.make_final_choice(FinalChoice::AlsoAccept);
    }

    #[test]
    fn rejected_final_choice_keeps_the_first() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        store.grant_access();
        store.make_final_choice(FinalChoice::Accept);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            store.make_final_choice(FinalChoice::AlsoAccept)
        }));
        assert_eq!(outcome.is_err(), cfg!(debug_assertions));
        if let Ok(change) = outcome {
            assert_eq!(change, Change::Rejected(ErrorCode::FinalChoiceAlreadyMade));
        }

        assert_eq!(store.final_choice(), Some(FinalChoice::Accept));
        assert!(store.final_choice_made());
        assert_eq!(
            ProgressStore::open(storage).final_choice(),
            Some(FinalChoice::Accept)
        );
    }

    #[test]
    fn toggle_sound_flips() {
        let mut store = store();
        assert!(!store.sound_enabled());
        store.toggle_sound();
        assert!(store.sound_enabled());
        store.toggle_sound();
        assert!(!store.sound_enabled());
    }

    #[test]
    fn reset_restores_defaults_and_bumps_epoch() {
        let mut store = started();
        store.complete_chapter(0);
        store.find_easter_egg(0);
        store.make_final_choice(FinalChoice::AlsoAccept);
        store.toggle_sound();

        store.reset_progress();
        let expected = JourneyState {
            epoch: 1,
            ..JourneyState::default()
        };
        assert_eq!(store.state(), &expected);
        assert_eq!(store.phase(), JourneyPhase::Entry);
    }

    #[test]
    fn mutations_persist_immediately() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        store.grant_access();
        store.complete_chapter(0);

        let reopened = ProgressStore::open(storage);
        assert_eq!(reopened.state(), store.state());
        assert!(matches!(reopened.load_outcome(), LoadOutcome::Restored));
    }

    #[test]
    fn write_failure_keeps_memory_state() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        storage.set_disabled(true);

        assert_eq!(store.grant_access(), Change::Applied);
        assert!(store.access_granted());
        assert!(matches!(store.last_persist_error(), Some(StorageError::Disabled)));

        storage.set_disabled(false);
        store.complete_chapter(0);
        assert!(store.last_persist_error().is_none());
    }

    #[test]
    fn time_lock_is_bypassed_by_default() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let store = started().with_clock(clock);
        for index in 0..CHAPTER_COUNT {
            assert!(!store.is_time_locked(index));
            assert_eq!(store.time_until_unlock(index), Duration::zero());
        }
    }

    #[test]
    fn enforced_time_lock_holds_future_chapters() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 9, 12, 0, 0).unwrap());
        let mut store = started()
            .with_clock(clock)
            .with_time_lock(TimeLock::enforced(UnlockSchedule::default()));

        assert!(!store.is_time_locked(2));
        assert!(store.is_time_locked(3));
        assert_eq!(store.time_until_unlock(3), Duration::hours(12));

        // Finished chapters are never held back.
        for index in 0..=3 {
            store.complete_chapter(index);
        }
        assert!(!store.is_time_locked(3));
    }

    #[test]
    fn out_of_range_reads_are_safe() {
        let store = started();
        assert_eq!(store.chapter_state(CHAPTER_COUNT), None);
        assert!(store.is_time_locked(CHAPTER_COUNT));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_completion_panics_in_debug() {
        let mut store = started();
        store.complete_chapter(CHAPTER_COUNT);
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn out_of_range_completion_is_ignored_in_release() {
        let mut store = started();
        let before = store.state().clone();
        assert_eq!(
            store.complete_chapter(CHAPTER_COUNT),
            Change::Rejected(ErrorCode::ChapterOutOfRange)
        );
        assert_eq!(store.find_easter_egg(99), Change::Rejected(ErrorCode::ChapterOutOfRange));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn storage_change_merges_other_writer() {
        let storage = MemoryStorage::new();
        let mut here = ProgressStore::open(storage.clone());
        here.grant_access();

        let mut there = ProgressStore::open(storage.clone());
        there.complete_chapter(0);
        there.find_easter_egg(0);

        // Writing folds in what `there` stored first.
        here.find_easter_egg(5);
        assert!(here.chapters_completed()[0]);
        assert!(here.easter_eggs_found().contains(&0));

        assert_eq!(there.on_storage_changed(), Change::Applied);
        assert!(there.easter_eggs_found().contains(&5));
        assert_eq!(here.on_storage_changed(), Change::Unchanged);
        assert_eq!(here.state(), there.state());
    }

    #[test]
    fn stale_writer_does_not_drop_other_updates() {
        let storage = MemoryStorage::new();
        started_on(&storage);

        let mut a = ProgressStore::open(storage.clone());
        let mut b = ProgressStore::open(storage.clone());
        a.find_easter_egg(1);
        b.find_easter_egg(2);
        b.save_reflection_answer("chapter1_0", AnswerValue::Scale(4));
        a.save_reflection_answer("chapter1_0", AnswerValue::Scale(8));

        let reopened = ProgressStore::open(storage);
        assert!(reopened.easter_eggs_found().contains(&1));
        assert!(reopened.easter_eggs_found().contains(&2));
        assert_eq!(
            reopened.reflection_answer("chapter1_0"),
            Some(&AnswerValue::Scale(8))
        );
    }

    #[test]
    fn write_after_remote_reset_adopts_the_reset() {
        let storage = MemoryStorage::new();
        started_on(&storage);

        let mut stale = ProgressStore::open(storage.clone());
        let mut resetter = ProgressStore::open(storage.clone());
        resetter.reset_progress();

        stale.find_easter_egg(3);
        assert_eq!(stale.state().epoch, 1);
        assert!(!stale.access_granted());
        assert_eq!(ProgressStore::open(storage).state(), stale.state());
    }

    #[test]
    fn toggling_sound_is_not_undone_by_the_stored_copy() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        store.grant_access();
        store.toggle_sound();
        assert!(store.sound_enabled());
        assert!(ProgressStore::open(storage).sound_enabled());
    }

    #[test]
    fn storage_change_adopts_reset_from_other_writer() {
        let storage = MemoryStorage::new();
        let mut here = ProgressStore::open(storage.clone());
        here.grant_access();
        here.complete_chapter(0);

        let mut there = ProgressStore::open(storage);
        there.reset_progress();

        here.on_storage_changed();
        assert_eq!(here.completed_count(), 0);
        assert_eq!(here.state().epoch, 1);
    }
}
