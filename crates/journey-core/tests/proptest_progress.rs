use journey_core::codec;
use journey_core::storage::MemoryStorage;
use journey_core::{CHAPTER_COUNT, JourneyState, ProgressStore};
use proptest::prelude::*;

use generators::*;

fn check_ordering(state: &JourneyState) -> Result<(), TestCaseError> {
    for index in 0..CHAPTER_COUNT {
        if state.chapters_completed[index] {
            prop_assert!(state.chapters_unlocked[index], "completed {index} but not unlocked");
        }
        if index > 0 && state.chapters_unlocked[index] {
            prop_assert!(
                state.chapters_completed[index - 1],
                "unlocked {index} before completing {}",
                index - 1
            );
        }
    }
    if state.chapters_unlocked[0] {
        prop_assert!(state.access_granted);
    }
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn unlocks_and_completions_never_revert(ops in prop::collection::vec(arb_forward_op(), 0..60)) {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut unlocked = [false; CHAPTER_COUNT];
        let mut completed = [false; CHAPTER_COUNT];
        let mut eggs = 0;

        for op in &ops {
            apply(&mut store, op);
            for index in 0..CHAPTER_COUNT {
                prop_assert!(!unlocked[index] || store.chapters_unlocked()[index]);
                prop_assert!(!completed[index] || store.chapters_completed()[index]);
            }
            prop_assert!(store.easter_eggs_found().len() >= eggs);
            unlocked = *store.chapters_unlocked();
            completed = *store.chapters_completed();
            eggs = store.easter_eggs_found().len();
        }
    }

    #[test]
    fn chapters_open_in_sequence(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut store = ProgressStore::open(MemoryStorage::new());
        for op in &ops {
            apply(&mut store, op);
            check_ordering(store.state())?;
        }
    }

    #[test]
    fn completing_twice_equals_once(ops in prop::collection::vec(arb_op(), 0..30), index in arb_index()) {
        let mut store = ProgressStore::open(MemoryStorage::new());
        for op in &ops {
            apply(&mut store, op);
        }
        store.complete_chapter(index);
        let once = store.state().clone();
        store.complete_chapter(index);
        prop_assert_eq!(store.state(), &once);
    }

    #[test]
    fn first_final_choice_sticks(
        first in arb_choice(),
        later in prop::collection::vec(arb_choice(), 1..5),
    ) {
        let mut store = ProgressStore::open(MemoryStorage::new());
        store.make_final_choice(first);
        for choice in later {
            apply(&mut store, &Op::Choose(choice));
            apply(&mut store, &Op::ToggleSound);
        }
        prop_assert_eq!(store.final_choice(), Some(first));
        prop_assert!(store.final_choice_made());
    }

    #[test]
    fn reopen_restores_identical_state(ops in prop::collection::vec(arb_op(), 0..40)) {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        for op in &ops {
            apply(&mut store, op);
        }
        let reopened = ProgressStore::open(storage);
        prop_assert_eq!(reopened.state(), store.state());
    }

    #[test]
    fn reset_returns_to_defaults(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut store = ProgressStore::open(MemoryStorage::new());
        for op in &ops {
            apply(&mut store, op);
        }
        let epoch = store.state().epoch;
        store.reset_progress();
        let expected = JourneyState { epoch: epoch + 1, ..JourneyState::default() };
        prop_assert_eq!(store.state(), &expected);
    }

    #[test]
    fn encode_decode_is_lossless(state in arb_reachable_state()) {
        let raw = codec::encode(&state).unwrap();
        prop_assert_eq!(codec::decode(&raw).unwrap(), state);
    }

    #[test]
    fn decoded_blobs_open_in_sequence(state in arb_raw_state()) {
        let raw = codec::encode(&state).unwrap();
        let decoded = codec::decode(&raw).unwrap();
        check_ordering(&decoded)?;
    }

    #[test]
    fn repair_is_idempotent(mut state in arb_raw_state()) {
        state.repair();
        let once = state.clone();
        prop_assert_eq!(state.repair(), 0);
        prop_assert_eq!(state, once);
    }

    #[test]
    fn reconcile_is_idempotent(a in arb_reachable_state(), b in arb_reachable_state()) {
        let mut merged = a;
        merged.reconcile(&b);
        let once = merged.clone();
        prop_assert!(!merged.reconcile(&b));
        prop_assert_eq!(merged, once);
    }

    #[test]
    fn equal_epoch_reconcile_never_moves_backwards(
        a in arb_reachable_state(),
        b in arb_reachable_state(),
    ) {
        let mut b = b;
        b.epoch = a.epoch;
        let mut merged = a.clone();
        merged.reconcile(&b);

        for index in 0..CHAPTER_COUNT {
            prop_assert!(!a.chapters_completed[index] || merged.chapters_completed[index]);
            prop_assert!(!b.chapters_completed[index] || merged.chapters_completed[index]);
            prop_assert!(!a.chapters_unlocked[index] || merged.chapters_unlocked[index]);
        }
        for egg in a.easter_eggs_found.iter().chain(b.easter_eggs_found.iter()) {
            prop_assert!(merged.easter_eggs_found.contains(egg));
        }
        if a.final_choice_made {
            prop_assert_eq!(merged.final_choice, a.final_choice);
        }
    }
}
