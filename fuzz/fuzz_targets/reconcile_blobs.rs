#![no_main]

use journey_core::codec::decode;
use libfuzzer_sys::fuzz_target;

// Input is two blobs separated by a NUL byte.
fuzz_target!(|data: &[u8]| {
    let Some(split) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let (Ok(left), Ok(right)) = (
        std::str::from_utf8(&data[..split]),
        std::str::from_utf8(&data[split + 1..]),
    ) else {
        return;
    };
    let (Ok(local), Ok(remote)) = (decode(left), decode(right)) else {
        return;
    };

    let mut merged = local.clone();
    merged.reconcile(&remote);
    let once = merged.clone();
    assert!(!merged.reconcile(&remote), "reconcile is not idempotent");
    assert_eq!(merged, once);

    if local.epoch == remote.epoch {
        for index in 0..journey_core::CHAPTER_COUNT {
            assert!(!local.chapters_completed[index] || merged.chapters_completed[index]);
        }
    }
});
