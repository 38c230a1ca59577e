#![no_main]

use journey_core::codec::{decode, encode};
use libfuzzer_sys::fuzz_target;

// Whatever decodes must come out repaired and survive a second round trip.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(state) = decode(text) else {
        return;
    };

    let mut repaired = state.clone();
    assert_eq!(repaired.repair(), 0, "decode returned an unrepaired state");

    let blob = encode(&state).expect("encoding a decoded state");
    let again = decode(&blob).expect("re-decoding our own output");
    assert_eq!(again, state);
});
