//! Property-based tests for the debouncer and the entry buffer.
//!
//! These tests use proptest to generate random scan sequences and verify
//! that the keypad pipeline invariants hold for every input.

use lockbox_core::{Code, Digit, KeyCode};
use lockbox_keypad::{Debouncer, EntryBuffer};
use proptest::prelude::*;

/// Strategy for generating any key on the 4x4 keypad.
fn any_key() -> impl Strategy<Value = KeyCode> {
    (0u8..16).prop_map(|code| KeyCode::from_code(code).expect("code in range"))
}

/// Strategy for generating a single scan result (key or no key).
fn any_scan() -> impl Strategy<Value = Option<KeyCode>> {
    prop_oneof![Just(None), any_key().prop_map(Some)]
}

/// Strategy for generating debounce thresholds.
fn threshold() -> impl Strategy<Value = u32> {
    1u32..30
}

proptest! {
    /// Property: A key held for at least the threshold and then released
    /// produces exactly one event, for that key.
    #[test]
    fn prop_held_key_fires_exactly_once(
        key in any_key(),
        threshold in threshold(),
        extra in 0u32..60,
        release in 1usize..5,
    ) {
        let mut debouncer = Debouncer::new(threshold);
        let mut events = Vec::new();

        for _ in 0..(threshold + extra) {
            events.extend(debouncer.step(Some(key)));
        }
        for _ in 0..release {
            events.extend(debouncer.step(None));
        }

        prop_assert_eq!(events, vec![key]);
    }

    /// Property: Runs of identical keys shorter than the threshold never
    /// produce an event, whatever separates them.
    #[test]
    fn prop_short_runs_never_fire(
        threshold in 2u32..30,
        runs in prop::collection::vec((any_key(), 1u32..30), 1..20),
    ) {
        let mut debouncer = Debouncer::new(threshold);

        for (key, len) in runs {
            let len = len.min(threshold - 1);
            for _ in 0..len {
                prop_assert_eq!(debouncer.step(Some(key)), None);
            }
            prop_assert_eq!(debouncer.step(None), None);
        }
    }

    /// Property: Every event is preceded by at least `threshold` consecutive
    /// scans of the same key, and events are separated by a release.
    #[test]
    fn prop_events_require_continuous_hold(
        threshold in threshold(),
        scans in prop::collection::vec(any_scan(), 0..400),
    ) {
        let mut debouncer = Debouncer::new(threshold);
        let mut run_key: Option<KeyCode> = None;
        let mut run_len = 0u32;
        let mut released_since_event = true;

        for scan in scans {
            let event = debouncer.step(scan);

            if let Some(key) = event {
                prop_assert!(released_since_event);
                prop_assert_eq!(Some(key), run_key);
                prop_assert!(run_len >= threshold);
                released_since_event = false;
            }

            match scan {
                Some(key) if Some(key) == run_key => run_len += 1,
                Some(key) => {
                    run_key = Some(key);
                    run_len = 1;
                }
                None => {
                    run_key = None;
                    run_len = 0;
                    released_since_event = true;
                }
            }
        }
    }

    /// Property: After any digit sequence the buffer holds the last four
    /// digits, most recent first.
    #[test]
    fn prop_buffer_holds_last_four(digits in prop::collection::vec(0u8..10, 0..40)) {
        let mut buffer = EntryBuffer::new();
        for &d in &digits {
            buffer.push(Digit::new(d).expect("digit in range"));
        }

        let expected: Vec<Option<u8>> = (0..4)
            .map(|i| digits.len().checked_sub(i + 1).map(|idx| digits[idx]))
            .collect();
        let actual: Vec<Option<u8>> = buffer
            .slots()
            .iter()
            .map(|slot| slot.map(|d| d.value()))
            .collect();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(buffer.to_code(), Code::from_typed(&digits).expect("digits in range"));
    }
}
