//! Fuzz target for policy deserialization
//!
//! Arbitrary byte input must either parse into a valid policy or fail with
//! an error; it must never panic or produce a policy that fails validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_core::Policy;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(policy) = Policy::from_json(text) {
            // Deserialization implies validity
            assert!(policy.validate().is_ok());
            // And a valid policy must re-serialize
            let _ = policy.to_json().unwrap();
        }
    }
});
