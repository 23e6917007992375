#![no_main]

use libfuzzer_sys::fuzz_target;
use pwpatch_domain::builtin_patches;
use pwpatch_edit::Document;

fuzz_target!(|data: &[u8]| {
    // Arbitrary YAML through both patches: errors are fine, panics and non-idempotence are not.
    let Ok(s) = std::str::from_utf8(data) else { return };
    let Ok(doc) = Document::parse(s) else { return };

    for patch in builtin_patches() {
        let mut once = doc.clone();
        if patch.apply(&mut once).is_err() {
            continue;
        }
        let mut twice = once.clone();
        let second = patch.apply(&mut twice).expect("second apply succeeds");
        assert!(!second.changed(), "{} changed on second apply", patch.id());
        assert_eq!(once, twice);
    }
});
