#![no_main]

use libfuzzer_sys::arbitrary;
use libfuzzer_sys::fuzz_target;

use makini_diff::{compute_diff, DiffOptions};

#[derive(arbitrary::Arbitrary, Debug)]
struct Input<'a> {
    before: &'a str,
    after: &'a str,
    extend_to_subwords: bool,
}

/// Feeds whole texts through the splitting entry point and checks that
/// the pipeline is deterministic and total.
fn do_fuzz(input: Input<'_>) {
    let options = DiffOptions {
        extend_to_subwords: input.extend_to_subwords,
        ..DiffOptions::default()
    };
    let first = compute_diff(input.before, input.after, &options);
    let second = compute_diff(input.before, input.after, &options);
    assert_eq!(first, second);
    if input.before == input.after {
        assert!(first.line_diffs.is_empty());
    }
}

fuzz_target!(|input: Input<'_>| {
    do_fuzz(input);
});
