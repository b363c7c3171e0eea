#![no_main]

use libfuzzer_sys::arbitrary;
use libfuzzer_sys::fuzz_target;

use makini_diff::{compute_line_alignments, DiffOptions, LinesDiff, Position};

#[derive(arbitrary::Arbitrary, Debug)]
struct Input {
    before: Vec<String>,
    after: Vec<String>,
    ignore_trim_whitespace: bool,
    consider_whitespace_changes: bool,
    extend_to_subwords: bool,
}

/// Runs the full pipeline on arbitrary line slices and checks the output
/// invariants:
/// - line diffs and range mappings are ordered and disjoint on both axes
/// - every emitted position is inside its document
/// - re-applying the line diffs reconstructs the modified lines
fn do_fuzz(input: Input) {
    let before: Vec<String> = input
        .before
        .into_iter()
        .map(|line| line.replace('\n', " "))
        .collect();
    let after: Vec<String> = input
        .after
        .into_iter()
        .map(|line| line.replace('\n', " "))
        .collect();
    let options = DiffOptions {
        ignore_trim_whitespace: input.ignore_trim_whitespace,
        consider_whitespace_changes: input.consider_whitespace_changes,
        extend_to_subwords: input.extend_to_subwords,
        timeout_ms: 0,
    };
    let diff = compute_line_alignments(&before, &after, &options);
    assert!(!diff.hit_timeout);
    check_ordering(&diff, &before, &after);
    if before.is_empty() || after.is_empty() {
        assert_eq!(diff, LinesDiff::default());
        return;
    }
    check_reconstruction(&diff, &before, &after);
}

fn check_ordering(diff: &LinesDiff, before: &[String], after: &[String]) {
    for pair in diff.line_diffs.windows(2) {
        assert!(pair[0].before.end <= pair[1].before.start);
        assert!(pair[0].after.end <= pair[1].after.start);
    }
    for d in &diff.line_diffs {
        assert!(d.before.start <= d.before.end && d.before.end <= before.len() as u32);
        assert!(d.after.start <= d.after.end && d.after.end <= after.len() as u32);
    }
    for pair in diff.range_mappings.windows(2) {
        assert!(pair[0].before.end <= pair[1].before.start);
        assert!(pair[0].after.end <= pair[1].after.start);
    }
    for m in &diff.range_mappings {
        check_position(m.before.start, before);
        check_position(m.before.end, before);
        check_position(m.after.start, after);
        check_position(m.after.end, after);
    }
}

fn check_position(position: Position, lines: &[String]) {
    assert!(position.line >= 1 && position.line <= lines.len() as u32);
    let len = lines[position.line as usize - 1].chars().count() as u32;
    assert!(position.column >= 1 && position.column <= len + 1);
}

/// Equal spans match lines by their trimmed form, so reconstruction is
/// faithful modulo surrounding whitespace on unchanged lines (exactly the
/// aliasing `strongly_equal` exists to resolve).
fn check_reconstruction(diff: &LinesDiff, before: &[String], after: &[String]) {
    let mut rebuilt: Vec<&String> = Vec::new();
    let mut pos = 0usize;
    for d in &diff.line_diffs {
        rebuilt.extend(&before[pos..d.before.start as usize]);
        rebuilt.extend(&after[d.after.start as usize..d.after.end as usize]);
        pos = d.before.end as usize;
    }
    rebuilt.extend(&before[pos..]);
    let rebuilt: Vec<&str> = rebuilt.iter().map(|line| trimmed(line)).collect();
    let expected: Vec<&str> = after.iter().map(|line| trimmed(line)).collect();
    assert_eq!(rebuilt, expected);
}

fn trimmed(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_ascii_whitespace())
}

fuzz_target!(|input: Input| {
    do_fuzz(input);
});
