//! Character-level refinement of a single line diff.
//!
//! Each surviving line diff is re-diffed at character granularity: the
//! covered lines of both sides are flattened into [`CharSequence`]s, the
//! engine runs again, the char-level optimizer chain cleans the result up
//! and the surviving diffs are translated back into 1-based (line, column)
//! range mappings.

use std::ops::Range;

use crate::chars::CharSequence;
use crate::seq::Sequence;
use crate::timeout::Budget;
use crate::{dynamic, myers, postprocess};
use crate::{Position, RangeMapping, SequenceDiff, TextRange};

/// Combined char-slice length below which the dynamic-programming aligner
/// replaces Myers.
const SMALL_CHAR_INPUT: u32 = 500;

pub(crate) struct RefinePolicy {
    pub consider_whitespace_changes: bool,
    pub extend_to_subwords: bool,
}

pub(crate) fn refine<S: AsRef<str>>(
    original_lines: &[S],
    modified_lines: &[S],
    diff: &SequenceDiff,
    budget: &Budget,
    policy: &RefinePolicy,
) -> (Vec<RangeMapping>, bool) {
    let (range1, range2) = slice_ranges(original_lines, modified_lines, diff);
    let seq1 = CharSequence::new(original_lines, &range1, policy.consider_whitespace_changes);
    let seq2 = CharSequence::new(modified_lines, &range2, policy.consider_whitespace_changes);

    let script = if seq1.len() + seq2.len() < SMALL_CHAR_INPUT {
        dynamic::compute(&seq1, &seq2, budget, |_, _| 1.0)
    } else {
        myers::compute(&seq1, &seq2, budget)
    };
    let hit_timeout = script.hit_timeout;

    let mut diffs = script.diffs;
    diffs = postprocess::optimize(&seq1, &seq2, diffs);
    diffs = postprocess::extend_word_diffs(&seq1, &seq2, diffs, |seq, off| seq.find_word(off), false);
    if policy.extend_to_subwords {
        diffs =
            postprocess::extend_word_diffs(&seq1, &seq2, diffs, |seq, off| seq.find_subword(off), true);
    }
    diffs = postprocess::fuse_short_matches(diffs);
    diffs = postprocess::fuse_long_diff_neighborhoods(&seq1, &seq2, diffs);

    let mappings = diffs
        .iter()
        .map(|diff| RangeMapping {
            before: translate(&seq1, &diff.before, &range1),
            after: translate(&seq2, &diff.after, &range2),
        })
        .collect();
    (mappings, hit_timeout)
}

/// Converts a slice-relative char range into absolute 1-based coordinates.
fn translate(seq: &CharSequence, range: &Range<u32>, slice: &TextRange) -> TextRange {
    let (start, end) = seq.translate_range(range);
    TextRange {
        start: Position {
            line: slice.start.line + start.0,
            column: start.1 + 1,
        },
        end: Position {
            line: slice.start.line + end.0,
            column: end.1 + 1,
        },
    }
}

/// The text ranges covered by a line diff on both sides.
///
/// The plain case covers the diff's lines from column 1 through column 1
/// of the first line past the range. When the end line does not exist
/// (the diff touches the end of a document) the ranges anchor to line
/// ends instead, which makes a slice start mid-line for pure
/// insertions/deletions at the very bottom of a file.
fn slice_ranges<S: AsRef<str>>(
    original: &[S],
    modified: &[S],
    diff: &SequenceDiff,
) -> (TextRange, TextRange) {
    // 1-based, half-open line ranges
    let start1 = diff.before.start + 1;
    let end1 = diff.before.end + 1;
    let start2 = diff.after.start + 1;
    let end2 = diff.after.end + 1;

    if end1 <= original.len() as u32 && end2 <= modified.len() as u32 {
        return (
            TextRange {
                start: line_start(start1),
                end: line_start(end1),
            },
            TextRange {
                start: line_start(start2),
                end: line_start(end2),
            },
        );
    }
    if start1 < end1 && start2 < end2 {
        return (
            TextRange {
                start: line_start(start1),
                end: line_end(original, end1 - 1),
            },
            TextRange {
                start: line_start(start2),
                end: line_end(modified, end2 - 1),
            },
        );
    }
    // one side is empty and the other ends at the last line: anchor both
    // slices to line ends so the insertion point sits at the end of the
    // preceding line
    if start1 > 1 && start2 > 1 {
        return (
            TextRange {
                start: line_end(original, start1 - 1),
                end: line_end(original, end1 - 1),
            },
            TextRange {
                start: line_end(modified, start2 - 1),
                end: line_end(modified, end2 - 1),
            },
        );
    }
    // unreachable for non-empty inputs; fall back to document starts
    let range = |lines: &[S], start: u32, end: u32| {
        if start == end {
            TextRange {
                start: line_start(1),
                end: line_start(1),
            }
        } else {
            TextRange {
                start: line_start(start),
                end: line_end(lines, end - 1),
            }
        }
    };
    (
        range(original, start1, end1),
        range(modified, start2, end2),
    )
}

fn line_start(line: u32) -> Position {
    Position { line, column: 1 }
}

fn line_end<S: AsRef<str>>(lines: &[S], line: u32) -> Position {
    Position {
        line,
        column: lines[line as usize - 1].as_ref().chars().count() as u32 + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping_str(mapping: &RangeMapping) -> String {
        format!(
            "[{},{} -> {},{}] => [{},{} -> {},{}]",
            mapping.before.start.line,
            mapping.before.start.column,
            mapping.before.end.line,
            mapping.before.end.column,
            mapping.after.start.line,
            mapping.after.start.column,
            mapping.after.end.line,
            mapping.after.end.column,
        )
    }

    fn refine_one(
        original: &[&str],
        modified: &[&str],
        diff: SequenceDiff,
    ) -> Vec<String> {
        let policy = RefinePolicy {
            consider_whitespace_changes: true,
            extend_to_subwords: false,
        };
        let (mappings, hit_timeout) =
            refine(original, modified, &diff, &Budget::unlimited(), &policy);
        assert!(!hit_timeout);
        mappings.iter().map(mapping_str).collect()
    }

    #[test]
    fn word_swap_maps_to_word_columns() {
        let mappings = refine_one(
            &["Hello world"],
            &["Hello there"],
            SequenceDiff::new(0..1, 0..1),
        );
        assert_eq!(mappings, ["[1,7 -> 1,12] => [1,7 -> 1,12]"]);
    }

    #[test]
    fn trailing_insertion_anchors_to_the_previous_line_end() {
        let mappings = refine_one(&["a"], &["a", "b"], SequenceDiff::new(1..1, 1..2));
        assert_eq!(mappings, ["[1,2 -> 1,2] => [1,2 -> 2,2]"]);
    }

    #[test]
    fn inner_insertion_maps_to_the_inserted_line() {
        let mappings = refine_one(&["a", "c"], &["a", "b", "c"], SequenceDiff::new(1..1, 1..2));
        assert_eq!(mappings, ["[2,1 -> 2,1] => [2,1 -> 2,2]"]);
    }

    #[test]
    fn carriage_return_stays_inside_one_mapping() {
        let mappings = refine_one(
            &["abc\rdef"],
            &["abc\rxef"],
            SequenceDiff::new(0..1, 0..1),
        );
        assert_eq!(mappings, ["[1,5 -> 1,6] => [1,5 -> 1,6]"]);
    }
}
