#![deny(missing_docs)]
//! Makini-diff is a careful (makini in Swahili) diff library for Rust.
//! Careful refers to the output rather than the input: instead of the
//! shortest possible edit script, makini-diff computes the diff a code
//! editor would show. Line-level change regions are relocated and merged
//! to natural boundaries by a family of battle-tested heuristics, and each
//! region is refined into character-level inline mappings suitable for
//! side-by-side rendering with inline highlights.
//!
//! The pipeline mirrors the diff engine shipped in a widely used code
//! editor: a forward-only Myers O(ND) engine (or a scorer-based
//! dynamic-programming aligner for small inputs) runs over interned lines,
//! heuristic optimizers rewrite the edit script for readability, and the
//! same engine and heuristics run a second time over the characters of
//! each changed region.
//!
//! # API Overview
//!
//! The input is the two sides of the diff as ordered sequences of lines
//! without terminators ([`sources::lines`] splits a whole text
//! accordingly). [`compute_line_alignments`] runs the full pipeline and
//! returns a [`LinesDiff`]: the line-level [`SequenceDiff`]s, the refined
//! [`RangeMapping`]s in 1-based end-exclusive (line, column) coordinates,
//! and whether the wall-clock budget expired along the way.
//!
//! ```
//! # use makini_diff::{compute_line_alignments, DiffOptions};
//! #
//! let before = ["fn main() {", "    println!(\"hello\");", "}"];
//! let after = ["fn main() {", "    println!(\"hello world\");", "}"];
//! let diff = compute_line_alignments(&before, &after, &DiffOptions::default());
//! assert_eq!(diff.line_diffs.len(), 1);
//! assert!(!diff.hit_timeout);
//! ```
//!
//! Columns count Unicode code points, never bytes or UTF-16 units; hosts
//! with different conventions convert at their own boundary. On a timeout
//! the result is degenerate (a single region spanning both inputs) but
//! still well-formed and safe to render.

use std::ops::Range;

use tracing::trace;

use crate::intern::Interner;
use crate::refine::RefinePolicy;
use crate::seq::Sequence;
use crate::sources::LineSequence;
use crate::timeout::Budget;
use crate::util::{join_ranges, shift_range};

mod chars;
mod dynamic;
mod intern;
mod myers;
mod postprocess;
mod refine;
mod seq;
pub mod sources;
mod timeout;
mod util;


/// Line count below which the dynamic-programming aligner replaces Myers
/// at line granularity.
const SMALL_LINE_INPUT: u32 = 1700;

/// A single change region: replace `before` in the first sequence with
/// `after` from the second sequence.
///
/// Both ranges are half-open element offsets. An empty `before` range is a
/// pure insertion, an empty `after` range a pure removal. Lists of
/// `SequenceDiff`s are always strictly ordered by `before.start` and
/// disjoint on both axes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceDiff {
    /// The replaced range of the first sequence.
    pub before: Range<u32>,
    /// The replacement range of the second sequence.
    pub after: Range<u32>,
}

impl SequenceDiff {
    /// Creates a diff replacing `before` with `after`.
    pub fn new(before: Range<u32>, after: Range<u32>) -> SequenceDiff {
        SequenceDiff { before, after }
    }

    /// Returns whether elements are only inserted and not removed in this
    /// diff.
    pub fn is_pure_insertion(&self) -> bool {
        self.before.is_empty()
    }

    /// Returns whether elements are only removed and not inserted in this
    /// diff.
    pub fn is_pure_removal(&self) -> bool {
        self.after.is_empty()
    }

    /// Inverts the diff so that it represents the change that would undo
    /// this one.
    pub fn invert(&self) -> SequenceDiff {
        SequenceDiff {
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    pub(crate) fn swapped(&self) -> SequenceDiff {
        self.invert()
    }

    pub(crate) fn delta(&self, delta: i32) -> SequenceDiff {
        SequenceDiff {
            before: shift_range(&self.before, delta),
            after: shift_range(&self.after, delta),
        }
    }

    pub(crate) fn delta_start(&self, delta: i32) -> SequenceDiff {
        let shift = |offset: u32| (offset as i64 + delta as i64).max(0) as u32;
        SequenceDiff {
            before: shift(self.before.start)..self.before.end,
            after: shift(self.after.start)..self.after.end,
        }
    }

    pub(crate) fn delta_end(&self, delta: i32) -> SequenceDiff {
        let shift = |offset: u32| (offset as i64 + delta as i64).max(0) as u32;
        SequenceDiff {
            before: self.before.start..shift(self.before.end),
            after: self.after.start..shift(self.after.end),
        }
    }

    pub(crate) fn join(&self, other: &SequenceDiff) -> SequenceDiff {
        SequenceDiff {
            before: join_ranges(&self.before, &other.before),
            after: join_ranges(&self.after, &other.after),
        }
    }

    pub(crate) fn clamp(&self, space: &SequenceDiff) -> SequenceDiff {
        SequenceDiff {
            before: self.before.start.max(space.before.start)..self.before.end.min(space.before.end),
            after: self.after.start.max(space.after.start)..self.after.end.min(space.after.end),
        }
    }
}

/// A 1-based text position; `column` counts Unicode code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column in code points.
    pub column: u32,
}

/// A pair of positions, exclusive at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    /// First position covered by the range.
    pub start: Position,
    /// First position past the range.
    pub end: Position,
}

impl TextRange {
    /// Whether the range covers nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A pair of character-granularity text ranges: `before` in the original
/// text maps to `after` in the modified text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeMapping {
    /// The original side of the mapping.
    pub before: TextRange,
    /// The modified side of the mapping.
    pub after: TextRange,
}

/// A 1-based, half-open range of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    /// First line of the range.
    pub start: u32,
    /// First line past the range.
    pub end: u32,
}

impl LineRange {
    fn overlaps_or_touches(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    fn join(&self, other: &LineRange) -> LineRange {
        LineRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A pair of line ranges plus the ordered inline [`RangeMapping`]s whose
/// endpoints lie inside them. This is the shape side-by-side renderers
/// consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedLineRangeMapping {
    /// Changed lines of the original text.
    pub before: LineRange,
    /// Changed lines of the modified text.
    pub after: LineRange,
    /// Character-level mappings inside the line ranges.
    pub inner: Vec<RangeMapping>,
}

/// Policy knobs for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Treat lines that differ only in leading/trailing whitespace as
    /// equal at character granularity too.
    pub ignore_trim_whitespace: bool,
    /// Report whitespace-only changes inside otherwise equal regions.
    /// Only effective while `ignore_trim_whitespace` is off.
    pub consider_whitespace_changes: bool,
    /// Additionally extend inline diffs to camel-case subword boundaries.
    pub extend_to_subwords: bool,
    /// Wall-clock budget in milliseconds; `0` disables the budget.
    pub timeout_ms: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            ignore_trim_whitespace: false,
            consider_whitespace_changes: true,
            extend_to_subwords: false,
            timeout_ms: 0,
        }
    }
}

/// The result of a pipeline run.
///
/// `line_diffs` and `range_mappings` are strictly ordered and disjoint.
/// When `hit_timeout` is set the diffs over-approximate the change (in the
/// worst case a single region spanning both inputs) but every invariant
/// still holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinesDiff {
    /// Line-level change regions (0-based half-open line offsets).
    pub line_diffs: Vec<SequenceDiff>,
    /// Character-level mappings in 1-based end-exclusive coordinates.
    pub range_mappings: Vec<RangeMapping>,
    /// Whether any engine invocation exhausted the wall-clock budget.
    pub hit_timeout: bool,
}

/// Computes the full diff between two ordered sequences of lines.
///
/// Lines carry no terminators. Either side being an empty slice counts as
/// invalid input and yields an empty result; a document with no text is
/// the one-element slice `[""]`, as produced by [`sources::lines`].
pub fn compute_line_alignments<S: AsRef<str>>(
    original_lines: &[S],
    modified_lines: &[S],
    options: &DiffOptions,
) -> LinesDiff {
    if original_lines.is_empty() || modified_lines.is_empty() {
        return LinesDiff::default();
    }
    if original_lines.len() <= 1
        && original_lines.len() == modified_lines.len()
        && original_lines
            .iter()
            .zip(modified_lines)
            .all(|(a, b)| a.as_ref() == b.as_ref())
    {
        return LinesDiff::default();
    }
    if (original_lines.len() == 1 && original_lines[0].as_ref().is_empty())
        || (modified_lines.len() == 1 && modified_lines[0].as_ref().is_empty())
    {
        // one side is the empty document: a single whole-file replacement
        return LinesDiff {
            line_diffs: vec![SequenceDiff::new(
                0..original_lines.len() as u32,
                0..modified_lines.len() as u32,
            )],
            range_mappings: vec![RangeMapping {
                before: whole_text_range(original_lines),
                after: whole_text_range(modified_lines),
            }],
            hit_timeout: false,
        };
    }

    let budget = Budget::from_millis(options.timeout_ms);
    let policy = RefinePolicy {
        consider_whitespace_changes: options.consider_whitespace_changes
            && !options.ignore_trim_whitespace,
        extend_to_subwords: options.extend_to_subwords,
    };

    let mut interner = Interner::with_capacity(original_lines.len() + modified_lines.len());
    let seq1 = LineSequence::new(original_lines, &mut interner);
    let seq2 = LineSequence::new(modified_lines, &mut interner);

    let script = if seq1.len() + seq2.len() < SMALL_LINE_INPUT {
        dynamic::compute(&seq1, &seq2, &budget, |i, j| {
            let original = original_lines[i as usize].as_ref();
            let modified = modified_lines[j as usize].as_ref();
            if original == modified {
                if modified.is_empty() {
                    0.1
                } else {
                    1.0 + (1.0 + modified.chars().count() as f64).ln()
                }
            } else {
                // ids matched but the raw lines differ (whitespace): still
                // credit the pair slightly to bias toward dense alignments
                0.99
            }
        })
    } else {
        myers::compute(&seq1, &seq2, &budget)
    };

    let mut hit_timeout = script.hit_timeout;
    let mut line_diffs = script.diffs;
    line_diffs = postprocess::optimize(&seq1, &seq2, line_diffs);
    line_diffs = postprocess::fuse_whitespace_gaps(&seq1, line_diffs);
    trace!(
        line_diffs = line_diffs.len(),
        distinct_lines = interner.num_tokens(),
        hit_timeout,
        "line alignments computed"
    );

    let mut range_mappings = Vec::new();
    let mut pos1 = 0u32;
    let mut pos2 = 0u32;
    for diff in &line_diffs {
        debug_assert!(diff.before.start - pos1 == diff.after.start - pos2);
        let equal_lines = diff.before.start - pos1;
        scan_whitespace_changes(
            original_lines,
            modified_lines,
            pos1,
            pos2,
            equal_lines,
            &budget,
            &policy,
            &mut range_mappings,
            &mut hit_timeout,
        );
        pos1 = diff.before.end;
        pos2 = diff.after.end;
        let (mappings, timed_out) =
            refine::refine(original_lines, modified_lines, diff, &budget, &policy);
        hit_timeout |= timed_out;
        range_mappings.extend(mappings);
    }
    scan_whitespace_changes(
        original_lines,
        modified_lines,
        pos1,
        pos2,
        original_lines.len() as u32 - pos1,
        &budget,
        &policy,
        &mut range_mappings,
        &mut hit_timeout,
    );
    trace!(range_mappings = range_mappings.len(), "refinement finished");

    // every engine that observes the expiry already reports it; the latch
    // catches any polling path that would otherwise drop the signal
    LinesDiff {
        line_diffs,
        range_mappings,
        hit_timeout: hit_timeout || budget.hit(),
    }
}

/// Computes the diff of two whole texts, splitting them into lines first.
pub fn compute_diff(original: &str, modified: &str, options: &DiffOptions) -> LinesDiff {
    let original_lines: Vec<&str> = sources::lines(original).collect();
    let modified_lines: Vec<&str> = sources::lines(modified).collect();
    compute_line_alignments(&original_lines, &modified_lines, options)
}

/// Lines inside equal spans can still differ in whitespace (their interned
/// ids are trim-based); refine those pairs individually so whitespace-only
/// edits show up as inline mappings.
#[allow(clippy::too_many_arguments)]
fn scan_whitespace_changes<S: AsRef<str>>(
    original_lines: &[S],
    modified_lines: &[S],
    pos1: u32,
    pos2: u32,
    count: u32,
    budget: &Budget,
    policy: &RefinePolicy,
    range_mappings: &mut Vec<RangeMapping>,
    hit_timeout: &mut bool,
) {
    if !policy.consider_whitespace_changes {
        return;
    }
    for offset in 0..count {
        let line1 = pos1 + offset;
        let line2 = pos2 + offset;
        if original_lines[line1 as usize].as_ref() != modified_lines[line2 as usize].as_ref() {
            let (mappings, timed_out) = refine::refine(
                original_lines,
                modified_lines,
                &SequenceDiff::new(line1..line1 + 1, line2..line2 + 1),
                budget,
                policy,
            );
            *hit_timeout |= timed_out;
            range_mappings.extend(mappings);
        }
    }
}

fn whole_text_range<S: AsRef<str>>(lines: &[S]) -> TextRange {
    TextRange {
        start: Position { line: 1, column: 1 },
        end: Position {
            line: lines.len() as u32,
            column: lines[lines.len() - 1].as_ref().chars().count() as u32 + 1,
        },
    }
}

/// Groups ordered [`RangeMapping`]s into [`DetailedLineRangeMapping`]s,
/// joining mappings whose line ranges overlap or touch.
///
/// A mapping that ends at column 1 excludes that line from its line range,
/// and one that starts past the end of a line starts its line range on the
/// next line, so pure line insertions/removals produce clean line spans.
pub fn line_range_mappings<S: AsRef<str>>(
    mappings: &[RangeMapping],
    original_lines: &[S],
    modified_lines: &[S],
) -> Vec<DetailedLineRangeMapping> {
    let mut changes: Vec<DetailedLineRangeMapping> = Vec::new();
    for mapping in mappings {
        let (before, after) = line_ranges_of(mapping, original_lines, modified_lines);
        let groups = changes.last().map_or(false, |last| {
            last.before.overlaps_or_touches(&before) || last.after.overlaps_or_touches(&after)
        });
        if groups {
            let last = changes.last_mut().unwrap();
            last.before = last.before.join(&before);
            last.after = last.after.join(&after);
            last.inner.push(*mapping);
        } else {
            changes.push(DetailedLineRangeMapping {
                before,
                after,
                inner: vec![*mapping],
            });
        }
    }
    changes
}

fn line_ranges_of<S: AsRef<str>>(
    mapping: &RangeMapping,
    original_lines: &[S],
    modified_lines: &[S],
) -> (LineRange, LineRange) {
    let line_len = |lines: &[S], line: u32| lines[line as usize - 1].as_ref().chars().count() as u32;
    let mut start_delta = 0u32;
    let mut end_delta = 0i64;
    if mapping.after.end.column == 1
        && mapping.before.end.column == 1
        && mapping.before.start.line <= mapping.before.end.line
        && mapping.after.start.line <= mapping.after.end.line
    {
        // the mapping ends at the beginning of a line: leave that line out
        end_delta = -1;
    }
    if mapping.after.start.column > line_len(modified_lines, mapping.after.start.line)
        && mapping.before.start.column > line_len(original_lines, mapping.before.start.line)
        && mapping.before.start.line as i64 <= mapping.before.end.line as i64 + end_delta
        && mapping.after.start.line as i64 <= mapping.after.end.line as i64 + end_delta
    {
        // the mapping starts past the end of a line: begin on the next one
        start_delta = 1;
    }
    (
        LineRange {
            start: mapping.before.start.line + start_delta,
            end: (mapping.before.end.line as i64 + 1 + end_delta) as u32,
        },
        LineRange {
            start: mapping.after.start.line + start_delta,
            end: (mapping.after.end.line as i64 + 1 + end_delta) as u32,
        },
    )
}
