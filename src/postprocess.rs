//! Heuristics that rewrite an edit script for readability.
//!
//! None of these passes change what an edit script *means*: re-applying
//! the rewritten diffs still reconstructs the second sequence. They trade
//! minimality for placement, moving ambiguous insertions and deletions to
//! natural boundaries and fusing regions a reader would perceive as one
//! change. All passes preserve ordering and disjointness.

use std::ops::Range;

use crate::chars::CharSequence;
use crate::seq::Sequence;
use crate::sources::LineSequence;
use crate::util::{intersection_len, range_len, ranges_intersect};
use crate::SequenceDiff;

/// Shift radius cap for the boundary-score alignment.
const MAX_BOUNDARY_SHIFT: u32 = 100;

/// The full position-optimizer chain: shift-and-join twice (a third pass
/// has never been observed to change the result), then boundary-score
/// alignment.
pub(crate) fn optimize<S: Sequence>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let diffs = join_by_shifting(seq1, seq2, diffs);
    let diffs = join_by_shifting(seq1, seq2, diffs);
    align_to_boundaries(seq1, seq2, diffs)
}

/// Slides pure insertions/deletions along equal-element runs: first left
/// (by element id), merging with the previous diff when the whole gap is
/// slidable, then right (by strong equality), merging with the next.
fn join_by_shifting<S: Sequence>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }
    let mut iter = diffs.into_iter();
    let mut result: Vec<SequenceDiff> = vec![iter.next().unwrap()];
    for mut cur in iter {
        if cur.is_pure_insertion() || cur.is_pure_removal() {
            let prev = result.last().unwrap();
            // equal spans have the same extent on both axes
            let gap = cur.before.start - prev.before.end;
            let mut delta = 0;
            while delta < gap
                && seq1.element(cur.before.start - delta - 1) == seq1.element(cur.before.end - delta - 1)
                && seq2.element(cur.after.start - delta - 1) == seq2.element(cur.after.end - delta - 1)
            {
                delta += 1;
            }
            if delta == gap {
                let prev = result.last_mut().unwrap();
                prev.before.end = cur.before.end - gap;
                prev.after.end = cur.after.end - gap;
                continue;
            }
            cur = cur.delta(-(delta as i32));
        }
        result.push(cur);
    }

    let mut shifted: Vec<SequenceDiff> = Vec::with_capacity(result.len());
    for idx in 0..result.len().saturating_sub(1) {
        let mut cur = result[idx].clone();
        if cur.is_pure_insertion() || cur.is_pure_removal() {
            let next = &result[idx + 1];
            let gap = next.before.start - cur.before.end;
            let mut delta = 0;
            while delta < gap
                && seq1.strongly_equal(cur.before.start + delta, cur.before.end + delta)
                && seq2.strongly_equal(cur.after.start + delta, cur.after.end + delta)
            {
                delta += 1;
            }
            if delta == gap {
                let next = &mut result[idx + 1];
                next.before.start = cur.before.start + gap;
                next.after.start = cur.after.start + gap;
                continue;
            }
            if delta > 0 {
                cur = cur.delta(delta as i32);
            }
        }
        shifted.push(cur);
    }
    if let Some(last) = result.pop() {
        shifted.push(last);
    }
    shifted
}

/// Moves each pure insertion/deletion to the best-scoring cut position
/// reachable through strongly-equal slides, without touching its
/// neighbors. Modifications are left alone.
fn align_to_boundaries<S: Sequence>(
    seq1: &S,
    seq2: &S,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if !seq1.supports_boundary_score() || !seq2.supports_boundary_score() {
        return diffs;
    }
    for idx in 0..diffs.len() {
        let free1 = free_range(&diffs, idx, |diff| &diff.before, seq1.len());
        let free2 = free_range(&diffs, idx, |diff| &diff.after, seq2.len());
        let diff = &diffs[idx];
        if diff.is_pure_insertion() {
            diffs[idx] = shift_to_best_boundary(diff, seq1, seq2, &free1, &free2);
        } else if diff.is_pure_removal() {
            diffs[idx] =
                shift_to_best_boundary(&diff.swapped(), seq2, seq1, &free2, &free1).swapped();
        }
    }
    diffs
}

/// The range a diff may move through without touching its neighbors.
fn free_range(
    diffs: &[SequenceDiff],
    idx: usize,
    axis: impl Fn(&SequenceDiff) -> &Range<u32>,
    len: u32,
) -> Range<u32> {
    let start = if idx > 0 { axis(&diffs[idx - 1]).end + 1 } else { 0 };
    let end = if idx + 1 < diffs.len() {
        axis(&diffs[idx + 1]).start.saturating_sub(1)
    } else {
        len
    };
    start..end
}

/// `diff` must be a pure insertion into `seq2` (empty `before` range).
fn shift_to_best_boundary<S1: Sequence, S2: Sequence>(
    diff: &SequenceDiff,
    seq1: &S1,
    seq2: &S2,
    free1: &Range<u32>,
    free2: &Range<u32>,
) -> SequenceDiff {
    let mut shift_left = 1u32;
    while diff.before.start as i64 - shift_left as i64 >= free1.start as i64
        && diff.after.start as i64 - shift_left as i64 >= free2.start as i64
        && seq2.strongly_equal(diff.after.start - shift_left, diff.after.end - shift_left)
        && shift_left < MAX_BOUNDARY_SHIFT
    {
        shift_left += 1;
    }
    shift_left -= 1;

    let mut shift_right = 0u32;
    while diff.before.start + shift_right < free1.end
        && diff.after.end + shift_right < free2.end
        && seq2.strongly_equal(diff.after.start + shift_right, diff.after.end + shift_right)
        && shift_right < MAX_BOUNDARY_SHIFT
    {
        shift_right += 1;
    }

    if shift_left == 0 && shift_right == 0 {
        return diff.clone();
    }

    let mut best_delta = 0i32;
    let mut best_score = i64::MIN;
    for delta in -(shift_left as i32)..=(shift_right as i32) {
        let start2 = (diff.after.start as i32 + delta) as u32;
        let end2 = (diff.after.end as i32 + delta) as u32;
        let cut1 = (diff.before.start as i32 + delta) as u32;
        let score = seq1.boundary_score(cut1) as i64
            + seq2.boundary_score(start2) as i64
            + seq2.boundary_score(end2) as i64;
        if score > best_score {
            best_score = score;
            best_delta = delta;
        }
    }
    diff.delta(best_delta)
}

/// Fuses consecutive diffs whose unchanged gap is at most two elements on
/// either axis.
pub(crate) fn fuse_short_matches(diffs: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    for cur in diffs {
        let joins = result.last().map_or(false, |last| {
            cur.before.start - last.before.end <= 2 || cur.after.start - last.after.end <= 2
        });
        if joins {
            let last = result.last_mut().unwrap();
            last.before.end = cur.before.end;
            last.after.end = cur.after.end;
        } else {
            result.push(cur);
        }
    }
    result
}

/// Line-level pass: fuses diffs separated by nearly-blank lines, provided
/// one of the two neighbors is large. Repeats until a pass changes
/// nothing, capped at ten passes.
pub(crate) fn fuse_whitespace_gaps(
    seq1: &LineSequence,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }
    for _pass in 0..10 {
        let mut changed = false;
        let mut result: Vec<SequenceDiff> = vec![diffs[0].clone()];
        for cur in diffs.iter().skip(1) {
            let last = result.last_mut().unwrap();
            let gap_text = seq1.get_text(last.before.end..cur.before.start);
            let non_whitespace = gap_text.chars().filter(|c| !c.is_whitespace()).count();
            let either_large = range_len(&last.before) + range_len(&last.after) > 5
                || range_len(&cur.before) + range_len(&cur.after) > 5;
            if non_whitespace <= 4 && either_large {
                changed = true;
                last.before.end = cur.before.end;
                last.after.end = cur.after.end;
            } else {
                result.push(cur.clone());
            }
        }
        diffs = result;
        if !changed {
            break;
        }
    }
    diffs
}

/// Inverts an ordered diff list into its equal regions.
fn equal_regions(diffs: &[SequenceDiff], len1: u32, len2: u32) -> Vec<SequenceDiff> {
    let mut regions = Vec::with_capacity(diffs.len() + 1);
    let mut pos1 = 0;
    let mut pos2 = 0;
    for diff in diffs {
        if diff.before.start > pos1 || diff.after.start > pos2 {
            regions.push(SequenceDiff::new(
                pos1..diff.before.start,
                pos2..diff.after.start,
            ));
        }
        pos1 = diff.before.end;
        pos2 = diff.after.end;
    }
    if pos1 < len1 || pos2 < len2 {
        regions.push(SequenceDiff::new(pos1..len1, pos2..len2));
    }
    regions
}

/// Extends diffs over entire words when most of a boundary word changed.
///
/// Scans the word covering each end of each equal region on both
/// sequences. When the unchanged portion of the (joined) word is shorter
/// than two thirds of the word (any changed part at all for `force`, used
/// by the subword pass), a synthetic diff spanning the word is merged into
/// the list, fusing whatever it overlaps.
pub(crate) fn extend_word_diffs(
    seq1: &CharSequence,
    seq2: &CharSequence,
    diffs: Vec<SequenceDiff>,
    find_parent: impl Fn(&CharSequence, u32) -> Option<Range<u32>>,
    force: bool,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }
    let regions = equal_regions(&diffs, seq1.len(), seq2.len());
    let mut additional: Vec<SequenceDiff> = Vec::new();
    let mut scanned_to = (0u32, 0u32);

    for (region_idx, region) in regions.iter().enumerate() {
        if region.before.is_empty() && region.after.is_empty() {
            continue;
        }
        let scan_points = [
            (region.before.start, region.after.start),
            (region.before.end - 1, region.after.end - 1),
        ];
        for (point1, point2) in scan_points {
            if point1 < scanned_to.0 || point2 < scanned_to.1 {
                continue;
            }
            let (Some(word1), Some(word2)) =
                (find_parent(seq1, point1), find_parent(seq2, point2))
            else {
                continue;
            };
            let mut word = SequenceDiff::new(word1, word2);
            let mut equal1 = intersection_len(&word.before, &region.before);
            let mut equal2 = intersection_len(&word.after, &region.after);
            // the word may continue across later diffs into the following
            // equal regions; accumulate their unchanged share as well
            for next in &regions[region_idx + 1..] {
                if !ranges_intersect(&next.before, &word.before)
                    && !ranges_intersect(&next.after, &word.after)
                {
                    break;
                }
                let (Some(cont1), Some(cont2)) = (
                    find_parent(seq1, next.before.start),
                    find_parent(seq2, next.after.start),
                ) else {
                    break;
                };
                let cont = SequenceDiff::new(cont1, cont2);
                equal1 += intersection_len(&cont.before, &next.before);
                equal2 += intersection_len(&cont.after, &next.after);
                word = word.join(&cont);
                if word.before.end < next.before.end {
                    break;
                }
            }
            let equal = (equal1 + equal2) as u64;
            let total = (range_len(&word.before) + range_len(&word.after)) as u64;
            let mostly_changed = if force {
                equal < total
            } else {
                equal * 3 < total * 2
            };
            if mostly_changed {
                additional.push(word.clone());
            }
            scanned_to = (word.before.end, word.after.end);
        }
    }
    if additional.is_empty() {
        return diffs;
    }
    merge_fusing(diffs, additional)
}

/// Merges two ordered diff lists, fusing entries that touch or overlap on
/// either axis.
fn merge_fusing(a: Vec<SequenceDiff>, b: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    fn push(result: &mut Vec<SequenceDiff>, diff: SequenceDiff) {
        let fuses = result.last().map_or(false, |last| {
            last.before.end >= diff.before.start || last.after.end >= diff.after.start
        });
        if fuses {
            let last = result.last_mut().unwrap();
            *last = last.join(&diff);
        } else {
            result.push(diff);
        }
    }

    let mut result = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();
    loop {
        match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => {
                if x.before.start <= y.before.start {
                    let x = a.next().unwrap();
                    push(&mut result, x);
                } else {
                    let y = b.next().unwrap();
                    push(&mut result, y);
                }
            }
            (Some(_), None) => {
                let x = a.next().unwrap();
                push(&mut result, x);
            }
            (None, Some(_)) => {
                let y = b.next().unwrap();
                push(&mut result, y);
            }
            (None, None) => break,
        }
    }
    result
}

/// Char-level pass: fuses diffs whose unchanged gap is tiny (at most five
/// lines, 500 code points, 20 trimmed code points with at most one line
/// break) when a proximity score over the neighboring diff sizes clears a
/// fixed threshold. Afterwards, large diffs absorb up to three trimmed
/// code points of the surrounding line whitespace.
pub(crate) fn fuse_long_diff_neighborhoods(
    seq1: &CharSequence,
    seq2: &CharSequence,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }

    const CAP: f64 = 130.0;
    let contribution = |seq: &CharSequence, range: &Range<u32>| {
        let weight = seq.count_lines(range) as f64 * 40.0 + range_len(range) as f64;
        weight.min(CAP).powf(1.5).powf(1.5)
    };
    let threshold = CAP.powf(1.5).powf(1.5) * 1.3;

    for _pass in 0..10 {
        let mut changed = false;
        let mut result: Vec<SequenceDiff> = vec![diffs[0].clone()];
        for cur in diffs.iter().skip(1) {
            let last = result.last_mut().unwrap();
            let gap = last.before.end..cur.before.start;
            let should_join = 'decide: {
                if seq1.count_lines(&gap) > 5 || range_len(&gap) > 500 {
                    break 'decide false;
                }
                let gap_text = seq1.get_text(&gap);
                let trimmed = gap_text.trim();
                if trimmed.chars().count() > 20 || line_break_count(trimmed) > 1 {
                    break 'decide false;
                }
                let score = contribution(seq1, &last.before)
                    + contribution(seq2, &last.after)
                    + contribution(seq1, &cur.before)
                    + contribution(seq2, &cur.after);
                score > threshold
            };
            if should_join {
                changed = true;
                last.before.end = cur.before.end;
                last.after.end = cur.after.end;
            } else {
                result.push(cur.clone());
            }
        }
        diffs = result;
        if !changed {
            break;
        }
    }

    // let large diffs swallow the bordering line whitespace so highlights
    // snap to line edges
    let mut extended = Vec::with_capacity(diffs.len());
    for idx in 0..diffs.len() {
        let mut diff = diffs[idx].clone();
        if range_len(&diff.before) + range_len(&diff.after) > 100 {
            let full = seq1.extend_to_full_lines(&diff.before);
            let prefix = seq1.get_text(&(full.start..diff.before.start));
            if absorbable(&prefix) {
                diff = diff.delta_start(-(prefix.chars().count() as i32));
            }
            let suffix = seq1.get_text(&(diff.before.end..full.end));
            if absorbable(&suffix) {
                diff = diff.delta_end(suffix.chars().count() as i32);
            }
        }
        let space = SequenceDiff::new(
            free_edge(&diffs, idx, |d| &d.before, seq1.len()),
            free_edge(&diffs, idx, |d| &d.after, seq2.len()),
        );
        extended.push(diff.clamp(&space));
    }
    extended
}

/// Space between the neighboring diffs' endpoints (no margin).
fn free_edge(
    diffs: &[SequenceDiff],
    idx: usize,
    axis: impl Fn(&SequenceDiff) -> &Range<u32>,
    len: u32,
) -> Range<u32> {
    let start = if idx > 0 { axis(&diffs[idx - 1]).end } else { 0 };
    let end = if idx + 1 < diffs.len() {
        axis(&diffs[idx + 1]).start
    } else {
        len
    };
    start..end
}

fn absorbable(text: &str) -> bool {
    !text.is_empty() && text.trim().chars().count() <= 3
}

fn line_break_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\r' => {
                count += 1;
                idx += if bytes.get(idx + 1) == Some(&b'\n') { 2 } else { 1 };
            }
            b'\n' => {
                count += 1;
                idx += 1;
            }
            _ => idx += 1,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use crate::{Position, TextRange};

    fn line_seqs<'a>(
        before: &'a [&'a str],
        after: &'a [&'a str],
        interner: &mut Interner<&'a str>,
    ) -> (LineSequence<'a>, LineSequence<'a>) {
        (
            LineSequence::new(before, interner),
            LineSequence::new(after, interner),
        )
    }

    fn char_seq(lines: &[&str]) -> CharSequence {
        let range = TextRange {
            start: Position { line: 1, column: 1 },
            end: Position {
                line: lines.len() as u32,
                column: lines[lines.len() - 1].chars().count() as u32 + 1,
            },
        };
        CharSequence::new(lines, &range, true)
    }

    #[test]
    fn shifting_joins_adjacent_insertions() {
        // two single-line insertions of "x" separated by an equal "x";
        // sliding the second insertion left over it merges the two
        let before = ["x", "y"];
        let after = ["x", "x", "x", "y"];
        let mut interner = Interner::with_capacity(8);
        let (seq1, seq2) = line_seqs(&before, &after, &mut interner);
        let diffs = vec![
            SequenceDiff::new(0..0, 0..1),
            SequenceDiff::new(1..1, 2..3),
        ];
        let optimized = optimize(&seq1, &seq2, diffs);
        assert_eq!(optimized, vec![SequenceDiff::new(0..0, 0..2)]);
    }

    #[test]
    fn boundary_alignment_moves_insertions_to_flat_lines() {
        // the inserted block can slide between an indented cut and the
        // flat end of the file; the boundary score prefers the flat cut
        let before = ["fn a() {", "    x();", "}"];
        let after = ["fn a() {", "    x();", "}", "", "fn b() {", "    x();", "}"];
        let mut interner = Interner::with_capacity(16);
        let (seq1, seq2) = line_seqs(&before, &after, &mut interner);
        let diffs = vec![SequenceDiff::new(2..2, 2..6)];
        let optimized = optimize(&seq1, &seq2, diffs);
        assert_eq!(optimized, vec![SequenceDiff::new(3..3, 3..7)]);
    }

    #[test]
    fn short_matches_fuse() {
        let diffs = vec![
            SequenceDiff::new(0..2, 0..2),
            SequenceDiff::new(4..6, 4..6),
            SequenceDiff::new(20..21, 20..21),
        ];
        assert_eq!(
            fuse_short_matches(diffs),
            vec![SequenceDiff::new(0..6, 0..6), SequenceDiff::new(20..21, 20..21)]
        );
    }

    #[test]
    fn whitespace_gaps_fuse_next_to_large_diffs() {
        let before = ["old1", "old2", "old3", "old4", "old5", "old6", "x", "old7"];
        let after = ["new1", "new2", "new3", "new4", "new5", "new6", "x", "new7"];
        let mut interner = Interner::with_capacity(16);
        let (seq1, _seq2) = line_seqs(&before, &after, &mut interner);
        let diffs = vec![
            SequenceDiff::new(0..6, 0..6),
            SequenceDiff::new(7..8, 7..8),
        ];
        assert_eq!(
            fuse_whitespace_gaps(&seq1, diffs),
            vec![SequenceDiff::new(0..8, 0..8)]
        );
    }

    #[test]
    fn mostly_changed_words_are_extended() {
        // "world" -> "there": only "r" survives inside the word, so the
        // diffs must grow to cover the whole word on both sides
        let seq1 = char_seq(&["Hello world"]);
        let seq2 = char_seq(&["Hello there"]);
        let diffs = vec![
            SequenceDiff::new(6..8, 6..9),
            SequenceDiff::new(9..11, 10..11),
        ];
        let extended = extend_word_diffs(&seq1, &seq2, diffs, |seq, off| seq.find_word(off), false);
        assert_eq!(extended, vec![SequenceDiff::new(6..11, 6..11)]);
    }

    #[test]
    fn barely_changed_words_are_left_alone() {
        // "d" -> "x" inside "def"/"xef": two thirds of the word is
        // unchanged, not enough to justify extending
        let seq1 = char_seq(&["abc def"]);
        let seq2 = char_seq(&["abc xef"]);
        let diffs = vec![SequenceDiff::new(4..5, 4..5)];
        let extended =
            extend_word_diffs(&seq1, &seq2, diffs.clone(), |seq, off| seq.find_word(off), false);
        assert_eq!(extended, diffs);
    }

    #[test]
    fn optimize_is_idempotent() {
        let before = ["a", "b", "b", "c"];
        let after = ["a", "b", "b", "b", "c"];
        let mut interner = Interner::with_capacity(16);
        let (seq1, seq2) = line_seqs(&before, &after, &mut interner);
        let diffs = vec![SequenceDiff::new(1..1, 1..2)];
        let once = optimize(&seq1, &seq2, diffs);
        let twice = optimize(&seq1, &seq2, once.clone());
        assert_eq!(once, twice);
    }
}
