//! Forward-only Myers O(ND) shortest-edit-script search.
//!
//! See "An O(ND) Difference Algorithm and its Variations" by Eugene Myers.
//! The search walks d-paths from the origin only (no middle-snake divide
//! and conquer): the `V` array holds, per diagonal `k = x - y`, the
//! furthest x reached by a d-path, and a parallel array of back-pointers
//! into a snake arena records the match runs, from which the edit script
//! is reconstructed once the bottom-right corner is reached.

use crate::seq::{EditScript, Sequence};
use crate::timeout::Budget;
use crate::SequenceDiff;

/// Array indexed by diagonal `k = x - y`, which ranges over signed
/// integers. Backed by two contiguous halves grown on demand; reads
/// outside the written area return the default value.
struct DiagonalVec<T> {
    positive: Vec<T>,
    negative: Vec<T>,
    default: T,
}

impl<T: Copy> DiagonalVec<T> {
    fn new(default: T) -> Self {
        DiagonalVec {
            positive: Vec::new(),
            negative: Vec::new(),
            default,
        }
    }

    fn get(&self, k: i32) -> T {
        if k < 0 {
            let idx = (-k - 1) as usize;
            self.negative.get(idx).copied().unwrap_or(self.default)
        } else {
            self.positive.get(k as usize).copied().unwrap_or(self.default)
        }
    }

    fn set(&mut self, k: i32, value: T) {
        let (half, idx) = if k < 0 {
            (&mut self.negative, (-k - 1) as usize)
        } else {
            (&mut self.positive, k as usize)
        };
        if idx >= half.len() {
            half.resize(idx + 1, self.default);
        }
        half[idx] = value;
    }
}

const SNAKE_NONE: u32 = u32::MAX;

/// A maximal diagonal run of matches, chained toward the origin through
/// the arena.
#[derive(Clone, Copy)]
struct Snake {
    x: u32,
    y: u32,
    len: u32,
    prev: u32,
}

pub(crate) fn compute<S: Sequence>(seq1: &S, seq2: &S, budget: &Budget) -> EditScript {
    let len1 = seq1.len();
    let len2 = seq2.len();
    if len1 == 0 || len2 == 0 {
        return EditScript::trivial(len1, len2);
    }
    assert!(
        len1 < i32::MAX as u32 && len2 < i32::MAX as u32,
        "makini-diff only supports up to {} elements",
        i32::MAX
    );

    let x_after_snake = |mut x: u32, mut y: u32| {
        while x < len1 && y < len2 && seq1.element(x) == seq2.element(y) {
            x += 1;
            y += 1;
        }
        x
    };

    let mut snakes: Vec<Snake> = Vec::new();
    // V[k]: furthest x reached by a d-path ending on diagonal k
    let mut v: DiagonalVec<i32> = DiagonalVec::new(0);
    let mut paths: DiagonalVec<u32> = DiagonalVec::new(SNAKE_NONE);

    let first = x_after_snake(0, 0);
    v.set(0, first as i32);
    if first != 0 {
        snakes.push(Snake {
            x: 0,
            y: 0,
            len: first,
            prev: SNAKE_NONE,
        });
        paths.set(0, 0);
    }

    let mut final_k = 0i32;
    if !(first == len1 && first == len2) {
        let mut d = 0i32;
        'search: loop {
            d += 1;
            if !budget.is_inside_budget() {
                return EditScript::trivial_timed_out(len1, len2);
            }
            let lower = -(d.min(len2 as i32 + d % 2));
            let upper = d.min(len1 as i32 + d % 2);
            let mut k = lower;
            while k <= upper {
                // x of the better predecessor: step down from k + 1
                // (insertion) or step right from k - 1 (deletion)
                let max_x_top = if k == upper { -1 } else { v.get(k + 1) };
                let max_x_left = if k == lower { -1 } else { v.get(k - 1) + 1 };
                let x = max_x_top.max(max_x_left).min(len1 as i32);
                let y = x - k;
                if x > len1 as i32 || y > len2 as i32 {
                    // this diagonal cannot contribute to the result
                    k += 2;
                    continue;
                }
                debug_assert!(x >= 0 && y >= 0);
                let new_max_x = x_after_snake(x as u32, y as u32) as i32;
                v.set(k, new_max_x);
                let last_path = if x == max_x_top {
                    paths.get(k + 1)
                } else {
                    paths.get(k - 1)
                };
                let path = if new_max_x != x {
                    snakes.push(Snake {
                        x: x as u32,
                        y: y as u32,
                        len: (new_max_x - x) as u32,
                        prev: last_path,
                    });
                    snakes.len() as u32 - 1
                } else {
                    last_path
                };
                paths.set(k, path);
                if v.get(k) == len1 as i32 && v.get(k) - k == len2 as i32 {
                    final_k = k;
                    break 'search;
                }
                k += 2;
            }
        }
    }

    // walk the snake chain back to the origin, emitting a diff for every
    // gap between consecutive snakes (and at both ends)
    let mut diffs = Vec::new();
    let mut path = paths.get(final_k);
    let mut last_x = len1;
    let mut last_y = len2;
    loop {
        let (end_x, end_y) = if path == SNAKE_NONE {
            (0, 0)
        } else {
            let snake = snakes[path as usize];
            (snake.x + snake.len, snake.y + snake.len)
        };
        if end_x != last_x || end_y != last_y {
            diffs.push(SequenceDiff::new(end_x..last_x, end_y..last_y));
        }
        if path == SNAKE_NONE {
            break;
        }
        let snake = snakes[path as usize];
        last_x = snake.x;
        last_y = snake.y;
        path = snake.prev;
    }
    diffs.reverse();
    EditScript {
        diffs,
        hit_timeout: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use crate::sources::LineSequence;

    fn diff_lines(before: &[&str], after: &[&str]) -> Vec<SequenceDiff> {
        let mut interner = Interner::with_capacity(before.len() + after.len());
        let seq1 = LineSequence::new(before, &mut interner);
        let seq2 = LineSequence::new(after, &mut interner);
        let script = compute(&seq1, &seq2, &Budget::unlimited());
        assert!(!script.hit_timeout);
        script.diffs
    }

    #[test]
    fn equal_sequences_produce_no_diffs() {
        assert_eq!(diff_lines(&["a", "b", "c"], &["a", "b", "c"]), []);
    }

    #[test]
    fn insertion_between_matches() {
        assert_eq!(
            diff_lines(&["a", "c"], &["a", "b", "c"]),
            [SequenceDiff::new(1..1, 1..2)]
        );
    }

    #[test]
    fn disjoint_sequences_produce_one_replacement() {
        assert_eq!(
            diff_lines(&["a", "b"], &["x", "y", "z"]),
            [SequenceDiff::new(0..2, 0..3)]
        );
    }

    #[test]
    fn scattered_changes_stay_ordered_and_disjoint() {
        let diffs = diff_lines(
            &["a", "b", "c", "d", "e", "f"],
            &["a", "x", "c", "d", "y", "f", "g"],
        );
        for window in diffs.windows(2) {
            assert!(window[0].before.end <= window[1].before.start);
            assert!(window[0].after.end <= window[1].after.start);
        }
        assert_eq!(
            diffs,
            [
                SequenceDiff::new(1..2, 1..2),
                SequenceDiff::new(4..5, 4..5),
                SequenceDiff::new(6..6, 6..7),
            ]
        );
    }

    #[test]
    fn expired_budget_yields_the_degenerate_script() {
        let mut interner = Interner::with_capacity(4);
        let seq1 = LineSequence::new(&["a", "b"], &mut interner);
        let seq2 = LineSequence::new(&["c", "d"], &mut interner);
        let script = compute(&seq1, &seq2, &Budget::already_expired());
        assert!(script.hit_timeout);
        assert_eq!(script.diffs, [SequenceDiff::new(0..2, 0..2)]);
    }
}
