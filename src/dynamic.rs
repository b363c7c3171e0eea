//! Scorer-based dynamic-programming aligner.
//!
//! For small inputs this produces nicer alignments than the shortest edit
//! script: matched pairs earn a caller-provided score (longer lines are
//! worth more at line granularity) and consecutive matches earn their run
//! length on top, so the alignment gravitates toward long unbroken runs.

use crate::seq::{EditScript, Sequence};
use crate::timeout::Budget;
use crate::SequenceDiff;

const DIAGONAL: u8 = 3;
const HORIZONTAL: u8 = 1;
const VERTICAL: u8 = 2;

struct Grid<T> {
    width: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    fn new(width: usize, height: usize, fill: T) -> Self {
        Grid {
            width,
            cells: vec![fill; width * height],
        }
    }

    fn get(&self, x: usize, y: usize) -> T {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, value: T) {
        self.cells[y * self.width + x] = value;
    }
}

/// Aligns `seq1` against `seq2` maximizing the summed `score` of matched
/// pairs. `score(i, j)` is only consulted for pairs whose element ids are
/// equal. Ties prefer the diagonal, so equal-scoring alignments resolve to
/// the lexicographically smallest diff positions.
pub(crate) fn compute<S: Sequence>(
    seq1: &S,
    seq2: &S,
    budget: &Budget,
    score: impl Fn(u32, u32) -> f64,
) -> EditScript {
    let len1 = seq1.len() as usize;
    let len2 = seq2.len() as usize;
    if len1 == 0 || len2 == 0 {
        return EditScript::trivial(seq1.len(), seq2.len());
    }

    // total[i][j]: best score aligning seq1[..=i] with seq2[..=j]
    let mut total = Grid::new(len1, len2, 0.0f64);
    let mut directions = Grid::new(len1, len2, 0u8);
    // run length of consecutive diagonal matches ending at a cell
    let mut lengths = Grid::new(len1, len2, 0u32);

    for i in 0..len1 {
        if !budget.is_inside_budget() {
            return EditScript::trivial_timed_out(seq1.len(), seq2.len());
        }
        for j in 0..len2 {
            let horizontal = if i == 0 { 0.0 } else { total.get(i - 1, j) };
            let vertical = if j == 0 { 0.0 } else { total.get(i, j - 1) };
            let extended = if seq1.element(i as u32) == seq2.element(j as u32) {
                let mut extended = if i == 0 || j == 0 {
                    0.0
                } else {
                    total.get(i - 1, j - 1)
                };
                if i > 0 && j > 0 && directions.get(i - 1, j - 1) == DIAGONAL {
                    // consecutive matches are worth their run length
                    extended += lengths.get(i - 1, j - 1) as f64;
                }
                extended + score(i as u32, j as u32)
            } else {
                -1.0
            };
            let value = horizontal.max(vertical).max(extended);
            if value == extended {
                let run = if i > 0 && j > 0 {
                    lengths.get(i - 1, j - 1)
                } else {
                    0
                };
                lengths.set(i, j, run + 1);
                directions.set(i, j, DIAGONAL);
            } else if value == horizontal {
                lengths.set(i, j, 0);
                directions.set(i, j, HORIZONTAL);
            } else {
                lengths.set(i, j, 0);
                directions.set(i, j, VERTICAL);
            }
            total.set(i, j, value);
        }
    }

    // walk the direction matrix back, emitting a diff for the gap between
    // consecutive aligned pairs (and at both ends)
    fn aligned_gap(i: i64, j: i64, last_i: i64, last_j: i64) -> Option<SequenceDiff> {
        if i + 1 != last_i || j + 1 != last_j {
            Some(SequenceDiff::new(
                (i + 1) as u32..last_i as u32,
                (j + 1) as u32..last_j as u32,
            ))
        } else {
            None
        }
    }

    let mut diffs = Vec::new();
    let mut last_i = len1 as i64;
    let mut last_j = len2 as i64;
    let mut i = len1 as i64 - 1;
    let mut j = len2 as i64 - 1;
    while i >= 0 && j >= 0 {
        match directions.get(i as usize, j as usize) {
            DIAGONAL => {
                diffs.extend(aligned_gap(i, j, last_i, last_j));
                last_i = i;
                last_j = j;
                i -= 1;
                j -= 1;
            }
            HORIZONTAL => i -= 1,
            _ => j -= 1,
        }
    }
    diffs.extend(aligned_gap(-1, -1, last_i, last_j));
    diffs.reverse();
    EditScript {
        diffs,
        hit_timeout: false,
    }
}
