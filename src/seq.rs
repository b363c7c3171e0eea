use crate::SequenceDiff;

/// A read-only ordered collection that the diff engines operate on.
///
/// `element` returns a fast-to-compare id that may alias under hashing or
/// trimming; `strongly_equal` is the authoritative comparison and never
/// aliases. `element(i) == element(j)` is necessary but not sufficient for
/// true equality.
pub trait Sequence {
    /// The element id at `offset`.
    fn element(&self, offset: u32) -> u32;

    /// Number of elements.
    fn len(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact equality of the elements at two offsets of this sequence.
    fn strongly_equal(&self, offset1: u32, offset2: u32) -> bool;

    /// How natural it is to cut the sequence between positions `length - 1`
    /// and `length`. Defined for every `length` in `0..=len()`. Higher is
    /// better. Only meaningful when `supports_boundary_score` is true.
    fn boundary_score(&self, _length: u32) -> i32 {
        0
    }

    /// Whether `boundary_score` expresses a real preference. Optimizers
    /// that align diffs to natural boundaries skip sequences without one.
    fn supports_boundary_score(&self) -> bool {
        false
    }
}

/// Outcome of one engine invocation: an ordered, disjoint edit script and
/// whether the wall-clock budget expired while computing it.
pub struct EditScript {
    pub diffs: Vec<SequenceDiff>,
    pub hit_timeout: bool,
}

impl EditScript {
    /// The over-approximated result used for empty inputs: one diff
    /// replacing all of the first sequence with all of the second.
    pub fn trivial(len1: u32, len2: u32) -> EditScript {
        let diffs = if len1 == 0 && len2 == 0 {
            Vec::new()
        } else {
            vec![SequenceDiff::new(0..len1, 0..len2)]
        };
        EditScript {
            diffs,
            hit_timeout: false,
        }
    }

    /// Same shape as [`EditScript::trivial`], returned when the budget
    /// expired before the search finished.
    pub fn trivial_timed_out(len1: u32, len2: u32) -> EditScript {
        EditScript {
            diffs: vec![SequenceDiff::new(0..len1, 0..len2)],
            hit_timeout: true,
        }
    }
}
