use std::ops::Range;

pub fn range_len(range: &Range<u32>) -> u32 {
    range.end - range.start
}

/// Whether the two half-open ranges share at least one element.
pub fn ranges_intersect(a: &Range<u32>, b: &Range<u32>) -> bool {
    a.start.max(b.start) < a.end.min(b.end)
}

pub fn intersection_len(a: &Range<u32>, b: &Range<u32>) -> u32 {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    end.saturating_sub(start)
}

pub fn join_ranges(a: &Range<u32>, b: &Range<u32>) -> Range<u32> {
    a.start.min(b.start)..a.end.max(b.end)
}

pub fn shift_range(range: &Range<u32>, delta: i32) -> Range<u32> {
    let start = (range.start as i64 + delta as i64).max(0) as u32;
    let end = (range.end as i64 + delta as i64).max(0) as u32;
    start..end
}
