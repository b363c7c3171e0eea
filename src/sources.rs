//! Input views over line-based text.
//!
//! The diff pipeline consumes pre-split lines without their terminators;
//! [`lines`] splits a whole text accordingly, [`LineSequence`] wraps one
//! side of a diff as a [`Sequence`](crate::seq::Sequence) for the engines.

use std::ops::Range;
use std::str::from_utf8_unchecked;

use memchr::memchr;

use crate::intern::{Interner, Token};
use crate::seq::Sequence;

/// Splits `data` into lines, stripping the `\n` or `\r\n` terminators.
///
/// The final line is always emitted, even when empty: `"a\n"` yields
/// `["a", ""]` just like an editor buffer would, and `""` yields `[""]`.
pub fn lines(data: &str) -> Lines<'_> {
    Lines {
        rest: data.as_bytes(),
        done: false,
    }
}

/// Iterator returned by [`lines`].
#[derive(Clone, Copy)]
pub struct Lines<'a> {
    rest: &'a [u8],
    done: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let line = match memchr(b'\n', self.rest) {
            Some(newline) => {
                let line = &self.rest[..newline];
                self.rest = &self.rest[newline + 1..];
                line.strip_suffix(b"\r").unwrap_or(line)
            }
            None => {
                self.done = true;
                self.rest
            }
        };
        // safety invariant: dividing valid utf8 at ascii characters always
        // produces valid utf8
        Some(unsafe { from_utf8_unchecked(line) })
    }
}

/// Sequence over the lines of one side of a diff.
///
/// Element ids are the interned token of the whitespace-trimmed line, so
/// two lines differing only in surrounding whitespace share an id;
/// `strongly_equal` compares the original text and stays authoritative.
/// The boundary score prefers cutting at low-indentation lines.
pub(crate) struct LineSequence<'a> {
    tokens: Vec<Token>,
    lines: Vec<&'a str>,
}

impl<'a> LineSequence<'a> {
    pub fn new<S: AsRef<str>>(lines: &'a [S], interner: &mut Interner<&'a str>) -> Self {
        let lines: Vec<&'a str> = lines.iter().map(|line| line.as_ref()).collect();
        let tokens = lines
            .iter()
            .map(|line| interner.get_or_create(line.trim_matches(|c: char| c.is_ascii_whitespace())))
            .collect();
        LineSequence { tokens, lines }
    }

    /// The unchanged text of `range`, lines joined by `\n`.
    pub fn get_text(&self, range: Range<u32>) -> String {
        self.lines[range.start as usize..range.end as usize].join("\n")
    }
}

fn indentation(line: &str) -> u32 {
    line.bytes()
        .take_while(|&byte| byte == b' ' || byte == b'\t')
        .count() as u32
}

impl Sequence for LineSequence<'_> {
    fn element(&self, offset: u32) -> u32 {
        self.tokens[offset as usize].0
    }

    fn len(&self) -> u32 {
        self.lines.len() as u32
    }

    fn strongly_equal(&self, offset1: u32, offset2: u32) -> bool {
        self.lines[offset1 as usize] == self.lines[offset2 as usize]
    }

    fn boundary_score(&self, length: u32) -> i32 {
        let before = if length == 0 {
            0
        } else {
            indentation(self.lines[length as usize - 1])
        };
        let after = if length == self.len() {
            0
        } else {
            indentation(self.lines[length as usize])
        };
        1000 - (before + after) as i32
    }

    fn supports_boundary_score(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_splitting() {
        assert_eq!(lines("a\nb").collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(lines("a\r\nb\n").collect::<Vec<_>>(), ["a", "b", ""]);
        assert_eq!(lines("").collect::<Vec<_>>(), [""]);
    }

    #[test]
    fn boundary_score_prefers_low_indentation() {
        let mut interner = Interner::with_capacity(4);
        let source = ["fn foo() {", "    body();", "}"];
        let seq = LineSequence::new(&source, &mut interner);
        assert_eq!(seq.boundary_score(0), 1000);
        assert_eq!(seq.boundary_score(1), 996);
        assert_eq!(seq.boundary_score(2), 996);
        assert_eq!(seq.boundary_score(3), 1000);
        assert!(seq.boundary_score(0) > seq.boundary_score(1));
    }

    #[test]
    fn trimmed_ids_alias_but_strong_equality_does_not() {
        let mut interner = Interner::with_capacity(4);
        let source = ["  indented", "indented"];
        let seq = LineSequence::new(&source, &mut interner);
        assert_eq!(seq.element(0), seq.element(1));
        assert!(!seq.strongly_equal(0, 1));
    }
}
