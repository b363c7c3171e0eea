use std::hash::Hash;
use std::ops::Index;

use ahash::RandomState;
use hashbrown::raw::RawTable;

/// A line represented as an interned integer.
///
/// Tokens are handed out densely starting at 1, so they double as array
/// indices and `0` stays available as a sentinel. Two values that compare
/// equal receive the same token, distinct values receive distinct tokens.
/// Tokens are only meaningful relative to the [`Interner`] that created
/// them.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Token(pub u32);

/// A hashtable based interner that assigns a dense non-zero id to each
/// distinct value.
///
/// Collisions are resolved by comparing the full stored value, never just
/// its hash, so equal tokens imply equal content. The interner is
/// deterministic within a single pipeline invocation; one instance is
/// shared by both sides of a diff so that ids are comparable across them.
#[derive(Default)]
pub struct Interner<T: Hash + Eq> {
    values: Vec<T>,
    table: RawTable<Token>,
    hasher: RandomState,
}

impl<T: Hash + Eq> Interner<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            values: Vec::with_capacity(capacity),
            table: RawTable::with_capacity(capacity),
            hasher: RandomState::new(),
        }
    }

    /// Returns the token for `value`, creating one if it was never seen.
    /// Expected constant time.
    pub fn get_or_create(&mut self, value: T) -> Token {
        let hash = self.hasher.hash_one(&value);
        if let Some(&token) = self
            .table
            .get(hash, |&it| self.values[it.0 as usize - 1] == value)
        {
            token
        } else {
            let interned = Token(self.values.len() as u32 + 1);
            self.table.insert(hash, interned, |&token| {
                self.hasher.hash_one(&self.values[token.0 as usize - 1])
            });
            self.values.push(value);
            interned
        }
    }

    pub fn num_tokens(&self) -> u32 {
        self.values.len() as u32
    }
}

impl<T: Hash + Eq> Index<Token> for Interner<T> {
    type Output = T;
    fn index(&self, index: Token) -> &Self::Output {
        &self.values[index.0 as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::Interner;

    #[test]
    fn tokens_are_dense_and_nonzero() {
        let mut interner = Interner::with_capacity(4);
        let a = interner.get_or_create("fn main() {");
        let b = interner.get_or_create("}");
        let a2 = interner.get_or_create("fn main() {");
        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);
        assert_eq!(a, a2);
        assert_eq!(interner.num_tokens(), 2);
        assert_eq!(interner[a], "fn main() {");
    }
}
