use std::collections::BTreeMap;

/// Index range `[first, last]` of a snapshot whose endpoints close a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClosingPair {
    pub first: usize,
    pub last: usize,
}

impl ClosingPair {
    pub fn new(first: usize, last: usize) -> Self {
        ClosingPair { first, last }
    }

    pub fn contains(&self, other: &ClosingPair) -> bool {
        self.first <= other.first && self.last >= other.last
    }
}

/// Set of closing pairs in which no pair is contained in another.
///
/// Inserting a pair that is already covered is a no-op; inserting a pair that covers
/// existing ones removes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosingPairs {
    pairs: BTreeMap<usize, usize>,
}

impl ClosingPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Pairs ordered by `first`.
    pub fn iter(&self) -> impl Iterator<Item = ClosingPair> + '_ {
        self.pairs.iter().map(|(&first, &last)| ClosingPair::new(first, last))
    }

    /// The stored pair containing `pair`, if any.
    pub fn find_range(&self, pair: ClosingPair) -> Option<ClosingPair> {
        self.pairs
            .range(..=pair.first)
            .map(|(&first, &last)| ClosingPair::new(first, last))
            .find(|stored| stored.last >= pair.last)
    }

    /// Return
    /// ----------
    /// * `true` if the pair was stored.
    pub fn insert(&mut self, pair: ClosingPair) -> bool {
        if self.find_range(pair).is_some() {
            return false;
        }

        self.pairs.insert(pair.first, pair.last);
        // later pairs now covered by the new one
        let covered: Vec<usize> = self
            .pairs
            .range(pair.first + 1..)
            .take_while(|(&first, _)| first <= pair.last)
            .filter(|(_, &last)| last <= pair.last)
            .map(|(&first, _)| first)
            .collect();
        for first in covered {
            self.pairs.remove(&first);
        }
        true
    }
}
