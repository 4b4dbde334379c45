use std::{
    cmp::{max, min},
    collections::{btree_map::Iter, BTreeMap},
    ops::Range,
};

/// Set of ranges where overlapping or touching ranges are merged on
/// insertion.
#[derive(Debug, Clone)]
pub struct OverlappingRanges<T: Ord + Copy> {
    ranges: BTreeMap<T, T>,
}

impl<T: Ord + Copy> OverlappingRanges<T> {
    pub fn new() -> OverlappingRanges<T> {
        OverlappingRanges {
            ranges: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, range: Range<T>) {
        use std::ops::Bound::*;

        let Range { mut start, mut end } = range;
        if start >= end {
            return;
        }

        let mut lower = self.ranges.range((Unbounded, Excluded(start)));
        if let Some((s, e)) = lower.next_back() {
            if start <= *e {
                start = min(*s, start);
                end = max(end, *e);
            }
        }

        let mut remove = vec![];
        let higher = self.ranges.range((Included(start), Unbounded));
        for (s, e) in higher {
            if *s <= end {
                start = min(*s, start);
                end = max(end, *e);
                remove.push(*s);
            } else {
                break;
            }
        }

        for rem in remove {
            self.ranges.remove(&rem);
        }

        self.ranges.insert(start, end);
    }

    pub fn contains(&self, pos: T) -> bool {
        use std::ops::Bound::*;

        self.ranges
            .range((Unbounded, Included(pos)))
            .next_back()
            .map(|(_, e)| pos < *e)
            .unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn iter(&self) -> OverlappingRangeIter<'_, T> {
        let iter = self.ranges.iter();
        OverlappingRangeIter { iter }
    }
}

impl OverlappingRanges<u64> {
    /// Open a gap of `len` at `pos`. Ranges at or after `pos` move right, a
    /// range spanning `pos` grows to cover the gap.
    pub fn insert_gap(&mut self, pos: u64, len: u64) {
        if len == 0 {
            return;
        }

        let old = std::mem::take(&mut self.ranges);
        for (s, e) in old {
            let (s, e) = if s >= pos {
                (s + len, e + len)
            } else if pos < e {
                (s, e + len)
            } else {
                (s, e)
            };
            self.ranges.insert(s, e);
        }
    }

    /// Close the gap `range`. Parts of ranges inside it are dropped and
    /// ranges after it move left.
    pub fn remove_gap(&mut self, range: Range<u64>) {
        let Range { start, end } = range;
        if start >= end {
            return;
        }

        let removed = end - start;
        let shift = |x: u64| {
            if x <= start {
                x
            } else if x >= end {
                x - removed
            } else {
                start
            }
        };

        let old = std::mem::take(&mut self.ranges);
        for (s, e) in old {
            self.add(shift(s)..shift(e));
        }
    }
}

impl<T: Ord + Copy> Default for OverlappingRanges<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct OverlappingRangeIter<'a, T: Ord + Copy> {
    iter: Iter<'a, T, T>,
}

impl<'a, T: Ord + Copy> Iterator for OverlappingRangeIter<'a, T> {
    type Item = Range<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let (s, e) = self.iter.next()?;
        Some(*s..*e)
    }
}

impl<'a, T: Ord + Copy> DoubleEndedIterator for OverlappingRangeIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (s, e) = self.iter.next_back()?;
        Some(*s..*e)
    }
}
