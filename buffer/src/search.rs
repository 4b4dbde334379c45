pub(crate) mod needle;

use std::cmp::max;

use bytedit_utils::sat;

pub use needle::{parse_needle, unhex, NeedleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Boyer-Moore searcher finding the first occurrence of a pattern.
#[derive(Debug, Clone)]
pub struct Searcher {
    pattern: Vec<u8>,
    bad_char: [usize; 256],
    good_suffix: Box<[usize]>,
}

impl Searcher {
    /// Create a searcher, the pattern must not be empty
    pub fn new(pattern: &[u8]) -> Searcher {
        debug_assert!(!pattern.is_empty(), "Searcher: empty pattern");
        Searcher {
            bad_char: Self::build_bad_char_table(pattern),
            good_suffix: Self::build_good_suffix_table(pattern),
            pattern: pattern.into(),
        }
    }

    fn build_bad_char_table(pattern: &[u8]) -> [usize; 256] {
        let mut table = [pattern.len(); 256];
        let last = pattern.len() - 1;

        for i in 0..last {
            table[pattern[i] as usize] = last - i;
        }

        table
    }

    /// Shift for a mismatch after `k` matched bytes, indexed by `k`.
    fn build_good_suffix_table(pattern: &[u8]) -> Box<[usize]> {
        let m = pattern.len();
        let mut table: Box<[usize]> = vec![0; m].into();
        let mut last_prefix = m;

        for i in (1..=m).rev() {
            if Self::is_prefix(pattern, i) {
                last_prefix = i;
            }
            table[m - i] = last_prefix - i + m;
        }

        for i in 0..m - 1 {
            let slen = Self::suffix_len(pattern, i);
            table[slen] = m - 1 - i + slen;
        }

        table
    }

    /// Whether `pattern[p..]` is also a prefix of the pattern
    fn is_prefix(pattern: &[u8], p: usize) -> bool {
        let suffix = &pattern[p..];
        pattern.starts_with(suffix)
    }

    /// Length of the longest common suffix of `pattern[..=p]` and `pattern`
    fn suffix_len(pattern: &[u8], p: usize) -> usize {
        pattern[..=p]
            .iter()
            .rev()
            .zip(pattern.iter().rev())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Find the first match in `haystack`
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        self.find_by(haystack.len(), |i| haystack[i])
    }

    /// Find the first match in a haystack of length `n` accessed through
    /// `at`.
    fn find_by<F: Fn(usize) -> u8>(&self, n: usize, at: F) -> Option<usize> {
        let pattern = &self.pattern;
        let m = pattern.len();
        let mut i = m - 1;

        while i < n {
            let mut j = m - 1;
            while at(i) == pattern[j] {
                if j == 0 {
                    return Some(i);
                }

                j -= 1;
                i -= 1;
            }

            i += max(self.good_suffix[m - 1 - j], self.bad_char[at(i) as usize]);
        }

        None
    }
}

/// Boyer-Moore searcher finding the last occurrence of a pattern by running
/// the reversed pattern over the haystack from the end.
#[derive(Debug, Clone)]
pub struct SearcherRev {
    inner: Searcher,
}

impl SearcherRev {
    pub fn new(pattern: &[u8]) -> SearcherRev {
        let reversed: Vec<u8> = pattern.iter().rev().copied().collect();
        SearcherRev {
            inner: Searcher::new(&reversed),
        }
    }

    /// Find the last match in `haystack`
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        let n = haystack.len();
        let m = self.inner.pattern.len();
        let rpos = self.inner.find_by(n, |i| haystack[n - 1 - i])?;
        Some(n - rpos - m)
    }
}

/// Circular search for `needle` starting at `start`. Candidate offsets are
/// visited one by one in `dir`, wrapping around the haystack end once. A
/// match must fit inside the haystack, matches never wrap.
pub fn search(haystack: &[u8], needle: &[u8], start: u64, dir: Direction) -> Option<u64> {
    let n = haystack.len();
    let m = needle.len();
    if n == 0 || m == 0 || m > n {
        return None;
    }

    let start = sat::clamp(start, 0, n as u64 - 1) as usize;
    let found = match dir {
        Direction::Forward => {
            let searcher = Searcher::new(needle);
            searcher
                .find(&haystack[start..])
                .map(|pos| pos + start)
                .or_else(|| {
                    // Matches starting before start
                    let end = (start + m - 1).min(n);
                    searcher.find(&haystack[..end])
                })
        }
        Direction::Backward => {
            let searcher = SearcherRev::new(needle);
            let end = (start + m).min(n);
            searcher.find(&haystack[..end]).or_else(|| {
                // Matches starting after start
                let from = start + 1;
                searcher.find(&haystack[from..]).map(|pos| pos + from)
            })
        }
    };

    found.map(|pos| pos as u64)
}

#[cfg(test)]
mod test {
    use super::*;

    fn naive(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn boyer_moore() {
        let text = b"world. This is another world. In another universe. Other worldy creatures. worl orld world";
        let searcher = Searcher::new(b"world");
        assert_eq!(Some(0), searcher.find(text));
        assert_eq!(Some(23), searcher.find(&text[1..]).map(|p| p + 1));
        assert_eq!(None, Searcher::new(b"planet").find(text));

        let rsearcher = SearcherRev::new(b"world");
        assert_eq!(Some(text.len() - 5), rsearcher.find(text));
    }

    #[test]
    fn matches_naive() {
        let hay = b"abaababaabaababaababaabbabababbaabaabbaababbabaabaababa";
        let needles: [&[u8]; 8] = [b"a", b"ab", b"aba", b"abab", b"baab", b"bb", b"aabaab", b"ccc"];

        for needle in needles {
            let searcher = Searcher::new(needle);
            for start in 0..hay.len() {
                let expected = naive(&hay[start..], needle).map(|p| p + start);
                assert_eq!(
                    expected,
                    searcher.find(&hay[start..]).map(|p| p + start),
                    "needle {needle:?} from {start}"
                );
            }

            let rsearcher = SearcherRev::new(needle);
            for end in 0..=hay.len() {
                let expected = hay[..end]
                    .windows(needle.len())
                    .rposition(|w| w == needle);
                assert_eq!(expected, rsearcher.find(&hay[..end]), "needle {needle:?} to {end}");
            }
        }
    }

    #[test]
    fn forward_wraps() {
        assert_eq!(Some(3), search(b"xxxabc", b"abc", 4, Direction::Forward));
        assert_eq!(Some(4), search(b"abcXabc", b"abc", 3, Direction::Forward));
        assert_eq!(Some(0), search(b"abcXabc", b"abc", 5, Direction::Forward));
    }

    #[test]
    fn backward_wraps() {
        assert_eq!(Some(0), search(b"abcXabc", b"abc", 3, Direction::Backward));
        assert_eq!(Some(4), search(b"abcXabc", b"abc", 4, Direction::Backward));
        assert_eq!(Some(3), search(b"abcxxx", b"xxx", 1, Direction::Backward));
    }

    #[test]
    fn start_is_candidate() {
        assert_eq!(Some(2), search(b"abcabc", b"ca", 2, Direction::Forward));
        assert_eq!(Some(2), search(b"abcabc", b"ca", 2, Direction::Backward));
    }

    #[test]
    fn not_found() {
        assert_eq!(None, search(b"abcdef", b"xyz", 2, Direction::Forward));
        assert_eq!(None, search(b"abcdef", b"xyz", 2, Direction::Backward));
        assert_eq!(None, search(b"", b"a", 0, Direction::Forward));
        assert_eq!(None, search(b"abc", b"", 0, Direction::Forward));
        assert_eq!(None, search(b"ab", b"abc", 0, Direction::Forward));
    }

    #[test]
    fn start_past_end_is_clamped() {
        assert_eq!(Some(0), search(b"abc", b"a", 10, Direction::Forward));
        assert_eq!(Some(2), search(b"abc", b"c", 10, Direction::Backward));
    }
}
