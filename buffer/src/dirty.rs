use std::ops::Range;

use bytedit_utils::ranges::OverlappingRanges;

use crate::region::ChangeKind;

/// Spans edited since the last load or save. Used for highlighting only, the
/// saved state of a buffer is tracked by its modification distance.
#[derive(Debug, Default)]
pub(crate) struct DirtyMarks {
    ranges: OverlappingRanges<u64>,
}

impl DirtyMarks {
    pub fn mark(&mut self, kind: ChangeKind, pos: u64, len: u64) {
        match kind {
            ChangeKind::Overwrite => self.ranges.add(pos..pos + len),
            ChangeKind::Insert => {
                self.ranges.insert_gap(pos, len);
                self.ranges.add(pos..pos + len);
            }
            ChangeKind::Delete => self.ranges.remove_gap(pos..pos + len),
        }
    }

    pub fn contains(&self, pos: u64) -> bool {
        self.ranges.contains(pos)
    }

    pub fn ranges(&self) -> Vec<Range<u64>> {
        self.ranges.iter().collect()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
