//! Half-open byte ranges

/// Byte range `[offset, offset + len)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: u64,
    pub len: u64,
}

impl Region {
    pub fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// One past the last byte
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `pos` lies inside the range
    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.offset && pos < self.end()
    }

    /// Whether `other` lies entirely inside this range.
    ///
    /// An empty `other` is covered only when its offset is inside.
    pub fn covers(&self, other: &Region) -> bool {
        if other.is_empty() {
            return self.contains(other.offset);
        }
        other.offset >= self.offset && other.end() <= self.end()
    }

    /// Intersection of two ranges, if non-empty
    pub fn overlap(&self, other: &Region) -> Option<Region> {
        let start = self.offset.max(other.offset);
        let end = self.end().min(other.end());
        (start < end).then(|| Region::new(start, end - start))
    }
}
