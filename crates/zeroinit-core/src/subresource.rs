//! Subresource coordinate model.
//!
//! A texture's addressable space is the cross product of its mip levels and its
//! array layers (or, for 3D textures, the single layer 0). [`SubresourceRange`]
//! names a rectangle of that space and hands out fresh traversals on every call:
//! nothing here holds a cursor, so the same range can be walked any number of
//! times and always yields the same sequence.
//!
//! No bounds are checked against a real texture. Intersecting a range with the
//! resource's actual extent is the caller's job.
//!
//! # Example
//!
//! ```
//! use zeroinit_core::{RangeDesc, Subresource, SubresourceRange};
//!
//! let range = SubresourceRange::new(
//!     RangeDesc::Count { begin: 0, count: 2 },
//!     RangeDesc::End { begin: 2, end: 4 },
//! );
//!
//! let all: Vec<_> = range.each().collect();
//! assert_eq!(all.len(), 4);
//! assert_eq!(all[1], Subresource { level: 0, slice: 3 });
//! ```

use std::fmt;

/// Either form a caller may use to describe a half-open interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeDesc {
    /// `[begin, end)`
    End { begin: u32, end: u32 },
    /// `[begin, begin + count)`
    Count { begin: u32, count: u32 },
}

impl RangeDesc {
    pub fn begin(&self) -> u32 {
        match *self {
            RangeDesc::End { begin, .. } | RangeDesc::Count { begin, .. } => begin,
        }
    }

    /// Exclusive end of the interval, whichever form it was given in.
    ///
    /// A `Count` form whose end would pass `u32::MAX` clamps to `u32::MAX`,
    /// so the range then holds `u32::MAX - begin` indices, fewer than `count`.
    pub fn end_of(&self) -> u32 {
        match *self {
            RangeDesc::End { end, .. } => end,
            RangeDesc::Count { begin, count } => begin.saturating_add(count),
        }
    }
}

/// Half-open integer interval `[begin, end)`, normalized at construction.
///
/// `begin == end` is a valid empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub begin: u32,
    pub end: u32,
}

impl Range {
    /// Build `[begin, end)`. An inverted pair collapses to the empty range at `begin`.
    pub const fn new(begin: u32, end: u32) -> Self {
        let end = if end < begin { begin } else { end };
        Self { begin, end }
    }

    /// Build `[begin, begin + count)`, clamping the end to `u32::MAX` like
    /// [`RangeDesc::end_of`].
    pub const fn with_count(begin: u32, count: u32) -> Self {
        Self::new(begin, begin.saturating_add(count))
    }

    /// A range covering exactly one index.
    pub const fn single(index: u32) -> Self {
        Self::with_count(index, 1)
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.begin
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    #[inline]
    pub const fn contains(&self, index: u32) -> bool {
        index >= self.begin && index < self.end
    }

    pub const fn overlaps(&self, other: &Range) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Fresh iterator over the indices in the range.
    #[inline]
    pub fn iter(&self) -> std::ops::Range<u32> {
        self.begin..self.end
    }
}

impl From<RangeDesc> for Range {
    fn from(desc: RangeDesc) -> Self {
        Range::new(desc.begin(), desc.end_of())
    }
}

impl From<std::ops::Range<u32>> for Range {
    fn from(range: std::ops::Range<u32>) -> Self {
        Range::new(range.start, range.end)
    }
}

impl IntoIterator for Range {
    type Item = u32;
    type IntoIter = std::ops::Range<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// One addressable `(mip level, array layer)` point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subresource {
    pub level: u32,
    pub slice: u32,
}

impl fmt::Display for Subresource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} slice {}", self.level, self.slice)
    }
}

/// A rectangle of a texture's subresource space: mip levels × array layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubresourceRange {
    pub mip_range: Range,
    pub layer_range: Range,
}

impl SubresourceRange {
    pub fn new(mip_range: impl Into<Range>, layer_range: impl Into<Range>) -> Self {
        Self {
            mip_range: mip_range.into(),
            layer_range: layer_range.into(),
        }
    }

    /// The range holding exactly one subresource.
    pub fn single(subresource: Subresource) -> Self {
        Self::new(
            Range::single(subresource.level),
            Range::single(subresource.slice),
        )
    }

    /// Number of subresources in the rectangle.
    pub fn count(&self) -> u64 {
        self.mip_range.len() as u64 * self.layer_range.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mip_range.is_empty() || self.layer_range.is_empty()
    }

    pub fn contains(&self, subresource: Subresource) -> bool {
        self.mip_range.contains(subresource.level) && self.layer_range.contains(subresource.slice)
    }

    pub fn intersects(&self, other: &SubresourceRange) -> bool {
        self.mip_range.overlaps(&other.mip_range) && self.layer_range.overlaps(&other.layer_range)
    }

    /// Every subresource in the range, levels outer, slices inner.
    pub fn each(&self) -> Subresources {
        Subresources {
            mip_begin: self.mip_range.begin,
            layer_range: self.layer_range,
            front: 0,
            back: self.count(),
        }
    }

    /// One entry per mip level, each carrying the slice range for that level.
    ///
    /// Lets callers batch per-level work (one copy covering several layers)
    /// without materializing the full cross product.
    pub fn mip_levels(&self) -> MipLevels {
        MipLevels {
            levels: self.mip_range.iter(),
            layer_range: self.layer_range,
        }
    }
}

impl fmt::Display for SubresourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mips {} × layers {}", self.mip_range, self.layer_range)
    }
}

impl<'a> IntoIterator for &'a SubresourceRange {
    type Item = Subresource;
    type IntoIter = Subresources;

    fn into_iter(self) -> Self::IntoIter {
        self.each()
    }
}

/// Row-major traversal returned by [`SubresourceRange::each`].
#[derive(Debug, Clone)]
pub struct Subresources {
    mip_begin: u32,
    layer_range: Range,
    front: u64,
    back: u64,
}

impl Subresources {
    fn at(&self, index: u64) -> Subresource {
        let layers = self.layer_range.len() as u64;
        Subresource {
            level: self.mip_begin + (index / layers) as u32,
            slice: self.layer_range.begin + (index % layers) as u32,
        }
    }
}

impl Iterator for Subresources {
    type Item = Subresource;

    fn next(&mut self) -> Option<Subresource> {
        if self.front >= self.back {
            return None;
        }
        let item = self.at(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.back - self.front) as usize;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Subresources {
    fn next_back(&mut self) -> Option<Subresource> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.at(self.back))
    }
}

impl ExactSizeIterator for Subresources {}

impl std::iter::FusedIterator for Subresources {}

/// A mip level together with the slices it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub level: u32,
    pub slices: std::ops::Range<u32>,
}

/// Per-level traversal returned by [`SubresourceRange::mip_levels`].
#[derive(Debug, Clone)]
pub struct MipLevels {
    levels: std::ops::Range<u32>,
    layer_range: Range,
}

impl Iterator for MipLevels {
    type Item = MipLevel;

    fn next(&mut self) -> Option<MipLevel> {
        let level = self.levels.next()?;
        Some(MipLevel {
            level,
            slices: self.layer_range.iter(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.levels.size_hint()
    }
}

impl ExactSizeIterator for MipLevels {}
