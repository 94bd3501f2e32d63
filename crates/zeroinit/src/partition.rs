//! Which subresources of a case are checked and which serve as controls.
//!
//! Testing every subresource would multiply the matrix by levels × layers.
//! Instead a case leaves a few ranges uninitialized (the first level, an
//! interior level, and a boundary layer) and treats everything else as
//! controls that are written with canary data and must come back unchanged.

use zeroinit_core::{Range, Subresource, SubresourceRange};

/// Uninitialized mip ranges for the level counts the matrix uses.
fn mip_ranges(count: u32) -> Vec<Range> {
    match count {
        1 => vec![Range::new(0, 1)],
        5 => vec![Range::new(0, 2), Range::new(3, 4)],
        n => fallback_ranges(n),
    }
}

/// Uninitialized layer ranges for the layer counts the matrix uses.
fn layer_ranges(count: u32) -> Vec<Range> {
    match count {
        1 => vec![Range::new(0, 1)],
        7 => vec![Range::new(2, 4), Range::new(6, 7)],
        n => fallback_ranges(n),
    }
}

/// The leading third (at least one) and the last index, merged when they meet.
fn fallback_ranges(count: u32) -> Vec<Range> {
    if count == 0 {
        return Vec::new();
    }
    let first = Range::new(0, (count / 3).max(1));
    let last = Range::new(count - 1, count);
    if last.begin <= first.end {
        vec![Range::new(0, count)]
    } else {
        vec![first, last]
    }
}

/// Disjoint split of a texture's subresources into the set under test and
/// the control set.
///
/// Every subresource of the texture lands in exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubresourcePartition {
    mip_level_count: u32,
    layer_count: u32,
    uninitialized: Vec<SubresourceRange>,
    initialized: Vec<SubresourceRange>,
}

impl SubresourcePartition {
    /// The fixed partition for a texture with these counts.
    ///
    /// # Example
    ///
    /// ```
    /// use zeroinit::SubresourcePartition;
    ///
    /// let partition = SubresourcePartition::for_counts(5, 7);
    /// assert_eq!(partition.uninitialized().len(), 4);
    /// assert_eq!(partition.uninitialized_count() + partition.initialized_count(), 35);
    /// ```
    pub fn for_counts(mip_level_count: u32, layer_count: u32) -> Self {
        let mips = mip_ranges(mip_level_count);
        let layers = layer_ranges(layer_count);
        let uninitialized = mips
            .iter()
            .flat_map(|&mip| layers.iter().map(move |&layer| SubresourceRange::new(mip, layer)))
            .collect();
        Self::from_uninitialized(mip_level_count, layer_count, uninitialized)
    }

    /// A partition whose set under test is exactly `uninitialized`; every
    /// other subresource of the texture becomes a control.
    ///
    /// Ranges are clipped to the texture and empty ranges are dropped.
    pub fn from_uninitialized(
        mip_level_count: u32,
        layer_count: u32,
        uninitialized: Vec<SubresourceRange>,
    ) -> Self {
        let clip = |range: Range, count: u32| Range::new(range.begin.min(count), range.end.min(count));
        let uninitialized: Vec<SubresourceRange> = uninitialized
            .into_iter()
            .map(|range| SubresourceRange {
                mip_range: clip(range.mip_range, mip_level_count),
                layer_range: clip(range.layer_range, layer_count),
            })
            .filter(|range| !range.is_empty())
            .collect();

        let mut initialized = Vec::new();
        for level in 0..mip_level_count {
            let mut run: Option<u32> = None;
            for layer in 0..=layer_count {
                let free = layer < layer_count
                    && !uninitialized
                        .iter()
                        .any(|range| range.contains(Subresource { level, slice: layer }));
                match (run, free) {
                    (None, true) => run = Some(layer),
                    (Some(start), false) => {
                        initialized.push(SubresourceRange::new(
                            Range::single(level),
                            Range::new(start, layer),
                        ));
                        run = None;
                    }
                    _ => {}
                }
            }
        }

        Self {
            mip_level_count,
            layer_count,
            uninitialized,
            initialized,
        }
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Ranges checked for zero.
    pub fn uninitialized(&self) -> &[SubresourceRange] {
        &self.uninitialized
    }

    /// Control ranges, one per run of consecutive layers on a level.
    pub fn initialized(&self) -> &[SubresourceRange] {
        &self.initialized
    }

    pub fn uninitialized_subresources(&self) -> impl Iterator<Item = Subresource> + '_ {
        self.uninitialized.iter().flat_map(SubresourceRange::each)
    }

    pub fn initialized_subresources(&self) -> impl Iterator<Item = Subresource> + '_ {
        self.initialized.iter().flat_map(SubresourceRange::each)
    }

    pub fn uninitialized_count(&self) -> u64 {
        self.uninitialized.iter().map(SubresourceRange::count).sum()
    }

    pub fn initialized_count(&self) -> u64 {
        self.initialized.iter().map(SubresourceRange::count).sum()
    }

    pub fn is_uninitialized(&self, subresource: Subresource) -> bool {
        self.uninitialized
            .iter()
            .any(|range| range.contains(subresource))
    }
}
