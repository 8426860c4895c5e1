// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattens a set of priority-ordered, possibly-overlapping descriptors into
//! a disjoint partition of the 32-bit address universe.
//!
//! Implemented as a plain ordered vector, not an interval tree: the table
//! cap keeps `K` small (≤ 16), so `O(K log K)` construction and
//! `O(log K)` lookup are already more than sufficient.

use crate::model::{DisjointInterval, MpuTable, PlannedDescriptor};

/// A partition of `[universe_lo, universe_hi]` into maximal runs over which
/// the set of overlapping descriptors is constant.
#[derive(Debug, Clone)]
pub struct DisjointRangeVector {
    universe_lo: u32,
    universe_hi: u32,
    intervals: Vec<DisjointInterval>,
}

impl DisjointRangeVector {
    /// Builds the partition from a list of `(start, end, descriptor)`
    /// ranges. Malformed ranges (`start > end`) are normalized by swapping;
    /// construction itself never fails.
    pub fn build(
        universe_lo: u32,
        universe_hi: u32,
        mut ranges: Vec<(u32, u32, PlannedDescriptor)>,
    ) -> Self {
        for r in &mut ranges {
            if r.0 > r.1 {
                std::mem::swap(&mut r.0, &mut r.1);
            }
        }

        // Every range start and every range's exclusive end (end + 1) that
        // falls strictly inside the universe is a breakpoint; together with
        // the universe's own bounds they cut the universe into maximal runs
        // where the active set cannot change mid-run. `end + 1` is computed
        // with checked arithmetic rather than relying on wraparound, since
        // `end` may legitimately be `u32::MAX`.
        let mut boundaries = vec![universe_lo];
        for (start, end, _) in &ranges {
            let clamped_start = (*start).clamp(universe_lo, universe_hi);
            boundaries.push(clamped_start);
            if let Some(past_end) = end.checked_add(1) {
                if past_end > universe_lo && past_end <= universe_hi {
                    boundaries.push(past_end);
                }
            }
        }
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut intervals = Vec::with_capacity(boundaries.len());
        for i in 0..boundaries.len() {
            let seg_start = boundaries[i];
            let seg_end = match boundaries.get(i + 1) {
                Some(&next) => next - 1,
                None => universe_hi,
            };
            if seg_start > seg_end {
                continue;
            }

            let covering: Vec<PlannedDescriptor> = ranges
                .iter()
                .filter(|(start, end, _)| *start <= seg_start && *end >= seg_start)
                .map(|(_, _, descriptor)| *descriptor)
                .collect();

            intervals.push(DisjointInterval {
                start: seg_start,
                end: seg_end,
                covering,
            });
        }

        DisjointRangeVector {
            universe_lo,
            universe_hi,
            intervals,
        }
    }

    /// Builds the partition for a whole table, expanding each descriptor's
    /// active subregions into one range apiece so that a partially-disabled
    /// region doesn't spuriously cover its disabled subregions.
    pub fn from_table(table: &MpuTable) -> Self {
        let mut ranges = Vec::with_capacity(table.descriptors.len());
        for d in &table.descriptors {
            if !d.supports_subregions() || d.subregion_disable_mask == 0 {
                let (start, end) = d.active_range();
                ranges.push((start, end, *d));
                continue;
            }
            let subsize = d.subregion_size();
            for i in 0..8u32 {
                if d.subregion_disable_mask & (1 << i) != 0 {
                    continue;
                }
                let start = d.base as u64 + i as u64 * subsize;
                let end = start + subsize - 1;
                ranges.push((start as u32, end as u32, *d));
            }
        }
        DisjointRangeVector::build(0, u32::MAX, ranges)
    }

    pub fn intervals(&self) -> &[DisjointInterval] {
        &self.intervals
    }

    /// Finds the disjoint interval containing `point`, or `None` if `point`
    /// falls outside `[universe_lo, universe_hi]`.
    pub fn find(&self, point: u32) -> Option<&DisjointInterval> {
        if point < self.universe_lo || point > self.universe_hi {
            return None;
        }
        let idx = self
            .intervals
            .partition_point(|interval| interval.end < point);
        self.intervals.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessPermission, ExecPolicy, MpuAttributes};

    fn descriptor(region_number: u32, base: u32, size_class: u8) -> PlannedDescriptor {
        PlannedDescriptor {
            region_number,
            base,
            size_class,
            subregion_disable_mask: 0,
            exec: ExecPolicy::Executable,
            ap: AccessPermission::Full,
            attrs: MpuAttributes::NormalUncached,
        }
    }

    #[test]
    fn partitions_cover_the_whole_universe_with_no_overlap() {
        let d0 = descriptor(0, 0x1000, 11); // [0x1000, 0x17ff]
        let d1 = descriptor(1, 0x1800, 10); // [0x1800, 0x19ff]
        let dv = DisjointRangeVector::build(0, 0xffff, vec![(0x1000, 0x17ff, d0), (0x1800, 0x19ff, d1)]);

        let mut cursor = 0u32;
        for interval in dv.intervals() {
            assert_eq!(interval.start, cursor);
            cursor = interval.end.checked_add(1).unwrap_or(cursor);
        }
        assert_eq!(dv.intervals().last().unwrap().end, 0xffff);
    }

    #[test]
    fn higher_region_number_wins_on_overlap() {
        let low = descriptor(0, 0x0, 12); // [0, 0xfff]
        let high = descriptor(5, 0x800, 11); // [0x800, 0xbff]
        let dv = DisjointRangeVector::build(0, 0xffff, vec![(0x0, 0xfff, low), (0x800, 0xbff, high)]);

        let at_overlap = dv.find(0x900).unwrap();
        assert_eq!(at_overlap.effective().unwrap().region_number, 5);

        let outside_overlap = dv.find(0x100).unwrap();
        assert_eq!(outside_overlap.effective().unwrap().region_number, 0);
    }

    #[test]
    fn unmapped_gaps_are_represented_as_empty_intervals() {
        let d0 = descriptor(0, 0x1000, 8); // [0x1000, 0x10ff]
        let dv = DisjointRangeVector::build(0, 0xffff, vec![(0x1000, 0x10ff, d0)]);
        let before = dv.find(0x0).unwrap();
        assert!(before.covering.is_empty());
    }
}
