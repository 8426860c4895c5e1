// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The data model shared by the planner, encoder, and composition engine.

/// Default number of MPU region slots, matching the ARMv7-M MPU's typical
/// sixteen regions.
pub const DEFAULT_TABLE_CAP: u32 = 16;

/// One of the closed set of ARMv7-M memory attribute combinations. Each
/// variant is an opaque tag to the planner; it is only decomposed into its
/// `(TEX, S, C, B)` tuple by [`crate::descriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpuAttributes {
    NoAccess,
    StronglyOrdered,
    DeviceShareable,
    DeviceNonShareable,
    NormalUncached,
    NormalWriteThroughNoWriteAllocate,
    NormalWriteBackNoWriteAllocate,
    NormalWriteBackReadWriteAllocate,
    NormalWriteBackReadWriteAllocateNonShareable,
}

impl MpuAttributes {
    /// The `ARM_MPU_ACCESS_*`-style token used inside a generated
    /// `ARM_MPU_RASR_EX()` literal, matching `mpu_display.cpp`'s
    /// `access_type_to_code` table. `mpu-planner::render`'s
    /// `access_type_to_string` carries the separate, notes-and-bare-name
    /// table used for the human-readable memory map.
    pub fn code_name(self) -> &'static str {
        match self {
            MpuAttributes::NoAccess => "NO_ACCESS",
            MpuAttributes::StronglyOrdered => "STRONGLY_ORDERED",
            MpuAttributes::DeviceShareable => "DEVICE_SHAREABLE",
            MpuAttributes::DeviceNonShareable => "DEVICE_NON_SHAREABLE",
            MpuAttributes::NormalUncached => "NORMAL_UNCACHED",
            MpuAttributes::NormalWriteThroughNoWriteAllocate => {
                "NORMAL_WRITE_THROUGH_NO_WRITE_ALLOCATE"
            }
            MpuAttributes::NormalWriteBackNoWriteAllocate => "NORMAL_WRITE_BACK_NO_WRITE_ALLOCATE",
            MpuAttributes::NormalWriteBackReadWriteAllocate => {
                "NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE"
            }
            MpuAttributes::NormalWriteBackReadWriteAllocateNonShareable => {
                "NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE_NON_SHAREABLE"
            }
        }
    }
}

/// Access permission, independent of the execute-never bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPermission {
    None,
    PrivilegedOnly,
    PrivilegedReadWriteUserReadOnly,
    Full,
    PrivilegedReadOnly,
    ReadOnly,
}

/// Execute permission, encoded as the `XN` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecPolicy {
    Executable,
    NeverExecute,
}

/// A user-level request to protect one inclusive byte range. `priority`
/// equals the region-number slot the planner will start assigning
/// descriptors from; higher region numbers win ARMv7-M's overlap
/// precedence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRequest {
    pub start: u32,
    pub end: u32,
    pub exec: ExecPolicy,
    pub ap: AccessPermission,
    pub attrs: MpuAttributes,
    pub comment: String,
    pub priority: u32,
}

/// One hardware-ready MPU descriptor, prior to bit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedDescriptor {
    pub region_number: u32,
    pub base: u32,
    pub size_class: u8,
    pub subregion_disable_mask: u8,
    pub exec: ExecPolicy,
    pub ap: AccessPermission,
    pub attrs: MpuAttributes,
}

impl PlannedDescriptor {
    /// Region size in bytes, `2^(size_class + 1)`.
    pub fn region_size(&self) -> u64 {
        1u64 << (self.size_class as u32 + 1)
    }

    /// Size in bytes of one of the region's 8 subregions.
    pub fn subregion_size(&self) -> u64 {
        self.region_size() / 8
    }

    /// Whether this descriptor is allowed to carry a non-zero subregion
    /// mask (region size must be at least 256 B, i.e. `size_class >= 7`).
    pub fn supports_subregions(&self) -> bool {
        self.size_class >= 7
    }

    /// The descriptor's first and last active byte, accounting for any
    /// disabled subregions at either end.
    pub fn active_range(&self) -> (u32, u32) {
        if !self.supports_subregions() || self.subregion_disable_mask == 0 {
            let size = self.region_size();
            let end = self.base as u64 + size - 1;
            return (self.base, end as u32);
        }
        let subsize = self.subregion_size();
        let first = (0..8)
            .find(|i| self.subregion_disable_mask & (1 << i) == 0)
            .expect("mask != 0 checked supports_subregions already rules out all-disabled");
        let last = (0..8)
            .rev()
            .find(|i| self.subregion_disable_mask & (1 << i) == 0)
            .unwrap();
        let start = self.base as u64 + first as u64 * subsize;
        let end = self.base as u64 + (last as u64 + 1) * subsize - 1;
        (start as u32, end as u32)
    }
}

/// An ordered, region-number-indexed table of descriptors, capped at
/// `table_cap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpuTable {
    pub descriptors: Vec<PlannedDescriptor>,
    pub table_cap: u32,
}

impl MpuTable {
    pub fn new(table_cap: u32) -> Self {
        MpuTable {
            descriptors: Vec::new(),
            table_cap,
        }
    }

    pub fn remaining_slots(&self, from_region_number: u32) -> u32 {
        self.table_cap.saturating_sub(from_region_number)
    }
}

/// One maximal sub-range of the address universe over which the set of
/// overlapping descriptors is constant, produced by
/// [`crate::compose::DisjointRangeVector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisjointInterval {
    pub start: u32,
    pub end: u32,
    pub covering: Vec<PlannedDescriptor>,
}

impl DisjointInterval {
    /// The descriptor that wins ARMv7-M's overlap precedence rule: highest
    /// region number among those covering this interval.
    pub fn effective(&self) -> Option<&PlannedDescriptor> {
        self.covering.iter().max_by_key(|d| d.region_number)
    }
}
