// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reads back every live MPU region and renders them the same way
//! `mpu-planner::render` renders a planned table, so a live dump and a
//! planned-but-not-yet-loaded table can be compared side by side. Grounded
//! on `configure_mpu.cpp::mpu_dump`, which walks `MPU->TYPE`'s `DREGION`
//! field and decodes each region through `RNR`/`RBAR`/`RASR`.

use tock_registers::interfaces::{Readable, Writeable};

use mpu_planner::{compose::DisjointRangeVector, descriptor::decode, render, MpuTable};

use crate::registers::{MpuRegisters, RegionNumber};

/// Reads back every region the MPU reports supporting (`MPU_TYPE.DREGION`)
/// and reconstructs a [`MpuTable`] from the live `RBAR`/`RASR` pairs,
/// skipping disabled (`RASR.ENABLE == 0`) slots the way the original's
/// `mpu_dump` implicitly does by never rendering them as active.
///
/// # Safety
/// The caller must have exclusive access to the MPU register block for the
/// duration of this call; no concurrent reprogramming may be in flight.
pub unsafe fn read_live_table(regs: &MpuRegisters) -> MpuTable {
    let dregion = (regs.mpu_type.get() >> 8) & 0xff;
    let mut table = MpuTable::new(dregion.max(1));

    for region_number in 0..dregion {
        regs.rnr.write(RegionNumber::REGION.val(region_number));
        let bar = regs.rbar.get();
        let asr = regs.rasr.get();
        if asr & 1 == 0 {
            continue; // ENABLE bit clear: unprogrammed slot.
        }
        table.descriptors.push(decode(bar, asr));
    }

    table
}

/// Renders the live MPU state as a human-readable memory map, matching
/// `mpu_display.cpp::display_memory_map`'s column layout via
/// `mpu_planner::render`.
///
/// # Safety
/// Same as [`read_live_table`].
pub unsafe fn dump_memory_map(regs: &MpuRegisters) -> String {
    let table = unsafe { read_live_table(regs) };
    let dv = DisjointRangeVector::from_table(&table);
    render::display_memory_map(&dv)
}
