// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scoped guard around runtime region reprogramming.
//!
//! Grounded on `cpu_m7.h`'s `cpu_interrupt_disable_guard` (disable
//! interrupts for the guard's lifetime, restore on drop) and
//! `configure_mpu.cpp::mpu_configure_region`/`mpu_clear_region`, which wrap
//! every region rewrite in that guard plus a `DSB`/`ISB`/`DMB` barrier
//! sequence so no in-flight memory operation observes a half-written
//! descriptor.

use tock_registers::interfaces::{Readable, Writeable};

use crate::registers::{Asr, MpuRegisters, RegionNumber};

#[cfg(any(doc, all(target_arch = "arm", target_os = "none")))]
mod arch {
    use core::arch::asm;

    #[inline(always)]
    pub fn disable_interrupts() -> u32 {
        let primask: u32;
        unsafe {
            asm!("mrs {0}, PRIMASK", out(reg) primask, options(nomem, nostack, preserves_flags));
            asm!("cpsid i", options(nomem, nostack));
        }
        primask
    }

    #[inline(always)]
    pub fn restore_interrupts(primask: u32) {
        if primask & 1 == 0 {
            unsafe {
                asm!("cpsie i", options(nomem, nostack));
            }
        }
    }

    #[inline(always)]
    pub fn dsb() {
        unsafe {
            asm!("dsb", options(nomem, nostack, preserves_flags));
        }
    }

    #[inline(always)]
    pub fn isb() {
        unsafe {
            asm!("isb", options(nomem, nostack, preserves_flags));
        }
    }

    #[inline(always)]
    pub fn dmb() {
        unsafe {
            asm!("dmb", options(nomem, nostack, preserves_flags));
        }
    }
}

#[cfg(not(any(doc, all(target_arch = "arm", target_os = "none"))))]
mod arch {
    //! Host-side mocks so the guard's sequencing can be exercised by tests
    //! that don't run on real silicon.
    pub fn disable_interrupts() -> u32 {
        0
    }
    pub fn restore_interrupts(_primask: u32) {}
    pub fn dsb() {}
    pub fn isb() {}
    pub fn dmb() {}
}

/// RAII guard around one region's reprogramming. Construction performs
/// (a) disable interrupts, (b) `DSB`, (c) `ISB`, (d) `DMB`; [`Self::clear`]
/// and [`Self::write`] perform (e)/(f) (clear then write the selected
/// region); `Drop` performs (g) `DSB`/`ISB` then (h) restores interrupts —
/// the full barrier sequence from `configure_mpu.cpp`, expressed as a type
/// rather than paired free functions.
pub struct InterruptBarrierGuard<'a> {
    regs: &'a MpuRegisters,
    primask: u32,
}

impl<'a> InterruptBarrierGuard<'a> {
    /// Opens the guard. No region is touched yet.
    pub fn new(regs: &'a MpuRegisters) -> Self {
        let primask = arch::disable_interrupts();
        arch::dsb();
        arch::isb();
        arch::dmb();
        InterruptBarrierGuard { regs, primask }
    }

    /// Disables `region_number` without disturbing any other region.
    pub fn clear(&mut self, region_number: u32) {
        self.regs.rnr.write(RegionNumber::REGION.val(region_number));
        self.regs.rasr.write(Asr::ENABLE.val(0));
        #[cfg(feature = "trace")]
        tracing::trace!(region_number, "cleared mpu region");
    }

    /// Writes one descriptor's `(BAR, ASR)` word pair. `bar` must already
    /// carry `VALID` and the target region number, as produced by
    /// `mpu_planner::descriptor::encode`.
    pub fn write(&mut self, bar: u32, asr: u32) {
        self.regs.rbar.set(bar);
        self.regs.rasr.set(asr);
        #[cfg(feature = "trace")]
        tracing::trace!(bar, asr, "wrote mpu region");
    }

    /// Reads back the `(BAR, ASR)` pair currently selected by `RNR`.
    pub fn read(&self, region_number: u32) -> (u32, u32) {
        self.regs.rnr.write(RegionNumber::REGION.val(region_number));
        (self.regs.rbar.get(), self.regs.rasr.get())
    }
}

impl Drop for InterruptBarrierGuard<'_> {
    fn drop(&mut self) {
        arch::dsb();
        arch::isb();
        arch::restore_interrupts(self.primask);
    }
}

/// Writes an entire planned table into the live MPU under one guard,
/// clearing every slot up to `table_cap` first so stale descriptors from a
/// previous load never survive a shorter new table.
///
/// # Safety
/// The caller must hold the only live [`InterruptBarrierGuard`] (or
/// otherwise guarantee exclusive access to the MPU register block) for the
/// duration of this call.
pub unsafe fn load_table(
    regs: &MpuRegisters,
    descriptors: &[mpu_planner::PlannedDescriptor],
    table_cap: u32,
) {
    let mut guard = InterruptBarrierGuard::new(regs);
    for region_number in 0..table_cap {
        guard.clear(region_number);
    }
    for d in descriptors {
        let (bar, asr) = mpu_planner::descriptor::encode(d);
        guard.write(bar, asr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A free-standing MpuRegisters instance backed by zeroed heap memory,
    // for exercising the guard's sequencing without a real MMIO block.
    // `MpuRegisters` has no safe constructor by design (it models a fixed
    // hardware address); tests instead zero-initialize raw bytes of the
    // right size and reinterpret them, matching the layout
    // `register_structs!` guarantees.
    fn fake_registers() -> Box<MpuRegisters> {
        let layout = core::alloc::Layout::new::<MpuRegisters>();
        unsafe {
            let ptr = std::alloc::alloc_zeroed(layout) as *mut MpuRegisters;
            Box::from_raw(ptr)
        }
    }

    #[test]
    fn clear_then_write_round_trips_through_rnr() {
        let regs = fake_registers();
        let mut guard = InterruptBarrierGuard::new(&regs);
        guard.clear(3);
        guard.write(0x0000_0013, 0x0000_0013);
        let (bar, asr) = guard.read(3);
        assert_eq!(bar, 0x0000_0013);
        assert_eq!(asr, 0x0000_0013);
    }

    proptest::proptest! {
        /// Whatever `(bar, asr)` word pair `write` is given comes back
        /// unchanged from `read`, regardless of which region slot it
        /// targets — the guard itself must not reinterpret the bits.
        #[test]
        fn write_then_read_is_exact_for_any_word_pair(
            region_number in 0u32..16,
            bar in proptest::prelude::any::<u32>(),
            asr in proptest::prelude::any::<u32>(),
        ) {
            let regs = fake_registers();
            let mut guard = InterruptBarrierGuard::new(&regs);
            guard.clear(region_number);
            guard.write(bar, asr);
            let (got_bar, got_asr) = guard.read(region_number);
            proptest::prop_assert_eq!(got_bar, bar);
            proptest::prop_assert_eq!(got_asr, asr);
        }
    }
}
