// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! ARMv7-M MPU register layout, per section 4.5 of the Cortex-M7 Devices
//! Generic User Guide.
//!
//! `BAR`/`ASR` field layout is owned by `mpu_planner::descriptor` and
//! re-exported here rather than redefined, so the encoder and the live
//! register access can never drift apart.

use tock_registers::register_bitfields;
use tock_registers::register_structs;
use tock_registers::registers::ReadWrite;

pub use mpu_planner::descriptor::{Asr, Bar};

register_bitfields![u32,
    pub Type [
        /// Number of MPU instruction regions supported. Always reads 0 on
        /// this family (unified regions).
        IREGION OFFSET(16) NUMBITS(8) [],
        /// Number of data regions this MPU implements.
        DREGION OFFSET(8) NUMBITS(8) [],
        SEPARATE OFFSET(0) NUMBITS(1) []
    ],

    pub Control [
        /// Enable the default memory map as a background region for
        /// privileged accesses.
        PRIVDEFENA OFFSET(2) NUMBITS(1) [],
        /// Enable the MPU during hard fault, NMI, and FAULTMASK handlers.
        HFNMIENA OFFSET(1) NUMBITS(1) [],
        /// Enable the MPU.
        ENABLE OFFSET(0) NUMBITS(1) []
    ],

    pub RegionNumber [
        REGION OFFSET(0) NUMBITS(8) []
    ]
];

register_structs! {
    /// MMIO layout of the Cortex-M7 MPU at base address `0xE000_ED90`.
    pub MpuRegisters {
        (0x000 => mpu_type: ReadWrite<u32, Type::Register>),
        (0x004 => ctrl: ReadWrite<u32, Control::Register>),
        (0x008 => rnr: ReadWrite<u32, RegionNumber::Register>),
        (0x00c => rbar: ReadWrite<u32, Bar::Register>),
        (0x010 => rasr: ReadWrite<u32, Asr::Register>),
        (0x014 => @END),
    }
}

/// Physical base address of the MPU register block on ARMv7-M.
pub const MPU_BASE_ADDRESS: usize = 0xE000_ED90;

/// Number of data regions this crate binds to; matches
/// `mpu_planner::DEFAULT_TABLE_CAP`.
pub const NUM_REGIONS: u32 = 16;

/// Borrows the live MPU register block.
///
/// # Safety
/// The caller must ensure no other live reference to the MPU register
/// block exists for the duration of the borrow, and that this is called on
/// an ARMv7-M core with an MPU present at the architectural address.
pub unsafe fn mpu_registers() -> &'static MpuRegisters {
    unsafe { &*(MPU_BASE_ADDRESS as *const MpuRegisters) }
}
