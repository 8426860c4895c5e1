// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit-exact encoding and decoding of the ARMv7-M MPU descriptor word pair:
//! the Region Base Address Register (`BAR`/`RBAR`) and the Region Attribute
//! and Size Register (`ASR`/`RASR`).
//!
//! The field layout here is the single source of truth shared with
//! `cortex7-mpu`'s live register access; that crate re-exports these
//! bitfields rather than redefining them.

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::register_bitfields;
use tock_registers::registers::LocalRegisterCopy;

use crate::model::{AccessPermission, ExecPolicy, MpuAttributes, PlannedDescriptor};

register_bitfields![u32,
    /// Region Base Address Register.
    pub Bar [
        /// Bits [31:5] of the region's base address. The low 5 bits are
        /// implicitly zero: regions are always at least 32-byte aligned.
        ADDR OFFSET(5) NUMBITS(27) [],
        /// Whether REGION should be used to select the region (vs. the
        /// region number register). Always set by this encoder.
        VALID OFFSET(4) NUMBITS(1) [],
        /// The region number this descriptor occupies.
        REGION OFFSET(0) NUMBITS(4) []
    ],

    /// Region Attribute and Size Register.
    pub Asr [
        /// Execute-never.
        XN OFFSET(28) NUMBITS(1) [],
        /// Access permission.
        AP OFFSET(24) NUMBITS(3) [],
        /// Type extension field.
        TEX OFFSET(19) NUMBITS(3) [],
        /// Shareable.
        S OFFSET(18) NUMBITS(1) [],
        /// Cacheable.
        C OFFSET(17) NUMBITS(1) [],
        /// Bufferable.
        B OFFSET(16) NUMBITS(1) [],
        /// Subregion disable mask; bit k disables subregion k.
        SRD OFFSET(8) NUMBITS(8) [],
        /// Region size is `2^(SIZE+1)` bytes.
        SIZE OFFSET(1) NUMBITS(5) [],
        /// Region enable.
        ENABLE OFFSET(0) NUMBITS(1) []
    ]
];

/// `(TEX, S, C, B)` for one named attribute combination, per the ARMv7-M
/// memory attribute encoding table.
fn attrs_tuple(attrs: MpuAttributes) -> (u32, u32, u32, u32) {
    use MpuAttributes::*;
    match attrs {
        NoAccess => (0b000, 0, 0, 0),
        StronglyOrdered => (0b000, 1, 0, 0),
        DeviceShareable => (0b000, 1, 0, 1),
        DeviceNonShareable => (0b010, 0, 0, 0),
        NormalUncached => (0b001, 1, 0, 0),
        NormalWriteThroughNoWriteAllocate => (0b000, 1, 1, 0),
        NormalWriteBackNoWriteAllocate => (0b000, 1, 1, 1),
        NormalWriteBackReadWriteAllocate => (0b001, 1, 1, 1),
        NormalWriteBackReadWriteAllocateNonShareable => (0b001, 0, 1, 1),
    }
}

fn attrs_from_tuple(tex: u32, s: u32, c: u32, b: u32) -> MpuAttributes {
    use MpuAttributes::*;
    match (tex, s, c, b) {
        (0b000, 0, 0, 0) => NoAccess,
        (0b000, 1, 0, 0) => StronglyOrdered,
        (0b000, 1, 0, 1) => DeviceShareable,
        (0b010, 0, 0, 0) => DeviceNonShareable,
        (0b001, 1, 0, 0) => NormalUncached,
        (0b000, 1, 1, 0) => NormalWriteThroughNoWriteAllocate,
        (0b000, 1, 1, 1) => NormalWriteBackNoWriteAllocate,
        (0b001, 1, 1, 1) => NormalWriteBackReadWriteAllocate,
        (0b001, 0, 1, 1) => NormalWriteBackReadWriteAllocateNonShareable,
        // Any other combination was never produced by `attrs_tuple`; callers
        // only decode words this module itself encoded.
        _ => NoAccess,
    }
}

fn ap_code(ap: AccessPermission) -> u32 {
    use AccessPermission::*;
    match ap {
        None => 0b000,
        PrivilegedOnly => 0b001,
        PrivilegedReadWriteUserReadOnly => 0b010,
        Full => 0b011,
        PrivilegedReadOnly => 0b101,
        ReadOnly => 0b110,
    }
}

fn ap_from_code(code: u32) -> AccessPermission {
    use AccessPermission::*;
    match code {
        0b000 => None,
        0b001 => PrivilegedOnly,
        0b010 => PrivilegedReadWriteUserReadOnly,
        0b011 => Full,
        0b101 => PrivilegedReadOnly,
        0b110 => ReadOnly,
        _ => None,
    }
}

/// Encodes a planned descriptor into its `(BAR, ASR)` word pair.
///
/// Panics in debug builds if the descriptor violates its own invariants
/// (misaligned base, out-of-range size class): those are bugs in whatever
/// produced the descriptor, not user-facing conditions.
pub fn encode(d: &PlannedDescriptor) -> (u32, u32) {
    debug_assert!(
        (4..=31).contains(&d.size_class),
        "size_class {} out of range",
        d.size_class
    );
    debug_assert_eq!(
        d.base as u64 % d.region_size(),
        0,
        "base {:#010x} not aligned to region size",
        d.base
    );
    debug_assert!(
        d.subregion_disable_mask == 0 || d.supports_subregions(),
        "subregion mask set on a region smaller than 256 bytes"
    );

    let mut bar = LocalRegisterCopy::<u32, Bar::Register>::new(0);
    bar.write(Bar::ADDR.val(d.base >> 5) + Bar::VALID.val(1) + Bar::REGION.val(d.region_number));

    let (tex, s, c, b) = attrs_tuple(d.attrs);
    let xn = match d.exec {
        ExecPolicy::Executable => 0,
        ExecPolicy::NeverExecute => 1,
    };

    let mut asr = LocalRegisterCopy::<u32, Asr::Register>::new(0);
    asr.write(
        Asr::ENABLE.val(1)
            + Asr::SIZE.val(d.size_class as u32)
            + Asr::SRD.val(d.subregion_disable_mask as u32)
            + Asr::B.val(b)
            + Asr::C.val(c)
            + Asr::S.val(s)
            + Asr::TEX.val(tex)
            + Asr::AP.val(ap_code(d.ap))
            + Asr::XN.val(xn),
    );

    (bar.get(), asr.get())
}

/// Reconstructs a [`PlannedDescriptor`] from its encoded word pair.
pub fn decode(bar_word: u32, asr_word: u32) -> PlannedDescriptor {
    let bar = LocalRegisterCopy::<u32, Bar::Register>::new(bar_word);
    let asr = LocalRegisterCopy::<u32, Asr::Register>::new(asr_word);

    let exec = if asr.read(Asr::XN) == 1 {
        ExecPolicy::NeverExecute
    } else {
        ExecPolicy::Executable
    };

    PlannedDescriptor {
        region_number: bar.read(Bar::REGION),
        base: bar.read(Bar::ADDR) << 5,
        size_class: asr.read(Asr::SIZE) as u8,
        subregion_disable_mask: asr.read(Asr::SRD) as u8,
        exec,
        ap: ap_from_code(asr.read(Asr::AP)),
        attrs: attrs_from_tuple(
            asr.read(Asr::TEX),
            asr.read(Asr::S),
            asr.read(Asr::C),
            asr.read(Asr::B),
        ),
    }
}
