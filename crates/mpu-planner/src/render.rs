// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable rendering of a composed memory map, matching the column
//! layout shown by the golden composition-rendering scenario and the
//! attribute-string table from
//! `examples/original_source/src/mpu_display.cpp`'s `format_size` and
//! `access_type_to_string`.

use crate::compose::DisjointRangeVector;
use crate::model::{AccessPermission, ExecPolicy, MpuAttributes, MpuTable, PlannedDescriptor};

/// Formats a byte count as `B`/`K`/`M`/`G`, at most one decimal place, with
/// a trailing `.0` or trailing zero stripped (e.g. `3584` -> `3.5K`, `4096`
/// -> `4K`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1 << 30, "G"), (1 << 20, "M"), (1 << 10, "K")];

    for (unit_size, suffix) in UNITS {
        if bytes >= unit_size {
            return format_fraction_1_dp(bytes, unit_size, suffix);
        }
    }
    format!("{bytes}B")
}

/// `bytes / unit_size` rendered with at most one decimal digit, rounded to
/// nearest (half up).
fn format_fraction_1_dp(bytes: u64, unit_size: u64, suffix: &str) -> String {
    let mut whole = bytes / unit_size;
    let remainder = bytes % unit_size;
    let mut tenths = (remainder * 10 + unit_size / 2) / unit_size;
    if tenths == 10 {
        whole += 1;
        tenths = 0;
    }
    if tenths == 0 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole}.{tenths}{suffix}")
    }
}

/// Describes one descriptor's effective memory type, matching
/// `mpu_entry_t::access_type_to_string`'s branching on execute permission,
/// access permission, and access attributes. The fallback strings for
/// combinations the format never actually produces are kept verbatim: they
/// are unreachable through this crate's own descriptors but are what the
/// original prints if it ever sees one.
fn access_type_to_string(d: &PlannedDescriptor) -> String {
    use MpuAttributes::*;

    if d.exec == ExecPolicy::Executable {
        return match d.attrs {
            NormalWriteBackReadWriteAllocate if d.ap == AccessPermission::ReadOnly => {
                "WRITE_BACK_READ_AND_WRITE_ALLOCATE (read-only, execute allowed)".to_string()
            }
            NormalWriteBackReadWriteAllocate => {
                "WRITE_BACK_READ_AND_WRITE_ALLOCATE (fully cached, execute allowed)".to_string()
            }
            _ => "unknown TEX/C/S/B/AP combination with execute allowed".to_string(),
        };
    }

    if d.ap == AccessPermission::ReadOnly {
        return match d.attrs {
            NormalWriteBackReadWriteAllocate => {
                "WRITE_BACK_READ_AND_WRITE_ALLOCATE (read-only, execute allowed)".to_string()
            }
            _ => "unknown TEX/C/S/B/AP combination with read-only access".to_string(),
        };
    }

    if d.ap == AccessPermission::None {
        return match d.attrs {
            NoAccess => "NO_ACCESS".to_string(),
            _ => "unknown TEX/C/S/B/AP combination with no access".to_string(),
        };
    }

    match d.attrs {
        StronglyOrdered => "STRONGLY_ORDERED".to_string(),
        DeviceShareable => "DEVICE_SHAREABLE".to_string(),
        NormalWriteThroughNoWriteAllocate => "WRITE_THROUGH_NO_WRITE_ALLOCATE (logging)".to_string(),
        NormalWriteBackNoWriteAllocate => "WRITE_BACK_NO_WRITE_ALLOCATE (logging & stats)".to_string(),
        NormalUncached => "UNCACHED e.g. inbox/outbox, pktmem".to_string(),
        NormalWriteBackReadWriteAllocate => "WRITE_BACK_READ_AND_WRITE_ALLOCATE (fully cached)".to_string(),
        NormalWriteBackReadWriteAllocateNonShareable => {
            "WRITE_BACK_READ_AND_WRITE_ALLOCATE_NON_SHAREABLE (fully cached and works with jtag)"
                .to_string()
        }
        DeviceNonShareable => "DEVICE_NON_SHAREABLE".to_string(),
        NoAccess => "unknown TEX/C/S/B/AP combination".to_string(),
    }
}

/// Renders one line per disjoint interval: `start-hex end-hex human-size
/// region attr-string`, or `start-hex end-hex human-size  . unmapped` for a
/// gap, matching `display_interval`'s two printf shapes (the unmapped row
/// has no region-number column, hence the extra space before `.`).
pub fn display_memory_map(dv: &DisjointRangeVector) -> String {
    let mut out = String::new();
    for interval in dv.intervals() {
        let size = interval.end as u64 - interval.start as u64 + 1;
        let size_str = format_size(size);
        match interval.effective() {
            None => {
                out.push_str(&format!(
                    "{:08x} {:08x} {:>4}  . unmapped\n",
                    interval.start, interval.end, size_str
                ));
            }
            Some(d) => {
                out.push_str(&format!(
                    "{:08x} {:08x} {:>4}  {} {}\n",
                    interval.start,
                    interval.end,
                    size_str,
                    d.region_number,
                    access_type_to_string(d),
                ));
            }
        }
    }
    out
}

/// `ARM_MPU_AP_*` token for one access permission, matching the macro table
/// in `configure_mpu.cpp`'s `MPUThreadGuard_calculate` comment block.
fn ap_token(ap: AccessPermission) -> &'static str {
    match ap {
        AccessPermission::None => "ARM_MPU_AP_NONE",
        AccessPermission::PrivilegedOnly => "ARM_MPU_AP_PRIV",
        AccessPermission::PrivilegedReadWriteUserReadOnly => "ARM_MPU_AP_URO",
        AccessPermission::Full => "ARM_MPU_AP_FULL",
        AccessPermission::PrivilegedReadOnly => "ARM_MPU_AP_PRO",
        AccessPermission::ReadOnly => "ARM_MPU_AP_RO",
    }
}

fn exec_token(exec: ExecPolicy) -> &'static str {
    match exec {
        ExecPolicy::Executable => "EXECUTE",
        ExecPolicy::NeverExecute => "NEVER_EXECUTE",
    }
}

/// `ARM_MPU_REGION_SIZE_*` token for a descriptor's region size, e.g.
/// `256KB` for `size_class = 15`.
fn region_size_token(size_class: u8) -> String {
    let bytes: u64 = 1u64 << (size_class as u32 + 1);
    if bytes < 1024 {
        format!("{bytes}B")
    } else if bytes < 1024 * 1024 {
        format!("{}KB", bytes / 1024)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{}MB", bytes / (1024 * 1024))
    } else {
        format!("{}GB", bytes / (1024 * 1024 * 1024))
    }
}

/// Renders one descriptor as a `{ BAR = ..., ASR = ... }` literal block,
/// matching `memory_map.h`'s generated-code shape so the artifact can be
/// dropped straight into a C firmware build.
pub fn format_descriptor_block(d: &PlannedDescriptor) -> String {
    format!(
        "{{ BAR = RBAR({}UL, {:#010x}UL),\n  ASR = RASR_EX({}, {}, {}, {:#04x}, SIZE_{}) }}",
        d.region_number,
        d.base,
        exec_token(d.exec),
        ap_token(d.ap),
        d.attrs.code_name(),
        d.subregion_disable_mask,
        region_size_token(d.size_class),
    )
}

/// Renders the full persisted artifact: the human-readable memory map
/// followed by one descriptor block per table entry, in region-number
/// order.
pub fn render_table_source(table: &MpuTable) -> String {
    let dv = DisjointRangeVector::from_table(table);
    let mut out = display_memory_map(&dv);
    out.push('\n');

    let mut descriptors = table.descriptors.clone();
    descriptors.sort_by_key(|d| d.region_number);
    for d in &descriptors {
        out.push_str(&format_descriptor_block(d));
        out.push_str(",\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_strips_trailing_zero_and_dot() {
        assert_eq!(format_size(4096), "4K");
        assert_eq!(format_size(4096 + 2048), "6K");
        assert_eq!(format_size(1536), "1.5K");
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(1 << 20), "1M");
        assert_eq!(format_size(1 << 30), "1G");
    }

    #[test]
    fn format_size_matches_golden_scenario_five_fractions() {
        // 3.5 GiB unmapped gap and 511.9 MiB trailing gap, matching a
        // documented memory map with a Cortex-M7 system control space hole.
        assert_eq!(format_size(0xdf_ff_ff_ff - 0x03_00_00_00 + 1), "3.5G");
        let trailing = 0xff_ff_ff_ffu64 - 0xe0_01_00_00 + 1;
        assert_eq!(format_size(trailing), "511.9M");
    }

    #[test]
    fn format_descriptor_block_matches_memory_map_h_shape() {
        let d = PlannedDescriptor {
            region_number: 3,
            base: 0x0040_0000,
            size_class: 17, // 256 KiB
            subregion_disable_mask: 0,
            exec: ExecPolicy::Executable,
            ap: AccessPermission::ReadOnly,
            attrs: crate::model::MpuAttributes::NormalWriteBackReadWriteAllocate,
        };
        let block = format_descriptor_block(&d);
        assert!(block.contains("RBAR(3UL, 0x00400000UL)"));
        assert!(block.contains(
            "RASR_EX(EXECUTE, ARM_MPU_AP_RO, NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE, 0x00, SIZE_256KB)"
        ));
    }

    #[test]
    fn access_type_to_string_marks_flash_read_only_and_executable() {
        let flash = PlannedDescriptor {
            region_number: 7,
            base: 0x0040_0000,
            size_class: 17,
            subregion_disable_mask: 0x80,
            exec: ExecPolicy::Executable,
            ap: AccessPermission::ReadOnly,
            attrs: MpuAttributes::NormalWriteBackReadWriteAllocate,
        };
        assert_eq!(
            access_type_to_string(&flash),
            "WRITE_BACK_READ_AND_WRITE_ALLOCATE (read-only, execute allowed)"
        );
    }

    #[test]
    fn access_type_to_string_leaves_device_and_ordered_memory_unannotated() {
        let device = PlannedDescriptor {
            region_number: 1,
            base: 0x0100_0000,
            size_class: 24,
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: MpuAttributes::DeviceShareable,
        };
        assert_eq!(access_type_to_string(&device), "DEVICE_SHAREABLE");

        let peripherals = PlannedDescriptor {
            region_number: 6,
            base: 0xe000_0000,
            size_class: 15,
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: MpuAttributes::StronglyOrdered,
        };
        assert_eq!(access_type_to_string(&peripherals), "STRONGLY_ORDERED");
    }

    #[test]
    fn access_type_to_string_notes_fully_cached_and_no_access() {
        let ram = PlannedDescriptor {
            region_number: 2,
            base: 0x2000_0000,
            size_class: 16,
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: MpuAttributes::NormalWriteBackReadWriteAllocate,
        };
        assert_eq!(
            access_type_to_string(&ram),
            "WRITE_BACK_READ_AND_WRITE_ALLOCATE (fully cached)"
        );

        let guard = PlannedDescriptor {
            region_number: 0,
            base: 0x1fff_0000,
            size_class: 7,
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::None,
            attrs: MpuAttributes::NoAccess,
        };
        assert_eq!(access_type_to_string(&guard), "NO_ACCESS");
    }

    #[test]
    fn display_memory_map_matches_golden_composition_scenario_rows() {
        let mut table = MpuTable::new(16);
        table.descriptors.push(PlannedDescriptor {
            region_number: 1,
            base: 0x0100_0000,
            size_class: 24, // 32 MiB
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: MpuAttributes::DeviceShareable,
        });
        table.descriptors.push(PlannedDescriptor {
            region_number: 6,
            base: 0xe000_0000,
            size_class: 15, // 64 KiB
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: MpuAttributes::StronglyOrdered,
        });

        let dv = DisjointRangeVector::from_table(&table);
        let rendered = display_memory_map(&dv);
        assert!(rendered.contains("01000000 02ffffff  32M  1 DEVICE_SHAREABLE\n"));
        assert!(rendered.contains("e0000000 e000ffff  64K  6 STRONGLY_ORDERED\n"));
        assert!(rendered.contains("00000000 00ffffff  16M  . unmapped\n"));
        assert!(rendered.contains("e0010000 ffffffff 511.9M  . unmapped\n"));
    }

    #[test]
    fn render_table_source_orders_descriptors_by_region_number() {
        let mut table = MpuTable::new(16);
        table.descriptors.push(PlannedDescriptor {
            region_number: 1,
            base: 0x0010_0000,
            size_class: 11,
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: crate::model::MpuAttributes::NormalUncached,
        });
        table.descriptors.push(PlannedDescriptor {
            region_number: 0,
            base: 0x0000_0000,
            size_class: 11,
            subregion_disable_mask: 0,
            exec: ExecPolicy::NeverExecute,
            ap: AccessPermission::Full,
            attrs: crate::model::MpuAttributes::NormalUncached,
        });
        let source = render_table_source(&table);
        let pos0 = source.find("RBAR(0UL").unwrap();
        let pos1 = source.find("RBAR(1UL").unwrap();
        assert!(pos0 < pos1);
    }
}
