// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure, hardware-free planning of ARMv7-M MPU region tables.
//!
//! This crate owns everything that can be computed without touching a
//! register: decomposing an arbitrary byte range into hardware-aligned
//! region/subregion descriptors ([`planner`]), encoding and decoding the
//! `BAR`/`ASR` word pairs ([`descriptor`]), flattening a table into a
//! disjoint view of the address space ([`compose`]), rendering that view
//! for humans ([`render`]), and reading the flat memory-map document format
//! ([`document`]). Talking to real MPU registers is `cortex7-mpu`'s job.

pub mod compose;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod model;
pub mod planner;
pub mod render;

pub use compose::DisjointRangeVector;
pub use document::parse_document;
pub use error::{ParseError, PlannerError};
pub use model::{
    AccessPermission, DisjointInterval, ExecPolicy, MpuAttributes, MpuTable, PlannedDescriptor,
    RegionRequest, DEFAULT_TABLE_CAP,
};
pub use planner::{cover, cover_request};
pub use render::{display_memory_map, format_descriptor_block, render_table_source};

/// Plans and encodes an entire document's worth of region requests in
/// order, assigning each request's priority as the next free region number
/// and returning the resulting table together with every encoded
/// `(BAR, ASR)` word pair, indexed the same way as
/// [`model::MpuTable::descriptors`].
///
/// This is the convenience entry point `mpu-tool` drives; it exists here
/// (rather than only as ad hoc glue in the binary) so that both the CLI and
/// any test harness exercise the exact same request-to-table pipeline.
pub fn plan_document(
    requests: &[RegionRequest],
    table_cap: u32,
) -> Result<(MpuTable, Vec<(u32, u32)>), PlannerError> {
    let mut table = MpuTable::new(table_cap);
    let mut words = Vec::new();
    let mut next_region_number = 0u32;

    for request in requests {
        let mut request = request.clone();
        request.priority = next_region_number;
        let (descriptors, after) = cover_request(&request, table.table_cap)?;
        for d in &descriptors {
            words.push(descriptor::encode(d));
        }
        table.descriptors.extend(descriptors);
        next_region_number = after;
    }

    Ok((table, words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_document_assigns_sequential_region_numbers() {
        let requests = vec![
            RegionRequest {
                start: 0x0000_0000,
                end: 0x0000_001f,
                exec: ExecPolicy::Executable,
                ap: AccessPermission::Full,
                attrs: MpuAttributes::NormalUncached,
                comment: String::new(),
                priority: 0,
            },
            RegionRequest {
                start: 0x0001_0000,
                end: 0x0001_001f,
                exec: ExecPolicy::Executable,
                ap: AccessPermission::Full,
                attrs: MpuAttributes::NormalUncached,
                comment: String::new(),
                priority: 0,
            },
        ];

        let (table, words) = plan_document(&requests, DEFAULT_TABLE_CAP).unwrap();
        assert_eq!(words.len(), table.descriptors.len());
        assert_eq!(table.descriptors[0].region_number, 0);
        assert!(table.descriptors.iter().any(|d| d.region_number == 1));
    }

    #[test]
    fn plan_document_reports_over_budget() {
        let requests: Vec<RegionRequest> = (0..20)
            .map(|i| RegionRequest {
                start: i * 0x1000,
                end: i * 0x1000 + 0x1f,
                exec: ExecPolicy::Executable,
                ap: AccessPermission::Full,
                attrs: MpuAttributes::NormalUncached,
                comment: String::new(),
                priority: 0,
            })
            .collect();

        let result = plan_document(&requests, DEFAULT_TABLE_CAP);
        assert!(result.is_err());
    }
}
