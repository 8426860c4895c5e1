// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types shared across the planner, encoder, and document loader.

use thiserror::Error;

/// Failure modes of [`crate::planner::cover`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlannerError {
    /// `end - start < 31`: the requested range cannot be expressed as a
    /// single hardware-aligned region plus subregions.
    #[error("range [{start:#010x}, {end:#010x}] is smaller than the minimum region size")]
    RangeTooSmall { start: u32, end: u32 },

    /// Covering the requested range would need more descriptors than remain
    /// in the table.
    #[error("covering [{start:#010x}, {end:#010x}] from region {first_region_number} would exceed the table cap of {table_cap}")]
    OverBudget {
        start: u32,
        end: u32,
        first_region_number: u32,
        table_cap: u32,
    },

    /// The starting region number is already at or past the table cap.
    #[error("region number {region_number} is at or past the table cap of {table_cap}")]
    NoRegionSlot { region_number: u32, table_cap: u32 },
}

/// A single token in a document entry that failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A key in a `region` entry is not one this loader recognizes.
    #[error("{line}:{column}: unknown key {key:?}")]
    UnknownKey {
        line: u32,
        column: u32,
        key: String,
    },

    /// A value for a known key could not be parsed into the expected shape
    /// (an integer, an enum token, ...).
    #[error("{line}:{column}: {message}")]
    Malformed {
        line: u32,
        column: u32,
        message: String,
    },

    /// A token did not match any valid variant for its field; carries the
    /// accepted alternatives so the caller can print a helpful diagnostic,
    /// matching the original loader's `token_to_from_list` error message.
    #[error("{line}:{column}: {field} value {token:?} is not one of {valid:?}")]
    UnknownEnum {
        line: u32,
        column: u32,
        field: &'static str,
        token: String,
        valid: &'static [&'static str],
    },

    /// A `region` entry was missing a field required to build a
    /// `RegionRequest` (e.g. no `start_addr`, or neither `size` nor
    /// `end_addr`).
    #[error("{line}:{column}: region entry is missing required field {field}")]
    MissingField { line: u32, column: u32, field: &'static str },
}
