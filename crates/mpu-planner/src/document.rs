// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document-shape adapter: turns the declarative `key: value` memory-map
//! document into an ordered sequence of [`RegionRequest`]s.
//!
//! This is deliberately not a YAML engine: only the flat `region` /
//! `key: value` document shape actually used by memory-map documents is in
//! scope, not general YAML. What's implemented here is a line-oriented
//! reader for exactly that shape, plus a per-entry builder that replaces
//! the original's process-wide parse-state globals
//! (`mpu_calc.cpp::traverse_yaml_node`) with an owned accumulator.

use crate::error::ParseError;
use crate::model::{AccessPermission, ExecPolicy, MpuAttributes, RegionRequest};

/// Parses `0x`-prefixed hex or decimal with an optional `K`/`KB`/`M`/`MB`/
/// `G`/`GB` multiplier suffix, matching `mpu_calc.cpp::token_to_dec`.
fn token_to_dec(token: &str, line: u32, column: u32) -> Result<u32, ParseError> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|_| ParseError::Malformed {
            line,
            column,
            message: format!("{token:?} is not a valid hex literal"),
        });
    }

    const SUFFIXES: [(&str, u32); 6] = [
        ("KB", 1024),
        ("MB", 1024 * 1024),
        ("GB", 1024 * 1024 * 1024),
        ("K", 1024),
        ("M", 1024 * 1024),
        ("G", 1024 * 1024 * 1024),
    ];

    for (suffix, multiplier) in SUFFIXES {
        if let Some(digits) = token.strip_suffix(suffix) {
            let n: u32 = digits.trim().parse().map_err(|_| ParseError::Malformed {
                line,
                column,
                message: format!("{token:?} is not a valid sized integer"),
            })?;
            return n.checked_mul(multiplier).ok_or_else(|| ParseError::Malformed {
                line,
                column,
                message: format!("{token:?} overflows a 32-bit address"),
            });
        }
    }

    token.parse().map_err(|_| ParseError::Malformed {
        line,
        column,
        message: format!("{token:?} is not a valid integer"),
    })
}

fn token_to_exec(token: &str, line: u32, column: u32) -> Result<ExecPolicy, ParseError> {
    match token {
        "EXECUTE" => Ok(ExecPolicy::Executable),
        "NEVER_EXECUTE" => Ok(ExecPolicy::NeverExecute),
        other => Err(ParseError::UnknownEnum {
            line,
            column,
            field: "DisableExec",
            token: other.to_string(),
            valid: &["EXECUTE", "NEVER_EXECUTE"],
        }),
    }
}

fn token_to_access_permission(
    token: &str,
    line: u32,
    column: u32,
) -> Result<AccessPermission, ParseError> {
    match token {
        "ARM_MPU_AP_RO" => Ok(AccessPermission::ReadOnly),
        "ARM_MPU_AP_NONE" => Ok(AccessPermission::None),
        "ARM_MPU_AP_FULL" => Ok(AccessPermission::Full),
        other => Err(ParseError::UnknownEnum {
            line,
            column,
            field: "AccessPermission",
            token: other.to_string(),
            valid: &["ARM_MPU_AP_RO", "ARM_MPU_AP_NONE", "ARM_MPU_AP_FULL"],
        }),
    }
}

/// Recognized `AccessAttributes` tokens, paired with the variant they name.
/// The original also accepts each `NORMAL_`-prefixed token with the prefix
/// stripped (`token_to_AccessAttributes`); that aliasing is applied in
/// [`token_to_access_attributes`] rather than duplicated in this table.
const ATTRIBUTE_TOKENS: &[(&str, MpuAttributes)] = &[
    ("NO_ACCESS", MpuAttributes::NoAccess),
    ("STRONGLY_ORDERED", MpuAttributes::StronglyOrdered),
    ("DEVICE_SHAREABLE", MpuAttributes::DeviceShareable),
    ("DEVICE_NON_SHAREABLE", MpuAttributes::DeviceNonShareable),
    ("NORMAL_UNCACHED", MpuAttributes::NormalUncached),
    (
        "NORMAL_WRITE_THROUGH_NO_WRITE_ALLOCATE",
        MpuAttributes::NormalWriteThroughNoWriteAllocate,
    ),
    (
        "NORMAL_WRITE_BACK_NO_WRITE_ALLOCATE",
        MpuAttributes::NormalWriteBackNoWriteAllocate,
    ),
    (
        "NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE",
        MpuAttributes::NormalWriteBackReadWriteAllocate,
    ),
    (
        "NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE_NON_SHAREABLE",
        MpuAttributes::NormalWriteBackReadWriteAllocateNonShareable,
    ),
];

fn token_to_access_attributes(
    token: &str,
    line: u32,
    column: u32,
) -> Result<MpuAttributes, ParseError> {
    for (name, variant) in ATTRIBUTE_TOKENS {
        if token == *name {
            return Ok(*variant);
        }
        // The original also accepts the token with the "NORMAL_" prefix
        // stripped, e.g. "WRITE_THROUGH_NO_WRITE_ALLOCATE".
        if let Some(stripped) = name.strip_prefix("NORMAL_") {
            if token == stripped {
                return Ok(*variant);
            }
        }
    }
    Err(ParseError::UnknownEnum {
        line,
        column,
        field: "AccessAttributes",
        token: token.to_string(),
        valid: &[
            "NO_ACCESS",
            "STRONGLY_ORDERED",
            "DEVICE_SHAREABLE",
            "DEVICE_NON_SHAREABLE",
            "NORMAL_UNCACHED",
            "NORMAL_WRITE_THROUGH_NO_WRITE_ALLOCATE",
            "NORMAL_WRITE_BACK_NO_WRITE_ALLOCATE",
            "NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE",
            "NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE_NON_SHAREABLE",
        ],
    })
}

/// Accumulates the fields of one `region` entry. Its lifetime is the
/// entry: it is created when a `region` key is seen and consumed by
/// [`RegionEntryBuilder::finish`] when the next `region` key (or
/// end-of-document) is reached. This replaces the original's process-wide
/// `global_start_addr`/`global_size`/... parse state.
#[derive(Debug, Default)]
struct RegionEntryBuilder {
    start_addr: Option<u32>,
    size: Option<u32>,
    end_addr: Option<u32>,
    exec: Option<ExecPolicy>,
    ap: Option<AccessPermission>,
    attrs: Option<MpuAttributes>,
    comment: String,
    started_at_line: u32,
}

impl RegionEntryBuilder {
    fn new(started_at_line: u32) -> Self {
        RegionEntryBuilder {
            started_at_line,
            ..Default::default()
        }
    }

    fn apply(&mut self, key: &str, value: &str, line: u32, column: u32) -> Result<(), ParseError> {
        match key {
            "start_addr" => self.start_addr = Some(token_to_dec(value, line, column)?),
            "size" => self.size = Some(token_to_dec(value, line, column)?),
            "end_addr" => self.end_addr = Some(token_to_dec(value, line, column)?),
            "DisableExec" => self.exec = Some(token_to_exec(value, line, column)?),
            "AccessPermission" => self.ap = Some(token_to_access_permission(value, line, column)?),
            "AccessAttributes" => {
                self.attrs = Some(token_to_access_attributes(value, line, column)?)
            }
            "comment" => self.comment = value.to_string(),
            other => {
                return Err(ParseError::UnknownKey {
                    line,
                    column,
                    key: other.to_string(),
                })
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<RegionRequest, ParseError> {
        let line = self.started_at_line;
        let start = self.start_addr.ok_or(ParseError::MissingField {
            line,
            column: 1,
            field: "start_addr",
        })?;
        let end = match (self.size, self.end_addr) {
            (_, Some(end_addr)) => end_addr,
            (Some(size), None) => start + size - 1,
            (None, None) => {
                return Err(ParseError::MissingField {
                    line,
                    column: 1,
                    field: "size or end_addr",
                })
            }
        };
        let exec = self.exec.ok_or(ParseError::MissingField {
            line,
            column: 1,
            field: "DisableExec",
        })?;
        let ap = self.ap.ok_or(ParseError::MissingField {
            line,
            column: 1,
            field: "AccessPermission",
        })?;
        let attrs = self.attrs.ok_or(ParseError::MissingField {
            line,
            column: 1,
            field: "AccessAttributes",
        })?;

        Ok(RegionRequest {
            start,
            end,
            exec,
            ap,
            attrs,
            comment: self.comment,
            // Assigned by the caller as it drives successive planner calls.
            priority: 0,
        })
    }
}

fn split_key_value(line: &str, line_no: u32) -> Result<(&str, &str), ParseError> {
    match line.split_once(':') {
        Some((key, value)) => Ok((key.trim(), value.trim())),
        None => Err(ParseError::Malformed {
            line: line_no,
            column: 1,
            message: format!("{line:?} is not a `key: value` line"),
        }),
    }
}

/// Parses a complete memory-map document into an ordered sequence of
/// region requests. Each request's `priority` is left at `0`; the caller
/// assigns region numbers as it drives successive [`crate::planner::cover`]
/// calls.
pub fn parse_document(text: &str) -> Result<Vec<RegionRequest>, ParseError> {
    let mut requests = Vec::new();
    let mut builder: Option<RegionEntryBuilder> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = split_key_value(line, line_no)?;

        if key == "region" {
            if let Some(b) = builder.take() {
                requests.push(b.finish()?);
            }
            builder = Some(RegionEntryBuilder::new(line_no));
            continue;
        }

        match builder.as_mut() {
            Some(b) => b.apply(key, value, line_no, 1)?,
            None => {
                return Err(ParseError::Malformed {
                    line: line_no,
                    column: 1,
                    message: "key seen before any `region` entry was opened".to_string(),
                })
            }
        }
    }

    if let Some(b) = builder.take() {
        requests.push(b.finish()?);
    }

    Ok(requests)
}
