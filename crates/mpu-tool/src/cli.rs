// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Argument parsing. Both the original tool's underscored flag spellings
//! and the hyphenated convention `clap` derives by default are accepted,
//! since the underscored spelling is what any caller scripted against the
//! original tool still passes.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "mpu-tool")]
#[command(about = "Plans an ARMv7-M MPU region table from a memory-map document", long_about = None)]
#[command(version)]
pub struct Args {
    /// Path to the memory-map document to plan.
    #[arg(long, alias = "memory_map")]
    pub memory_map: PathBuf,

    /// Where to write the rendered memory map and descriptor table. Prints
    /// to stdout when omitted.
    #[arg(long, alias = "output_filename")]
    pub output_filename: Option<PathBuf>,

    /// Number of MPU region slots available on the target (1..=16).
    #[arg(long, alias = "mpu_table_size", default_value_t = mpu_planner::DEFAULT_TABLE_CAP)]
    pub mpu_table_size: u32,

    /// Raise the tracing filter level; repeatable (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
