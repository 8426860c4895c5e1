// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CLI driver: reads a memory-map document, plans and encodes the MPU
//! table, and persists the rendered artifact — the only crate in the
//! workspace that touches the filesystem or process environment.

mod cli;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Args;

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(args: Args) -> Result<()> {
    if !(1..=16).contains(&args.mpu_table_size) {
        bail!(
            "--mpu-table-size must be between 1 and 16, got {}",
            args.mpu_table_size
        );
    }

    let document = fs::read_to_string(&args.memory_map)
        .with_context(|| format!("reading memory map {}", args.memory_map.display()))?;

    let requests = mpu_planner::parse_document(&document)
        .with_context(|| format!("parsing memory map {}", args.memory_map.display()))?;
    tracing::info!(count = requests.len(), "loaded region requests");

    let (table, _words) = mpu_planner::plan_document(&requests, args.mpu_table_size)
        .context("planning MPU region table")?;
    tracing::info!(regions = table.descriptors.len(), "planned MPU table");

    let rendered = mpu_planner::render_table_source(&table);

    match &args.output_filename {
        Some(path) => write_output(path, &rendered)?,
        None => print!("{rendered}"),
    }

    Ok(())
}

fn write_output(path: &Path, rendered: &str) -> Result<()> {
    fs::write(path, rendered).with_context(|| format!("writing output {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote rendered memory map");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_document() -> &'static str {
        "\
region:
start_addr: 0x00400000
size: 256K
DisableExec: EXECUTE
AccessPermission: ARM_MPU_AP_RO
AccessAttributes: NORMAL_WRITE_BACK_READ_AND_WRITE_ALLOCATE
comment: flash
"
    }

    #[test]
    fn run_plans_and_writes_a_document_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("memory_map.yaml");
        let mut input = fs::File::create(&input_path).unwrap();
        input.write_all(sample_document().as_bytes()).unwrap();

        let output_path = dir.path().join("memory_map.out");

        let args = Args {
            memory_map: input_path,
            output_filename: Some(output_path.clone()),
            mpu_table_size: 16,
            verbose: 0,
        };
        run(args).unwrap();

        let rendered = fs::read_to_string(&output_path).unwrap();
        assert!(rendered.contains("RBAR(0UL, 0x00400000UL)"));
        assert!(rendered.contains("WRITE_BACK_READ_AND_WRITE_ALLOCATE"));
    }

    #[test]
    fn run_rejects_an_out_of_range_table_size() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("memory_map.yaml");
        fs::write(&input_path, sample_document()).unwrap();

        let args = Args {
            memory_map: input_path,
            output_filename: None,
            mpu_table_size: 0,
            verbose: 0,
        };
        assert!(run(args).is_err());
    }

    #[test]
    fn run_surfaces_a_parse_error_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("memory_map.yaml");
        fs::write(&input_path, "region:\nbogus_key: 1\n").unwrap();

        let args = Args {
            memory_map: input_path,
            output_filename: None,
            mpu_table_size: 16,
            verbose: 0,
        };
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("parsing memory map"));
    }
}
