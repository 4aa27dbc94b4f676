// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-seismic-qc project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Prints the effective configuration and the algorithms it resolves to
use anyhow::Result;
use rust_seismic_qc::config::Config;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));

    println!("Testing file: {:?}", path);
    println!("File exists: {}", path.exists());

    let config = Config::from_file(&path)?;
    println!("{}", serde_yml::to_string(&config)?);

    let plan = config.processing_plan()?;
    for trigger in &plan.triggers {
        println!("Trigger algorithm: {}", trigger.kind());
    }
    for mask in &plan.masks {
        println!("Mask algorithm: {}", mask.kind());
    }
    println!("SOH adjacent threshold: {}", plan.soh_adjacent_threshold);

    Ok(())
}
