//! Shared test helpers for integration tests
//!
//! Fixtures are laid out the way a real run expects them:
//! `Data/<product>/<week>/<stem>.csv` next to `spc_config.yaml`.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const WEEK1: &str = "20240101-20240107";
pub const WEEK2: &str = "20240108-20240114";
pub const WEEK3: &str = "20240115-20240121";

/// Helper to get an spc command with a clean environment
pub fn spc() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("spc"));
    cmd.env_remove("SPC_CONFIG").env_remove("RUST_LOG");
    cmd
}

/// Helper to get an spc command running inside a fixture directory
pub fn spc_in(tmp: &TempDir) -> Command {
    let mut cmd = spc();
    cmd.current_dir(tmp.path());
    cmd
}

/// Write `spc_config.yaml` with one product and the given `(display, stem)` features
pub fn write_config(tmp: &TempDir, product: &str, threshold: usize, features: &[(&str, &str)]) {
    let mut yaml = format!(
        "data_root: Data\nresult_root: Results\nthreshold: {}\nproducts:\n  - name: {}\n    features:\n",
        threshold, product
    );
    for (display, stem) in features {
        yaml.push_str(&format!(
            "      - display_name: {}\n        file_stem: {}\n",
            display, stem
        ));
    }
    fs::write(tmp.path().join("spc_config.yaml"), yaml).unwrap();
}

/// Write a measurement export with limits USL 10, LSL 0, UCL 8, LCL 2
pub fn write_sheet(tmp: &TempDir, product: &str, week: &str, stem: &str, values: &[f64]) -> PathBuf {
    const WIDTH: usize = 34;
    let dir = tmp.path().join("Data").join(product).join(week);
    fs::create_dir_all(&dir).unwrap();

    let header: Vec<String> = (0..WIDTH).map(|i| format!("c{}", i)).collect();
    let mut out = header.join(",");
    out.push('\n');
    for (i, v) in values.iter().enumerate() {
        let mut row = vec![String::new(); WIDTH];
        row[0] = (i + 1).to_string();
        row[1] = v.to_string();
        if i == 0 {
            row[3] = "8".to_string();
            row[7] = "2".to_string();
            row[31] = "0".to_string();
            row[33] = "10".to_string();
        }
        out.push_str(&row.join(","));
        out.push('\n');
    }

    let path = dir.join(format!("{}.csv", stem));
    fs::write(&path, out).unwrap();
    path
}

/// Path of the chart a run writes for a feature
pub fn chart_path(tmp: &TempDir, product: &str, week: &str, feature: &str) -> PathBuf {
    tmp.path()
        .join("Results")
        .join(product)
        .join(week)
        .join(format!("{}.svg", feature))
}

pub fn memory_file(tmp: &TempDir) -> PathBuf {
    tmp.path()
        .join("Results")
        .join("_memory_global")
        .join("spc_memory.json")
}

pub fn sigma_file(tmp: &TempDir) -> PathBuf {
    tmp.path()
        .join("Results")
        .join("_memory_global")
        .join("last_sigma_simple.json")
}
