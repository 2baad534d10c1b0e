// 💾 Output - Persist a run as pretty-printed JSON files

use crate::pipeline::RunOutput;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CATEGORIES_FILE: &str = "categories.json";
pub const PRACTITIONERS_FILE: &str = "practitioners.json";
pub const SERVICES_FILE: &str = "services.json";
pub const SERVICE_PRACTITIONERS_FILE: &str = "service_practitioners.json";
pub const SYNC_REPORT_FILE: &str = "sync_report.json";

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write the four collections and the sync report into `dir`.
/// Returns the paths written, in order.
pub fn write_run<P: AsRef<Path>>(dir: P, output: &RunOutput) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let paths = vec![
        dir.join(CATEGORIES_FILE),
        dir.join(PRACTITIONERS_FILE),
        dir.join(SERVICES_FILE),
        dir.join(SERVICE_PRACTITIONERS_FILE),
        dir.join(SYNC_REPORT_FILE),
    ];

    write_json(&paths[0], &output.categories)?;
    write_json(&paths[1], &output.practitioners)?;
    write_json(&paths[2], &output.services)?;
    write_json(&paths[3], &output.service_practitioners)?;
    write_json(&paths[4], &output.report)?;

    for path in &paths {
        log::info!("Wrote {}", path.display());
    }
    Ok(paths)
}
