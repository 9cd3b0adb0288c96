//! Profile graph persistence.
//!
//! The normalized graph is written as pretty-printed UTF-8 JSON next to the
//! download tree, and reloaded from there for download-only runs.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::ProfileGraph;

/// Write the graph, creating parent directories as needed.
pub fn save_graph(graph: &ProfileGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(graph)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_graph(path: &Path) -> Result<ProfileGraph> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
