//! Config command implementation

use crate::config_loader::{config_path, load_config};
use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use anyhow::Result;
use std::path::Path;

pub fn execute(config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_file)?;

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if !output.is_json() {
        output.section("Effective Configuration");
        match config_path(config_file) {
            Some(path) => output.kv("File", path.display()),
            None => output.kv("File", "(none)"),
        }
    }
    output.table(rows)
}
