use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::collector::MatchRecord;

/// `path`, with `.json` appended when it has no extension.
pub fn output_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("json")
    }
}

/// Writes all records as one pretty-printed JSON array and returns the
/// path actually written.
pub fn write_records(path: &Path, records: &[MatchRecord]) -> Result<PathBuf> {
    let path = output_path(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let serialized = serde_json::to_vec_pretty(records)?;
    fs::write(&path, serialized).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn appends_json_extension_only_when_missing() {
        assert_eq!(output_path(Path::new("out/page_data")), PathBuf::from("out/page_data.json"));
        assert_eq!(output_path(Path::new("out/data.txt")), PathBuf::from("out/data.txt"));
    }

    #[test]
    fn writes_array_creating_parents() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![json!({ "matchId": "NA1_1" }), json!({ "matchId": "NA1_1" })];

        let written = write_records(&dir.path().join("nested/matches"), &records).unwrap();

        assert!(written.ends_with("nested/matches.json"));
        let parsed: Value = serde_json::from_slice(&fs::read(&written).unwrap()).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }
}
