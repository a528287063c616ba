use crate::archive::LoadedTrace;
use crate::error::ArchiveError;
use crate::models::TraceDocument;
use std::path::{Path, PathBuf};

/// `parsed_<name>` for the trace entry, without its directory prefix.
pub fn export_file_name(json_entry_name: &str) -> String {
    let base = json_entry_name.rsplit('/').next().unwrap_or(json_entry_name);
    format!("parsed_{}", base)
}

/// The normalized trace as 2-space indented JSON.
pub fn to_pretty_json(trace: &TraceDocument) -> Result<String, ArchiveError> {
    Ok(serde_json::to_string_pretty(trace)?)
}

/// Write the normalized trace into `dir` and return the written path.
pub fn write_export(dir: &Path, loaded: &LoadedTrace) -> Result<PathBuf, ArchiveError> {
    let path = dir.join(export_file_name(&loaded.file_name));
    std::fs::write(&path, to_pretty_json(&loaded.trace)?)?;
    tracing::info!(path = %path.display(), "Exported parsed trace");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::load_entries;
    use crate::media::Asset;

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("trace.json"), "parsed_trace.json");
        assert_eq!(export_file_name("run_7/trace.json"), "parsed_trace.json");
    }

    #[test]
    fn test_write_export_round_trips_normalized_trace() {
        let loaded = load_entries(vec![Asset::new(
            "task.json",
            br#"{"question": "{\"q\": 1}", "steps": []}"#.to_vec(),
        )])
        .unwrap();

        let dir = std::env::temp_dir().join(format!("taskscope-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = write_export(&dir, &loaded).unwrap();
        assert_eq!(path.file_name().unwrap(), "parsed_task.json");

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"question\": {\n    \"q\": 1\n  },\n  \"steps\": []\n}");

        std::fs::remove_dir_all(&dir).ok();
    }
}
