//! Archive loader — turns a trace archive into a normalized trace plus
//! per-step screenshots
//!
//! Pipeline:
//! 1. decompress (zip) or accept pre-split named entries (Drive folders)
//! 2. pick the first `*.json` entry and every image entry
//! 3. index images by `(kind, index)`, first-wins
//! 4. decode + normalize the trace
//! 5. resolve each step's `code_output` against the index

use crate::error::{ArchiveError, TaskscopeError};
use crate::media::{is_image_name, Asset, ImageIndex};
use crate::models::TraceDocument;
use crate::normalize::normalize;
use crate::resolver::{resolve_step_images, StepImageSet};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

/// Result of one successful load. Rebuilt from scratch on every load.
#[derive(Debug, Clone)]
pub struct LoadedTrace {
    /// Name of the archive entry the trace was read from.
    pub file_name: String,
    pub trace: TraceDocument,
    /// Resolved screenshots keyed by step position. Steps with none are absent.
    pub images: BTreeMap<usize, StepImageSet>,
    /// Every image entry of the archive, classified or not, in archive order.
    pub assets: Vec<Asset>,
}

impl LoadedTrace {
    pub fn step_images(&self, step: usize) -> Option<&StepImageSet> {
        self.images.get(&step)
    }
}

/// Decompress a zip archive into named entries, in archive order.
/// Directory entries are skipped.
pub fn read_zip_entries(bytes: &[u8]) -> Result<Vec<Asset>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        // Corrupt entry data (bad deflate stream, CRC mismatch) surfaces as io
        // errors from the reader; report it as a broken archive.
        file.read_to_end(&mut data)
            .map_err(|e| ArchiveError::InvalidArchive(zip::result::ZipError::Io(e)))?;
        entries.push(Asset::new(file.name(), data));
    }

    tracing::debug!(entries = entries.len(), "Decompressed archive");
    Ok(entries)
}

/// Load a zip archive.
pub fn load_archive(bytes: &[u8]) -> Result<LoadedTrace, ArchiveError> {
    let entries = read_zip_entries(bytes)?;
    load_entries(entries)
}

/// Read and load a zip archive from disk.
pub fn load_archive_file(path: &Path) -> Result<LoadedTrace, TaskscopeError> {
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read archive file");
    Ok(load_archive(&bytes)?)
}

/// Load from named entries that are already split out (a zip's contents or
/// the files of a Drive folder). Entry order decides first-wins ties.
pub fn load_entries(entries: Vec<Asset>) -> Result<LoadedTrace, ArchiveError> {
    let json_entry = entries
        .iter()
        .find(|e| e.name.ends_with(".json"))
        .ok_or(ArchiveError::NoJsonEntry)?;
    let file_name = json_entry.name.clone();

    // Invalid UTF-8 sequences become U+FFFD rather than failing the load.
    let text = String::from_utf8_lossy(&json_entry.data);
    let decoded: Value = serde_json::from_str(&text)?;

    let assets: Vec<Asset> = entries.into_iter().filter(|e| is_image_name(&e.name)).collect();
    let index = ImageIndex::build(&assets);

    let trace = TraceDocument::new(normalize(decoded));
    let images = resolve_all_steps(&trace, &index);

    tracing::info!(
        file = %file_name,
        steps = trace.steps().map_or(0, |steps| steps.len()),
        assets = assets.len(),
        indexed = index.len(),
        steps_with_images = images.len(),
        "Loaded trace archive"
    );

    Ok(LoadedTrace {
        file_name,
        trace,
        images,
        assets,
    })
}

/// Resolve every step in parallel. The index is read-only by now.
fn resolve_all_steps(trace: &TraceDocument, index: &ImageIndex) -> BTreeMap<usize, StepImageSet> {
    let Some(steps) = trace.steps() else {
        return BTreeMap::new();
    };

    steps
        .par_iter()
        .enumerate()
        .filter_map(|(i, step)| {
            resolve_step_images(step.get("code_output"), index).map(|set| (i, set))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str, data: &[u8]) -> Asset {
        Asset::new(name, data.to_vec())
    }

    #[test]
    fn test_missing_json_entry() {
        let result = load_entries(vec![entry("before_1.png", b"img")]);
        assert!(matches!(result, Err(ArchiveError::NoJsonEntry)));
    }

    #[test]
    fn test_malformed_json_entry() {
        let result = load_entries(vec![entry("trace.json", b"{bad json")]);
        assert!(matches!(result, Err(ArchiveError::MalformedJson(_))));
    }

    #[test]
    fn test_non_utf8_json_entry_is_decoded_lossily() {
        let loaded =
            load_entries(vec![entry("trace.json", b"{\"question\": \"a\xffb\"}")]).unwrap();
        assert_eq!(loaded.trace.question(), Some(&json!("a\u{FFFD}b")));

        // Replacement characters outside a string still break the JSON.
        let result = load_entries(vec![entry("trace.json", &[0xff, 0xfe, 0x7b])]);
        assert!(matches!(result, Err(ArchiveError::MalformedJson(_))));
    }

    #[test]
    fn test_first_json_entry_is_used() {
        let loaded = load_entries(vec![
            entry("a/first.json", br#"{"question": "q1"}"#),
            entry("second.json", br#"{"question": "q2"}"#),
        ])
        .unwrap();

        assert_eq!(loaded.file_name, "a/first.json");
        assert_eq!(loaded.trace.question(), Some(&json!("q1")));
    }

    #[test]
    fn test_steps_resolved_by_position() {
        let trace = json!({
            "question": "\"What changed?\"",
            "steps": [
                {"code_output": "nothing here"},
                {"code_output": "2_after_image"},
                {"code_output": {"not": "text"}},
                {"code_output": "image_1"}
            ]
        })
        .to_string();

        let loaded = load_entries(vec![
            entry("trace.json", trace.as_bytes()),
            entry("after_2.jpg", b"a2"),
            entry("before_1.png", b"b1"),
            entry("notes.txt", b"ignored"),
        ])
        .unwrap();

        assert_eq!(loaded.trace.question(), Some(&json!("What changed?")));
        assert_eq!(loaded.images.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(loaded.images[&1].after[0].name, "after_2.jpg");
        assert_eq!(loaded.images[&3].before[0].name, "before_1.png");
        assert!(loaded.images[&3].after.is_empty());
        assert_eq!(loaded.assets.len(), 2);
    }

    #[test]
    fn test_trace_without_steps_has_no_images() {
        let loaded = load_entries(vec![
            entry("trace.json", br#"{"steps": "none"}"#),
            entry("before_1.png", b"b1"),
        ])
        .unwrap();

        assert!(loaded.trace.steps().is_none());
        assert!(loaded.images.is_empty());
    }

    #[test]
    fn test_invalid_zip_bytes() {
        let result = load_archive(b"definitely not a zip");
        assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
    }

    #[test]
    fn test_load_archive_file_errors() {
        let dir = std::env::temp_dir().join(format!("taskscope-archive-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = load_archive_file(&dir.join("missing.zip"));
        assert!(matches!(missing, Err(TaskscopeError::Io(_))));

        let garbage = dir.join("garbage.zip");
        std::fs::write(&garbage, b"not a zip at all").unwrap();
        let result = load_archive_file(&garbage);
        assert!(matches!(
            result,
            Err(TaskscopeError::Archive(ArchiveError::InvalidArchive(_)))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
