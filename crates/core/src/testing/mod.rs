//! Testing utilities shared by unit and integration tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use slidecase_core::testing::{fixtures, MockPlacer};
//!
//! fixtures::write_slide(&raw, "u1/s1.svs");
//! fixtures::write_document(&doc, &[fixtures::metadata_item("u1", "s1.svs", "TCGA-AB-0001-01Z-00-DX1")]);
//!
//! let placer = MockPlacer::new();
//! placer.fail_record("u1");
//! ```

mod mock_placer;

pub use mock_placer::MockPlacer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Writes a small fake slide at `root/rel` and returns its path.
    ///
    /// The content is the relative path, so distinct slides differ on disk.
    pub fn write_slide(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create slide directory");
        }
        fs::write(&path, rel).expect("write slide");
        path
    }

    /// A metadata item in the shape of a repository file listing.
    pub fn metadata_item(file_id: &str, file_name: &str, entity_submitter_id: &str) -> Value {
        json!({
            "file_id": file_id,
            "file_name": file_name,
            "data_type": "Slide Image",
            "associated_entities": [{ "entity_submitter_id": entity_submitter_id }],
            "cases": [{ "project": { "project_id": "TCGA-KIRP" } }]
        })
    }

    /// A metadata item identified only through its linked case.
    pub fn case_linked_item(file_id: &str, file_name: &str, case_submitter_id: &str) -> Value {
        json!({
            "file_id": file_id,
            "file_name": file_name,
            "data_type": "Slide Image",
            "cases": [{ "submitter_id": case_submitter_id }]
        })
    }

    /// Writes items as `{"data": {"hits": [...]}}`.
    pub fn write_document(path: &Path, items: &[Value]) {
        let document = json!({ "data": { "hits": items } });
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create document directory");
        }
        fs::write(path, document.to_string()).expect("write metadata document");
    }

    /// Relative paths of every file under `root`, sorted.
    pub fn tree(root: &Path) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                e.path()
                    .strip_prefix(root)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        files.sort();
        files
    }
}
