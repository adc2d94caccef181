//! Case identifier normalization.
//!
//! Raw identifiers arrive in several spellings (`tcga_ab_1234`,
//! ` TCGA-AB-1234 `, full slide submitter ids). Everything that keys a case
//! directory goes through this module so the spellings collapse to one
//! canonical [`CaseId`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of leading segments of a submitter id that name the case
/// (`PROJECT-SITE-PARTICIPANT`).
const CASE_SEGMENTS: usize = 3;

/// Canonical case identifier.
///
/// Only constructed by [`normalize`] and [`case_id_from_entity_submitter_id`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Usable as a single directory name under the organized root.
    pub fn is_path_safe(&self) -> bool {
        is_single_component(&self.0)
    }

    /// Re-wraps a value read back from storage. The value was normalized
    /// before it was written.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trims, upper-cases and turns underscores into hyphens.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> CaseId {
    CaseId(raw.trim().to_uppercase().replace('_', "-"))
}

/// Keeps the first three hyphen-delimited segments of a slide submitter id.
///
/// `TCGA-AB-1234-01Z-00-DX1` becomes `TCGA-AB-1234`. Inputs with fewer than
/// three segments come back unchanged.
pub fn case_id_from_entity_submitter_id(entity: &str) -> CaseId {
    let segments: Vec<&str> = entity.split('-').collect();
    if segments.len() < CASE_SEGMENTS {
        return CaseId(entity.to_string());
    }
    CaseId(segments[..CASE_SEGMENTS].join("-"))
}

/// Normalizes a raw entity id and reduces it to its case prefix.
pub fn case_id_from_raw_entity(raw: &str) -> CaseId {
    let normalized = normalize(raw);
    case_id_from_entity_submitter_id(normalized.as_str())
}

/// Non-empty, not `.` or `..`, and free of separators and NUL bytes.
pub(crate) fn is_single_component(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0'])
}
