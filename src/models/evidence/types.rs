use serde::{Deserialize, Serialize};

use crate::models::review::Review;

/// Kind of proof attached to a TTFU: an external link or an uploaded file
/// reference. Exactly one of `url` / `file_ref` is populated per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Link,
    File,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Link => "link",
            EvidenceKind::File => "file",
        }
    }

    pub fn parse(s: &str) -> Option<EvidenceKind> {
        match s {
            "link" => Some(EvidenceKind::Link),
            "file" => Some(EvidenceKind::File),
            _ => None,
        }
    }
}

/// One evidence record with its reviews attached.
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub id: i64,
    pub ttfu_id: i64,
    pub kind: EvidenceKind,
    pub url: Option<String>,
    pub file_ref: Option<String>,
    pub description: String,
    pub submitted_by: i64,
    pub submitter_name: String,
    pub created_at: String,
    pub reviews: Vec<Review>,
}

/// New evidence data; the submitter is the session principal.
pub struct NewEvidence {
    pub ttfu_id: i64,
    pub kind: EvidenceKind,
    pub url: Option<String>,
    pub file_ref: Option<String>,
    pub description: String,
}
