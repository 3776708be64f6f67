use serde::{Deserialize, Serialize};

/// Reviewer verdict on one piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewDecision {
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "needs-revision")]
    NeedsRevision,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approved => "approved",
            ReviewDecision::Rejected => "rejected",
            ReviewDecision::NeedsRevision => "needs-revision",
        }
    }

    pub fn parse(s: &str) -> Option<ReviewDecision> {
        match s {
            "approved" => Some(ReviewDecision::Approved),
            "rejected" => Some(ReviewDecision::Rejected),
            "needs-revision" => Some(ReviewDecision::NeedsRevision),
            _ => None,
        }
    }
}

/// One immutable review record.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: i64,
    pub evidence_id: i64,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub decision: ReviewDecision,
    pub comment: Option<String>,
    pub created_at: String,
}

/// New review data; the reviewer is the session principal.
pub struct NewReview {
    pub evidence_id: i64,
    pub decision: ReviewDecision,
    pub comment: Option<String>,
}
