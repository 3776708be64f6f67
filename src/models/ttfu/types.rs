use serde::{Deserialize, Serialize};

/// Lifecycle status of a follow-up item.
///
/// Any authenticated caller may set any of the four values in any order;
/// there is no transition table and review decisions never move the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtfuStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "rejected")]
    Rejected,
}

impl TtfuStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtfuStatus::Open => "open",
            TtfuStatus::InProgress => "in-progress",
            TtfuStatus::Done => "done",
            TtfuStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<TtfuStatus> {
        match s {
            "open" => Some(TtfuStatus::Open),
            "in-progress" => Some(TtfuStatus::InProgress),
            "done" => Some(TtfuStatus::Done),
            "rejected" => Some(TtfuStatus::Rejected),
            _ => None,
        }
    }
}

/// For TTFU list responses.
#[derive(Debug, Clone, Serialize)]
pub struct TtfuListItem {
    pub id: i64,
    pub meeting_id: i64,
    pub title: String,
    pub status: TtfuStatus,
    pub assignee_id: i64,
    pub assignee_name: String,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub due_date: Option<String>,
}

/// Full TTFU detail; the handler attaches evidence separately.
#[derive(Debug, Clone, Serialize)]
pub struct TtfuDetail {
    pub id: i64,
    pub meeting_id: i64,
    pub title: String,
    pub description: String,
    pub status: TtfuStatus,
    pub assignee_id: i64,
    pub assignee_name: String,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New TTFU with assignee and reviewer already resolved (explicit or
/// auto-assigned).
pub struct NewTtfu {
    pub meeting_id: i64,
    pub title: String,
    pub description: String,
    pub assignee_id: i64,
    pub reviewer_id: i64,
    pub due_date: Option<String>,
}

/// Optional filters for the TTFU list. All combine with AND.
#[derive(Debug, Default, Clone)]
pub struct TtfuFilter {
    pub meeting_id: Option<i64>,
    pub status: Option<TtfuStatus>,
    pub assignee_id: Option<i64>,
    pub reviewer_id: Option<i64>,
}

/// One page of the TTFU ledger.
pub struct TtfuPage {
    pub ttfus: Vec<TtfuListItem>,
    pub page: i64,
    pub per_page: i64,
    pub total_count: i64,
}
