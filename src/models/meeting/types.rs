use serde::{Deserialize, Serialize};

/// Role a user holds inside one meeting, independent of their global role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingRole {
    Owner,
    Reviewer,
    Participant,
}

impl MeetingRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingRole::Owner => "owner",
            MeetingRole::Reviewer => "reviewer",
            MeetingRole::Participant => "participant",
        }
    }

    pub fn parse(s: &str) -> Option<MeetingRole> {
        match s {
            "owner" => Some(MeetingRole::Owner),
            "reviewer" => Some(MeetingRole::Reviewer),
            "participant" => Some(MeetingRole::Participant),
            _ => None,
        }
    }
}

/// For the meeting list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingListItem {
    pub id: i64,
    pub title: String,
    pub meeting_date: String,
    pub created_by: i64,
    pub creator_name: String,
    pub ttfu_count: i64,
}

/// Full meeting detail, participants attached separately.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingDetail {
    pub id: i64,
    pub title: String,
    pub meeting_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: String,
    pub created_by: i64,
    pub creator_name: String,
    pub created_at: String,
    pub participants: Vec<Participant>,
}

/// One roster entry with the user's display fields joined in.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub meeting_role: MeetingRole,
}

/// New meeting data for creation.
pub struct NewMeeting {
    pub title: String,
    pub meeting_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: String,
}

/// One page of the meeting registry.
pub struct MeetingPage {
    pub meetings: Vec<MeetingListItem>,
    pub page: i64,
    pub per_page: i64,
    pub total_count: i64,
}
