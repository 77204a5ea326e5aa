//! Review Model

use serde::{Deserialize, Serialize};

/// Moderation state shared by reviews and testimonials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

/// Review entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    /// Reviewer display name
    pub user_name: String,
    pub order_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub status: ModerationStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create review payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCreate {
    pub rating: i32,
    pub comment: Option<String>,
}

/// Moderation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationUpdate {
    pub status: ModerationStatus,
}

/// Moderation list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationQuery {
    pub status: Option<ModerationStatus>,
}
