//! Testimonial Model

use serde::{Deserialize, Serialize};

use super::review::ModerationStatus;

/// Testimonial entity (site-wide customer quote)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub designation: Option<String>,
    pub content: String,
    pub rating: i32,
    pub avatar: Option<String>,
    pub status: ModerationStatus,
    pub created_at: i64,
}

/// Submit testimonial payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialCreate {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub content: String,
    pub rating: i32,
    pub avatar: Option<String>,
}
