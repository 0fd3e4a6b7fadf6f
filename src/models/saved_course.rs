use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::course::Course;

/// A bookmark row; unique per (user_id, course_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCourse {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "courses", skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
}
