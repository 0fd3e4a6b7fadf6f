use serde::{Deserialize, Serialize};

/// Keyed by the auth user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Row presence grants administrator capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRole {
    pub user_id: String,
}
