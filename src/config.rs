use std::env;

use crate::error::AppError;
use crate::search::EmptyQueryPolicy;

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            url,
            anon_key: anon_key.into(),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        Ok(Self::new(url, anon_key))
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }
}

/// Support contacts shown on the home and course screens.
#[derive(Clone, Debug, Default)]
pub struct ContactConfig {
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub supabase: SupabaseConfig,
    pub empty_query: EmptyQueryPolicy,
    pub contact: ContactConfig,
}

impl CatalogConfig {
    /// Reads `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let supabase = SupabaseConfig::new_from_env()?;

        let empty_query = match env::var("CATALOG_EMPTY_QUERY") {
            Ok(raw) => raw.parse()?,
            Err(_) => EmptyQueryPolicy::default(),
        };

        let contact = ContactConfig {
            phone: non_blank_var("CATALOG_CONTACT_PHONE"),
            email: non_blank_var("CATALOG_CONTACT_EMAIL"),
        };

        Ok(Self {
            supabase,
            empty_query,
            contact,
        })
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
