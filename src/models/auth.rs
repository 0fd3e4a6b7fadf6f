use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn expires_within(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => at - now.timestamp() <= margin_secs,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The backend sent a verification mail; no session yet.
    ConfirmationRequired { email: String },
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Trims the email and checks the login form rules.
    pub fn validated(&self) -> Result<Credentials, AppError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation("Please fill in all fields".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(Credentials::new(email, self.password.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub full_name: String,
    pub credentials: Credentials,
}

impl SignUpForm {
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            credentials: Credentials::new(email, password),
        }
    }

    pub fn validated(&self) -> Result<SignUpForm, AppError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::Validation(
                "Please enter your full name".to_string(),
            ));
        }
        Ok(SignUpForm {
            full_name: full_name.to_string(),
            credentials: self.credentials.validated()?,
        })
    }
}
