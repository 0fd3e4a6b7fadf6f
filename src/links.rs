use reqwest::Url;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::Course;

/// Destinations handed to the platform: dialer, mail client, browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalLink {
    Phone(String),
    Email(String),
    Web(Url),
}

impl ExternalLink {
    /// Keeps a leading `+` and the digits; spaces, dashes and brackets go.
    pub fn phone(number: &str) -> Result<Self, AppError> {
        let trimmed = number.trim();
        let mut dialable = String::with_capacity(trimmed.len());
        for (i, ch) in trimmed.chars().enumerate() {
            match ch {
                '+' if i == 0 => dialable.push(ch),
                '0'..='9' => dialable.push(ch),
                ' ' | '-' | '(' | ')' | '.' => {}
                _ => {
                    return Err(AppError::Validation(format!(
                        "Invalid phone number: {}",
                        number
                    )));
                }
            }
        }
        if !dialable.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "Invalid phone number: {}",
                number
            )));
        }
        Ok(ExternalLink::Phone(dialable))
    }

    pub fn email(address: &str) -> Result<Self, AppError> {
        let address = address.trim();
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
                Ok(ExternalLink::Email(address.to_string()))
            }
            _ => Err(AppError::Validation(format!(
                "Invalid e-mail address: {}",
                address
            ))),
        }
    }

    pub fn web(raw: &str) -> Result<Self, AppError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| AppError::Validation(format!("Invalid link {}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(ExternalLink::Web(url)),
            other => Err(AppError::Validation(format!(
                "Unsupported link scheme: {}",
                other
            ))),
        }
    }

    /// The provider's page for a course, when it has a usable one.
    pub fn for_course(course: &Course) -> Option<Self> {
        let raw = course.course_link.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match Self::web(raw) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!("course {} has an unusable link: {}", course.id, e);
                None
            }
        }
    }

    pub fn to_uri(&self) -> String {
        match self {
            ExternalLink::Phone(number) => format!("tel:{}", number),
            ExternalLink::Email(address) => format!("mailto:{}", address),
            ExternalLink::Web(url) => url.to_string(),
        }
    }
}

/// Platform hook that hands a URI to the OS.
pub trait LinkOpener: Send + Sync {
    fn open(&self, uri: &str) -> Result<(), String>;
}

/// Fire-and-forget: failures are logged, never reported back.
pub fn open_link(opener: &dyn LinkOpener, link: &ExternalLink) {
    let uri = link.to_uri();
    match opener.open(&uri) {
        Ok(()) => info!("opened {}", uri),
        Err(e) => warn!("failed to open {}: {}", uri, e),
    }
}
