//! Vocational course catalog: categories, courses, bookmarks and admin
//! CRUD over a hosted Postgres/auth backend.

pub mod auth;
pub mod category_style;
pub mod config;
pub mod error;
pub mod gateway;
pub mod links;
pub mod models;
pub mod scope;
pub mod search;
pub mod services;
pub mod session;
pub mod supabase;
pub mod telemetry;

pub use error::{AppError, RemoteError};
pub use gateway::{CatalogGateway, CourseFilter};
pub use session::{SessionContext, SessionState};
