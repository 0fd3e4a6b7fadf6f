pub mod auth;
pub mod category;
pub mod course;
pub mod profile;
pub mod saved_course;

pub use auth::{AuthSession, AuthUser, Credentials, SignUpForm, SignUpOutcome};
pub use category::{Category, CategoryRef, NewCategoryRequest, UpdateCategoryRequest};
pub use course::{Course, DetailRow, NewCourseRequest, UpdateCourseRequest};
pub use profile::{AdminRole, Profile};
pub use saved_course::SavedCourse;
