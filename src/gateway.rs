use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{
    Category, Course, NewCategoryRequest, NewCourseRequest, Profile, SavedCourse,
    UpdateCategoryRequest, UpdateCourseRequest,
};

/// Sentinel the category screens pass for "no category filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CourseFilter {
    #[default]
    All,
    Category(String),
}

impl CourseFilter {
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => CourseFilter::All,
            Some(id) => CourseFilter::Category(id.to_string()),
        }
    }
}

/// One method per remote query. Each call issues exactly one request:
/// no batching, no retries, no caching.
///
/// Categories come back ordered by name ascending, courses and saved
/// courses by creation time descending.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn get_categories(&self) -> Result<Vec<Category>, RemoteError>;
    async fn create_category(&self, req: &NewCategoryRequest) -> Result<Category, RemoteError>;
    async fn update_category(
        &self,
        id: &str,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, RemoteError>;
    async fn delete_category(&self, id: &str) -> Result<(), RemoteError>;

    async fn get_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, RemoteError>;
    async fn get_course_by_id(&self, id: &str) -> Result<Course, RemoteError>;
    async fn create_course(&self, req: &NewCourseRequest) -> Result<Course, RemoteError>;
    async fn update_course(
        &self,
        id: &str,
        req: &UpdateCourseRequest,
    ) -> Result<Course, RemoteError>;
    async fn delete_course(&self, id: &str) -> Result<(), RemoteError>;

    async fn get_saved_courses(&self, user_id: &str) -> Result<Vec<SavedCourse>, RemoteError>;
    async fn save_course(&self, user_id: &str, course_id: &str) -> Result<(), RemoteError>;
    /// Deleting a bookmark that does not exist succeeds.
    async fn unsave_course(&self, user_id: &str, course_id: &str) -> Result<(), RemoteError>;
    async fn is_course_saved(&self, user_id: &str, course_id: &str) -> Result<bool, RemoteError>;

    /// `false` when the user has no admin role row.
    async fn is_admin(&self, user_id: &str) -> Result<bool, RemoteError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError>;
    async fn upsert_profile(&self, user_id: &str, full_name: &str) -> Result<(), RemoteError>;
}
