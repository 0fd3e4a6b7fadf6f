use std::sync::Arc;

use tracing::info;

use crate::error::AppError;
use crate::gateway::{CatalogGateway, CourseFilter};
use crate::models::{
    Category, Course, NewCategoryRequest, NewCourseRequest, UpdateCategoryRequest,
    UpdateCourseRequest,
};
use crate::session::SessionContext;

pub const COLOR_OPTIONS: [&str; 10] = [
    "#FF6B35", "#3B82F6", "#22C55E", "#EF4444", "#8B5CF6", "#F59E0B", "#EC4899", "#06B6D4",
    "#84CC16", "#F97316",
];
pub const DEFAULT_FORM_COLOR: &str = "#FF6B35";
pub const DEFAULT_FORM_ICON: &str = "school-outline";

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: DEFAULT_FORM_COLOR.to_string(),
            icon: DEFAULT_FORM_ICON.to_string(),
        }
    }
}

impl CategoryForm {
    pub fn from_category(category: &Category) -> Self {
        let defaults = Self::default();
        Self {
            name: category.name.clone(),
            color: category.color.clone().unwrap_or(defaults.color),
            icon: category.icon.clone().unwrap_or(defaults.icon),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Category name is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_new_request(&self) -> NewCategoryRequest {
        NewCategoryRequest {
            name: self.name.trim().to_string(),
            icon: non_blank(&self.icon),
            color: non_blank(&self.color),
        }
    }

    /// Every column is sent, so a blanked icon or colour clears it.
    pub fn to_update_request(&self) -> UpdateCategoryRequest {
        UpdateCategoryRequest {
            name: Some(self.name.trim().to_string()),
            icon: Some(self.icon.trim().to_string()),
            color: Some(self.color.trim().to_string()),
        }
    }
}

/// One text field per course column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseForm {
    pub name: String,
    pub category_id: String,
    pub category: String,
    pub sub_category: String,
    pub duration: String,
    pub eligibility: String,
    pub fees: String,
    pub entrance_exam: String,
    pub location: String,
    pub provider: String,
    pub course_link: String,
    pub image_url: String,
}

impl CourseForm {
    pub fn from_course(course: &Course) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            name: course.name.clone(),
            category_id: text(&course.category_id),
            category: text(&course.category),
            sub_category: text(&course.sub_category),
            duration: text(&course.duration),
            eligibility: text(&course.eligibility),
            fees: text(&course.fees),
            entrance_exam: text(&course.entrance_exam),
            location: text(&course.location),
            provider: text(&course.provider),
            course_link: text(&course.course_link),
            image_url: text(&course.image_url),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Course name is required".to_string()));
        }
        if self.category_id.trim().is_empty() {
            return Err(AppError::Validation("Please select a category".to_string()));
        }
        Ok(())
    }

    /// Copies the selected category's name into the denormalized text
    /// column; keeps the typed text when the id is unknown.
    pub fn with_category_text(&self, categories: &[Category]) -> CourseForm {
        let mut form = self.clone();
        if let Some(selected) = categories.iter().find(|c| c.id == self.category_id) {
            form.category = selected.name.clone();
        }
        form
    }

    pub fn to_new_request(&self) -> NewCourseRequest {
        NewCourseRequest {
            name: self.name.trim().to_string(),
            category_id: self.category_id.trim().to_string(),
            category: non_blank(&self.category),
            sub_category: non_blank(&self.sub_category),
            duration: non_blank(&self.duration),
            eligibility: non_blank(&self.eligibility),
            fees: non_blank(&self.fees),
            entrance_exam: non_blank(&self.entrance_exam),
            location: non_blank(&self.location),
            provider: non_blank(&self.provider),
            course_link: non_blank(&self.course_link),
            image_url: non_blank(&self.image_url),
        }
    }

    /// Every column is sent, so clearing a field clears the column.
    pub fn to_update_request(&self) -> UpdateCourseRequest {
        let text = |value: &String| Some(value.trim().to_string());
        UpdateCourseRequest {
            name: text(&self.name),
            category_id: text(&self.category_id),
            category: text(&self.category),
            sub_category: text(&self.sub_category),
            duration: text(&self.duration),
            eligibility: text(&self.eligibility),
            fees: text(&self.fees),
            entrance_exam: text(&self.entrance_exam),
            location: text(&self.location),
            provider: text(&self.provider),
            course_link: text(&self.course_link),
            image_url: text(&self.image_url),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminDashboard {
    pub categories: Vec<Category>,
    pub courses: Vec<Course>,
}

/// Category and course CRUD for administrators. Nothing reaches the
/// backend unless the session holds an admin identity.
pub struct AdminService {
    gateway: Arc<dyn CatalogGateway>,
    session: Arc<SessionContext>,
}

impl AdminService {
    pub fn new(gateway: Arc<dyn CatalogGateway>, session: Arc<SessionContext>) -> Self {
        Self { gateway, session }
    }

    fn require_admin(&self) -> Result<(), AppError> {
        if self.session.user().is_none() {
            return Err(AppError::NotSignedIn);
        }
        if !self.session.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// Unlike the public screens, a load failure here is reported.
    pub async fn dashboard(&self) -> Result<AdminDashboard, AppError> {
        self.require_admin()?;
        let (categories, courses) = tokio::join!(
            self.gateway.get_categories(),
            self.gateway.get_courses(&CourseFilter::All)
        );
        Ok(AdminDashboard {
            categories: categories?,
            courses: courses?,
        })
    }

    /// Creates when `editing` is `None`, otherwise updates that category.
    pub async fn save_category(
        &self,
        editing: Option<&Category>,
        form: &CategoryForm,
    ) -> Result<Category, AppError> {
        self.require_admin()?;
        form.validate()?;

        let category = match editing {
            Some(existing) => {
                self.gateway
                    .update_category(&existing.id, &form.to_update_request())
                    .await?
            }
            None => self.gateway.create_category(&form.to_new_request()).await?,
        };
        info!("category {} saved", category.id);
        Ok(category)
    }

    /// Courses keep their rows; only the category link is lost.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        self.require_admin()?;
        self.gateway.delete_category(id).await?;
        Ok(())
    }

    pub async fn save_course(
        &self,
        editing: Option<&Course>,
        form: &CourseForm,
        categories: &[Category],
    ) -> Result<Course, AppError> {
        self.require_admin()?;
        form.validate()?;

        let form = form.with_category_text(categories);
        let course = match editing {
            Some(existing) => {
                self.gateway
                    .update_course(&existing.id, &form.to_update_request())
                    .await?
            }
            None => self.gateway.create_course(&form.to_new_request()).await?,
        };
        info!("course {} saved", course.id);
        Ok(course)
    }

    pub async fn delete_course(&self, id: &str) -> Result<(), AppError> {
        self.require_admin()?;
        self.gateway.delete_course(id).await?;
        Ok(())
    }
}
