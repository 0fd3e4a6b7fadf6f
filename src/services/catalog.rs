use std::sync::Arc;

use tracing::{error, info};

use crate::category_style::{resolve_color, resolve_icon};
use crate::error::{AppError, RemoteError};
use crate::gateway::{CatalogGateway, CourseFilter};
use crate::links::ExternalLink;
use crate::models::{Category, Course, DetailRow};
use crate::search::{self, EmptyQueryPolicy};
use crate::session::SessionContext;

pub const HOME_CATEGORY_LIMIT: usize = 6;
pub const POPULAR_COURSE_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTile {
    pub category: Category,
    pub icon: &'static str,
    pub color: &'static str,
}

impl CategoryTile {
    pub fn new(category: Category) -> Self {
        let icon = resolve_icon(&category.name);
        let color = resolve_color(&category.name);
        Self {
            category,
            icon,
            color,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeFeed {
    pub categories: Vec<CategoryTile>,
    pub popular: Vec<Course>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub matched_category: Option<Category>,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetail {
    pub category_name: String,
    pub rows: Vec<DetailRow>,
    pub link: Option<ExternalLink>,
    pub saved: bool,
    pub course: Course,
}

/// Screen-facing reads and bookmark writes.
///
/// Reads never fail: a backend error is logged and the screen gets an
/// empty value. Writes return the error so the caller can alert.
pub struct CatalogService {
    gateway: Arc<dyn CatalogGateway>,
    empty_query: EmptyQueryPolicy,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn CatalogGateway>, empty_query: EmptyQueryPolicy) -> Self {
        Self {
            gateway,
            empty_query,
        }
    }

    pub async fn home_feed(&self) -> HomeFeed {
        let (categories, courses) = tokio::join!(
            self.gateway.get_categories(),
            self.gateway.get_courses(&CourseFilter::All)
        );

        match (categories, courses) {
            (Ok(categories), Ok(courses)) => HomeFeed {
                categories: categories
                    .into_iter()
                    .take(HOME_CATEGORY_LIMIT)
                    .map(CategoryTile::new)
                    .collect(),
                popular: courses.into_iter().take(POPULAR_COURSE_LIMIT).collect(),
            },
            (Err(e), _) | (_, Err(e)) => {
                error!("home_feed failed: {}", e);
                HomeFeed::default()
            }
        }
    }

    pub async fn category_tiles(&self) -> Vec<CategoryTile> {
        read_or_default("get_categories", self.gateway.get_categories().await)
            .into_iter()
            .map(CategoryTile::new)
            .collect()
    }

    /// The most recently added courses.
    pub async fn popular_courses(&self) -> Vec<Course> {
        let mut courses = read_or_default(
            "get_courses",
            self.gateway.get_courses(&CourseFilter::All).await,
        );
        courses.truncate(POPULAR_COURSE_LIMIT);
        courses
    }

    pub async fn category_courses(&self, filter: &CourseFilter) -> Vec<Course> {
        read_or_default("get_courses", self.gateway.get_courses(filter).await)
    }

    pub async fn search(&self, query: &str) -> SearchPage {
        let (categories, courses) = tokio::join!(
            self.gateway.get_categories(),
            self.gateway.get_courses(&CourseFilter::All)
        );
        let (categories, courses) = match (categories, courses) {
            (Ok(categories), Ok(courses)) => (categories, courses),
            (Err(e), _) | (_, Err(e)) => {
                error!("search for {:?} failed: {}", query, e);
                return SearchPage::default();
            }
        };

        let result = search::search_detailed(query, &categories, &courses, self.empty_query);
        SearchPage {
            matched_category: result.matched_category.cloned(),
            courses: result.courses.into_iter().cloned().collect(),
        }
    }

    /// `None` when the course cannot be loaded ("Course not found").
    pub async fn course_detail(&self, id: &str, session: &SessionContext) -> Option<CourseDetail> {
        let course = match self.gateway.get_course_by_id(id).await {
            Ok(course) => course,
            Err(e) => {
                error!("get_course_by_id {} failed: {}", id, e);
                return None;
            }
        };

        let saved = match session.user() {
            Some(user) => read_or_default(
                "is_course_saved",
                self.gateway.is_course_saved(&user.id, id).await,
            ),
            None => false,
        };

        Some(CourseDetail {
            category_name: course.display_category().to_string(),
            rows: course.detail_rows(),
            link: ExternalLink::for_course(&course),
            saved,
            course,
        })
    }

    /// Bookmarked courses, newest bookmark first. Rows whose course no
    /// longer exists are dropped.
    pub async fn saved_courses(&self, session: &SessionContext) -> Vec<Course> {
        let Some(user) = session.user() else {
            return Vec::new();
        };
        read_or_default(
            "get_saved_courses",
            self.gateway.get_saved_courses(&user.id).await,
        )
        .into_iter()
        .filter_map(|saved| saved.course)
        .collect()
    }

    /// Flips the bookmark and returns the new saved flag.
    pub async fn toggle_saved(
        &self,
        session: &SessionContext,
        course_id: &str,
        currently_saved: bool,
    ) -> Result<bool, AppError> {
        let user = session.user().ok_or(AppError::NotSignedIn)?;
        if currently_saved {
            self.gateway.unsave_course(&user.id, course_id).await?;
            info!("{} unsaved course {}", user.id, course_id);
            Ok(false)
        } else {
            self.gateway.save_course(&user.id, course_id).await?;
            info!("{} saved course {}", user.id, course_id);
            Ok(true)
        }
    }

    pub async fn unsave(&self, session: &SessionContext, course_id: &str) -> Result<(), AppError> {
        let user = session.user().ok_or(AppError::NotSignedIn)?;
        self.gateway.unsave_course(&user.id, course_id).await?;
        Ok(())
    }

    pub async fn profile_name(&self, session: &SessionContext) -> Option<String> {
        let user = session.user()?;
        read_or_default("get_profile", self.gateway.get_profile(&user.id).await)
            .and_then(|profile| profile.full_name)
            .filter(|name| !name.trim().is_empty())
    }
}

fn read_or_default<T: Default>(operation: &str, result: Result<T, RemoteError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("{} failed: {}", operation, e);
            T::default()
        }
    }
}
