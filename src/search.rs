use std::str::FromStr;

use crate::error::AppError;
use crate::models::{Category, Course};

/// What a blank query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyQueryPolicy {
    /// Every course, in fetched order.
    #[default]
    NoFilter,
    /// A blank string is a substring of every name, so the first category
    /// matches and only its courses come back.
    FirstCategory,
}

impl FromStr for EmptyQueryPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no-filter" | "all" => Ok(EmptyQueryPolicy::NoFilter),
            "first-category" => Ok(EmptyQueryPolicy::FirstCategory),
            other => Err(AppError::Config(format!(
                "unknown empty query policy: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<'a> {
    pub matched_category: Option<&'a Category>,
    pub courses: Vec<&'a Course>,
}

/// Category match first (whole category), otherwise course name or
/// sub-category substring. Case-insensitive, no ranking.
pub fn search_detailed<'a>(
    query: &str,
    categories: &'a [Category],
    courses: &'a [Course],
    policy: EmptyQueryPolicy,
) -> SearchResult<'a> {
    let query = query.trim().to_lowercase();

    if query.is_empty() && policy == EmptyQueryPolicy::NoFilter {
        return SearchResult {
            matched_category: None,
            courses: courses.iter().collect(),
        };
    }

    let matched_category = categories
        .iter()
        .find(|cat| cat.name.to_lowercase().contains(&query));

    let courses = match matched_category {
        Some(cat) => courses
            .iter()
            .filter(|course| course.category_id.as_deref() == Some(cat.id.as_str()))
            .collect(),
        None => courses
            .iter()
            .filter(|course| {
                course.name.to_lowercase().contains(&query)
                    || course
                        .sub_category
                        .as_deref()
                        .is_some_and(|sub| sub.to_lowercase().contains(&query))
            })
            .collect(),
    };

    SearchResult {
        matched_category,
        courses,
    }
}

pub fn search<'a>(
    query: &str,
    categories: &'a [Category],
    courses: &'a [Course],
    policy: EmptyQueryPolicy,
) -> Vec<&'a Course> {
    search_detailed(query, categories, courses, policy).courses
}
