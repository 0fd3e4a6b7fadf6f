pub mod admin;
pub mod catalog;

pub use admin::{AdminDashboard, AdminService, CategoryForm, CourseForm};
pub use catalog::{CatalogService, CategoryTile, CourseDetail, HomeFeed, SearchPage};
