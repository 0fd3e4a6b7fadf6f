#![allow(dead_code)]


use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_catalog::auth::AuthProvider;
use course_catalog::error::RemoteError;
use course_catalog::gateway::{CatalogGateway, CourseFilter};
use course_catalog::models::*;
use uuid::Uuid;

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: None,
        color: None,
    }
}

pub fn course(id: &str, name: &str, category_id: Option<&str>) -> Course {
    Course {
        id: id.to_string(),
        name: name.to_string(),
        category_id: category_id.map(str::to_string),
        category: None,
        sub_category: None,
        duration: None,
        eligibility: None,
        fees: None,
        entrance_exam: None,
        location: None,
        provider: None,
        course_link: None,
        image_url: None,
        created_at: None,
        category_ref: None,
    }
}

pub fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
}

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    courses: Vec<Course>,
    saved: Vec<SavedCourse>,
    admins: Vec<AdminRole>,
    profiles: Vec<Profile>,
    users: Vec<(AuthUser, String)>,
    session: Option<AuthSession>,
    clock: i64,
}

/// Stateful stand-in for the hosted backend: tables and auth in memory.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_admin_check: AtomicBool,
    confirm_signups: AtomicBool,
    admin_delay_ms: AtomicU64,
    sign_in_delay_ms: AtomicU64,
    pub calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("tables lock")
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), RemoteError> {
        self.record_call();
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::new("backend unavailable"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), RemoteError> {
        self.record_call();
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::new("permission denied for table"));
        }
        Ok(())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_admin_check(&self, fail: bool) {
        self.fail_admin_check.store(fail, Ordering::SeqCst);
    }

    /// When set, sign-up returns no session until the e-mail is confirmed.
    pub fn set_confirm_signups(&self, confirm: bool) {
        self.confirm_signups.store(confirm, Ordering::SeqCst);
    }

    pub fn set_admin_check_delay(&self, delay: Duration) {
        self.admin_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_sign_in_delay(&self, delay: Duration) {
        self.sign_in_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// The session the auth side currently holds.
    pub fn active_session(&self) -> Option<AuthSession> {
        self.tables().session.clone()
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let cat = category(&Uuid::new_v4().to_string(), name);
        self.tables().categories.push(cat.clone());
        cat
    }

    pub fn seed_course(&self, name: &str, category: Option<&Category>) -> Course {
        let mut tables = self.tables();
        tables.clock += 1;
        let mut c = course(
            &Uuid::new_v4().to_string(),
            name,
            category.map(|cat| cat.id.as_str()),
        );
        c.category = category.map(|cat| cat.name.clone());
        c.created_at = Some(timestamp(tables.clock));
        tables.courses.push(c.clone());
        c
    }

    pub fn add_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.tables()
            .users
            .push((user.clone(), password.to_string()));
        user
    }

    pub fn grant_admin(&self, user_id: &str) {
        self.tables().admins.push(AdminRole {
            user_id: user_id.to_string(),
        });
    }

    pub fn saved_rows(&self, user_id: &str) -> usize {
        self.tables()
            .saved
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.tables()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned()
    }

    pub fn stored_courses(&self) -> Vec<Course> {
        self.tables().courses.clone()
    }

    pub fn stored_categories(&self) -> Vec<Category> {
        self.tables().categories.clone()
    }

    fn joined(tables: &Tables, course: &Course) -> Course {
        let mut c = course.clone();
        c.category_ref = c.category_id.as_ref().and_then(|id| {
            tables
                .categories
                .iter()
                .find(|cat| &cat.id == id)
                .map(|cat| CategoryRef {
                    name: cat.name.clone(),
                    icon: cat.icon.clone(),
                    color: cat.color.clone(),
                })
        });
        c
    }

    fn session_for(user: &AuthUser) -> AuthSession {
        AuthSession {
            access_token: format!("access-{}", user.id),
            refresh_token: format!("refresh-{}", user.id),
            expires_at: None,
            user: user.clone(),
        }
    }
}

#[async_trait]
impl CatalogGateway for InMemoryBackend {
    async fn get_categories(&self) -> Result<Vec<Category>, RemoteError> {
        self.check_read()?;
        let mut cats = self.tables().categories.clone();
        cats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cats)
    }

    async fn create_category(&self, req: &NewCategoryRequest) -> Result<Category, RemoteError> {
        self.check_write()?;
        let cat = Category {
            id: Uuid::new_v4().to_string(),
            name: req.name.clone(),
            icon: req.icon.clone(),
            color: req.color.clone(),
        };
        self.tables().categories.push(cat.clone());
        Ok(cat)
    }

    async fn update_category(
        &self,
        id: &str,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        let cat = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RemoteError::new("JSON object requested, multiple (or no) rows returned"))?;
        if let Some(name) = &req.name {
            cat.name = name.clone();
        }
        if req.icon.is_some() {
            cat.icon = req.icon.clone();
        }
        if req.color.is_some() {
            cat.color = req.color.clone();
        }
        Ok(cat.clone())
    }

    async fn delete_category(&self, id: &str) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        tables.categories.retain(|c| c.id != id);
        for course in tables.courses.iter_mut() {
            if course.category_id.as_deref() == Some(id) {
                course.category_id = None;
            }
        }
        Ok(())
    }

    async fn get_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, RemoteError> {
        self.check_read()?;
        let tables = self.tables();
        let mut courses: Vec<Course> = tables
            .courses
            .iter()
            .filter(|c| match filter {
                CourseFilter::All => true,
                CourseFilter::Category(id) => c.category_id.as_deref() == Some(id.as_str()),
            })
            .map(|c| Self::joined(&tables, c))
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn get_course_by_id(&self, id: &str) -> Result<Course, RemoteError> {
        self.check_read()?;
        let tables = self.tables();
        tables
            .courses
            .iter()
            .find(|c| c.id == id)
            .map(|c| Self::joined(&tables, c))
            .ok_or_else(|| RemoteError::new("JSON object requested, multiple (or no) rows returned"))
    }

    async fn create_course(&self, req: &NewCourseRequest) -> Result<Course, RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        tables.clock += 1;
        let mut c = course(
            &Uuid::new_v4().to_string(),
            &req.name,
            Some(req.category_id.as_str()),
        );
        c.category = req.category.clone();
        c.sub_category = req.sub_category.clone();
        c.duration = req.duration.clone();
        c.eligibility = req.eligibility.clone();
        c.fees = req.fees.clone();
        c.entrance_exam = req.entrance_exam.clone();
        c.location = req.location.clone();
        c.provider = req.provider.clone();
        c.course_link = req.course_link.clone();
        c.image_url = req.image_url.clone();
        c.created_at = Some(timestamp(tables.clock));
        tables.courses.push(c.clone());
        Ok(c)
    }

    async fn update_course(
        &self,
        id: &str,
        req: &UpdateCourseRequest,
    ) -> Result<Course, RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        let c = tables
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RemoteError::new("JSON object requested, multiple (or no) rows returned"))?;
        if let Some(name) = &req.name {
            c.name = name.clone();
        }
        macro_rules! apply {
            ($($field:ident),*) => {
                $(if req.$field.is_some() { c.$field = req.$field.clone(); })*
            };
        }
        apply!(
            category_id,
            category,
            sub_category,
            duration,
            eligibility,
            fees,
            entrance_exam,
            location,
            provider,
            course_link,
            image_url
        );
        Ok(c.clone())
    }

    async fn delete_course(&self, id: &str) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        tables.courses.retain(|c| c.id != id);
        tables.saved.retain(|s| s.course_id != id);
        Ok(())
    }

    async fn get_saved_courses(&self, user_id: &str) -> Result<Vec<SavedCourse>, RemoteError> {
        self.check_read()?;
        let tables = self.tables();
        let mut rows: Vec<SavedCourse> = tables
            .saved
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| {
                let mut row = s.clone();
                row.course = tables
                    .courses
                    .iter()
                    .find(|c| c.id == s.course_id)
                    .map(|c| Self::joined(&tables, c));
                row
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn save_course(&self, user_id: &str, course_id: &str) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        if tables
            .saved
            .iter()
            .any(|s| s.user_id == user_id && s.course_id == course_id)
        {
            return Err(RemoteError::with_status(
                409,
                "duplicate key value violates unique constraint \"saved_courses_user_id_course_id_key\"",
            ));
        }
        tables.clock += 1;
        let created_at = Some(timestamp(tables.clock));
        tables.saved.push(SavedCourse {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            created_at,
            course: None,
        });
        Ok(())
    }

    async fn unsave_course(&self, user_id: &str, course_id: &str) -> Result<(), RemoteError> {
        self.check_write()?;
        self.tables()
            .saved
            .retain(|s| !(s.user_id == user_id && s.course_id == course_id));
        Ok(())
    }

    async fn is_course_saved(&self, user_id: &str, course_id: &str) -> Result<bool, RemoteError> {
        self.check_read()?;
        Ok(self
            .tables()
            .saved
            .iter()
            .any(|s| s.user_id == user_id && s.course_id == course_id))
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, RemoteError> {
        let delay = self.admin_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check_read()?;
        if self.fail_admin_check.load(Ordering::SeqCst) {
            return Err(RemoteError::new("admin_roles unavailable"));
        }
        Ok(self.tables().admins.iter().any(|a| a.user_id == user_id))
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError> {
        self.check_read()?;
        Ok(self.profile(user_id))
    }

    async fn upsert_profile(&self, user_id: &str, full_name: &str) -> Result<(), RemoteError> {
        self.check_write()?;
        let mut tables = self.tables();
        tables.profiles.retain(|p| p.id != user_id);
        tables.profiles.push(Profile {
            id: user_id.to_string(),
            full_name: Some(full_name.to_string()),
        });
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        let delay = self.sign_in_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.record_call();
        let mut tables = self.tables();
        let user = tables
            .users
            .iter()
            .find(|(u, p)| u.email.as_deref() == Some(email) && p == password)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| RemoteError::with_status(400, "Invalid login credentials"))?;
        let session = Self::session_for(&user);
        tables.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _full_name: &str,
    ) -> Result<SignUpOutcome, RemoteError> {
        self.record_call();
        if self
            .tables()
            .users
            .iter()
            .any(|(u, _)| u.email.as_deref() == Some(email))
        {
            return Err(RemoteError::with_status(422, "User already registered"));
        }
        let user = self.add_user(email, password);
        if self.confirm_signups.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            });
        }
        let session = Self::session_for(&user);
        self.tables().session = Some(session.clone());
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.record_call();
        self.tables().session = None;
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        Ok(self.tables().session.clone())
    }

    async fn refresh_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        Ok(self.tables().session.clone())
    }
}
