pub mod dto;

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::auth::AuthProvider;
use crate::config::SupabaseConfig;
use crate::error::{AppError, RemoteError};
use crate::gateway::{CatalogGateway, CourseFilter};
use crate::models::{
    AuthSession, Category, Course, NewCategoryRequest, NewCourseRequest, Profile, SavedCourse,
    SignUpOutcome, UpdateCategoryRequest, UpdateCourseRequest,
};

const CATEGORIES: &str = "categories";
const COURSES: &str = "courses";
const SAVED_COURSES: &str = "saved_courses";
const ADMIN_ROLES: &str = "admin_roles";
const PROFILES: &str = "profiles";

const COURSE_SELECT: &str = "*,categories(name,color,icon)";
const SAVED_COURSE_SELECT: &str = "*,courses(*,categories(name,color,icon))";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
const UPSERT_MINIMAL: &str = "resolution=merge-duplicates,return=minimal";

/// Seconds before expiry at which a stored session is refreshed.
const REFRESH_MARGIN_SECS: i64 = 60;

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Client for the hosted backend's REST and auth endpoints. The signed-in
/// session is kept in memory and used as the bearer for table requests.
pub struct SupabaseHttpClient {
    client: Client,
    config: SupabaseConfig,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseHttpClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
        })
    }

    /// Resume a session persisted by the host.
    pub fn restore(self, session: AuthSession) -> Self {
        self.store_session(Some(session));
        self
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store_session(&self, session: Option<AuthSession>) {
        let mut guard = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = session;
    }

    fn bearer_token(&self) -> String {
        self.session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn url_with(&self, base: String, params: &[(&str, String)]) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&base)
            .map_err(|e| RemoteError::new(format!("Invalid backend url {}: {}", base, e)))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn table_request(
        &self,
        method: Method,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<RequestBuilder, RemoteError> {
        let url = self.url_with(self.config.rest_url(table), params)?;
        debug!("{} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .header("apikey", self.config.anon_key.as_str())
            .header("Authorization", format!("Bearer {}", self.bearer_token())))
    }

    fn auth_request(
        &self,
        path: &str,
        params: &[(&str, String)],
        bearer: &str,
    ) -> Result<RequestBuilder, RemoteError> {
        let url = self.url_with(self.config.auth_url(path), params)?;
        debug!("POST {}", url);
        Ok(self
            .client
            .post(url)
            .header("apikey", self.config.anon_key.as_str())
            .header("Authorization", format!("Bearer {}", bearer)))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, RemoteError> {
        let body = self.send(request, context).await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            error!("Failed to parse {} response: {}", context, e);
            RemoteError::new(format!("Failed to parse {} response: {}", context, e))
        })
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<String, RemoteError> {
        let response = request.send().await.map_err(|e| {
            error!("{} request failed: {}", context, e);
            RemoteError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let err = dto::remote_error(status.as_u16(), &body);
            warn!("{} rejected by backend ({}): {}", context, status, err);
            return Err(err);
        }

        Ok(body)
    }

    async fn exists(
        &self,
        table: &str,
        column: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<bool, RemoteError> {
        let mut query = vec![("select", column.to_string()), ("limit", "1".to_string())];
        query.extend(params.iter().cloned());
        let request = self.table_request(Method::GET, table, &query)?;
        let rows: Vec<serde_json::Value> = self.fetch(request, context).await?;
        Ok(!rows.is_empty())
    }

    async fn insert_one<B, T>(&self, table: &str, body: &B, context: &str) -> Result<T, RemoteError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .table_request(Method::POST, table, &[("select", "*".to_string())])?
            .header("Prefer", RETURN_REPRESENTATION)
            .header("Accept", SINGLE_OBJECT)
            .json(body);
        self.fetch(request, context).await
    }

    async fn update_one<B, T>(
        &self,
        table: &str,
        id: &str,
        body: &B,
        context: &str,
    ) -> Result<T, RemoteError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .table_request(
                Method::PATCH,
                table,
                &[("id", eq(id)), ("select", "*".to_string())],
            )?
            .header("Prefer", RETURN_REPRESENTATION)
            .header("Accept", SINGLE_OBJECT)
            .json(body);
        self.fetch(request, context).await
    }

    async fn delete_where(
        &self,
        table: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<(), RemoteError> {
        let request = self.table_request(Method::DELETE, table, params)?;
        self.send(request, context).await?;
        Ok(())
    }

    async fn token_grant<B: serde::Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<AuthSession, RemoteError> {
        let request = self
            .auth_request(
                "token",
                &[("grant_type", grant_type.to_string())],
                &self.config.anon_key,
            )?
            .json(body);
        let token: dto::TokenResponse = self.fetch(request, "token").await?;
        let session = token.into_session(Utc::now().timestamp());
        self.store_session(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl CatalogGateway for SupabaseHttpClient {
    async fn get_categories(&self) -> Result<Vec<Category>, RemoteError> {
        let request = self.table_request(
            Method::GET,
            CATEGORIES,
            &[
                ("select", "*".to_string()),
                ("order", "name.asc".to_string()),
            ],
        )?;
        self.fetch(request, "get_categories").await
    }

    async fn create_category(&self, req: &NewCategoryRequest) -> Result<Category, RemoteError> {
        let category: Category = self.insert_one(CATEGORIES, req, "create_category").await?;
        info!("created category {} ({})", category.name, category.id);
        Ok(category)
    }

    async fn update_category(
        &self,
        id: &str,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, RemoteError> {
        self.update_one(CATEGORIES, id, req, "update_category").await
    }

    async fn delete_category(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_where(CATEGORIES, &[("id", eq(id))], "delete_category")
            .await?;
        info!("deleted category {}", id);
        Ok(())
    }

    async fn get_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, RemoteError> {
        let mut params = vec![
            ("select", COURSE_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let CourseFilter::Category(category_id) = filter {
            params.push(("category_id", eq(category_id)));
        }
        let request = self.table_request(Method::GET, COURSES, &params)?;
        self.fetch(request, "get_courses").await
    }

    async fn get_course_by_id(&self, id: &str) -> Result<Course, RemoteError> {
        let request = self
            .table_request(
                Method::GET,
                COURSES,
                &[("select", COURSE_SELECT.to_string()), ("id", eq(id))],
            )?
            .header("Accept", SINGLE_OBJECT);
        self.fetch(request, "get_course_by_id").await
    }

    async fn create_course(&self, req: &NewCourseRequest) -> Result<Course, RemoteError> {
        let course: Course = self.insert_one(COURSES, req, "create_course").await?;
        info!("created course {} ({})", course.name, course.id);
        Ok(course)
    }

    async fn update_course(
        &self,
        id: &str,
        req: &UpdateCourseRequest,
    ) -> Result<Course, RemoteError> {
        self.update_one(COURSES, id, req, "update_course").await
    }

    async fn delete_course(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_where(COURSES, &[("id", eq(id))], "delete_course")
            .await?;
        info!("deleted course {}", id);
        Ok(())
    }

    async fn get_saved_courses(&self, user_id: &str) -> Result<Vec<SavedCourse>, RemoteError> {
        let request = self.table_request(
            Method::GET,
            SAVED_COURSES,
            &[
                ("select", SAVED_COURSE_SELECT.to_string()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )?;
        self.fetch(request, "get_saved_courses").await
    }

    async fn save_course(&self, user_id: &str, course_id: &str) -> Result<(), RemoteError> {
        let request = self
            .table_request(Method::POST, SAVED_COURSES, &[])?
            .header("Prefer", RETURN_MINIMAL)
            .json(&dto::SavedCourseInsert { user_id, course_id });
        self.send(request, "save_course").await?;
        Ok(())
    }

    async fn unsave_course(&self, user_id: &str, course_id: &str) -> Result<(), RemoteError> {
        self.delete_where(
            SAVED_COURSES,
            &[("user_id", eq(user_id)), ("course_id", eq(course_id))],
            "unsave_course",
        )
        .await
    }

    async fn is_course_saved(&self, user_id: &str, course_id: &str) -> Result<bool, RemoteError> {
        self.exists(
            SAVED_COURSES,
            "id",
            &[("user_id", eq(user_id)), ("course_id", eq(course_id))],
            "is_course_saved",
        )
        .await
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, RemoteError> {
        self.exists(
            ADMIN_ROLES,
            "user_id",
            &[("user_id", eq(user_id))],
            "is_admin",
        )
        .await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, RemoteError> {
        let request = self.table_request(
            Method::GET,
            PROFILES,
            &[
                ("select", "*".to_string()),
                ("id", eq(user_id)),
                ("limit", "1".to_string()),
            ],
        )?;
        let rows: Vec<Profile> = self.fetch(request, "get_profile").await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, user_id: &str, full_name: &str) -> Result<(), RemoteError> {
        let request = self
            .table_request(Method::POST, PROFILES, &[])?
            .header("Prefer", UPSERT_MINIMAL)
            .json(&dto::ProfileUpsert {
                id: user_id,
                full_name,
            });
        self.send(request, "upsert_profile").await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for SupabaseHttpClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        let session = self
            .token_grant("password", &dto::PasswordGrantRequest { email, password })
            .await?;
        info!("signed in as {}", session.user.id);
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, RemoteError> {
        let request = self
            .auth_request("signup", &[], &self.config.anon_key)?
            .json(&dto::SignUpRequest {
                email,
                password,
                data: dto::SignUpMetadata { full_name },
            });

        match self.fetch::<dto::SignUpResponse>(request, "sign_up").await? {
            dto::SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now().timestamp());
                self.store_session(Some(session.clone()));
                info!("signed up and signed in as {}", session.user.id);
                Ok(SignUpOutcome::SignedIn(session))
            }
            dto::SignUpResponse::User(user) => {
                info!("signed up {}, awaiting e-mail confirmation", user.id);
                Ok(SignUpOutcome::ConfirmationRequired {
                    email: user.email.unwrap_or_else(|| email.to_string()),
                })
            }
        }
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        // The local session is dropped even if the backend refuses the revoke.
        self.store_session(None);

        let request = self.auth_request("logout", &[], &session.access_token)?;
        self.send(request, "sign_out").await?;
        info!("signed out {}", session.user.id);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        match self.session() {
            Some(session) if session.expires_within(Utc::now(), REFRESH_MARGIN_SECS) => {
                debug!("session for {} is expiring, refreshing", session.user.id);
                self.refresh_session().await
            }
            other => Ok(other),
        }
    }

    async fn refresh_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        let Some(current) = self.session() else {
            return Ok(None);
        };

        match self
            .token_grant(
                "refresh_token",
                &dto::RefreshGrantRequest {
                    refresh_token: &current.refresh_token,
                },
            )
            .await
        {
            Ok(session) => Ok(Some(session)),
            // Only a backend rejection ends the session; a network failure
            // keeps the refresh token for the next attempt.
            Err(e) if e.status.is_some_and(|status| (400..500).contains(&status)) => {
                warn!("session refresh rejected, dropping session: {}", e);
                self.store_session(None);
                Err(e)
            }
            Err(e) => {
                warn!("session refresh failed, keeping session: {}", e);
                Err(e)
            }
        }
    }
}
