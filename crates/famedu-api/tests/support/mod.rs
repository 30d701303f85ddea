//! In-memory wiring of the full router for HTTP tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use famedu_api::{router, AppState};
use famedu_core::audit::{ActivityLogger, AuditLoggerConfig};
use famedu_core::repositories::{ActivityLogRepository, FamilyRepository, UserFilter, UserRepository};
use famedu_core::services::{AuthService, FamilyService, UserService};
use famedu_core::{ActivityLog, DomainError, Family, Role, User};
use famedu_security::{JwtService, LockoutPolicy, LoginAttemptTracker, ManualClock, PasswordService};
use famedu_shared::Pagination;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "koala-biscuit-thunder";
pub const OTHER_PASSWORD: &str = "quokka-saxophone-dawn";
const SECRET: &str = "integration-test-secret-0123456789";

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let wanted = username.trim().to_lowercase();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == wanted)
            .cloned())
    }

    async fn list(&self, filter: &UserFilter, pagination: Pagination) -> Result<Vec<User>, DomainError> {
        let mut users: Vec<User> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|u| matches(filter, u))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64, DomainError> {
        Ok(self.rows.lock().unwrap().values().filter(|u| matches(filter, u)).count() as i64)
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.username == user.username) {
            return Err(DomainError::UsernameAlreadyExists(user.username.clone()));
        }
        rows.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&user.id) {
            Some(row) => {
                *row = user.clone();
                Ok(user.clone())
            }
            None => Err(DomainError::UserNotFound),
        }
    }
}

fn matches(filter: &UserFilter, user: &User) -> bool {
    filter.role.is_none_or(|r| r == user.role)
        && filter.family_id.is_none_or(|f| Some(f) == user.family_id)
        && filter.is_active.is_none_or(|a| a == user.is_active)
}

#[derive(Default)]
pub struct InMemoryFamilies {
    rows: Mutex<HashMap<Uuid, Family>>,
}

#[async_trait]
impl FamilyRepository for InMemoryFamilies {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Family>, DomainError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Family>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn list(&self, pagination: Pagination) -> Result<Vec<Family>, DomainError> {
        let mut families: Vec<Family> = self.rows.lock().unwrap().values().cloned().collect();
        families.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(families
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn create(&self, family: &Family) -> Result<Family, DomainError> {
        self.rows.lock().unwrap().insert(family.id, family.clone());
        Ok(family.clone())
    }
}

#[derive(Default)]
pub struct InMemoryLogs {
    pub entries: Mutex<Vec<ActivityLog>>,
}

#[async_trait]
impl ActivityLogRepository for InMemoryLogs {
    async fn append_batch(&self, entries: &[ActivityLog]) -> Result<u64, DomainError> {
        self.entries.lock().unwrap().extend_from_slice(entries);
        Ok(entries.len() as u64)
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUsers>,
    pub families: Arc<InMemoryFamilies>,
    pub logs: Arc<InMemoryLogs>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let families = Arc::new(InMemoryFamilies::default());
        let logs = Arc::new(InMemoryLogs::default());
        let clock = Arc::new(ManualClock::default());

        let tracker = LoginAttemptTracker::with_clock(
            LockoutPolicy::new(5, Duration::minutes(15)).unwrap(),
            clock.clone(),
        );
        let jwt = Arc::new(JwtService::new(SECRET, 900, 3600));
        let audit = ActivityLogger::new(
            logs.clone(),
            AuditLoggerConfig {
                batch_timeout_ms: 10,
                ..Default::default()
            },
        );

        let state = AppState {
            auth: Arc::new(AuthService::new(
                users.clone(),
                families.clone(),
                tracker.clone(),
                jwt,
                audit.clone(),
            )),
            users: Arc::new(UserService::new(
                users.clone(),
                families.clone(),
                tracker,
                audit.clone(),
            )),
            families: Arc::new(FamilyService::new(families.clone(), users.clone(), audit)),
            trust_forwarded_for: false,
        };

        Self {
            router: router(state),
            users,
            families,
            logs,
            clock,
        }
    }

    pub async fn seed_family(&self, name: &str) -> Family {
        let family = Family::new(name.to_string(), None).unwrap();
        self.families.create(&family).await.unwrap()
    }

    pub async fn seed_user(&self, username: &str, role: Role, family_id: Option<Uuid>) -> User {
        let hash = PasswordService::hash(PASSWORD).unwrap();
        let year_level = (role == Role::Student).then_some(5);
        let user = User::new(username, hash, username, role, family_id, year_level).unwrap();
        self.users.create(&user).await.unwrap()
    }

    pub async fn deactivate(&self, user: &User) {
        let mut user = user.clone();
        user.set_active(false);
        self.users.update(&user).await.unwrap();
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, headers, body }
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Logs in with the seeded password and returns the access token.
    pub async fn token_for(&self, username: &str) -> String {
        let response = self.login(username, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["data"]["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}
