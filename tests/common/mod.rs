//! Shared harness for router-level tests.
//!
//! An in-memory store stands in for Postgres so the real services, extractors
//! and handlers run without a database.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use quill_api::api::{create_router, AppState};
use quill_api::domain::{
    Comment, Credential, NewComment, NewPost, NewUser, Password, Post, PostChanges, User,
    UserChanges, UserRole,
};
use quill_api::errors::AppResult;
use quill_api::infra::{
    AdminCreateOutcome, CommentRepository, CreateOutcome, PostRepository, UnitOfWork,
    UpdateOutcome, UserRepository,
};
use quill_api::services::TokenService;
use quill_api::types::PaginationParams;
use quill_api::Config;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

type Shared = Arc<Mutex<Tables>>;

fn page<T: Clone>(mut items: Vec<T>, params: &PaginationParams) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = (params.offset() as usize).min(items.len());
    let end = (start + params.limit() as usize).min(items.len());
    (items.drain(start..end).collect(), total)
}

pub struct MemoryUsers(Shared);
pub struct MemoryPosts(Shared);
pub struct MemoryComments(Shared);

impl MemoryUsers {
    fn insert(tables: &mut Tables, new_user: NewUser) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .push((user.clone(), new_user.password.into_string()));
        user
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.0.lock().unwrap();
        Ok(tables.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.0.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn find_credential_by_id(&self, id: Uuid) -> AppResult<Option<Credential>> {
        let tables = self.0.lock().unwrap();
        Ok(tables.users.iter().find(|(u, _)| u.id == id).map(|(u, h)| Credential {
            user: u.clone(),
            password: Password::from_hash(h.clone()),
        }))
    }

    async fn find_credential_by_email(&self, email: &str) -> AppResult<Option<Credential>> {
        let tables = self.0.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, h)| Credential {
                user: u.clone(),
                password: Password::from_hash(h.clone()),
            }))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<CreateOutcome> {
        let mut tables = self.0.lock().unwrap();
        if tables.users.iter().any(|(u, _)| u.email == new_user.email) {
            return Ok(CreateOutcome::DuplicateKey);
        }
        Ok(CreateOutcome::Created(Self::insert(&mut tables, new_user)))
    }

    async fn create_admin_if_count(
        &self,
        new_user: NewUser,
        expected_admins: u64,
    ) -> AppResult<AdminCreateOutcome> {
        let mut tables = self.0.lock().unwrap();
        let admins = tables.users.iter().filter(|(u, _)| u.role.is_admin()).count() as u64;
        if admins != expected_admins {
            return Ok(AdminCreateOutcome::AdminCountChanged);
        }
        if tables.users.iter().any(|(u, _)| u.email == new_user.email) {
            return Ok(AdminCreateOutcome::DuplicateKey);
        }
        Ok(AdminCreateOutcome::Created(Self::insert(&mut tables, new_user)))
    }

    async fn count_by_role(&self, role: UserRole) -> AppResult<u64> {
        let tables = self.0.lock().unwrap();
        Ok(tables.users.iter().filter(|(u, _)| u.role == role).count() as u64)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<UpdateOutcome> {
        let mut tables = self.0.lock().unwrap();
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|(u, _)| &u.email == email && u.id != id) {
                return Ok(UpdateOutcome::DuplicateKey);
            }
        }
        let Some((user, _)) = tables.users.iter_mut().find(|(u, _)| u.id == id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(UpdateOutcome::Updated(user.clone()))
    }

    async fn set_password(&self, id: Uuid, password: Password) -> AppResult<bool> {
        let mut tables = self.0.lock().unwrap();
        match tables.users.iter_mut().find(|(u, _)| u.id == id) {
            Some((_, hash)) => {
                *hash = password.into_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.0.lock().unwrap();
        let before = tables.users.len();
        tables.users.retain(|(u, _)| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.posts.retain(|p| p.author_id != id);
        tables.comments.retain(|c| c.author_id != id);
        Ok(true)
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let tables = self.0.lock().unwrap();
        let users: Vec<User> = tables.users.iter().rev().map(|(u, _)| u.clone()).collect();
        Ok(page(users, &params))
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn create(&self, new_post: NewPost) -> AppResult<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: new_post.title,
            content: new_post.content,
            author_id: new_post.author_id,
            created_at: now,
            updated_at: now,
        };
        self.0.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Post>> {
        let tables = self.0.lock().unwrap();
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list(
        &self,
        author_id: Option<Uuid>,
        params: PaginationParams,
    ) -> AppResult<(Vec<Post>, u64)> {
        let tables = self.0.lock().unwrap();
        let posts: Vec<Post> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| author_id.map_or(true, |a| p.author_id == a))
            .cloned()
            .collect();
        Ok(page(posts, &params))
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> AppResult<Option<Post>> {
        let mut tables = self.0.lock().unwrap();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.0.lock().unwrap();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        tables.comments.retain(|c| c.post_id != id);
        Ok(tables.posts.len() < before)
    }
}

#[async_trait]
impl CommentRepository for MemoryComments {
    async fn create(&self, new_comment: NewComment) -> AppResult<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            content: new_comment.content,
            created_at: now,
            updated_at: now,
        };
        self.0.lock().unwrap().comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let tables = self.0.lock().unwrap();
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_for_post(
        &self,
        post_id: Uuid,
        params: PaginationParams,
    ) -> AppResult<(Vec<Comment>, u64)> {
        let tables = self.0.lock().unwrap();
        let comments: Vec<Comment> = tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        Ok(page(comments, &params))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.0.lock().unwrap();
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }
}

/// Unit of Work over the in-memory tables
pub struct MemoryStore {
    users: Arc<MemoryUsers>,
    posts: Arc<MemoryPosts>,
    comments: Arc<MemoryComments>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let shared: Shared = Arc::default();
        Self {
            users: Arc::new(MemoryUsers(shared.clone())),
            posts: Arc::new(MemoryPosts(shared.clone())),
            comments: Arc::new(MemoryComments(shared)),
        }
    }
}

impl UnitOfWork for MemoryStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn posts(&self) -> Arc<dyn PostRepository> {
        self.posts.clone()
    }

    fn comments(&self) -> Arc<dyn CommentRepository> {
        self.comments.clone()
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Response captured for assertions
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Access token from a `{ data: { user, token } }` body
    pub fn access_token(&self) -> String {
        self.body["data"]["token"]["access_token"]
            .as_str()
            .expect("access token in body")
            .to_string()
    }

    pub fn user_id(&self) -> Uuid {
        self.body["data"]["user"]["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("user id in body")
    }
}

/// Router plus direct handles on the store and token service
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_unit_of_work(store.clone(), &config);

        Self {
            router: create_router(state),
            store,
            tokens: TokenService::new(&config),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
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
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Register a regular user, returning (token, id)
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (String, Uuid) {
        let response = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "name": name, "email": email, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        (response.access_token(), response.user_id())
    }

    /// Call the admin bootstrap route as `caller`
    pub async fn register_admin(&self, caller: Option<&str>, email: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/api/auth/register-admin",
            caller,
            Some(serde_json::json!({
                "name": "Root Admin",
                "email": email,
                "password": "SecurePass123!",
            })),
        )
        .await
    }

    /// A syntactically valid token whose expiry has already passed
    pub fn expired_token(&self, id: Uuid, role: UserRole) -> String {
        self.tokens
            .issue_at(
                &quill_api::Identity::new(id, role),
                Utc::now() - Duration::days(30),
            )
            .unwrap()
            .access_token
    }
}
