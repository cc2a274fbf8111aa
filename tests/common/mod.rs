#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use magic_villa::api::{self, AppState};
use magic_villa::repository::{
    Entity, Filter, MemoryStore, Repository, RepositoryError, Store, VillaNumberRepository,
    VillaRepository,
};

pub fn app(enable_swagger: bool) -> Router {
    api::app(AppState::new(MemoryStore::seeded()), enable_swagger)
}

pub fn seeded_app() -> Router {
    app(false)
}

/// App whose storage fails every call.
pub fn broken_app() -> Router {
    api::app(AppState::new(BrokenStore), false)
}

pub struct BrokenStore;

struct BrokenRepository;

#[async_trait]
impl<T: Entity> Repository<T> for BrokenRepository {
    async fn create(&self, _entity: T) -> Result<T, RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }

    async fn get(&self, _filter: Option<Filter>, _tracked: bool) -> Result<Option<T>, RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }

    async fn get_all(&self, _filter: Option<Filter>) -> Result<Vec<T>, RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }

    async fn remove(&self, _entity: &T) -> Result<(), RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }

    async fn replace(&self, _entity: &T) -> Result<(), RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }

    async fn save(&self) -> Result<(), RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }
}

impl VillaRepository for BrokenRepository {}

impl VillaNumberRepository for BrokenRepository {}

#[async_trait]
impl Store for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    fn villas(&self) -> Box<dyn VillaRepository> {
        Box::new(BrokenRepository)
    }

    fn villa_numbers(&self) -> Box<dyn VillaNumberRepository> {
        Box::new(BrokenRepository)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Err(RepositoryError::LockPoisoned)
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    send_request(app, request.body(body).unwrap()).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
