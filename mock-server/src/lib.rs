use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Users are served with snake_case keys so clients can exercise key
/// conversion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email_address: String,
}

/// What the server saw of an `/echo` request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
}

pub type Db = Arc<BTreeMap<Uuid, User>>;

pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: Uuid::from_u128(1),
            display_name: "Ada Lovelace".to_string(),
            email_address: "ada@example.com".to_string(),
        },
        User {
            id: Uuid::from_u128(2),
            display_name: "Grace Hopper".to_string(),
            email_address: "grace@example.com".to_string(),
        },
    ]
}

pub fn app() -> Router {
    let db: Db = Arc::new(seed_users().into_iter().map(|u| (u.id, u)).collect());
    Router::new()
        .route("/v1/users", get(list_users))
        .route("/v1/users/{id}", get(get_user))
        .route("/v1/echo", get(echo))
        .route("/v1/status/{code}", get(status))
        .route("/v1/malformed", get(malformed))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    Json(db.values().cloned().collect())
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, StatusCode> {
    db.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(RawQuery(query): RawQuery, headers: HeaderMap) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    debug!("echo query={query:?}");
    Json(Echo { query, headers })
}

async fn status(Path(code): Path<u16>) -> (StatusCode, String) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, format!("status {}", status.as_u16()))
}

async fn malformed() -> &'static str {
    "not json"
}
