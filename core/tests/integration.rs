//! End-to-end fetches against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `ApiService` over
//! real HTTP with the default ureq transport. Checks that finalized URLs,
//! headers, status handling and decoding line up with what the server sees.

use std::net::SocketAddr;
use std::sync::Arc;

use ib_foundation::{
    ApiConfig, ApiError, ApiService, DecodeContext, DecodeWithContext, FetchService, JsonDecoder,
    KeyStrategy, RequestBuilder, RequestBuilding, UreqTransport,
};
use mock_server::Echo;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct User {
    id: Uuid,
    display_name: String,
    email_address: String,
}

fn start_server() -> SocketAddr {
    let _ = env_logger::builder().is_test(true).try_init();

    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn api(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        scheme: "http".to_string(),
        host: addr.ip().to_string(),
        port: Some(addr.port()),
        base_path: "/v1/".to_string(),
    }
}

fn snake_case_service() -> ApiService<UreqTransport> {
    ApiService::with_transport(
        UreqTransport::new(),
        JsonDecoder::new().with_key_strategy(KeyStrategy::ConvertFromSnakeCase),
    )
}

#[test]
fn fetches_and_decodes_users() {
    let api = api(start_server());
    let service = snake_case_service();

    let users: Vec<User> = service.fetch_data(&api.endpoint("users")).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name, "Ada Lovelace");

    let grace: User = service
        .fetch_data(&api.endpoint(&format!("/users/{}/", Uuid::from_u128(2))))
        .unwrap();
    assert_eq!(grace.email_address, "grace@example.com");
}

#[test]
fn query_items_and_headers_reach_the_server() {
    let api = api(start_server());
    let endpoint = api
        .endpoint("echo")
        .add_query_item("name", Some("value"))
        .and_then(|b| b.add_query_item("flag", None))
        .unwrap()
        .add_header("X-Trace", "first")
        .add_header("X-Trace", "second");

    let echo: Echo = ApiService::new().fetch_data(&endpoint).unwrap();
    assert_eq!(echo.query.as_deref(), Some("name=value&flag"));
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("second"));
}

#[test]
fn no_query_items_means_no_query_string() {
    let api = api(start_server());
    let echo: Echo = ApiService::new().fetch_data(&api.endpoint("echo")).unwrap();
    assert!(echo.query.is_none());
}

#[test]
fn error_statuses_are_bad_server_responses() {
    let api = api(start_server());
    let service = ApiService::new();

    for code in [404u16, 500, 503] {
        let err = service
            .fetch_data::<serde_json::Value>(&api.endpoint(&format!("status/{code}")))
            .unwrap_err();
        match err {
            ApiError::BadServerResponse { status, body } => {
                assert_eq!(status, code);
                assert_eq!(body, format!("status {code}"));
            }
            other => panic!("{code}: unexpected error: {other:?}"),
        }
    }

    let missing = api.endpoint(&format!("users/{}", Uuid::nil()));
    let err = service.fetch_data::<User>(&missing).unwrap_err();
    assert!(matches!(err, ApiError::BadServerResponse { status: 404, .. }));
}

#[test]
fn malformed_body_is_decode_error() {
    let api = api(start_server());
    let err = ApiService::new()
        .fetch_data::<Vec<User>>(&api.endpoint("malformed"))
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn default_keys_do_not_match_snake_case_payload() {
    let api = api(start_server());
    let err = ApiService::new()
        .fetch_data::<Vec<User>>(&api.endpoint("users"))
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn unreachable_host_is_transport_error() {
    // Bind then drop so the port is very likely closed.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let endpoint = RequestBuilder::with_scheme("http", "127.0.0.1", "users").with_port(addr.port());
    let err = ApiService::new().fetch_data::<serde_json::Value>(&endpoint).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}

#[test]
fn invalid_host_fails_before_any_io() {
    let endpoint = RequestBuilder::new("bad host", "users");
    assert!(endpoint.build().is_none());
    let err = ApiService::new().fetch_data::<serde_json::Value>(&endpoint).unwrap_err();
    assert!(matches!(err, ApiError::MalformedUrl { .. }));
}

/// Collects every user decoded through it.
#[derive(Default)]
struct UserStore {
    names: std::sync::Mutex<Vec<String>>,
}

#[derive(Debug)]
struct StoredUsers(usize);

impl DecodeWithContext for StoredUsers {
    fn decode_with_context(
        value: serde_json::Value,
        context: &DecodeContext,
    ) -> Result<Self, ApiError> {
        let store = context.model_container::<UserStore>()?;
        let users: Vec<User> =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
        let mut names = store.names.lock().unwrap();
        names.extend(users.iter().map(|u| u.display_name.clone()));
        Ok(StoredUsers(users.len()))
    }
}

#[test]
fn fetch_with_context_inserts_into_container() {
    let api = api(start_server());
    let store = Arc::new(UserStore::default());
    let service = ApiService::with_transport(
        UreqTransport::new(),
        JsonDecoder::configured(
            KeyStrategy::ConvertFromSnakeCase,
            DecodeContext::from_model_container(store.clone()),
        ),
    );

    let stored: StoredUsers = service.fetch_with_context(&api.endpoint("users")).unwrap();
    assert_eq!(stored.0, 2);
    assert_eq!(
        *store.names.lock().unwrap(),
        vec!["Ada Lovelace".to_string(), "Grace Hopper".to_string()]
    );
}

#[test]
fn fetch_with_context_requires_the_right_handle() {
    let api = api(start_server());
    let service = ApiService::with_transport(
        UreqTransport::new(),
        JsonDecoder::new().with_key_strategy(KeyStrategy::ConvertFromSnakeCase),
    );
    let err = service
        .fetch_with_context::<StoredUsers>(&api.endpoint("users"))
        .unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));
}
