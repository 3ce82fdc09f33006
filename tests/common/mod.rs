//! Mock HTTP server shared by the integration tests
//!
//! Routes:
//! - `/b2api/v2/b2_authorize_account` - configured JSON body, or 401 when unset
//! - `/missing/*` - 404
//! - `/redirect/<path>` - 307 to `/<path>`
//! - anything else - 200 with body `content of <path>`

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const AUTHORIZE_PATH: &str = "/b2api/v2/b2_authorize_account";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    authorize_response: Arc<Mutex<Option<serde_json::Value>>>,
}

pub struct MockServer {
    base_url: String,
    state: MockState,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        // Bind to random available port
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let bound_addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{bound_addr}"),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn authorize_url(&self) -> String {
        self.url(AUTHORIZE_PATH)
    }

    pub fn set_authorize_response(&self, body: serde_json::Value) {
        *self.state.authorize_response.lock().unwrap() = Some(body);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

async fn handle(State(state): State<MockState>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        headers,
    });

    if path == AUTHORIZE_PATH {
        let body = state.authorize_response.lock().unwrap().clone();
        return match body {
            Some(body) => Json(body).into_response(),
            None => StatusCode::UNAUTHORIZED.into_response(),
        };
    }

    if path.starts_with("/missing/") {
        return StatusCode::NOT_FOUND.into_response();
    }

    if let Some(target) = path.strip_prefix("/redirect") {
        return Redirect::temporary(target).into_response();
    }

    format!("content of {path}").into_response()
}
