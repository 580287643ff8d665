//! Mock SEMP v2 server on axum, run on its own tokio runtime so the
//! blocking client can be driven from plain tests.

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};

pub const USER: &str = "admin";
pub const PASSWORD: &str = "secret";

#[derive(Debug, Default)]
pub struct MockBroker {
    /// queue name -> last PATCHed configuration
    pub queues: BTreeMap<String, Value>,
    pub subscriptions: BTreeMap<String, Vec<String>>,
    /// method and decoded path of every authorized request
    pub requests: Vec<(String, String)>,
}

pub type Shared = Arc<Mutex<MockBroker>>;

type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
    (
        StatusCode::OK,
        Json(json!({ "data": data, "meta": { "responseCode": 200 } })),
    )
}

fn fail(status: StatusCode, semp_status: &str, description: &str) -> Reply {
    (
        status,
        Json(json!({
            "meta": {
                "responseCode": status.as_u16(),
                "error": { "code": 6, "description": description, "status": semp_status }
            }
        })),
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{USER}:{PASSWORD}"))
    );
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn record(state: &Shared, method: &str, path: String) {
    state.lock().unwrap().requests.push((method.to_string(), path));
}

async fn about(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "bad credentials");
    }
    record(&state, "GET", "/SEMP/v2/monitor/about".into());
    ok(json!({ "sempVersion": "2.36", "platform": "mock" }))
}

async fn create_queue(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(vpn): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "bad credentials");
    }
    record(&state, "POST", format!("{vpn}/queues"));
    let name = body["queueName"].as_str().unwrap_or_default().to_string();
    let mut broker = state.lock().unwrap();
    if broker.queues.contains_key(&name) {
        return fail(StatusCode::BAD_REQUEST, "ALREADY_EXISTS", "queue already exists");
    }
    broker.queues.insert(name, body.clone());
    ok(body)
}

async fn patch_queue(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((vpn, queue)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "bad credentials");
    }
    record(&state, "PATCH", format!("{vpn}/queues/{queue}"));
    let mut broker = state.lock().unwrap();
    match broker.queues.get_mut(&queue) {
        Some(config) => {
            if let (Some(config), Some(patch)) = (config.as_object_mut(), body.as_object()) {
                for (key, value) in patch {
                    config.insert(key.clone(), value.clone());
                }
            }
            ok(config.clone())
        }
        None => fail(StatusCode::BAD_REQUEST, "NOT_FOUND", "no such queue"),
    }
}

async fn delete_queue(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((vpn, queue)): Path<(String, String)>,
) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "bad credentials");
    }
    record(&state, "DELETE", format!("{vpn}/queues/{queue}"));
    let mut broker = state.lock().unwrap();
    broker.subscriptions.remove(&queue);
    match broker.queues.remove(&queue) {
        Some(_) => ok(Value::Null),
        None => fail(StatusCode::BAD_REQUEST, "NOT_FOUND", "no such queue"),
    }
}

async fn add_subscription(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((vpn, queue)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "bad credentials");
    }
    record(&state, "POST", format!("{vpn}/queues/{queue}/subscriptions"));
    let topic = body["subscriptionTopic"].as_str().unwrap_or_default().to_string();
    let mut broker = state.lock().unwrap();
    if !broker.queues.contains_key(&queue) {
        return fail(StatusCode::BAD_REQUEST, "NOT_FOUND", "no such queue");
    }
    let topics = broker.subscriptions.entry(queue).or_default();
    if topics.contains(&topic) {
        return fail(StatusCode::BAD_REQUEST, "ALREADY_EXISTS", "subscription already exists");
    }
    topics.push(topic);
    ok(body)
}

async fn delete_subscription(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((vpn, queue, topic)): Path<(String, String, String)>,
) -> Reply {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "bad credentials");
    }
    record(&state, "DELETE", format!("{vpn}/queues/{queue}/subscriptions/{topic}"));
    let mut broker = state.lock().unwrap();
    let topics = broker.subscriptions.entry(queue).or_default();
    match topics.iter().position(|t| *t == topic) {
        Some(i) => {
            topics.remove(i);
            ok(Value::Null)
        }
        None => fail(StatusCode::BAD_REQUEST, "NOT_FOUND", "no such subscription"),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/SEMP/v2/monitor/about", get(about))
        .route("/SEMP/v2/config/msgVpns/:vpn/queues", post(create_queue))
        .route(
            "/SEMP/v2/config/msgVpns/:vpn/queues/:queue",
            axum::routing::patch(patch_queue).delete(delete_queue),
        )
        .route(
            "/SEMP/v2/config/msgVpns/:vpn/queues/:queue/subscriptions",
            post(add_subscription),
        )
        .route(
            "/SEMP/v2/config/msgVpns/:vpn/queues/:queue/subscriptions/:topic",
            axum::routing::delete(delete_subscription),
        )
        .with_state(state)
}

/// Bind to port 0 and return the base URL and the shared mock state.
pub fn start_server() -> (String, Shared) {
    let state = Shared::default();
    let (tx, rx) = mpsc::channel();
    let app = router(state.clone());

    thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    let addr = rx.recv().unwrap();
    (format!("http://{addr}"), state)
}
