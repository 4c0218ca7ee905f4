//! Integration test: gateway in front of a fake assistant service, both on ephemeral ports.
//! Covers provisioning (create on empty account), verbatim forwarding, auth and version params.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use relay_core::config::{AssistantSettings, Config};
use relay_core::gateway::{self, GatewayState};
use relay_core::service::AssistantService;
use relay_core::training::TrainingDefinition;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Remote {
    workspaces: Mutex<Vec<String>>,
    created: Mutex<Vec<Value>>,
    messages: Mutex<Vec<(String, Value)>>,
    lists: Mutex<usize>,
    auth: Mutex<Vec<String>>,
    versions: Mutex<Vec<String>>,
    reject_messages: bool,
}

impl Remote {
    fn record(&self, headers: &HeaderMap, query: &HashMap<String, String>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Basic "))
            .and_then(|v| base64::engine::general_purpose::STANDARD.decode(v).ok())
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        self.auth.lock().unwrap().push(auth);
        self.versions
            .lock()
            .unwrap()
            .push(query.get("version").cloned().unwrap_or_default());
    }
}

async fn list_workspaces(
    State(remote): State<Arc<Remote>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    remote.record(&headers, &query);
    *remote.lists.lock().unwrap() += 1;
    let ids = remote.workspaces.lock().unwrap().clone();
    let workspaces: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "workspace_id": id, "name": "existing", "language": "en" }))
        .collect();
    Json(json!({ "workspaces": workspaces, "pagination": { "refresh_url": "/v1/workspaces" } }))
}

async fn create_workspace(
    State(remote): State<Arc<Remote>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    remote.record(&headers, &query);
    remote.created.lock().unwrap().push(body.clone());
    remote.workspaces.lock().unwrap().push("created-1".to_string());
    (
        StatusCode::CREATED,
        Json(json!({ "workspace_id": "created-1", "name": body["name"] })),
    )
}

async fn message(
    State(remote): State<Arc<Remote>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    remote.record(&headers, &query);
    if remote.reject_messages {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized", "code": 401 })),
        );
    }
    remote.messages.lock().unwrap().push((id.clone(), body.clone()));
    (
        StatusCode::OK,
        Json(json!({
            "input": body["input"],
            "context": body["context"],
            "output": { "text": ["Hello from the assistant"], "nodes_visited": ["Welcome"] },
            "intents": [],
            "entities": [],
            "workspace": id
        })),
    )
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

async fn spawn_remote(remote: Arc<Remote>) -> String {
    let app = Router::new()
        .route("/v1/workspaces", get(list_workspaces).post(create_workspace))
        .route("/v1/workspaces/:id/message", post(message))
        .with_state(remote);
    spawn(app).await
}

async fn spawn_gateway(settings: AssistantSettings) -> (String, Arc<AssistantService>) {
    let service = Arc::new(AssistantService::new(settings));
    let state = GatewayState {
        config: Arc::new(Config::default()),
        service: service.clone(),
    };
    (spawn(gateway::router(state)).await, service)
}

fn settings(url: String) -> AssistantSettings {
    AssistantSettings {
        url: Some(url),
        apikey: Some("secret-key".to_string()),
        version: "2018-07-10".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn first_message_creates_workspace_then_forwards_verbatim() {
    let remote = Arc::new(Remote::default());
    let remote_url = spawn_remote(remote.clone()).await;
    let (gateway_url, service) = spawn_gateway(settings(remote_url)).await;
    let client = reqwest::Client::new();

    for text in ["hello", "what is my balance"] {
        let res = client
            .post(format!("{}/api/message", gateway_url))
            .json(&json!({ "input": { "text": text }, "context": { "a": 1 } }))
            .send()
            .await
            .expect("send message");
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("json body");
        assert_eq!(body["output"]["text"], json!(["Hello from the assistant"]));
        assert_eq!(body["context"], json!({ "a": 1 }));
        assert_eq!(body["workspace"], "created-1");
    }

    assert_eq!(*remote.lists.lock().unwrap(), 1);
    let created = remote.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    let bundled = serde_json::to_value(TrainingDefinition::bundled().unwrap()).unwrap();
    for field in ["name", "intents", "entities", "dialog_nodes", "counterexamples", "metadata"] {
        assert_eq!(created[0][field], bundled[field], "field {}", field);
    }
    assert!(created[0].get("learning_opt_out").is_none());

    let messages = remote.messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].0, "created-1");
    assert_eq!(
        messages[0].1,
        json!({ "input": { "text": "hello" }, "context": { "a": 1 } })
    );

    assert!(remote.auth.lock().unwrap().iter().all(|a| a == "apikey:secret-key"));
    assert!(remote.versions.lock().unwrap().iter().all(|v| v == "2018-07-10"));
    assert_eq!(service.workspace_id(), Some("created-1"));
}

#[tokio::test]
async fn existing_workspace_is_reused_with_basic_auth() {
    let remote = Arc::new(Remote::default());
    remote
        .workspaces
        .lock()
        .unwrap()
        .extend(["first".to_string(), "second".to_string()]);
    let remote_url = spawn_remote(remote.clone()).await;
    let (gateway_url, _) = spawn_gateway(AssistantSettings {
        apikey: None,
        username: Some("alice".to_string()),
        password: Some("pw".to_string()),
        ..settings(remote_url)
    })
    .await;

    let res = reqwest::Client::new()
        .post(format!("{}/api/message", gateway_url))
        .json(&json!({ "input": { "text": "hi" } }))
        .send()
        .await
        .expect("send message");
    assert_eq!(res.status(), 200);

    assert!(remote.created.lock().unwrap().is_empty());
    let messages = remote.messages.lock().unwrap();
    assert_eq!(messages[0].0, "first");
    assert_eq!(messages[0].1, json!({ "input": { "text": "hi" } }));
    assert!(remote.auth.lock().unwrap().iter().all(|a| a == "alice:pw"));
}

#[tokio::test]
async fn empty_body_returns_no_content_and_sends_nothing() {
    let remote = Arc::new(Remote::default());
    let remote_url = spawn_remote(remote.clone()).await;
    let (gateway_url, _) = spawn_gateway(AssistantSettings {
        workspace_id: Some("pinned".to_string()),
        ..settings(remote_url)
    })
    .await;

    let res = reqwest::Client::new()
        .post(format!("{}/api/message", gateway_url))
        .send()
        .await
        .expect("send empty message");
    assert_eq!(res.status(), 200);
    assert!(res.bytes().await.expect("body").is_empty());

    assert_eq!(*remote.lists.lock().unwrap(), 0);
    assert!(remote.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_body_on_fresh_gateway_still_provisions() {
    let remote = Arc::new(Remote::default());
    let remote_url = spawn_remote(remote.clone()).await;
    let (gateway_url, service) = spawn_gateway(settings(remote_url)).await;

    let res = reqwest::Client::new()
        .post(format!("{}/api/message", gateway_url))
        .send()
        .await
        .expect("send empty message");
    assert_eq!(res.status(), 200);
    assert!(res.bytes().await.expect("body").is_empty());

    assert_eq!(*remote.lists.lock().unwrap(), 1);
    assert_eq!(remote.created.lock().unwrap().len(), 1);
    assert!(remote.messages.lock().unwrap().is_empty());
    assert_eq!(service.workspace_id(), Some("created-1"));
}

#[tokio::test]
async fn remote_rejection_is_surfaced_unchanged() {
    let remote = Arc::new(Remote {
        reject_messages: true,
        ..Default::default()
    });
    let remote_url = spawn_remote(remote.clone()).await;
    let (gateway_url, _) = spawn_gateway(AssistantSettings {
        workspace_id: Some("pinned".to_string()),
        ..settings(remote_url)
    })
    .await;

    let res = reqwest::Client::new()
        .post(format!("{}/api/message", gateway_url))
        .json(&json!({ "input": { "text": "hi" } }))
        .send()
        .await
        .expect("send message");
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.expect("json body");
    assert_eq!(body, json!({ "error": "Unauthorized", "code": 401 }));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (gateway_url, service) = spawn_gateway(settings("http://127.0.0.1:9".to_string())).await;
    let res = reqwest::Client::new()
        .post(format!("{}/api/message", gateway_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("send message");
    assert_eq!(res.status(), 400);
    assert_eq!(service.workspace_id(), None);
}
