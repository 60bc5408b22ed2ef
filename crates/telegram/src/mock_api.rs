//! A local stand-in for the Telegram Bot API used by the unit tests.

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    secrecy::Secret,
    serde_json::{Value, json},
    tokio::sync::oneshot,
};

use crate::TelegramAccountConfig;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    get_updates: Arc<Mutex<VecDeque<Value>>>,
    get_me: Arc<Mutex<Option<Value>>>,
}

pub struct MockTelegramApi {
    state: MockState,
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            state,
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Account config pointing at this mock.
    pub fn account_config(&self) -> TelegramAccountConfig {
        TelegramAccountConfig {
            token: Secret::new("123:test-token".into()),
            api_url: Some(format!("http://{}/", self.addr)),
            ..Default::default()
        }
    }

    /// Queue the full JSON body returned by the next `getUpdates` call.
    pub fn push_get_updates(&self, response: Value) {
        self.state.get_updates.lock().unwrap().push_back(response);
    }

    /// Override the `getMe` response body.
    pub fn set_get_me(&self, response: Value) {
        *self.state.get_me.lock().unwrap() = Some(response);
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.method).collect()
    }
}

impl Drop for MockTelegramApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn telegram_api_handler(
    State(state): State<MockState>,
    uri: Uri,
    body: Bytes,
) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.clone(),
        body,
    });

    let response = match method.as_str() {
        "GetMe" => state
            .get_me
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| ok(me())),
        "GetUpdates" => state
            .get_updates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok(json!([]))),
        "SendMessage" => ok(json!({
            "message_id": 100,
            "date": 0,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "text": "ok"
        })),
        _ => ok(json!(true)),
    };
    Json(response)
}

pub fn ok(result: Value) -> Value {
    json!({ "ok": true, "result": result })
}

pub fn me() -> Value {
    json!({
        "id": 1,
        "is_bot": true,
        "first_name": "Updraft",
        "username": "updraft_test_bot",
        "can_join_groups": false,
        "can_read_all_group_messages": false,
        "supports_inline_queries": false,
        "can_connect_to_business": false,
        "has_main_web_app": false
    })
}

pub fn text_update(update_id: u64, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "last_name": "Liddell",
                "username": "alice"
            },
            "text": text
        }
    })
}
