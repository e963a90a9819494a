//! Mock nodes for integration testing.
//!
//! Every mock binds an ephemeral port on 127.0.0.1 and returns its address.
//! Handlers get the method (RPC), path (REST) or action (WebSocket) plus the
//! request payload and answer with `(error_code, result)`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::Uri;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub type Reply = (i64, Value);

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn desc(code: i64) -> &'static str {
    if code == 0 {
        "SUCCESS"
    } else {
        "INVALID PARAMS"
    }
}

/// JSON-RPC node. The handler sees `(method, params)`.
pub async fn start_rpc_node<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let app = Router::new().route(
        "/",
        post(move |Json(body): Json<Value>| {
            let handler = handler.clone();
            async move {
                let method = body["method"].as_str().unwrap_or_default();
                let (code, result) = handler(method, &body["params"]);
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "error": code,
                    "desc": desc(code),
                    "result": result,
                }))
            }
        }),
    );
    serve(app).await
}

/// JSON-RPC node that answers only after `delay`.
pub async fn start_stalled_rpc_node(delay: Duration) -> SocketAddr {
    let app = Router::new().route(
        "/",
        post(move |Json(body): Json<Value>| async move {
            tokio::time::sleep(delay).await;
            Json(json!({ "id": body["id"], "error": 0, "desc": "SUCCESS", "result": 1 }))
        }),
    );
    serve(app).await
}

/// REST node. The handler sees the path and query below `/api/v1`, and the
/// JSON body for POSTs (`Value::Null` for GETs).
pub async fn start_rest_node<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let app = Router::new().fallback(move |uri: Uri, body: String| {
        let handler = handler.clone();
        async move {
            let full = uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default();
            let path = full.strip_prefix("/api/v1").unwrap_or(&full);
            let payload = serde_json::from_str(&body).unwrap_or(Value::Null);
            let (code, result) = handler(path, &payload);
            Json(json!({
                "Action": "mock",
                "Version": "1.0.0",
                "Error": code,
                "Desc": desc(code),
                "Result": result,
            }))
        }
    });
    serve(app).await
}

/// WebSocket node. Reads `batch` frames before answering them in reverse
/// order, and sends an id-less push ahead of every batch of replies.
pub async fn start_ws_node<F>(batch: usize, handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let app = Router::new().route(
        "/",
        get(move |ws: WebSocketUpgrade| {
            let handler = handler.clone();
            async move { ws.on_upgrade(move |socket| answer_frames(socket, batch.max(1), handler)) }
        }),
    );
    serve(app).await
}

async fn answer_frames<F>(mut socket: WebSocket, batch: usize, handler: Arc<F>)
where
    F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
{
    let mut frames = Vec::with_capacity(batch);
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else { continue };
        let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else { continue };
        frames.push(frame);
        if frames.len() < batch {
            continue;
        }

        let push = json!({ "Action": "Notify", "Error": 0, "Desc": "SUCCESS", "Result": {} });
        if socket.send(Message::Text(push.to_string().into())).await.is_err() {
            return;
        }
        for frame in frames.drain(..).rev() {
            let action = frame["Action"].as_str().unwrap_or_default();
            let (code, result) = handler(action, &frame);
            let reply = json!({
                "Action": action,
                "Version": "1.0.0",
                "Id": frame["Id"],
                "Error": code,
                "Desc": desc(code),
                "Result": result,
            });
            if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                return;
            }
        }
    }
}

/// WebSocket node that hangs up after the first frame it receives.
pub async fn start_closing_ws_node() -> SocketAddr {
    let app = Router::new().route(
        "/",
        get(|ws: WebSocketUpgrade| async move {
            ws.on_upgrade(|mut socket: WebSocket| async move {
                let _ = socket.recv().await;
                let _ = socket.send(Message::Close(None)).await;
            })
        }),
    );
    serve(app).await
}

pub fn http_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{}", addr)
}

/// JSON-RPC node answering every call with `result` and recording the
/// request ids it saw.
pub async fn start_recording_rpc_node(result: Value) -> (SocketAddr, Arc<Mutex<Vec<Value>>>) {
    let ids: Arc<Mutex<Vec<Value>>> = Arc::default();
    let log = ids.clone();
    let app = Router::new().route(
        "/",
        post(move |Json(body): Json<Value>| {
            let log = log.clone();
            let result = result.clone();
            async move {
                log.lock().unwrap().push(body["id"].clone());
                Json(json!({ "id": body["id"], "error": 0, "desc": "SUCCESS", "result": result }))
            }
        }),
    );
    (serve(app).await, ids)
}
