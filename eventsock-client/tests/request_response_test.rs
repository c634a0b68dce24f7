//! Reply correlation integration tests

mod common;

use common::{eventually, MockWsServer, WAIT};
use eventsock_client::{ClientBuilder, EventClient};
use eventsock_core::Error;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn reply_id(frame: &Value) -> String {
    frame["id"].as_str().expect("frame carries a string id").to_string()
}

#[tokio::test]
async fn test_callback_receives_correlated_reply() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let mut conn = server.accept().await;
    assert!(eventually(|| client.is_open()).await);

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .emit_with_callback("inbox.load", Some(json!({"page": 1})), move |data| {
            let _ = tx.send(data);
        })
        .unwrap();

    let frame = conn.recv().await;
    assert_eq!(frame["event"], "inbox.load");
    assert_eq!(frame["data"], json!({"page": 1}));
    let id = reply_id(&frame);
    let numeric: u64 = id.parse().unwrap();
    assert!(numeric < 2_000_000_000);
    assert_eq!(client.pending_callbacks().await.unwrap(), 1);

    conn.send(json!({"id": id, "data": [1, 2, 3]})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(json!([1, 2, 3])));
    assert_eq!(client.pending_callbacks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_second_reply_is_ignored() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let marker = tx.clone();
    client
        .on("marker", move |_| {
            let _ = marker.send(json!("marker"));
        })
        .unwrap();
    let mut conn = server.accept().await;
    assert_eq!(conn.recv().await, json!({"subscribe": "marker"}));

    client
        .emit_with_callback("inbox.load", None::<Value>, move |data| {
            let _ = tx.send(data);
        })
        .unwrap();

    let id = reply_id(&conn.recv().await);
    conn.send(json!({"id": id, "data": "first"})).await;
    conn.send(json!({"id": id, "data": "second"})).await;
    conn.send(json!({"event": "marker"})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(json!("first")));
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(json!("marker")));
    assert!(client.is_open().await);
}

#[tokio::test]
async fn test_reply_for_unknown_id_is_ignored() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let mut conn = server.accept().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .emit_with_callback("inbox.load", None::<Value>, move |data| {
            let _ = tx.send(data);
        })
        .unwrap();

    let id = reply_id(&conn.recv().await);
    conn.send(json!({"id": "no-such-id", "data": "stray"})).await;
    conn.send(json!({"id": id, "data": "mine"})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(json!("mine")));
}

#[tokio::test]
async fn test_numeric_reply_id_matches() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new(server.url())
        .with_id_generator(|| "42".to_string())
        .connect()
        .unwrap();
    let mut conn = server.accept().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .emit_with_callback("count", None::<Value>, move |data| {
            let _ = tx.send(data);
        })
        .unwrap();

    assert_eq!(conn.recv().await, json!({"event": "count", "id": "42"}));
    conn.send(json!({"id": 42, "data": 5})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(json!(5)));
}

#[tokio::test]
async fn test_callback_emitted_while_disconnected_is_buffered() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    client
        .emit_with_callback("inbox.load", None::<Value>, move |data| {
            let _ = tx.send(data);
        })
        .unwrap();
    assert_eq!(client.buffered_frames().await.unwrap(), 1);
    assert_eq!(client.pending_callbacks().await.unwrap(), 1);

    let mut conn = server.accept().await;
    let id = reply_id(&conn.recv().await);
    conn.send(json!({"id": id, "data": "late"})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(json!("late")));
}

#[tokio::test]
async fn test_request_returns_typed_reply() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let mut conn = server.accept().await;

    let requester = client.clone();
    let pending =
        tokio::spawn(async move { requester.request::<_, Vec<u32>>("ids", Some("all")).await });

    let frame = conn.recv().await;
    assert_eq!(frame["data"], "all");
    conn.send(json!({"id": reply_id(&frame), "data": [4, 5]})).await;

    assert_eq!(pending.await.unwrap(), Ok(vec![4, 5]));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new(server.url())
        .with_request_timeout(Duration::from_millis(100))
        .connect()
        .unwrap();
    let mut conn = server.accept().await;

    let result: eventsock_core::Result<Value> = client.request("slow", None::<Value>).await;

    assert_eq!(result, Err(Error::Timeout));
    assert!(conn.recv().await["id"].is_string());
}

#[tokio::test]
async fn test_expired_callbacks_are_swept() {
    let server = MockWsServer::new().await;
    let client = ClientBuilder::new(server.url())
        .with_callback_ttl(Duration::from_millis(50))
        .connect()
        .unwrap();
    let _conn = server.accept().await;

    client
        .emit_with_callback("forgotten", None::<Value>, |_| {})
        .unwrap();
    assert_eq!(client.pending_callbacks().await.unwrap(), 1);

    let handle = client.clone();
    let drained = eventually(move || {
        let handle = handle.clone();
        async move { handle.pending_callbacks().await == Ok(0) }
    })
    .await;
    assert!(drained);
}
