//! Topic subscription integration tests

mod common;

use common::{eventually, MockWsServer, WAIT};
use eventsock_client::EventClient;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn forward(
    tx: &mpsc::UnboundedSender<(&'static str, Value)>,
    name: &'static str,
) -> impl Fn(Value) + Send + Sync + 'static {
    let tx = tx.clone();
    move |data| {
        let _ = tx.send((name, data));
    }
}

#[tokio::test]
async fn test_subscribe_sent_when_registered_while_open() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let mut conn = server.accept().await;
    assert!(eventually(|| client.is_open()).await);

    client.on("notice", |_| {}).unwrap();

    assert_eq!(conn.recv().await, json!({"subscribe": "notice"}));
}

#[tokio::test]
async fn test_handlers_run_in_registration_order() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    client.on("notice", forward(&tx, "first")).unwrap();
    client.on("notice", forward(&tx, "second")).unwrap();
    client.on("other", forward(&tx, "other")).unwrap();

    let mut conn = server.accept().await;
    conn.recv().await;
    conn.recv().await;
    conn.send(json!({"event": "notice", "data": {"id": 7}})).await;

    assert_eq!(
        timeout(WAIT, rx.recv()).await.unwrap(),
        Some(("first", json!({"id": 7})))
    );
    assert_eq!(
        timeout(WAIT, rx.recv()).await.unwrap(),
        Some(("second", json!({"id": 7})))
    );
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
}

#[tokio::test]
async fn test_event_without_data_delivers_null() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on("refresh", forward(&tx, "refresh")).unwrap();

    let mut conn = server.accept().await;
    conn.recv().await;
    conn.send(json!({"event": "refresh"})).await;

    assert_eq!(
        timeout(WAIT, rx.recv()).await.unwrap(),
        Some(("refresh", Value::Null))
    );
}

#[tokio::test]
async fn test_event_for_unknown_topic_is_ignored() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on("known", forward(&tx, "known")).unwrap();

    let mut conn = server.accept().await;
    conn.recv().await;
    conn.send(json!({"event": "unknown", "data": 1})).await;
    conn.send(json!({"event": "known", "data": 2})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(("known", json!(2))));
    assert!(client.is_open().await);
}

#[tokio::test]
async fn test_malformed_frames_are_discarded() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on("notice", forward(&tx, "notice")).unwrap();

    let mut conn = server.accept().await;
    conn.recv().await;
    conn.send_raw("not json").await;
    conn.send_raw("[1, 2, 3]").await;
    conn.send(json!({"data": "neither event nor id"})).await;
    conn.send(json!({"event": "notice", "data": "ok"})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(("notice", json!("ok"))));
    assert!(client.is_open().await);
}

#[tokio::test]
async fn test_panicking_handler_keeps_client_alive() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    client.on("notice", |_| panic!("handler failure")).unwrap();
    client.on("notice", forward(&tx, "after")).unwrap();

    let mut conn = server.accept().await;
    conn.recv().await;
    conn.send(json!({"event": "notice", "data": 1})).await;

    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(("after", json!(1))));
    assert!(client.is_open().await);
}

#[tokio::test]
async fn test_lifecycle_names_are_not_subscribed() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();

    client.on("open", |_| {}).unwrap();
    client.on("close", |_| {}).unwrap();
    client.on("notice", |_| {}).unwrap();

    let mut conn = server.accept().await;
    assert_eq!(conn.recv().await, json!({"subscribe": "notice"}));
    assert!(conn.recv_within(Duration::from_millis(200)).await.is_none());
}

#[tokio::test]
async fn test_each_topic_subscribed_once_per_open() {
    let server = MockWsServer::new().await;
    let client = EventClient::connect(&server.url()).unwrap();

    client.on("notice", |_| {}).unwrap();
    client.on("notice", |_| {}).unwrap();
    client.on("inbox", |_| {}).unwrap();

    let mut conn = server.accept().await;
    assert_eq!(conn.recv().await, json!({"subscribe": "notice"}));
    assert_eq!(conn.recv().await, json!({"subscribe": "inbox"}));
    assert!(conn.recv_within(Duration::from_millis(200)).await.is_none());
}
