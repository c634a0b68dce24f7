//! Common test utilities for eventsock-client integration tests
//!
//! The mock server only answers a handshake when the test calls
//! [`MockWsServer::accept`]. Until then the client sits in its connection
//! attempt, which keeps "not open yet" states deterministic.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

/// How long any single wait in a test may take
pub const WAIT: Duration = Duration::from_secs(5);

/// Mock WebSocket server for client testing
pub struct MockWsServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockWsServer {
    /// Bind on an ephemeral local port
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        Self { listener, addr }
    }

    /// WebSocket url of the default events endpoint
    pub fn url(&self) -> String {
        format!("ws://{}/ws/events", self.addr)
    }

    /// Get the bound socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Complete the next client handshake
    pub async fn accept(&self) -> MockConnection {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("client never connected")
            .unwrap();
        let ws = accept_async(stream).await.unwrap();
        MockConnection { ws }
    }

    /// Take the next TCP connection and drop it mid-handshake
    ///
    /// Returns when the attempt arrived, for measuring backoff gaps.
    pub async fn reject(&self) -> Instant {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("client never retried")
            .unwrap();
        let arrived = Instant::now();
        drop(stream);
        arrived
    }
}

/// Server side of one accepted client connection
pub struct MockConnection {
    ws: WebSocketStream<TcpStream>,
}

impl MockConnection {
    /// Next JSON frame from the client
    pub async fn recv(&mut self) -> Value {
        self.recv_within(WAIT).await.expect("no frame from client")
    }

    /// Next JSON frame, or None if nothing arrives within `limit`
    pub async fn recv_within(&mut self, limit: Duration) -> Option<Value> {
        let deadline = Instant::now() + limit;
        loop {
            let message = timeout(deadline.saturating_duration_since(Instant::now()), self.ws.next())
                .await
                .ok()?;
            match message {
                Some(Ok(Message::Text(text))) => {
                    return Some(serde_json::from_str(&text).unwrap());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("client closed the connection")
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Send a JSON frame to the client
    pub async fn send(&mut self, frame: Value) {
        self.send_raw(&frame.to_string()).await;
    }

    /// Send arbitrary text to the client
    pub async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::Text(text.to_string())).await.unwrap();
    }

    /// Close the connection from the server side
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }

    /// Wait for the client to hang up; returns false on timeout
    pub async fn closed(&mut self) -> bool {
        let ended = async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        };
        timeout(WAIT, ended).await.is_ok()
    }
}

/// Poll `check` until it holds or the wait runs out
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
