#![allow(dead_code)]

use std::sync::Arc;

use luna_api::{ApiClient, ChatHandler};
use luna_settings::{MemoryStore, SettingsStore};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock backend utilities for testing the client
pub struct LunaMockServer {
    server: MockServer,
}

impl LunaMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Client pointed at this server, optionally already logged in
    pub fn client(&self, token: Option<&str>) -> (ApiClient, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.set("server_url", &self.uri()).unwrap();
        if let Some(token) = token {
            store.set("auth_token", token).unwrap();
        }
        let client = ApiClient::new(store.clone()).unwrap();
        (client, store)
    }

    /// Mock the chat endpoint answering with a raw event-stream body
    pub async fn mock_chat_stream(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login_success(&self, password: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "password": password })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "token_type": "bearer"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "wrong password"
            })))
            .mount(&self.server)
            .await;
    }
}

/// Chat endpoint that sends its body as separate HTTP chunks.
///
/// `first` is written as soon as the request arrives; each part of `rest`
/// waits for one message on the returned sender. The body ends after the
/// last part.
pub struct ChunkedChatServer {
    uri: String,
    release: mpsc::UnboundedSender<()>,
}

impl ChunkedChatServer {
    pub async fn start(first: &'static str, rest: Vec<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        let (release, mut released) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      Content-Type: text/event-stream\r\n\
                      Transfer-Encoding: chunked\r\n\
                      Connection: close\r\n\r\n",
                )
                .await
                .unwrap();
            write_chunk(&mut socket, first).await;
            for part in rest {
                if released.recv().await.is_none() {
                    return;
                }
                write_chunk(&mut socket, part).await;
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
            socket.flush().await.unwrap();
        });

        Self { uri, release }
    }

    pub fn client(&self) -> ApiClient {
        let store = Arc::new(MemoryStore::new());
        store.set("server_url", &self.uri).unwrap();
        ApiClient::new(store).unwrap()
    }

    /// Let the next held-back part go out
    pub fn release_next(&self) {
        self.release.send(()).unwrap();
    }
}

async fn read_request(socket: &mut TcpStream) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            return;
        }
        data.extend_from_slice(&buf[..n]);

        let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if data.len() >= end + 4 + body_len {
            return;
        }
    }
}

async fn write_chunk(socket: &mut TcpStream, part: &str) {
    let frame = format!("{:x}\r\n{}\r\n", part.len(), part);
    socket.write_all(frame.as_bytes()).await.unwrap();
    socket.flush().await.unwrap();
}

/// One observed handler callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Chunk(String),
    Done,
    Error(String),
}

/// `ChatHandler` that records every callback in order
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Callback>,
}

impl Recorder {
    pub fn text(&self) -> String {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Callback::Chunk(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Callback::Chunk(_)))
            .count()
    }
}

impl ChatHandler for Recorder {
    fn on_chunk(&mut self, text: &str) {
        self.calls.push(Callback::Chunk(text.to_string()));
    }

    fn on_done(&mut self) {
        self.calls.push(Callback::Done);
    }

    fn on_error(&mut self, message: &str) {
        self.calls.push(Callback::Error(message.to_string()));
    }
}
