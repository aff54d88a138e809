//! # luna-api
//!
//! HTTP client for the Luna Villa backend.
//!
//! ## Features
//!
//! - **Streaming chat**: replies arrive as incremental text deltas, either as
//!   a `Stream` or through a callback handler
//! - **Resources**: history, memos, tasks, calendar events and stats
//! - **Session**: server address and auth token persisted in a settings store
//! - **Diagnostics**: upload of buffered device logs
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use luna_api::{ApiClient, ChatCallbacks};
//! use luna_settings::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new(Arc::new(MemoryStore::new()))?;
//!     client.set_server_url("http://127.0.0.1:8000")?;
//!
//!     let mut reply = String::new();
//!     let mut handler = ChatCallbacks {
//!         on_chunk: |text: &str| reply.push_str(text),
//!         on_done: || println!("done"),
//!         on_error: |message: &str| eprintln!("error: {}", message),
//!     };
//!     client.chat("Good evening!", &[], &mut handler).await;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod stream;

// Re-export commonly used types
pub use client::{ApiClient, ChatCallbacks, ChatHandler};

pub use config::{normalize_server_url, DEFAULT_SERVER_URL};

pub use error::{ApiError, CONNECTIVITY_MESSAGE};

pub use stream::{decode_line, ChatDelta, StreamState};
