use async_stream::stream;
use futures::Stream;
use futures_util::StreamExt;
use luna_logging::{log_request, log_response_status, log_stream_line};
use luna_types::ChatRequest;

use super::ApiClient;
use crate::config::{endpoint, CHAT_PATH};
use crate::error::ApiError;
use crate::stream::{decode_line, ChatDelta, StreamState};

/// Receiver for the incremental results of one chat request.
///
/// `on_chunk` may fire any number of times; afterwards exactly one of
/// `on_done` or `on_error` fires, and nothing after it.
pub trait ChatHandler {
    fn on_chunk(&mut self, text: &str);
    fn on_done(&mut self);
    fn on_error(&mut self, message: &str);
}

/// `ChatHandler` built from three closures
pub struct ChatCallbacks<C, D, E> {
    pub on_chunk: C,
    pub on_done: D,
    pub on_error: E,
}

impl<C, D, E> ChatHandler for ChatCallbacks<C, D, E>
where
    C: FnMut(&str),
    D: FnMut(),
    E: FnMut(&str),
{
    fn on_chunk(&mut self, text: &str) {
        (self.on_chunk)(text)
    }

    fn on_done(&mut self) {
        (self.on_done)()
    }

    fn on_error(&mut self, message: &str) {
        (self.on_error)(message)
    }
}

impl ApiClient {
    /// Send a chat message and stream the reply as text deltas.
    ///
    /// The stream yields `Ok(text)` for every content event and ends after
    /// the body completes. It yields at most one `Err`, always as the final
    /// item: a transport failure, a non-success status, or an error event
    /// sent by the server.
    pub fn stream_chat(
        &self,
        message: &str,
        images: &[String],
    ) -> impl Stream<Item = Result<String, ApiError>> + Send + 'static {
        let body = ChatRequest {
            message: message.to_string(),
            image_data: images.to_vec(),
        };
        let url = endpoint(&self.server_url(), CHAT_PATH);
        let token = self.token();
        let verbose = self.verbose();

        if verbose {
            if let Ok(json) = serde_json::to_value(&body) {
                log_request(&url, &json, token.as_deref(), verbose);
            }
        }

        let mut request = self
            .http()
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        stream! {
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    log::error!("Chat request failed: {}", e);
                    yield Err(ApiError::Network(e));
                    return;
                }
            };

            let status = response.status();
            log_response_status(status.as_u16(), verbose);
            if !status.is_success() {
                log::warn!("Chat request returned status {}", status);
                yield Err(ApiError::Status(status.as_u16()));
                return;
            }

            let mut state = StreamState::new();
            let mut bytes = response.bytes_stream();
            let mut line_counter = 0;

            loop {
                let (lines, finished) = match bytes.next().await {
                    Some(Ok(chunk)) => (state.push(&chunk), false),
                    Some(Err(e)) => {
                        log::error!("Chat stream interrupted: {}", e);
                        yield Err(ApiError::Network(e));
                        return;
                    }
                    None => (state.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for line in lines {
                    line_counter += 1;
                    log_stream_line(line_counter, &line, verbose);

                    match decode_line(&line) {
                        Some(ChatDelta::Content(text)) => yield Ok(text),
                        Some(ChatDelta::Error(message)) => {
                            log::warn!("Server reported chat error: {}", message);
                            yield Err(ApiError::Server(message));
                            return;
                        }
                        // Completion is signalled by the end of the body
                        Some(ChatDelta::Done) | None => {}
                    }
                }

                if finished {
                    break;
                }
            }
        }
    }

    /// Callback flavour of [`ApiClient::stream_chat`].
    ///
    /// Errors never escape as values; they are reported via `on_error`.
    pub async fn chat<H>(&self, message: &str, images: &[String], handler: &mut H)
    where
        H: ChatHandler + ?Sized,
    {
        let stream = self.stream_chat(message, images);
        futures::pin_mut!(stream);

        while let Some(item) = stream.next().await {
            match item {
                Ok(text) => handler.on_chunk(&text),
                Err(e) => {
                    handler.on_error(&e.to_string());
                    return;
                }
            }
        }
        handler.on_done();
    }
}
