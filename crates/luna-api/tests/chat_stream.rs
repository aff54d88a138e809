mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use fixtures::{Callback, ChunkedChatServer, LunaMockServer, Recorder};
use futures_util::StreamExt;
use luna_api::{ApiClient, ApiError, ChatCallbacks, CONNECTIVITY_MESSAGE};
use luna_settings::{MemoryStore, SettingsStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_chat_delivers_chunks_then_done() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(
            200,
            concat!(
                "data: {\"content\":\"Good \"}\r\n\r\n",
                "data: {\"content\":\"evening\"}\r\n\r\n",
                "data: {\"done\":true}\r\n\r\n",
            ),
        )
        .await;
    let (client, _) = server.client(None);

    let mut recorder = Recorder::default();
    client.chat("hi", &[], &mut recorder).await;

    assert_eq!(
        recorder.calls,
        vec![
            Callback::Chunk("Good ".into()),
            Callback::Chunk("evening".into()),
            Callback::Done,
        ]
    );
}

#[tokio::test]
async fn test_chat_sends_message_images_and_token() {
    let server = LunaMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({
            "message": "look at this",
            "image_data": ["aW1hZ2U="]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"data: {\"content\":\"cute\"}\n".to_vec(), "text/event-stream"),
        )
        .expect(1)
        .mount(server.server())
        .await;
    let (client, _) = server.client(Some("secret-token"));

    let mut recorder = Recorder::default();
    client
        .chat("look at this", &["aW1hZ2U=".to_string()], &mut recorder)
        .await;

    assert_eq!(
        recorder.calls,
        vec![Callback::Chunk("cute".into()), Callback::Done]
    );
}

#[tokio::test]
async fn test_chat_ignores_noise_and_malformed_lines() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(
            200,
            concat!(
                ": keep-alive\n",
                "event: message\n",
                "data: {not json\n",
                "data: {\"content\":\"still here\"}\n",
                "id: 7\n",
                "data: {\"content\":\"!\"}",
            ),
        )
        .await;
    let (client, _) = server.client(None);

    let mut recorder = Recorder::default();
    client.chat("hi", &[], &mut recorder).await;

    assert_eq!(recorder.text(), "still here!");
    assert_eq!(recorder.calls.last(), Some(&Callback::Done));
    assert_eq!(recorder.terminal_count(), 1);
}

#[tokio::test]
async fn test_chat_server_error_event_is_terminal() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(
            200,
            concat!(
                "data: {\"content\":\"Hmm\"}\n",
                "event: error\n",
                "data: {\"error\":\"The model is sulking\"}\n",
                "data: {\"content\":\"never shown\"}\n",
            ),
        )
        .await;
    let (client, _) = server.client(None);

    let mut recorder = Recorder::default();
    client.chat("hi", &[], &mut recorder).await;

    assert_eq!(
        recorder.calls,
        vec![
            Callback::Chunk("Hmm".into()),
            Callback::Error("The model is sulking".into()),
        ]
    );
}

#[tokio::test]
async fn test_chat_non_success_status_reports_code() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(500, "data: {\"content\":\"partial\"}\n")
        .await;
    let (client, _) = server.client(None);

    let mut recorder = Recorder::default();
    client.chat("hi", &[], &mut recorder).await;

    assert_eq!(recorder.calls.len(), 1);
    match &recorder.calls[0] {
        Callback::Error(message) => assert!(message.contains("500"), "{message}"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_unreachable_server_reports_connectivity() {
    let store = Arc::new(MemoryStore::new());
    store.set("server_url", "http://127.0.0.1:9").unwrap();
    let client = ApiClient::new(store).unwrap();

    let mut recorder = Recorder::default();
    client.chat("hi", &[], &mut recorder).await;

    assert_eq!(
        recorder.calls,
        vec![Callback::Error(CONNECTIVITY_MESSAGE.to_string())]
    );
}

#[tokio::test]
async fn test_chat_with_closure_callbacks() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(200, "data: {\"content\":\"Hel\"}\ndata: {\"content\":\"lo\"}\n")
        .await;
    let (client, _) = server.client(None);

    let mut text = String::new();
    let mut done = 0;
    let mut errors = Vec::new();
    {
        let mut handler = ChatCallbacks {
            on_chunk: |chunk: &str| text.push_str(chunk),
            on_done: || done += 1,
            on_error: |message: &str| errors.push(message.to_string()),
        };
        client.chat("hi", &[], &mut handler).await;
    }

    assert_eq!(text, "Hello");
    assert_eq!(done, 1);
    assert!(errors.is_empty());
}

#[tokio::test]
async fn test_stream_chat_yields_deltas_and_single_error() {
    let server = LunaMockServer::new().await;
    server.mock_chat_stream(404, "").await;
    let (client, _) = server.client(None);

    let items: Vec<_> = client.stream_chat("hi", &[]).collect().await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(ApiError::Status(404))));
}

#[tokio::test]
async fn test_concurrent_chats_keep_independent_state() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(200, "data: {\"content\":\"same reply\"}\n")
        .await;
    let (client, _) = server.client(None);

    let mut first = Recorder::default();
    let mut second = Recorder::default();
    tokio::join!(
        client.chat("one", &[], &mut first),
        client.chat("two", &[], &mut second),
    );

    assert_eq!(first.text(), "same reply");
    assert_eq!(second.text(), "same reply");
    assert_eq!(first.terminal_count(), 1);
    assert_eq!(second.terminal_count(), 1);
}

#[tokio::test]
async fn test_line_split_across_reads_dispatches_once_complete() {
    let server = ChunkedChatServer::start("data: {\"content\":\"Hel", vec!["lo\"}\n"]).await;
    let client = server.client();

    let stream = client.stream_chat("hi", &[]);
    tokio::pin!(stream);

    // Only the first half of the line has arrived
    let early = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
    assert!(early.is_err(), "dispatched before the line was complete: {early:?}");

    server.release_next();
    assert_eq!(stream.next().await.unwrap().unwrap(), "Hello");
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_chat_callbacks_over_split_line() {
    let server = ChunkedChatServer::start("data: {\"content\":\"Hel", vec!["lo\"}\n"]).await;
    let client = server.client();

    let mut recorder = Recorder::default();
    tokio::join!(client.chat("hi", &[], &mut recorder), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        server.release_next();
    });

    assert_eq!(
        recorder.calls,
        vec![Callback::Chunk("Hello".into()), Callback::Done]
    );
}

#[tokio::test]
async fn test_chat_ignores_empty_error_field() {
    let server = LunaMockServer::new().await;
    server
        .mock_chat_stream(
            200,
            "data: {\"error\":\"\"}\ndata: {\"content\":\"fine\"}\n",
        )
        .await;
    let (client, _) = server.client(None);

    let mut recorder = Recorder::default();
    client.chat("hi", &[], &mut recorder).await;

    assert_eq!(
        recorder.calls,
        vec![Callback::Chunk("fine".into()), Callback::Done]
    );
}
