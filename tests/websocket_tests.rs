//! WebSocket sessions against a running server.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use weblet::{FieldType, HandlerError, PacketArgs, PacketUnit, Schema};

fn packets() -> PacketUnit {
    PacketUnit::new("index")
        .single(
            "echo",
            Schema::new().required("text", FieldType::String),
            |args: PacketArgs| async move {
                let text: String = args.get("text")?;
                Ok::<_, HandlerError>(json!({ "text": text }))
            },
        )
        .stream(
            "stream",
            Schema::new().required("n", FieldType::Integer),
            |args: PacketArgs| {
                let n = args.get::<u64>("n").unwrap_or(0);
                futures_util::stream::iter((0..n).map(|i| Ok::<_, HandlerError>(json!({ "i": i }))))
            },
        )
}

async fn next_text<S>(socket: &mut S) -> String
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    frame.into_text().unwrap().as_str().to_string()
}

#[tokio::test]
async fn test_session_round_trip() {
    let site = common::start_site(&[], |builder| builder.packets(packets())).await;
    let (mut socket, _) = connect_async(site.ws_url("/ws")).await.unwrap();

    socket.send(Message::text(r#"["ping", {}]"#)).await.unwrap();
    assert_eq!(next_text(&mut socket).await, r#"{"error":"the packet name ping is not valid"}"#);

    socket.send(Message::text("not-json")).await.unwrap();
    let reply: Value = serde_json::from_str(&next_text(&mut socket).await).unwrap();
    assert!(reply["error"].is_string());

    socket.send(Message::text(r#"["echo", {"text": "hi"}]"#)).await.unwrap();
    assert_eq!(next_text(&mut socket).await, r#"{"text":"hi"}"#);
}

#[tokio::test]
async fn test_stream_then_connection_stays_open() {
    let site = common::start_site(&[], |builder| builder.packets(packets())).await;
    let (mut socket, _) = connect_async(site.ws_url("/ws")).await.unwrap();

    socket.send(Message::text(r#"["stream", {"n": 3}]"#)).await.unwrap();
    for i in 0..3 {
        assert_eq!(next_text(&mut socket).await, format!(r#"{{"i":{i}}}"#));
    }

    socket.send(Message::Ping(Vec::new().into())).await.unwrap();
    socket.send(Message::text(r#"["echo", {"text": "still here"}]"#)).await.unwrap();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            assert_eq!(text.as_str(), r#"{"text":"still here"}"#);
            break;
        }
    }
}

#[tokio::test]
async fn test_validation_errors_over_the_wire() {
    let site = common::start_site(&[], |builder| builder.packets(packets())).await;
    let (mut socket, _) = connect_async(site.ws_url("/ws")).await.unwrap();

    socket.send(Message::text(r#"["echo", {}]"#)).await.unwrap();
    assert_eq!(
        next_text(&mut socket).await,
        r#"{"error":"1 validation error: text: field required"}"#
    );
}

#[tokio::test]
async fn test_second_entrypoint_shares_packets() {
    let site = common::start_site(&[], |builder| builder.packets(packets())).await;
    let (mut socket, _) = connect_async(site.ws_url("/live")).await.unwrap();

    socket.send(Message::text(r#"["echo", {"text": "live"}]"#)).await.unwrap();
    assert_eq!(next_text(&mut socket).await, r#"{"text":"live"}"#);
}
