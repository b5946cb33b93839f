// server/tests/notification_channel.rs
use actix_web::{App, HttpServer};
use common::Config;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use server::{Delivery, ServerState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = Some("channel-test-secret".into());
    config
}

fn test_state() -> ServerState {
    ServerState::from_config(test_config()).expect("valid test config")
}

// Serve the app on an ephemeral port for the rest of the test
fn start(state: &ServerState) -> SocketAddr {
    let state = state.clone();
    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new().configure(move |cfg| state.configure(cfg))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind test server");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let url = format!("ws://{}/ws/notifications", addr);
    let (socket, _) = connect_async(url).await.expect("channel upgrade");
    socket
}

// Next JSON text frame, skipping control frames
async fn next_event(socket: &mut Socket) -> Value {
    let read = async {
        while let Some(frame) = socket.next().await {
            if let Message::Text(text) = frame.expect("channel frame") {
                return serde_json::from_str::<Value>(&text).expect("json frame");
            }
        }
        panic!("channel closed before an event arrived");
    };

    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("timed out waiting for channel event")
}

async fn announce(socket: &mut Socket, user_id: &str) {
    socket
        .send(Message::Text(
            json!({ "type": "announce", "user_id": user_id }).to_string(),
        ))
        .await
        .expect("send announce");

    let ack = next_event(socket).await;
    assert_eq!(ack, json!({ "type": "announced", "user_id": user_id }));
}

async fn wait_until_offline(state: &ServerState, user_id: &str) {
    for _ in 0..250 {
        if state.registry.lookup(user_id).is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} is still registered", user_id);
}

#[actix_web::test]
async fn test_notification_reaches_announced_channel() {
    let state = test_state();
    let addr = start(&state);

    let mut socket = connect(addr).await;
    announce(&mut socket, "u1").await;

    let event = json!({ "kind": "interview_invite", "job": "j-9" });
    let delivery = state.dispatcher.dispatch("u1", event.clone());
    assert_eq!(delivery, Delivery::Delivered);

    let pushed = next_event(&mut socket).await;
    assert_eq!(pushed, json!({ "type": "notification", "event": event }));

    let delivery = state.dispatcher.dispatch("u2", json!({ "kind": "ping" }));
    assert_eq!(delivery, Delivery::NotConnected);
}

#[actix_web::test]
async fn test_invalid_frame_gets_error_event() {
    let state = test_state();
    let addr = start(&state);

    let mut socket = connect(addr).await;
    socket
        .send(Message::Text("not json".into()))
        .await
        .expect("send frame");

    let event = next_event(&mut socket).await;
    assert_eq!(event["type"], "error");
    assert!(state.registry.is_empty());
}

#[actix_web::test]
async fn test_closing_channel_evicts_user() {
    let state = test_state();
    let addr = start(&state);

    let mut socket = connect(addr).await;
    announce(&mut socket, "u1").await;
    assert!(state.registry.lookup("u1").is_some());

    socket.close(None).await.expect("close channel");
    wait_until_offline(&state, "u1").await;

    let delivery = state.dispatcher.dispatch("u1", json!({ "kind": "ping" }));
    assert_eq!(delivery, Delivery::NotConnected);
}

#[actix_web::test]
async fn test_stale_close_keeps_newer_channel() {
    let state = test_state();
    let addr = start(&state);

    let mut first = connect(addr).await;
    announce(&mut first, "u1").await;
    let mut second = connect(addr).await;
    announce(&mut second, "u1").await;

    first.close(None).await.expect("close first channel");
    // let the first session stop and run its eviction
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(state.registry.lookup("u1").is_some());
    let delivery = state.dispatcher.dispatch("u1", json!({ "kind": "offer" }));
    assert_eq!(delivery, Delivery::Delivered);

    let pushed = next_event(&mut second).await;
    assert_eq!(pushed["event"]["kind"], "offer");
}

#[actix_web::test]
async fn test_silent_channel_is_evicted_after_timeout() {
    let mut config = test_config();
    config.channel.heartbeat_interval_secs = 1;
    config.channel.client_timeout_secs = 1;
    let state = ServerState::from_config(config).expect("valid test config");
    let addr = start(&state);

    let mut socket = connect(addr).await;
    announce(&mut socket, "u1").await;
    assert!(state.registry.lookup("u1").is_some());

    // never read again, so server pings go unanswered
    wait_until_offline(&state, "u1").await;
    drop(socket);
}
