//! End-to-end tests: a real server on a random port, driven by WebSocket
//! clients speaking the JSON protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rookery::prelude::*;
use serde_json::{Value, json};
use tokio::io::AsyncReadExt;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = RookeryServerBuilder::new()
        .bind("127.0.0.1:0")
        .build::<StandardChess>()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send");
}

/// Receives the next JSON event, failing the test after two seconds.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).expect("json"),
            Message::Binary(data) => return serde_json::from_slice(&data).expect("json"),
            _ => continue,
        }
    }
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
    assert!(result.is_err(), "expected no event, got {result:?}");
}

/// Opens a room as "A" and returns its code.
async fn create_room(ws: &mut ClientWs) -> String {
    send(ws, json!({"type": "create_room", "displayName": "A"})).await;
    let created = recv(ws).await;
    assert_eq!(created["type"], "room_created");
    created["code"].as_str().expect("code").to_string()
}

/// Connects A and B and seats them in a fresh room.
async fn start_game(addr: &str) -> (ClientWs, ClientWs, String) {
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let code = create_room(&mut a).await;
    send(&mut b, json!({"type": "join_room", "code": code, "displayName": "B"})).await;
    assert_eq!(recv(&mut b).await["type"], "room_joined");
    assert_eq!(recv(&mut a).await["type"], "opponent_joined");
    (a, b, code)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_four_digit_code_as_white() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;

    send(&mut a, json!({"type": "create_room", "displayName": "A"})).await;
    let created = recv(&mut a).await;

    assert_eq!(created["type"], "room_created");
    assert_eq!(created["color"], "white");
    let code = created["code"].as_str().unwrap();
    assert_eq!(code.len(), 4);
    assert!(code.bytes().all(|b| b.is_ascii_digit()));
}

#[tokio::test]
async fn test_join_room_seats_black_and_notifies_host() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let code = create_room(&mut a).await;

    send(&mut b, json!({"type": "join_room", "code": code, "displayName": "B"})).await;

    assert_eq!(
        recv(&mut b).await,
        json!({"type": "room_joined", "code": code, "color": "black", "opponentName": "A"})
    );
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "opponent_joined", "opponentName": "B"})
    );
}

#[tokio::test]
async fn test_move_is_broadcast_identically() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    send(&mut a, json!({"type": "make_move", "from": "e2", "to": "e4"})).await;

    let expected = json!({
        "type": "move_applied",
        "from": "e2",
        "to": "e4",
        "promotion": "q",
        "moverName": "A",
        "moverColor": "white"
    });
    assert_eq!(recv(&mut a).await, expected);
    assert_eq!(recv(&mut b).await, expected);
}

#[tokio::test]
async fn test_out_of_turn_move_is_rejected_for_caller_only() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    send(&mut b, json!({"type": "make_move", "from": "e7", "to": "e5"})).await;

    assert_eq!(
        recv(&mut b).await,
        json!({"type": "rejected", "reason": "not_your_turn"})
    );
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_stale_client_move_rejected_then_accepted_on_its_turn() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    send(&mut b, json!({"type": "make_move", "from": "e7", "to": "e5"})).await;
    assert_eq!(recv(&mut b).await["reason"], "not_your_turn");

    send(&mut a, json!({"type": "make_move", "from": "e2", "to": "e4"})).await;
    assert_eq!(recv(&mut a).await["type"], "move_applied");
    assert_eq!(recv(&mut b).await["type"], "move_applied");

    send(&mut b, json!({"type": "make_move", "from": "e7", "to": "e5"})).await;
    for ws in [&mut a, &mut b] {
        let applied = recv(ws).await;
        assert_eq!(applied["type"], "move_applied");
        assert_eq!(applied["moverColor"], "black");
        assert_eq!(applied["moverName"], "B");
    }
}

#[tokio::test]
async fn test_declined_draw_keeps_game_playable() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    send(&mut a, json!({"type": "offer_draw"})).await;
    assert_eq!(recv(&mut b).await, json!({"type": "draw_offered"}));
    send(&mut b, json!({"type": "respond_draw", "accept": false})).await;
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "draw_response", "accepted": false})
    );

    send(&mut a, json!({"type": "make_move", "from": "d2", "to": "d4"})).await;
    assert_eq!(recv(&mut a).await["type"], "move_applied");
    assert_eq!(recv(&mut b).await["type"], "move_applied");
}

#[tokio::test]
async fn test_third_player_is_rejected_room_full() {
    let addr = start_server().await;
    let (_a, _b, code) = start_game(&addr).await;
    let mut c = connect(&addr).await;

    send(&mut c, json!({"type": "join_room", "code": code, "displayName": "C"})).await;

    assert_eq!(
        recv(&mut c).await,
        json!({"type": "rejected", "reason": "room_full"})
    );
}

#[tokio::test]
async fn test_join_unknown_code_is_rejected_room_not_found() {
    let addr = start_server().await;
    let mut c = connect(&addr).await;

    send(&mut c, json!({"type": "join_room", "code": "0001", "displayName": "C"})).await;

    assert_eq!(
        recv(&mut c).await,
        json!({"type": "rejected", "reason": "room_not_found"})
    );
}

#[tokio::test]
async fn test_malformed_frame_is_rejected_and_connection_survives() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;

    send(&mut a, json!({"type": "teleport"})).await;
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "rejected", "reason": "rejected_generic"})
    );

    a.send(Message::text("not json")).await.expect("send");
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "rejected", "reason": "rejected_generic"})
    );

    create_room(&mut a).await;
}

#[tokio::test]
async fn test_draw_offer_accept_ends_game() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    send(&mut a, json!({"type": "offer_draw"})).await;
    assert_eq!(recv(&mut b).await, json!({"type": "draw_offered"}));

    send(&mut b, json!({"type": "respond_draw", "accept": true})).await;

    let ended = json!({"type": "game_ended", "result": "1/2-1/2", "reason": "draw_agreement"});
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "draw_response", "accepted": true})
    );
    assert_eq!(recv(&mut a).await, ended);
    assert_eq!(recv(&mut b).await, ended);
}

#[tokio::test]
async fn test_resign_notifies_opponent() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    send(&mut b, json!({"type": "resign"})).await;

    assert_eq!(recv(&mut a).await, json!({"type": "opponent_resigned"}));
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "game_ended", "result": "1-0", "reason": "resignation"})
    );
}

#[tokio::test]
async fn test_disconnect_mid_game_awards_opponent() {
    let addr = start_server().await;
    let (mut a, mut b, _) = start_game(&addr).await;

    b.close(None).await.expect("close");

    assert_eq!(
        recv(&mut a).await,
        json!({"type": "opponent_disconnected", "name": "B", "color": "black"})
    );
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "game_ended", "result": "1-0", "reason": "disconnection"})
    );
}

#[tokio::test]
async fn test_room_is_deleted_after_both_players_leave() {
    let addr = start_server().await;
    let (mut a, mut b, code) = start_game(&addr).await;
    let mut c = connect(&addr).await;

    a.close(None).await.expect("close");
    b.close(None).await.expect("close");

    // Teardown runs in the background; poll until the code is gone.
    let mut reason = Value::Null;
    for _ in 0..50 {
        send(&mut c, json!({"type": "join_room", "code": code, "displayName": "C"})).await;
        let reply = recv(&mut c).await;
        reason = reply["reason"].clone();
        if reason == "room_not_found" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(reason, "room_not_found");
}

#[tokio::test]
async fn test_idle_tcp_peer_does_not_block_other_players() {
    let addr = start_server().await;

    // Opens a socket but never sends the upgrade request.
    let _idle = tokio::net::TcpStream::connect(&addr)
        .await
        .expect("tcp connect");

    let mut a = tokio::time::timeout(Duration::from_secs(2), connect(&addr))
        .await
        .expect("a second peer must connect while the first is idle");
    create_room(&mut a).await;
}

#[tokio::test]
async fn test_idle_tcp_peer_is_dropped_after_handshake_timeout() {
    let server = RookeryServerBuilder::new()
        .bind("127.0.0.1:0")
        .handshake_timeout(Duration::from_millis(50))
        .build::<StandardChess>()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let mut idle = tokio::net::TcpStream::connect(addr)
        .await
        .expect("tcp connect");
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), idle.read(&mut buf))
        .await
        .expect("server should close the idle socket");
    assert!(matches!(read, Ok(0) | Err(_)));
}

#[tokio::test]
async fn test_run_until_returns_on_shutdown() {
    let server = RookeryServerBuilder::new()
        .bind("127.0.0.1:0")
        .build::<StandardChess>()
        .await
        .expect("server should build");
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let running = tokio::spawn(server.run_until(async move {
        let _ = stop_rx.await;
    }));
    stop_tx.send(()).expect("server should be waiting");

    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("server should stop")
        .expect("task should not panic");
    assert!(result.is_ok());
}
