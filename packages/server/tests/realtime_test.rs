//! Integration tests that drive a real server over WebSocket and HTTP.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use machiya_server::{
    infrastructure::auth::{Claims, JwtVerifier},
    ui::{AppState, Dependencies, Server, ServerSettings},
};
use machiya_shared::time::SystemClock;
use serde_json::{Value, json};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message, client::IntoClientRequest, http::HeaderValue},
};

const SECRET: &str = "integration-secret";
const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE: Duration = Duration::from_millis(200);

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper struct that owns a server bound to an ephemeral port
struct TestServer {
    addr: SocketAddr,
    verifier: Arc<JwtVerifier>,
}

impl TestServer {
    async fn start() -> Self {
        let clock = Arc::new(SystemClock);
        let verifier = Arc::new(JwtVerifier::new(SECRET, clock.clone()));
        let state = Arc::new(AppState::new(Dependencies::in_memory(
            verifier.clone(),
            clock,
        )));
        let settings = ServerSettings {
            // heartbeat がテスト中に割り込まないよう十分長くする
            heartbeat_interval: Duration::from_secs(3600),
            monitor_interval: Duration::from_secs(3600),
            allowed_origin: "http://localhost:3000".to_string(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(Server::new(state, settings).serve(listener, std::future::pending()));

        Self { addr, verifier }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn token(&self, user_id: &str) -> String {
        self.verifier
            .sign(&Claims {
                user_id: user_id.to_string(),
                wallet_address: format!("wallet-{}", user_id),
                username: Some(format!("{}-name", user_id)),
                exp: None,
            })
            .unwrap()
    }

    /// Connect as `user_id` (or anonymously with `None`)
    async fn connect(&self, user_id: Option<&str>) -> Ws {
        let url = match user_id {
            Some(user_id) => format!("{}?token={}", self.ws_url(), self.token(user_id)),
            None => self.ws_url(),
        };
        let (ws, _) = connect_async(url).await.unwrap();
        ws
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = reqwest::get(self.http_url(path)).await.unwrap();
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }
}

async fn send(ws: &mut Ws, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Wait for the next event frame
async fn recv(ws: &mut Ws) -> Value {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Assert that no event frame arrives for a short while
async fn assert_silent(ws: &mut Ws) {
    if let Ok(Some(Ok(Message::Text(text)))) = timeout(SILENCE, ws.next()).await {
        panic!("unexpected event: {}", text.as_str());
    }
}

/// Join a room and consume the resulting room_state
async fn join(ws: &mut Ws, room_id: &str, kind: &str) -> Value {
    send(ws, "join_room", json!({"roomId": room_id, "type": kind})).await;
    let state = recv(ws).await;
    assert_eq!(state["event"], "room_state");
    state
}

#[tokio::test]
async fn test_city_update_is_relayed_without_echo() {
    // テスト項目: city_update はルームの他のメンバーにだけ届き、送信者には返らない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut bob = server.connect(Some("u2")).await;
    join(&mut alice, "city1", "city").await;
    let bob_state = join(&mut bob, "city1", "city").await;
    let joined = recv(&mut alice).await;

    // when (操作):
    let city = json!({"resources": {"wood": 10}, "buildings": []});
    send(&mut alice, "city_update", json!({"roomId": "city1", "cityData": city})).await;

    // then (期待する結果):
    assert_eq!(bob_state["data"]["users"].as_array().unwrap().len(), 2);
    assert_eq!(joined["event"], "user_joined");
    assert_eq!(joined["data"]["user"]["userId"], "u2");
    assert_eq!(recv(&mut bob).await, json!({"event": "city_updated", "data": city}));
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_events_from_one_connection_arrive_in_send_order() {
    // テスト項目: 1 つの接続から続けて送ったイベントは、送信順のままルームに届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut bob = server.connect(Some("u2")).await;
    join(&mut alice, "city3", "city").await;
    join(&mut bob, "city3", "city").await;
    recv(&mut alice).await; // user_joined (u2)

    // when (操作):
    let building = json!({"kind": "farm", "x": 1, "y": 2});
    send(&mut alice, "building_placed", json!({"roomId": "city3", "building": building})).await;
    send(&mut alice, "city_update", json!({"roomId": "city3", "cityData": {"step": 1}})).await;
    for step in 0..20 {
        send(
            &mut alice,
            "send_message",
            json!({"roomId": "city3", "message": {"content": format!("step {}", step)}}),
        )
        .await;
    }

    // then (期待する結果):
    let added = recv(&mut bob).await;
    assert_eq!(added["event"], "building_added");
    assert_eq!(added["data"]["building"], building);
    assert_eq!(recv(&mut bob).await["event"], "city_updated");
    for step in 0..20 {
        let message = recv(&mut bob).await;
        assert_eq!(message["event"], "new_message");
        assert_eq!(message["data"]["content"], format!("step {}", step));
    }
}

#[tokio::test]
async fn test_late_joiner_receives_history_and_city() {
    // テスト項目: 後から参加した接続は直近のチャットと都市スナップショットを受け取る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    join(&mut alice, "city7", "city").await;
    send(
        &mut alice,
        "send_message",
        json!({"roomId": "city7", "message": {"content": "welcome"}}),
    )
    .await;
    assert_eq!(recv(&mut alice).await["event"], "new_message");
    let city = json!({"resources": {"stone": 3}});
    send(&mut alice, "city_update", json!({"roomId": "city7", "cityData": city})).await;
    // city_update は送信者に返らないので、後続の往復で処理完了を待つ
    join(&mut alice, "city7", "city").await;

    // when (操作):
    let mut bob = server.connect(Some("u2")).await;
    let state = join(&mut bob, "city7", "city").await;

    // then (期待する結果):
    let messages = state["data"]["recentMessages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "welcome");
    assert_eq!(messages[0]["senderId"], "u1");
    assert_eq!(state["data"]["city"], city);
}

#[tokio::test]
async fn test_trade_offer_reaches_recipient_and_global_room() {
    // テスト項目: trade_offer は相手に trade_received、global ルームに trade_created を届ける
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut bob = server.connect(Some("u2")).await;
    let mut watcher = server.connect(None).await;
    join(&mut alice, "trade-hall", "trade").await;
    join(&mut bob, "trade-hall", "trade").await;
    recv(&mut alice).await; // user_joined (u2)
    join(&mut watcher, "global", "global").await;

    // when (操作):
    send(
        &mut alice,
        "trade_offer",
        json!({"tradeId": "t1", "toUserId": "u2", "offer": {"wood": 5}}),
    )
    .await;

    // then (期待する結果):
    let received = recv(&mut bob).await;
    assert_eq!(received["event"], "trade_received");
    assert_eq!(received["data"]["tradeId"], "t1");
    assert_eq!(received["data"]["fromUser"]["userId"], "u1");
    let created = recv(&mut watcher).await;
    assert_eq!(created["event"], "trade_created");
    assert_eq!(created["data"]["tradeId"], "t1");
}

#[tokio::test]
async fn test_anonymous_chat_has_null_sender() {
    // テスト項目: トークン無しの接続もチャットでき、senderId は null になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut spectator = server.connect(None).await;
    join(&mut spectator, "global", "global").await;

    // when (操作):
    send(
        &mut spectator,
        "send_message",
        json!({"roomId": "global", "message": {"content": "hello"}}),
    )
    .await;

    // then (期待する結果):
    let message = recv(&mut spectator).await;
    assert_eq!(message["event"], "new_message");
    assert_eq!(message["data"]["senderId"], Value::Null);
    assert_eq!(message["data"]["senderName"], "Anonymous");
    assert_eq!(message["data"]["content"], "hello");
    assert_eq!(message["data"]["type"], "text");
}

#[tokio::test]
async fn test_invalid_token_is_rejected_with_401() {
    // テスト項目: 検証できないトークンではハンドシェイクが 401 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let url = format!("{}?token=not-a-jwt", server.ws_url());

    // when (操作):
    let result = connect_async(url).await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("handshake should be rejected"),
    }
}

#[tokio::test]
async fn test_bearer_header_identifies_connection() {
    // テスト項目: Authorization: Bearer ヘッダーのトークンでも身元付き接続になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut request = server.ws_url().into_client_request().unwrap();
    let bearer = format!("Bearer {}", server.token("u1"));
    request
        .headers_mut()
        .insert("Authorization", HeaderValue::from_str(&bearer).unwrap());

    // when (操作):
    let (mut ws, _) = connect_async(request).await.unwrap();
    let state = join(&mut ws, "guild9", "guild").await;

    // then (期待する結果):
    assert_eq!(state["data"]["users"][0]["userId"], "u1");
    assert_eq!(state["data"]["users"][0]["username"], "u1-name");
}

#[tokio::test]
async fn test_disconnect_leaves_rooms() {
    // テスト項目: 切断すると残りのメンバーに user_left が届き、空のルームは消える
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    let mut bob = server.connect(Some("u2")).await;
    join(&mut alice, "guild1", "guild").await;
    join(&mut bob, "guild1", "guild").await;
    recv(&mut alice).await; // user_joined (u2)

    // when (操作):
    alice.close(None).await.unwrap();

    // then (期待する結果):
    let left = recv(&mut bob).await;
    assert_eq!(left["event"], "user_left");
    assert_eq!(left["data"]["user"]["userId"], "u1");
    assert_eq!(left["data"]["roomUsers"].as_array().unwrap().len(), 1);

    let (status, detail) = server.get_json("/api/rooms/guild1").await;
    assert_eq!(status, 200);
    assert_eq!(detail["memberCount"], 1);

    bob.close(None).await.unwrap();
    let mut removed = false;
    for _ in 0..20 {
        if server.get_json("/api/rooms/guild1").await.0 == 404 {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(removed, "empty room should be removed");
}

#[tokio::test]
async fn test_malformed_event_keeps_connection_open() {
    // テスト項目: 不正なフレームは破棄され、同じ接続で処理を続けられる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;

    // when (操作):
    alice
        .send(Message::Text("definitely not json".to_string().into()))
        .await
        .unwrap();
    send(&mut alice, "teleport", json!({"to": "moon"})).await;
    send(&mut alice, "join_room", json!({"roomId": "r1", "type": "dungeon"})).await;

    // then (期待する結果):
    let state = join(&mut alice, "r1", "guild").await;
    assert_eq!(state["data"]["roomId"], "r1");
}

#[tokio::test]
async fn test_http_health_and_rooms() {
    // テスト項目: ヘルスチェックとルーム一覧が接続数・ルームを反映する
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("u1")).await;
    join(&mut alice, "city1", "city").await;

    // when (操作):
    let (health_status, health) = server.get_json("/api/health").await;
    let (rooms_status, rooms) = server.get_json("/api/rooms").await;
    let (missing_status, _) = server.get_json("/api/rooms/nowhere").await;

    // then (期待する結果):
    assert_eq!(health_status, 200);
    assert_eq!(health, json!({"status": "ok", "connections": 1, "rooms": 1}));
    assert_eq!(rooms_status, 200);
    assert_eq!(
        rooms,
        json!([{"id": "city1", "type": "city", "memberCount": 1}])
    );
    assert_eq!(missing_status, 404);
}
