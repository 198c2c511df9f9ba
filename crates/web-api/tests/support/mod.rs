//! 集成测试共用装配：内存仓储 + 真实服务栈 + 真实端口。

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;

use application::{
    memory::{
        InMemoryChannelMemberRepository, InMemoryChannelRepository, InMemoryMessageRepository,
        InMemoryUserRepository, MemoryStore,
    },
    ChannelService, ChannelServiceDependencies, ChannelSubscriptions, ChatService,
    ChatServiceDependencies, ConnectionRegistry, EventRouter, PresenceBroadcaster, SystemClock,
    TypingTracker, UserService, UserServiceDependencies,
};
use infrastructure::BcryptPasswordHasher;
use web_api::{router, AppState, JwtConfig, JwtService};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 启动一套完整的服务栈，返回监听地址。
pub async fn spawn_server() -> SocketAddr {
    let store = MemoryStore::new();
    let user_repository = Arc::new(InMemoryUserRepository::new(store.clone()));
    let channel_repository = Arc::new(InMemoryChannelRepository::new(store.clone()));
    let member_repository = Arc::new(InMemoryChannelMemberRepository::new(store.clone()));
    let message_repository = Arc::new(InMemoryMessageRepository::new(store));

    // 低 cost 让 bcrypt 不拖慢测试
    let password_hasher: Arc<dyn application::PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(4));
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    let registry = Arc::new(ConnectionRegistry::new());
    let subscriptions = Arc::new(ChannelSubscriptions::new());
    let event_router = Arc::new(EventRouter::new(64));
    let presence = Arc::new(PresenceBroadcaster::new(registry.clone(), event_router.clone()));
    let typing = Arc::new(TypingTracker::new(subscriptions.clone(), event_router.clone()));

    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: user_repository.clone(),
        password_hasher,
        clock: clock.clone(),
    }));

    let channel_service = Arc::new(ChannelService::new(ChannelServiceDependencies {
        channel_repository,
        member_repository,
        user_repository: user_repository.clone(),
        clock: clock.clone(),
        router: event_router.clone(),
    }));

    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        message_repository,
        user_repository,
        subscriptions: subscriptions.clone(),
        router: event_router.clone(),
        clock,
    }));

    let jwt_service = Arc::new(JwtService::new(JwtConfig {
        secret: "integration-test-secret-key-with-32-chars".to_string(),
        expiration_hours: 24,
    }));

    let state = AppState::new(
        user_service,
        channel_service,
        chat_service,
        registry,
        subscriptions,
        event_router,
        presence,
        typing,
        jwt_service,
    );

    let app = router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    addr
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// 注册并登录一个用户，返回 id 和 Bearer token。
pub async fn register_and_login(client: &Client, addr: SocketAddr, name: &str) -> TestUser {
    let base = format!("http://{addr}");

    let registered = client
        .post(format!("{base}/api/v1/auth/register"))
        .json(&json!({
            "username": name,
            "email": format!("{name}@example.com"),
            "password": "secret-password"
        }))
        .send()
        .await
        .expect("register")
        .json::<Value>()
        .await
        .expect("register json");
    let id = registered["id"]
        .as_str()
        .expect("user id")
        .parse::<Uuid>()
        .expect("uuid");

    let login = client
        .post(format!("{base}/api/v1/auth/login"))
        .json(&json!({
            "email": format!("{name}@example.com"),
            "password": "secret-password"
        }))
        .send()
        .await
        .expect("login")
        .json::<Value>()
        .await
        .expect("login json");
    let token = login["token"].as_str().expect("token").to_owned();

    TestUser { id, token }
}

/// 以创建者身份建一个公开频道，返回频道 id。
pub async fn create_channel(client: &Client, addr: SocketAddr, token: &str, name: &str) -> Uuid {
    let channel = client
        .post(format!("http://{addr}/api/v1/channels"))
        .header("authorization", format!("Bearer {token}"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("create channel")
        .json::<Value>()
        .await
        .expect("channel json");

    channel["id"]
        .as_str()
        .expect("channel id")
        .parse::<Uuid>()
        .expect("uuid")
}

pub async fn ws_connect(addr: SocketAddr, token: &str) -> WsClient {
    let url = format!("ws://{addr}/api/v1/ws?token={token}");
    let (ws, _) = connect_async(url).await.expect("ws connect");
    ws
}

pub async fn send_event(ws: &mut WsClient, event: Value) {
    ws.send(WsMessage::Text(event.to_string().into()))
        .await
        .expect("ws send");
}

/// 读下一条服务器事件（2 秒超时）。
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for websocket event")
            .expect("websocket closed")
            .expect("websocket error");
        match message {
            WsMessage::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("event json")
            }
            // 忽略协议层消息
            _ => continue,
        }
    }
}

/// 丢弃其他事件，直到读到指定名称的事件。
pub async fn wait_for_event(ws: &mut WsClient, name: &str) -> Value {
    loop {
        let event = next_event(ws).await;
        if event["event"] == name {
            return event;
        }
    }
}

/// 入场惯例：注册在线身份并订阅频道，消费掉自己的 get_users。
pub async fn add_user_and_join(ws: &mut WsClient, user_id: Uuid, channel_ids: &[Uuid]) {
    send_event(ws, json!({ "event": "add_user", "data": { "user_id": user_id } })).await;
    wait_for_event(ws, "get_users").await;
    for channel_id in channel_ids {
        send_event(
            ws,
            json!({ "event": "join_channel", "data": { "channel_id": channel_id } }),
        )
        .await;
    }
    // join_channel 没有应答事件，留一点时间让服务端处理订阅
    tokio::time::sleep(Duration::from_millis(100)).await;
}
