//! WebSocket 连接生命周期与事件分发。
//!
//! 每个连接一对任务：写任务独占消费事件路由器分配的出站队
//! 列并顺序写 socket（连接出站流的唯一写入方），读任务解析
//! 入站事件并分发到实时核心各组件。任一任务结束即视为断开，
//! 随后把连接从注册表、订阅索引和路由器中移除，再广播新的
//! 在线集合——清理先于任务退出完成，后续扇出不会再碰到这个
//! 连接。

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use application::{ClientEvent, SendMessageRequest, ServerEvent};
use domain::{ConnectionId, UserId};

use crate::{error::ApiError, state::AppState};

pub struct WsConnection {
    state: AppState,
    user_id: UserId,
    connection_id: ConnectionId,
}

impl WsConnection {
    pub fn new(state: AppState, user_id: UserId) -> Self {
        Self {
            state,
            user_id,
            connection_id: ConnectionId::generate(),
        }
    }

    pub async fn run(self, socket: WebSocket) {
        let connection_id = self.connection_id;
        info!(user_id = %self.user_id, connection_id = %connection_id, "WebSocket 连接已建立");

        let mut outbound = self.state.router.register(connection_id).await;
        let (mut sender, mut incoming) = socket.split();

        // 写任务：顺序消费出站队列。队列被路由器摘除（慢消费
        // 者被断开）或连接清理时，recv 返回 None，任务结束并关
        // 闭 socket
        let mut send_task = tokio::spawn(async move {
            while let Some(event) = outbound.recv().await {
                let payload = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        warn!(error = %err, "failed to serialize websocket payload");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            debug!(connection_id = %connection_id, "WebSocket 写任务结束");
        });

        // 读任务：解析客户端事件并分发
        let mut recv_task = tokio::spawn({
            let state = self.state.clone();
            let user_id = self.user_id;
            async move {
                while let Some(Ok(message)) = incoming.next().await {
                    match message {
                        WsMessage::Text(text) => {
                            dispatch_client_event(&state, user_id, connection_id, text.as_str())
                                .await;
                        }
                        WsMessage::Close(_) => break,
                        // Ping/Pong 由底层协议栈应答
                        _ => {}
                    }
                }
                debug!(connection_id = %connection_id, "WebSocket 读任务结束");
            }
        });

        // 任一任务结束即断开；另一半立刻终止，断开后的连接
        // 不会再分发任何入站事件
        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        // 断开清理：注册表与订阅索引先移除，保证后续扇出不会
        // 再选中这个连接；随后摘掉出站队列并广播新的在线集合
        self.state.registry.unregister(connection_id).await;
        self.state.subscriptions.unsubscribe_all(connection_id).await;
        self.state.router.unregister(connection_id).await;
        self.state.presence.broadcast_online_users().await;

        info!(user_id = %self.user_id, connection_id = %connection_id, "WebSocket 连接已断开并清理");
    }
}

async fn dispatch_client_event(
    state: &AppState,
    user_id: UserId,
    connection_id: ConnectionId,
    text: &str,
) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            send_error(state, connection_id, "INVALID_EVENT", err.to_string()).await;
            return;
        }
    };

    match event {
        ClientEvent::AddUser { user_id: claimed } => {
            // 身份在升级时已经认证，载荷必须与之一致
            if claimed != user_id {
                send_error(
                    state,
                    connection_id,
                    "IDENTITY_MISMATCH",
                    "user_id does not match the authenticated session",
                )
                .await;
                return;
            }
            state.registry.register(user_id, connection_id).await;
            state.presence.broadcast_online_users().await;
        }
        ClientEvent::JoinChannel { channel_id } => {
            state.subscriptions.subscribe(connection_id, channel_id).await;
        }
        ClientEvent::Typing {
            channel_id,
            user_id: typist,
        } => {
            // 输入指示是尽力而为的广播，没有值得上报的失败路径
            state.typing.mark_typing(channel_id, typist, connection_id).await;
        }
        ClientEvent::StopTyping {
            channel_id,
            user_id: typist,
        } => {
            state
                .typing
                .mark_stopped(channel_id, typist, connection_id)
                .await;
        }
        ClientEvent::SendMessage {
            sender_id,
            channel_id,
            content,
        } => {
            if sender_id != user_id {
                send_error(
                    state,
                    connection_id,
                    "IDENTITY_MISMATCH",
                    "sender_id does not match the authenticated session",
                )
                .await;
                return;
            }
            let result = state
                .chat_service
                .send_message(SendMessageRequest {
                    channel_id: channel_id.into(),
                    sender_id: sender_id.into(),
                    content,
                })
                .await;

            // 错误只回给发起连接，不影响其他连接
            if let Err(err) = result {
                let api_error = ApiError::from(err);
                send_error(
                    state,
                    connection_id,
                    api_error.code(),
                    api_error.message().to_owned(),
                )
                .await;
            }
        }
    }
}

async fn send_error(
    state: &AppState,
    connection_id: ConnectionId,
    code: &str,
    message: impl Into<String>,
) {
    state
        .router
        .send_to(
            connection_id,
            ServerEvent::Error {
                code: code.to_owned(),
                message: message.into(),
            },
        )
        .await;
}
