//! WebSocket 事件协议。
//!
//! 入站与出站事件统一编码为 `{"event": <名称>, "data": <载荷>}`。

use serde::{Deserialize, Serialize};

use domain::{ChannelId, UserId};

use crate::dto::{ChannelDto, MessageDto};

/// 客户端发给服务器的事件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// 把当前连接登记为某个用户的在线端点。
    /// 身份在连接升级时已通过认证，这里的 user_id 仅作回显校验。
    AddUser { user_id: UserId },
    /// 订阅频道的实时事件（读权限由 HTTP 层在此之前校验）。
    JoinChannel { channel_id: ChannelId },
    Typing {
        channel_id: ChannelId,
        user_id: UserId,
    },
    StopTyping {
        channel_id: ChannelId,
        user_id: UserId,
    },
    SendMessage {
        sender_id: UserId,
        channel_id: ChannelId,
        content: String,
    },
}

/// 服务器推送给客户端的事件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// 全量在线用户集合（不是增量）。
    GetUsers(Vec<UserId>),
    ReceiveMessage(MessageDto),
    /// 编辑与软删除都表现为一次消息更新。
    MessageUpdated(MessageDto),
    NewChannel(ChannelDto),
    Typing {
        channel_id: ChannelId,
        user_id: UserId,
    },
    StopTyping {
        channel_id: ChannelId,
        user_id: UserId,
    },
    /// 只回给出错请求的发起连接，永不广播。
    Error { code: String, message: String },
}
