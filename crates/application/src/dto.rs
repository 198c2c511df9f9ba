//! 暴露给客户端的数据传输对象。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::{Channel, ChannelVisibility, Message, Timestamp, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.into(),
            username: user.username.to_string(),
            email: user.email.to_string(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// 消息中内嵌的发送者展示信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderDto {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: String,
}

impl From<&User> for SenderDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.into(),
            username: user.username.to_string(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub sender: SenderDto,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MessageDto {
    pub fn from_message(message: &Message, sender: &User) -> Self {
        Self {
            id: message.id.into(),
            channel_id: message.channel_id.into(),
            sender: SenderDto::from(sender),
            content: message.content.as_str().to_owned(),
            is_deleted: message.is_deleted,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub visibility: ChannelVisibility,
    pub created_by: Uuid,
    pub members: Vec<UserDto>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChannelDto {
    pub fn from_channel(channel: &Channel, members: Vec<UserDto>) -> Self {
        Self {
            id: channel.id.into(),
            name: channel.name.clone(),
            description: channel.description.clone(),
            visibility: channel.visibility,
            created_by: channel.created_by.into(),
            members,
            created_at: channel.created_at,
            updated_at: channel.updated_at,
        }
    }
}
