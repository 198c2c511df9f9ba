use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ChannelId, MessageContent, MessageId, Timestamp, UserId};

/// 软删除后写入消息正文的固定占位文本。
///
/// 删除表现为一次内容变更而不是移除记录，客户端的消息列表
/// 因此保持稳定，历史中也能看出"这里曾有一条消息"。
pub const DELETED_MESSAGE_MARKER: &str = "This message was deleted";

/// 消息实体。
///
/// 生命周期：创建后可编辑，软删除是终态；记录永不硬删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        channel_id: ChannelId,
        sender_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            channel_id,
            sender_id,
            content,
            is_deleted: false,
            created_at,
            updated_at: created_at,
        }
    }

    /// 是否允许 `user_id` 修改这条消息。
    pub fn is_sent_by(&self, user_id: UserId) -> bool {
        self.sender_id == user_id
    }

    pub fn edit(&mut self, new_content: MessageContent, at: Timestamp) -> Result<(), DomainError> {
        if self.is_deleted {
            return Err(DomainError::MessageDeleted);
        }
        self.content = new_content;
        self.updated_at = at;
        Ok(())
    }

    /// 软删除：置删除标记并用占位文本替换正文。
    ///
    /// 对已删除的消息调用是无效果的（幂等），不报错。
    pub fn soft_delete(&mut self, at: Timestamp) {
        if self.is_deleted {
            return;
        }
        self.is_deleted = true;
        self.content = MessageContent::from_static(DELETED_MESSAGE_MARKER);
        self.updated_at = at;
    }
}
