//! 频道实体与持久化成员关系。
//!
//! 注意持久化成员关系（谁属于频道）与实时订阅关系（哪个连接
//! 接收频道事件）是两回事，后者由应用层的订阅索引维护。

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ChannelId, Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: ChannelVisibility,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Channel {
    pub fn new(
        id: ChannelId,
        name: impl Into<String>,
        description: Option<String>,
        visibility: ChannelVisibility,
        created_by: UserId,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        if name.len() > 100 {
            return Err(DomainError::invalid_argument("name", "too long"));
        }

        Ok(Self {
            id,
            name,
            description,
            visibility,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_private(&self) -> bool {
        self.visibility == ChannelVisibility::Private
    }
}

/// 持久化的频道成员关系。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub joined_at: Timestamp,
}

impl ChannelMember {
    pub fn new(channel_id: ChannelId, user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            channel_id,
            user_id,
            joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn channel_name_is_trimmed_and_validated() {
        let creator = UserId::new(Uuid::new_v4());
        let channel = Channel::new(
            ChannelId::new(Uuid::new_v4()),
            "  general ",
            None,
            ChannelVisibility::Public,
            creator,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(channel.name, "general");

        let err = Channel::new(
            ChannelId::new(Uuid::new_v4()),
            "   ",
            None,
            ChannelVisibility::Public,
            creator,
            Utc::now(),
        );
        assert!(err.is_err());
    }
}
