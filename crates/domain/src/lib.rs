//! 团队聊天系统核心领域模型
//!
//! 包含用户、频道、消息等核心实体，以及值对象和错误类型。

pub mod channel;
pub mod errors;
pub mod message;
pub mod user;
pub mod value_objects;

pub use channel::{Channel, ChannelMember, ChannelVisibility};
pub use errors::{DomainError, RepositoryError};
pub use message::{Message, DELETED_MESSAGE_MARKER};
pub use user::{User, DEFAULT_AVATAR_URL};
pub use value_objects::{
    ChannelId, ConnectionId, MessageContent, MessageId, PasswordHash, Timestamp, UserEmail,
    UserId, Username,
};
