//! 领域与仓储错误定义。

use thiserror::Error;

/// 领域层错误类型。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("channel not found")]
    ChannelNotFound,

    #[error("channel already exists")]
    ChannelAlreadyExists,

    #[error("message not found")]
    MessageNotFound,

    /// 只有消息的发送者可以编辑或删除它。
    #[error("only the sender may modify this message")]
    NotMessageSender,

    /// 已软删除的消息不可再编辑。
    #[error("message has been deleted")]
    MessageDeleted,

    #[error("user is already a channel member")]
    AlreadyMember,

    #[error("user is not a channel member")]
    NotChannelMember,

    #[error("invalid credentials")]
    InvalidCredentials,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误类型。
///
/// `Storage` 表示持久化往返失败；发送/编辑/删除在落库失败时
/// 必须整体中止，不允许出现只广播未存储的消息。
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Conflict,

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
