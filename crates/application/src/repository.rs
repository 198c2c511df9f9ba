//! 持久化仓储端口定义。
//!
//! 实时核心只通过这些 trait 与存储协作；Postgres 实现位于
//! infrastructure，内存实现位于 [`crate::memory`]（测试用）。

use async_trait::async_trait;
use domain::{
    Channel, ChannelId, ChannelMember, Message, MessageId, RepositoryError, User, UserEmail,
    UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError>;
    /// 批量解析用户（历史消息的发送者展示信息）。
    async fn find_by_ids(&self, ids: Vec<UserId>) -> Result<Vec<User>, RepositoryError>;
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn create(&self, channel: Channel) -> Result<Channel, RepositoryError>;
    async fn find_by_id(&self, id: ChannelId) -> Result<Option<Channel>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Channel>, RepositoryError>;
    /// 对用户可见的频道：公开频道，加上该用户是成员的私有频道。
    async fn list_visible_to(&self, user_id: UserId) -> Result<Vec<Channel>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelMemberRepository: Send + Sync {
    async fn upsert(&self, member: ChannelMember) -> Result<ChannelMember, RepositoryError>;
    async fn remove(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), RepositoryError>;
    async fn find(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<Option<ChannelMember>, RepositoryError>;
    async fn list_members(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<ChannelMember>, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError>;
    async fn update(&self, message: Message) -> Result<Message, RepositoryError>;
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;
    /// 按创建时间升序返回频道消息；`filter` 为大小写不敏感的
    /// 内容子串过滤。
    async fn list_by_channel(
        &self,
        channel_id: ChannelId,
        filter: Option<String>,
    ) -> Result<Vec<Message>, RepositoryError>;
}
