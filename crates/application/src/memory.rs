//! 内存仓储实现。
//!
//! 与 infrastructure 的 Postgres 实现行为一致，供单元测试和
//! 集成测试在没有数据库的环境下驱动完整服务栈。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{
    Channel, ChannelId, ChannelMember, ChannelVisibility, Message, MessageId, RepositoryError,
    User, UserEmail, UserId,
};

use crate::repository::{
    ChannelMemberRepository, ChannelRepository, MessageRepository, UserRepository,
};

/// 共享的内存"数据库"。各仓储持有同一个实例，
/// 以便跨表查询（例如私有频道的可见性）。
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    channels: RwLock<HashMap<ChannelId, Channel>>,
    members: RwLock<HashMap<ChannelId, HashMap<UserId, ChannelMember>>>,
    messages: RwLock<HashMap<MessageId, Message>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

pub struct InMemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.store.users.write().await;
        let duplicate = users
            .values()
            .any(|existing| existing.email == user.email || existing.username == user.username);
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.store.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
        let users = self.store.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: Vec<UserId>) -> Result<Vec<User>, RepositoryError> {
        let users = self.store.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self.store.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|user| user.created_at);
        Ok(all)
    }
}

pub struct InMemoryChannelRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryChannelRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChannelRepository for InMemoryChannelRepository {
    async fn create(&self, channel: Channel) -> Result<Channel, RepositoryError> {
        let mut channels = self.store.channels.write().await;
        if channels.values().any(|existing| existing.name == channel.name) {
            return Err(RepositoryError::Conflict);
        }
        channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    async fn find_by_id(&self, id: ChannelId) -> Result<Option<Channel>, RepositoryError> {
        Ok(self.store.channels.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Channel>, RepositoryError> {
        let channels = self.store.channels.read().await;
        Ok(channels.values().find(|channel| channel.name == name).cloned())
    }

    async fn list_visible_to(&self, user_id: UserId) -> Result<Vec<Channel>, RepositoryError> {
        let channels = self.store.channels.read().await;
        let members = self.store.members.read().await;

        let mut visible: Vec<Channel> = channels
            .values()
            .filter(|channel| {
                channel.visibility == ChannelVisibility::Public
                    || members
                        .get(&channel.id)
                        .is_some_and(|channel_members| channel_members.contains_key(&user_id))
            })
            .cloned()
            .collect();
        // 最近活跃的频道排在前面
        visible.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(visible)
    }
}

pub struct InMemoryChannelMemberRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryChannelMemberRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChannelMemberRepository for InMemoryChannelMemberRepository {
    async fn upsert(&self, member: ChannelMember) -> Result<ChannelMember, RepositoryError> {
        let mut members = self.store.members.write().await;
        members
            .entry(member.channel_id)
            .or_default()
            .insert(member.user_id, member.clone());
        Ok(member)
    }

    async fn remove(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), RepositoryError> {
        let mut members = self.store.members.write().await;
        if let Some(channel_members) = members.get_mut(&channel_id) {
            channel_members.remove(&user_id);
        }
        Ok(())
    }

    async fn find(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<Option<ChannelMember>, RepositoryError> {
        let members = self.store.members.read().await;
        Ok(members
            .get(&channel_id)
            .and_then(|channel_members| channel_members.get(&user_id))
            .cloned())
    }

    async fn list_members(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<ChannelMember>, RepositoryError> {
        let members = self.store.members.read().await;
        let mut all: Vec<ChannelMember> = members
            .get(&channel_id)
            .map(|channel_members| channel_members.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by_key(|member| member.joined_at);
        Ok(all)
    }
}

pub struct InMemoryMessageRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryMessageRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.store.messages.write().await;
        if messages.contains_key(&message.id) {
            return Err(RepositoryError::Conflict);
        }
        messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn update(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.store.messages.write().await;
        if !messages.contains_key(&message.id) {
            return Err(RepositoryError::NotFound);
        }
        messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self.store.messages.read().await.get(&id).cloned())
    }

    async fn list_by_channel(
        &self,
        channel_id: ChannelId,
        filter: Option<String>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let needle = filter.map(|value| value.to_lowercase());
        let messages = self.store.messages.read().await;

        let mut matching: Vec<Message> = messages
            .values()
            .filter(|message| message.channel_id == channel_id)
            .filter(|message| match &needle {
                Some(needle) => message.content.as_str().to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        // 历史按创建时间从旧到新
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(matching)
    }
}
