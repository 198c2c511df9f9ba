//! 消息投递管线。
//!
//! 发送/编辑/软删除先落库，成功后才向当前订阅该频道的连接扇
//! 出事件；持久化失败则整体中止，绝不出现"已广播未存储"的
//! 消息。软删除表现为一次 message_updated（不是独立的删除事
//! 件），客户端把删除当作内容变更处理，消息在历史中的位置
//! 保持不变。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use domain::{ChannelId, DomainError, Message, MessageContent, MessageId, User, UserId};

use crate::{
    clock::Clock,
    dto::MessageDto,
    error::ApplicationError,
    events::ServerEvent,
    repository::{MessageRepository, UserRepository},
    router::EventRouter,
    subscriptions::ChannelSubscriptions,
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub channel_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub message_id: Uuid,
    pub requester_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DeleteMessageRequest {
    pub message_id: Uuid,
    pub requester_id: Uuid,
}

pub struct ChatServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub subscriptions: Arc<ChannelSubscriptions>,
    pub router: Arc<EventRouter>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
    /// 每个频道一把发送锁：同一频道的发送按持久化顺序串行
    /// 扇出，不同频道互不阻塞。
    send_locks: Mutex<HashMap<ChannelId, Arc<Mutex<()>>>>,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self {
            deps,
            send_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<MessageDto, ApplicationError> {
        let channel_id = ChannelId::from(request.channel_id);
        let sender_id = UserId::from(request.sender_id);
        let content = MessageContent::new(request.content)?;

        let sender = self
            .deps
            .user_repository
            .find_by_id(sender_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let channel_lock = self.channel_send_lock(channel_id).await;
        let _ordering_guard = channel_lock.lock().await;

        let message = Message::new(
            MessageId::new(Uuid::new_v4()),
            channel_id,
            sender_id,
            content,
            self.deps.clock.now(),
        );

        let stored = self.deps.message_repository.create(message).await?;
        let dto = MessageDto::from_message(&stored, &sender);

        self.fan_out(channel_id, ServerEvent::ReceiveMessage(dto.clone()))
            .await;

        tracing::debug!(message_id = %stored.id, channel_id = %channel_id, "消息已投递");
        Ok(dto)
    }

    pub async fn edit_message(
        &self,
        request: EditMessageRequest,
    ) -> Result<MessageDto, ApplicationError> {
        let requester_id = UserId::from(request.requester_id);
        let new_content = MessageContent::new(request.content)?;

        let mut message = self
            .deps
            .message_repository
            .find_by_id(MessageId::from(request.message_id))
            .await?
            .ok_or(DomainError::MessageNotFound)?;

        if !message.is_sent_by(requester_id) {
            return Err(DomainError::NotMessageSender.into());
        }

        message.edit(new_content, self.deps.clock.now())?;

        let stored = self.deps.message_repository.update(message).await?;
        let dto = self.message_dto(&stored).await?;

        self.fan_out(stored.channel_id, ServerEvent::MessageUpdated(dto.clone()))
            .await;

        Ok(dto)
    }

    pub async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<MessageDto, ApplicationError> {
        let requester_id = UserId::from(request.requester_id);

        let mut message = self
            .deps
            .message_repository
            .find_by_id(MessageId::from(request.message_id))
            .await?
            .ok_or(DomainError::MessageNotFound)?;

        if !message.is_sent_by(requester_id) {
            return Err(DomainError::NotMessageSender.into());
        }

        // 重复删除是幂等的，第二次同样以 message_updated 收尾
        message.soft_delete(self.deps.clock.now());

        let stored = self.deps.message_repository.update(message).await?;
        let dto = self.message_dto(&stored).await?;

        self.fan_out(stored.channel_id, ServerEvent::MessageUpdated(dto.clone()))
            .await;

        Ok(dto)
    }

    /// 频道历史，按创建时间从旧到新；可选过滤条件为大小写
    /// 不敏感的内容子串。
    pub async fn get_history(
        &self,
        channel_id: Uuid,
        filter: Option<String>,
    ) -> Result<Vec<MessageDto>, ApplicationError> {
        let messages = self
            .deps
            .message_repository
            .list_by_channel(ChannelId::from(channel_id), filter)
            .await?;

        let sender_ids: Vec<UserId> = messages
            .iter()
            .map(|message| message.sender_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let senders: HashMap<UserId, User> = self
            .deps
            .user_repository
            .find_by_ids(sender_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        Ok(messages
            .iter()
            .filter_map(|message| {
                senders
                    .get(&message.sender_id)
                    .map(|sender| MessageDto::from_message(message, sender))
            })
            .collect())
    }

    async fn channel_send_lock(&self, channel_id: ChannelId) -> Arc<Mutex<()>> {
        let mut locks = self.send_locks.lock().await;
        locks.entry(channel_id).or_default().clone()
    }

    async fn message_dto(&self, message: &Message) -> Result<MessageDto, ApplicationError> {
        let sender = self
            .deps
            .user_repository
            .find_by_id(message.sender_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(MessageDto::from_message(message, &sender))
    }

    async fn fan_out(&self, channel_id: ChannelId, event: ServerEvent) {
        let targets = self.deps.subscriptions.subscribers_of(channel_id).await;
        self.deps.router.send_to_many(&targets, event).await;
    }
}
