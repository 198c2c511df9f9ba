use std::sync::Arc;

use uuid::Uuid;

use domain::{
    Channel, ChannelId, ChannelMember, ChannelVisibility, DomainError, UserEmail, UserId,
};

use crate::{
    clock::Clock,
    dto::{ChannelDto, UserDto},
    error::ApplicationError,
    events::ServerEvent,
    repository::{ChannelMemberRepository, ChannelRepository, UserRepository},
    router::EventRouter,
};

#[derive(Debug, Clone)]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: Option<String>,
    pub visibility: ChannelVisibility,
    pub creator_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct JoinChannelRequest {
    pub channel_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct LeaveChannelRequest {
    pub channel_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct AddMemberRequest {
    pub channel_id: Uuid,
    /// 按邮箱添加成员。
    pub email: String,
}

pub struct ChannelServiceDependencies {
    pub channel_repository: Arc<dyn ChannelRepository>,
    pub member_repository: Arc<dyn ChannelMemberRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
    pub router: Arc<EventRouter>,
}

pub struct ChannelService {
    deps: ChannelServiceDependencies,
}

impl ChannelService {
    pub fn new(deps: ChannelServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_channel(
        &self,
        request: CreateChannelRequest,
    ) -> Result<ChannelDto, ApplicationError> {
        let creator_id = UserId::from(request.creator_id);
        let now = self.deps.clock.now();

        let channel = Channel::new(
            ChannelId::new(Uuid::new_v4()),
            request.name,
            request.description,
            request.visibility,
            creator_id,
            now,
        )?;

        if self
            .deps
            .channel_repository
            .find_by_name(&channel.name)
            .await?
            .is_some()
        {
            return Err(DomainError::ChannelAlreadyExists.into());
        }

        let stored = self.deps.channel_repository.create(channel).await?;
        self.deps
            .member_repository
            .upsert(ChannelMember::new(stored.id, creator_id, now))
            .await?;

        let dto = self.channel_dto(&stored).await?;
        // 新频道广播给所有连接，客户端按可见性自行过滤
        self.deps
            .router
            .broadcast(ServerEvent::NewChannel(dto.clone()))
            .await;

        tracing::info!(channel_id = %stored.id, "频道创建成功");
        Ok(dto)
    }

    pub async fn list_channels(&self, user_id: Uuid) -> Result<Vec<ChannelDto>, ApplicationError> {
        let channels = self
            .deps
            .channel_repository
            .list_visible_to(UserId::from(user_id))
            .await?;

        let mut dtos = Vec::with_capacity(channels.len());
        for channel in &channels {
            dtos.push(self.channel_dto(channel).await?);
        }
        Ok(dtos)
    }

    pub async fn join_channel(
        &self,
        request: JoinChannelRequest,
    ) -> Result<ChannelDto, ApplicationError> {
        let channel_id = ChannelId::from(request.channel_id);
        let user_id = UserId::from(request.user_id);

        let channel = self
            .deps
            .channel_repository
            .find_by_id(channel_id)
            .await?
            .ok_or(DomainError::ChannelNotFound)?;

        if self
            .deps
            .member_repository
            .find(channel_id, user_id)
            .await?
            .is_some()
        {
            return Err(DomainError::AlreadyMember.into());
        }

        self.deps
            .member_repository
            .upsert(ChannelMember::new(channel_id, user_id, self.deps.clock.now()))
            .await?;

        self.channel_dto(&channel).await
    }

    pub async fn leave_channel(
        &self,
        request: LeaveChannelRequest,
    ) -> Result<ChannelDto, ApplicationError> {
        let channel_id = ChannelId::from(request.channel_id);
        let user_id = UserId::from(request.user_id);

        let channel = self
            .deps
            .channel_repository
            .find_by_id(channel_id)
            .await?
            .ok_or(DomainError::ChannelNotFound)?;

        self.deps
            .member_repository
            .find(channel_id, user_id)
            .await?
            .ok_or(DomainError::NotChannelMember)?;

        self.deps.member_repository.remove(channel_id, user_id).await?;
        self.channel_dto(&channel).await
    }

    /// 把用户按邮箱拉进（通常是私有的）频道。
    pub async fn add_member(
        &self,
        request: AddMemberRequest,
    ) -> Result<ChannelDto, ApplicationError> {
        let channel_id = ChannelId::from(request.channel_id);
        let email = UserEmail::parse(request.email)?;

        let channel = self
            .deps
            .channel_repository
            .find_by_id(channel_id)
            .await?
            .ok_or(DomainError::ChannelNotFound)?;

        let user = self
            .deps
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        if self
            .deps
            .member_repository
            .find(channel_id, user.id)
            .await?
            .is_some()
        {
            return Err(DomainError::AlreadyMember.into());
        }

        self.deps
            .member_repository
            .upsert(ChannelMember::new(channel_id, user.id, self.deps.clock.now()))
            .await?;

        let dto = self.channel_dto(&channel).await?;
        // 复用 new_channel 事件，让被添加用户的客户端立刻看到频道
        self.deps
            .router
            .broadcast(ServerEvent::NewChannel(dto.clone()))
            .await;

        Ok(dto)
    }

    async fn channel_dto(&self, channel: &Channel) -> Result<ChannelDto, ApplicationError> {
        let members = self.deps.member_repository.list_members(channel.id).await?;
        let users = self
            .deps
            .user_repository
            .find_by_ids(members.iter().map(|member| member.user_id).collect())
            .await?;
        let member_dtos = users.iter().map(UserDto::from).collect();
        Ok(ChannelDto::from_channel(channel, member_dtos))
    }
}
