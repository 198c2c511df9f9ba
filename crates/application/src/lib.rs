//! 应用层实现。
//!
//! 这里提供实时核心（连接注册表、频道订阅索引、事件路由器、
//! 在线状态广播、输入指示）和围绕领域模型的用例服务，以及对
//! 外部适配器（密码哈希、持久化仓储、时钟）的抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod events;
pub mod memory;
pub mod password;
pub mod presence;
pub mod registry;
pub mod repository;
pub mod router;
pub mod services;
pub mod subscriptions;
pub mod typing;

pub use clock::{Clock, SystemClock};
pub use dto::{ChannelDto, MessageDto, SenderDto, UserDto};
pub use error::ApplicationError;
pub use events::{ClientEvent, ServerEvent};
pub use password::{PasswordHasher, PasswordHasherError};
pub use presence::PresenceBroadcaster;
pub use registry::ConnectionRegistry;
pub use repository::{
    ChannelMemberRepository, ChannelRepository, MessageRepository, UserRepository,
};
pub use router::{EventRouter, DEFAULT_OUTBOUND_CAPACITY};
pub use services::{
    AddMemberRequest, AuthenticateUserRequest, ChannelService, ChannelServiceDependencies,
    ChatService, ChatServiceDependencies, CreateChannelRequest, DeleteMessageRequest,
    EditMessageRequest, JoinChannelRequest, LeaveChannelRequest, RegisterUserRequest,
    SendMessageRequest, UserService, UserServiceDependencies,
};
pub use subscriptions::ChannelSubscriptions;
pub use typing::{TypingTracker, TYPING_IDLE_TIMEOUT};
