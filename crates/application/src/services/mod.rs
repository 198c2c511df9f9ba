pub mod channel_service;
pub mod chat_service;
pub mod user_service;

#[cfg(test)]
mod chat_service_tests;

pub use channel_service::{
    AddMemberRequest, ChannelService, ChannelServiceDependencies, CreateChannelRequest,
    JoinChannelRequest, LeaveChannelRequest,
};
pub use chat_service::{
    ChatService, ChatServiceDependencies, DeleteMessageRequest, EditMessageRequest,
    SendMessageRequest,
};
pub use user_service::{
    AuthenticateUserRequest, RegisterUserRequest, UserService, UserServiceDependencies,
};
