use std::sync::Arc;

use application::{
    ChannelService, ChannelSubscriptions, ChatService, ConnectionRegistry, EventRouter,
    PresenceBroadcaster, TypingTracker, UserService,
};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub channel_service: Arc<ChannelService>,
    pub chat_service: Arc<ChatService>,
    pub registry: Arc<ConnectionRegistry>,
    pub subscriptions: Arc<ChannelSubscriptions>,
    pub router: Arc<EventRouter>,
    pub presence: Arc<PresenceBroadcaster>,
    pub typing: Arc<TypingTracker>,
    pub jwt_service: Arc<JwtService>,
}

#[allow(clippy::too_many_arguments)]
impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        channel_service: Arc<ChannelService>,
        chat_service: Arc<ChatService>,
        registry: Arc<ConnectionRegistry>,
        subscriptions: Arc<ChannelSubscriptions>,
        router: Arc<EventRouter>,
        presence: Arc<PresenceBroadcaster>,
        typing: Arc<TypingTracker>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_service,
            channel_service,
            chat_service,
            registry,
            subscriptions,
            router,
            presence,
            typing,
            jwt_service,
        }
    }
}
