//! 主应用程序入口
//!
//! 装配仓储、用例服务与实时核心，启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    ChannelService, ChannelServiceDependencies, ChannelSubscriptions, ChatService,
    ChatServiceDependencies, ConnectionRegistry, EventRouter, PresenceBroadcaster, SystemClock,
    TypingTracker, UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, PgChannelMemberRepository, PgChannelRepository,
    PgMessageRepository, PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 仓储
    let user_repository = Arc::new(PgUserRepository::new(pg_pool.clone()));
    let channel_repository = Arc::new(PgChannelRepository::new(pg_pool.clone()));
    let member_repository = Arc::new(PgChannelMemberRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool));

    // 外部适配器
    let password_hasher: Arc<dyn application::PasswordHasher> =
        Arc::new(match config.server.bcrypt_cost {
            Some(cost) => BcryptPasswordHasher::new(cost),
            None => BcryptPasswordHasher::default(),
        });
    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);

    // 实时核心
    let registry = Arc::new(ConnectionRegistry::new());
    let subscriptions = Arc::new(ChannelSubscriptions::new());
    let event_router = Arc::new(EventRouter::new(config.realtime.outbound_capacity));
    let presence = Arc::new(PresenceBroadcaster::new(registry.clone(), event_router.clone()));
    let typing = Arc::new(TypingTracker::new(subscriptions.clone(), event_router.clone()));

    // 用例服务
    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: user_repository.clone(),
        password_hasher,
        clock: clock.clone(),
    }));

    let channel_service = Arc::new(ChannelService::new(ChannelServiceDependencies {
        channel_repository,
        member_repository,
        user_repository: user_repository.clone(),
        clock: clock.clone(),
        router: event_router.clone(),
    }));

    let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
        message_repository,
        user_repository,
        subscriptions: subscriptions.clone(),
        router: event_router.clone(),
        clock,
    }));

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState::new(
        user_service,
        channel_service,
        chat_service,
        registry,
        subscriptions,
        event_router,
        presence,
        typing,
        jwt_service,
    );

    // 启动 Web 服务器
    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("团队聊天服务器启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
