//! 消息投递管线单元测试。
//!
//! 用内存仓储驱动真实的订阅索引与事件路由器，验证扇出范围、
//! 权限检查、软删除语义和持久化失败时的中止行为。

use std::sync::{Arc, Mutex as StdMutex};

use chrono::Duration;
use uuid::Uuid;

use domain::{
    ChannelId, ConnectionId, DomainError, RepositoryError, Timestamp, User, UserEmail, UserId,
    Username, DELETED_MESSAGE_MARKER,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    events::ServerEvent,
    memory::{InMemoryMessageRepository, InMemoryUserRepository, MemoryStore},
    repository::{MockMessageRepository, UserRepository},
    router::EventRouter,
    services::chat_service::{
        ChatService, ChatServiceDependencies, DeleteMessageRequest, EditMessageRequest,
        SendMessageRequest,
    },
    subscriptions::ChannelSubscriptions,
};

/// 手动推进的测试时钟。
struct TestClock {
    now: StdMutex<Timestamp>,
}

impl TestClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            now: StdMutex::new(chrono::Utc::now()),
        })
    }

    fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + duration;
    }
}

impl Clock for TestClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

struct Fixture {
    service: ChatService,
    subscriptions: Arc<ChannelSubscriptions>,
    router: Arc<EventRouter>,
    clock: Arc<TestClock>,
    user_repository: Arc<InMemoryUserRepository>,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let user_repository = Arc::new(InMemoryUserRepository::new(store.clone()));
    let message_repository = Arc::new(InMemoryMessageRepository::new(store));
    let subscriptions = Arc::new(ChannelSubscriptions::new());
    let router = Arc::new(EventRouter::new(32));
    let clock = TestClock::new();

    let service = ChatService::new(ChatServiceDependencies {
        message_repository,
        user_repository: user_repository.clone(),
        subscriptions: subscriptions.clone(),
        router: router.clone(),
        clock: clock.clone(),
    });

    Fixture {
        service,
        subscriptions,
        router,
        clock,
        user_repository,
    }
}

async fn seed_user(fixture: &Fixture, name: &str) -> UserId {
    let user = User::register(
        UserId::new(Uuid::new_v4()),
        Username::parse(name).unwrap(),
        UserEmail::parse(format!("{name}@example.com")).unwrap(),
        domain::value_objects::PasswordHash::new("hashed").unwrap(),
        fixture.clock.now(),
    );
    let stored = fixture.user_repository.create(user).await.unwrap();
    stored.id
}

#[tokio::test]
async fn send_reaches_exactly_the_subscribed_connections() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let chatting = ChannelId::new(Uuid::new_v4());
    let other = ChannelId::new(Uuid::new_v4());

    let subscriber = ConnectionId::generate();
    let bystander = ConnectionId::generate();
    let mut subscriber_rx = f.router.register(subscriber).await;
    let mut bystander_rx = f.router.register(bystander).await;
    f.subscriptions.subscribe(subscriber, chatting).await;
    f.subscriptions.subscribe(bystander, other).await;

    f.service
        .send_message(SendMessageRequest {
            channel_id: chatting.into(),
            sender_id: alice.into(),
            content: "hi".to_owned(),
        })
        .await
        .unwrap();

    let ServerEvent::ReceiveMessage(dto) = subscriber_rx.try_recv().unwrap() else {
        panic!("expected receive_message");
    };
    assert_eq!(dto.content, "hi");
    assert!(!dto.is_deleted);
    assert_eq!(dto.sender.username, "alice");

    // 另一个频道的订阅者什么都收不到
    assert!(bystander_rx.try_recv().is_err());
}

#[tokio::test]
async fn connection_subscribed_to_two_channels_gets_events_for_the_right_one() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let c1 = ChannelId::new(Uuid::new_v4());
    let c2 = ChannelId::new(Uuid::new_v4());

    let connection = ConnectionId::generate();
    let mut rx = f.router.register(connection).await;
    f.subscriptions.subscribe(connection, c1).await;
    f.subscriptions.subscribe(connection, c2).await;

    f.service
        .send_message(SendMessageRequest {
            channel_id: c2.into(),
            sender_id: alice.into(),
            content: "for c2".to_owned(),
        })
        .await
        .unwrap();

    let ServerEvent::ReceiveMessage(dto) = rx.try_recv().unwrap() else {
        panic!("expected receive_message");
    };
    assert_eq!(dto.channel_id, Uuid::from(c2));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn edit_by_non_sender_is_rejected_and_message_unchanged() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let mallory = seed_user(&f, "mallory").await;
    let channel_id = ChannelId::new(Uuid::new_v4());

    let sent = f
        .service
        .send_message(SendMessageRequest {
            channel_id: channel_id.into(),
            sender_id: alice.into(),
            content: "original".to_owned(),
        })
        .await
        .unwrap();

    let result = f
        .service
        .edit_message(EditMessageRequest {
            message_id: sent.id,
            requester_id: mallory.into(),
            content: "tampered".to_owned(),
        })
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotMessageSender))
    ));

    let history = f.service.get_history(channel_id.into(), None).await.unwrap();
    assert_eq!(history[0].content, "original");
}

#[tokio::test]
async fn delete_by_non_sender_is_rejected() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let mallory = seed_user(&f, "mallory").await;
    let channel_id = ChannelId::new(Uuid::new_v4());

    let sent = f
        .service
        .send_message(SendMessageRequest {
            channel_id: channel_id.into(),
            sender_id: alice.into(),
            content: "keep me".to_owned(),
        })
        .await
        .unwrap();

    let result = f
        .service
        .delete_message(DeleteMessageRequest {
            message_id: sent.id,
            requester_id: mallory.into(),
        })
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotMessageSender))
    ));
}

#[tokio::test]
async fn soft_delete_broadcasts_an_update_with_the_marker() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let channel_id = ChannelId::new(Uuid::new_v4());

    let subscriber = ConnectionId::generate();
    let mut rx = f.router.register(subscriber).await;
    f.subscriptions.subscribe(subscriber, channel_id).await;

    let sent = f
        .service
        .send_message(SendMessageRequest {
            channel_id: channel_id.into(),
            sender_id: alice.into(),
            content: "hi".to_owned(),
        })
        .await
        .unwrap();
    let ServerEvent::ReceiveMessage(received) = rx.try_recv().unwrap() else {
        panic!("expected receive_message");
    };
    assert_eq!(received.content, "hi");
    assert!(!received.is_deleted);

    f.clock.advance(Duration::seconds(10));
    f.service
        .delete_message(DeleteMessageRequest {
            message_id: sent.id,
            requester_id: alice.into(),
        })
        .await
        .unwrap();

    let ServerEvent::MessageUpdated(updated) = rx.try_recv().unwrap() else {
        panic!("expected message_updated");
    };
    assert_eq!(updated.content, DELETED_MESSAGE_MARKER);
    assert!(updated.is_deleted);
    assert_eq!(updated.created_at, received.created_at);
    assert!(updated.updated_at > received.updated_at);
}

#[tokio::test]
async fn soft_delete_twice_keeps_the_marker_and_the_event_type() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let channel_id = ChannelId::new(Uuid::new_v4());

    let subscriber = ConnectionId::generate();
    let mut rx = f.router.register(subscriber).await;
    f.subscriptions.subscribe(subscriber, channel_id).await;

    let sent = f
        .service
        .send_message(SendMessageRequest {
            channel_id: channel_id.into(),
            sender_id: alice.into(),
            content: "bye".to_owned(),
        })
        .await
        .unwrap();
    let _ = rx.try_recv().unwrap();

    for _ in 0..2 {
        let dto = f
            .service
            .delete_message(DeleteMessageRequest {
                message_id: sent.id,
                requester_id: alice.into(),
            })
            .await
            .unwrap();
        assert_eq!(dto.content, DELETED_MESSAGE_MARKER);
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerEvent::MessageUpdated(_)
        ));
    }
}

#[tokio::test]
async fn editing_a_deleted_message_is_an_invalid_state() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let channel_id = ChannelId::new(Uuid::new_v4());

    let sent = f
        .service
        .send_message(SendMessageRequest {
            channel_id: channel_id.into(),
            sender_id: alice.into(),
            content: "short-lived".to_owned(),
        })
        .await
        .unwrap();

    f.service
        .delete_message(DeleteMessageRequest {
            message_id: sent.id,
            requester_id: alice.into(),
        })
        .await
        .unwrap();

    let result = f
        .service
        .edit_message(EditMessageRequest {
            message_id: sent.id,
            requester_id: alice.into(),
            content: "resurrect".to_owned(),
        })
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MessageDeleted))
    ));
}

#[tokio::test]
async fn storage_failure_aborts_without_any_fanout() {
    let store = MemoryStore::new();
    let user_repository = Arc::new(InMemoryUserRepository::new(store));
    let subscriptions = Arc::new(ChannelSubscriptions::new());
    let router = Arc::new(EventRouter::new(32));

    let mut message_repository = MockMessageRepository::new();
    message_repository
        .expect_create()
        .returning(|_| Err(RepositoryError::storage("connection reset")));

    let clock = TestClock::new();
    let service = ChatService::new(ChatServiceDependencies {
        message_repository: Arc::new(message_repository),
        user_repository: user_repository.clone(),
        subscriptions: subscriptions.clone(),
        router: router.clone(),
        clock: clock.clone(),
    });

    let alice = User::register(
        UserId::new(Uuid::new_v4()),
        Username::parse("alice").unwrap(),
        UserEmail::parse("alice@example.com").unwrap(),
        domain::value_objects::PasswordHash::new("hashed").unwrap(),
        clock.now(),
    );
    let alice = user_repository.create(alice).await.unwrap();

    let channel_id = ChannelId::new(Uuid::new_v4());
    let subscriber = ConnectionId::generate();
    let mut rx = router.register(subscriber).await;
    subscriptions.subscribe(subscriber, channel_id).await;

    let result = service
        .send_message(SendMessageRequest {
            channel_id: channel_id.into(),
            sender_id: alice.id.into(),
            content: "lost".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(ApplicationError::Repository(_))));
    // 落库失败的消息绝不广播
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn history_is_ascending_and_filter_is_case_insensitive() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;
    let channel_id = ChannelId::new(Uuid::new_v4());

    for content in ["first Hello", "second", "third HELLO again"] {
        f.service
            .send_message(SendMessageRequest {
                channel_id: channel_id.into(),
                sender_id: alice.into(),
                content: content.to_owned(),
            })
            .await
            .unwrap();
        f.clock.advance(Duration::seconds(1));
    }

    let all = f.service.get_history(channel_id.into(), None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|pair| pair[0].created_at <= pair[1].created_at));
    assert_eq!(all[0].content, "first Hello");

    let filtered = f
        .service
        .get_history(channel_id.into(), Some("hello".to_owned()))
        .await
        .unwrap();
    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|dto| dto.content.to_lowercase().contains("hello")));
}

#[tokio::test]
async fn empty_content_is_rejected_before_persistence() {
    let f = fixture().await;
    let alice = seed_user(&f, "alice").await;

    let result = f
        .service
        .send_message(SendMessageRequest {
            channel_id: Uuid::new_v4(),
            sender_id: alice.into(),
            content: "   ".to_owned(),
        })
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}
