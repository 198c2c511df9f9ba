//! 在线状态广播。
//!
//! 注册表每次变更后，向所有连接推送权威的全量在线用户集合。
//! 刻意不做增量：快速的断开/重连（例如页面刷新会在几毫秒内
//! 产生一对 disconnect+connect）下增量极易漂移，全量集合让
//! 客户端无需自己对账。在线状态是全工作区的，不按频道划分。

use std::sync::Arc;

use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;
use crate::router::EventRouter;

pub struct PresenceBroadcaster {
    registry: Arc<ConnectionRegistry>,
    router: Arc<EventRouter>,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, router: Arc<EventRouter>) -> Self {
        Self { registry, router }
    }

    /// 注册表变更（连接注册或注销）后调用。
    pub async fn broadcast_online_users(&self) {
        let online = self.registry.online_user_ids().await;
        tracing::debug!(online_count = online.len(), "推送在线用户集合");
        self.router.broadcast(ServerEvent::GetUsers(online)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{ConnectionId, UserId};
    use uuid::Uuid;

    #[tokio::test]
    async fn every_connection_receives_the_full_online_set() {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(EventRouter::new(8));
        let presence = PresenceBroadcaster::new(registry.clone(), router.clone());

        let alice = UserId::new(Uuid::new_v4());
        let bob = UserId::new(Uuid::new_v4());
        let alice_conn = ConnectionId::generate();
        let bob_conn = ConnectionId::generate();

        let mut alice_rx = router.register(alice_conn).await;
        let mut bob_rx = router.register(bob_conn).await;
        registry.register(alice, alice_conn).await;
        registry.register(bob, bob_conn).await;

        presence.broadcast_online_users().await;

        for receiver in [&mut alice_rx, &mut bob_rx] {
            let ServerEvent::GetUsers(users) = receiver.try_recv().unwrap() else {
                panic!("expected get_users event");
            };
            assert_eq!(users.len(), 2);
            assert!(users.contains(&alice) && users.contains(&bob));
        }
    }

    #[tokio::test]
    async fn offline_user_disappears_from_next_broadcast() {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(EventRouter::new(8));
        let presence = PresenceBroadcaster::new(registry.clone(), router.clone());

        let alice = UserId::new(Uuid::new_v4());
        let bob = UserId::new(Uuid::new_v4());
        let alice_conn = ConnectionId::generate();
        let bob_conn = ConnectionId::generate();

        registry.register(alice, alice_conn).await;
        registry.register(bob, bob_conn).await;
        let mut bob_rx = router.register(bob_conn).await;

        registry.unregister(alice_conn).await;
        presence.broadcast_online_users().await;

        let ServerEvent::GetUsers(users) = bob_rx.try_recv().unwrap() else {
            panic!("expected get_users event");
        };
        assert_eq!(users, vec![bob]);
    }
}
