//! 事件路由器的出站半边：每个连接一条有界 mpsc 队列。
//!
//! 路由器是唯一向连接出站队列写入的组件；连接自己的写任务
//! 独占消费队列并顺序写 socket，因此两次并发扇出（例如在线
//! 状态更新和消息投递同时到达）不会交错各自的编码负载。
//!
//! 扇出对单个连接是 fire-and-forget：慢消费者不会阻塞发送方，
//! 队列塞满时直接摘除该连接的发送端（drop-and-disconnect），
//! 队列关闭会让连接的写任务退出并关闭 socket。

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

use domain::ConnectionId;

use crate::events::ServerEvent;

/// 单连接出站队列的默认容量。
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

pub struct EventRouter {
    senders: RwLock<HashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
    capacity: usize,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_CAPACITY)
    }
}

impl EventRouter {
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// 为连接分配出站队列，返回其消费端。
    /// 消费端必须由该连接的唯一写任务持有。
    pub async fn register(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.senders.write().await.insert(connection_id, sender);
        receiver
    }

    pub async fn unregister(&self, connection_id: ConnectionId) {
        self.senders.write().await.remove(&connection_id);
    }

    pub async fn send_to(&self, connection_id: ConnectionId, event: ServerEvent) {
        let evict = {
            let senders = self.senders.read().await;
            match senders.get(&connection_id) {
                None => false,
                Some(sender) => match sender.try_send(event) {
                    Ok(()) => false,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            connection_id = %connection_id,
                            "连接出站队列已满，断开慢消费者"
                        );
                        true
                    }
                    Err(TrySendError::Closed(_)) => true,
                },
            }
        };

        if evict {
            self.unregister(connection_id).await;
        }
    }

    /// 向一组连接扇出同一事件。
    pub async fn send_to_many(&self, connection_ids: &[ConnectionId], event: ServerEvent) {
        let mut evicted = Vec::new();
        {
            let senders = self.senders.read().await;
            for connection_id in connection_ids {
                let Some(sender) = senders.get(connection_id) else {
                    continue;
                };
                match sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            connection_id = %connection_id,
                            "连接出站队列已满，断开慢消费者"
                        );
                        evicted.push(*connection_id);
                    }
                    Err(TrySendError::Closed(_)) => evicted.push(*connection_id),
                }
            }
        }

        if !evicted.is_empty() {
            let mut senders = self.senders.write().await;
            for connection_id in evicted {
                senders.remove(&connection_id);
            }
        }
    }

    /// 向所有已注册连接广播（在线状态、新频道通知）。
    pub async fn broadcast(&self, event: ServerEvent) {
        let targets: Vec<ConnectionId> = {
            let senders = self.senders.read().await;
            senders.keys().copied().collect()
        };
        self.send_to_many(&targets, event).await;
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserId;
    use uuid::Uuid;

    fn users_event() -> ServerEvent {
        ServerEvent::GetUsers(vec![UserId::new(Uuid::new_v4())])
    }

    #[tokio::test]
    async fn send_reaches_registered_connection() {
        let router = EventRouter::new(8);
        let connection = ConnectionId::generate();
        let mut receiver = router.register(connection).await;

        let event = users_event();
        router.send_to(connection, event.clone()).await;

        assert_eq!(receiver.try_recv().unwrap(), event);
    }

    #[tokio::test]
    async fn send_to_unknown_connection_is_a_no_op() {
        let router = EventRouter::new(8);
        router.send_to(ConnectionId::generate(), users_event()).await;
    }

    #[tokio::test]
    async fn slow_consumer_is_evicted_on_overflow() {
        let router = EventRouter::new(1);
        let connection = ConnectionId::generate();
        let mut receiver = router.register(connection).await;

        router.send_to(connection, users_event()).await;
        // 队列容量 1，第二条触发 drop-and-disconnect
        router.send_to(connection, users_event()).await;

        assert_eq!(router.connection_count().await, 0);
        // 已入队的第一条仍可取出，随后队列报告关闭
        assert!(receiver.try_recv().is_ok());
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let router = EventRouter::new(8);
        let mut receivers = Vec::new();
        for _ in 0..3 {
            receivers.push(router.register(ConnectionId::generate()).await);
        }

        router.broadcast(users_event()).await;

        for receiver in &mut receivers {
            assert!(receiver.try_recv().is_ok());
        }
    }

    #[tokio::test]
    async fn send_to_many_skips_unregistered_connections() {
        let router = EventRouter::new(8);
        let registered = ConnectionId::generate();
        let gone = ConnectionId::generate();
        let mut receiver = router.register(registered).await;

        router.send_to_many(&[registered, gone], users_event()).await;

        assert!(receiver.try_recv().is_ok());
    }
}
