//! 频道订阅索引：连接与频道之间的投递路由关系。
//!
//! 订阅纯粹是投递层面的概念，与持久化的"频道成员"关系无关；
//! 只能通过显式的 subscribe/unsubscribe 变更，消息活动不会隐式
//! 改变它。访问控制在调用 subscribe 之前由 HTTP 层完成。

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use domain::{ChannelId, ConnectionId};

#[derive(Default)]
struct SubscriptionMaps {
    by_channel: HashMap<ChannelId, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, HashSet<ChannelId>>,
}

pub struct ChannelSubscriptions {
    inner: RwLock<SubscriptionMaps>,
}

impl Default for ChannelSubscriptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSubscriptions {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SubscriptionMaps::default()),
        }
    }

    /// 把连接加入频道的扇出集合。一个连接可以订阅任意多个频道。
    pub async fn subscribe(&self, connection_id: ConnectionId, channel_id: ChannelId) {
        let mut inner = self.inner.write().await;
        inner
            .by_channel
            .entry(channel_id)
            .or_default()
            .insert(connection_id);
        inner
            .by_connection
            .entry(connection_id)
            .or_default()
            .insert(channel_id);

        tracing::debug!(connection_id = %connection_id, channel_id = %channel_id, "连接订阅频道");
    }

    pub async fn unsubscribe(&self, connection_id: ConnectionId, channel_id: ChannelId) {
        let mut inner = self.inner.write().await;
        if let Some(connections) = inner.by_channel.get_mut(&channel_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                inner.by_channel.remove(&channel_id);
            }
        }
        if let Some(channels) = inner.by_connection.get_mut(&connection_id) {
            channels.remove(&channel_id);
            if channels.is_empty() {
                inner.by_connection.remove(&connection_id);
            }
        }
    }

    /// 断开连接时调用，清掉该连接的全部订阅。
    pub async fn unsubscribe_all(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;
        let Some(channels) = inner.by_connection.remove(&connection_id) else {
            return;
        };
        for channel_id in channels {
            if let Some(connections) = inner.by_channel.get_mut(&channel_id) {
                connections.remove(&connection_id);
                if connections.is_empty() {
                    inner.by_channel.remove(&channel_id);
                }
            }
        }
    }

    /// 当前订阅了某频道的连接集合（扇出目标）。
    pub async fn subscribers_of(&self, channel_id: ChannelId) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        inner
            .by_channel
            .get(&channel_id)
            .map(|connections| connections.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn is_subscribed(&self, connection_id: ConnectionId, channel_id: ChannelId) -> bool {
        let inner = self.inner.read().await;
        inner
            .by_channel
            .get(&channel_id)
            .is_some_and(|connections| connections.contains(&connection_id))
    }
}
