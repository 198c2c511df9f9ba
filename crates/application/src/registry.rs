//! 连接注册表：记录哪些用户当前持有活跃连接。
//!
//! 在线状态以用户为键：一个用户可以同时持有多个连接（多标签
//! 页、多设备），只要还剩至少一个连接，用户就是在线的。两张
//! 映射放在同一把锁下，保证断开后不会残留悬挂的连接引用。

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use domain::{ConnectionId, UserId};

#[derive(Default)]
struct RegistryMaps {
    /// 连接 -> 注册身份（注册后不可变更）
    connections: HashMap<ConnectionId, UserId>,
    /// 用户 -> 该用户的全部活跃连接
    user_connections: HashMap<UserId, HashSet<ConnectionId>>,
}

pub struct ConnectionRegistry {
    inner: RwLock<RegistryMaps>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryMaps::default()),
        }
    }

    /// 登记连接与用户身份的关联。同一连接重复注册是幂等的；
    /// 连接一旦绑定身份就不可换绑。
    pub async fn register(&self, user_id: UserId, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.connections.get(&connection_id) {
            if *existing != user_id {
                tracing::warn!(
                    connection_id = %connection_id,
                    registered = %existing,
                    requested = %user_id,
                    "连接已绑定其他用户，忽略重复注册"
                );
            }
            return;
        }

        inner.connections.insert(connection_id, user_id);
        inner
            .user_connections
            .entry(user_id)
            .or_default()
            .insert(connection_id);

        tracing::info!(user_id = %user_id, connection_id = %connection_id, "连接已注册");
    }

    /// 移除连接。未知连接是无操作：断开通知可能重复送达。
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().await;

        let Some(user_id) = inner.connections.remove(&connection_id) else {
            return;
        };

        if let Some(connections) = inner.user_connections.get_mut(&user_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                inner.user_connections.remove(&user_id);
            }
        }

        tracing::info!(user_id = %user_id, connection_id = %connection_id, "连接已注销");
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        let inner = self.inner.read().await;
        inner
            .user_connections
            .get(&user_id)
            .is_some_and(|connections| !connections.is_empty())
    }

    /// 当前在线用户集合，每次重新计算，不做增量维护。
    pub async fn online_user_ids(&self) -> Vec<UserId> {
        let inner = self.inner.read().await;
        inner
            .user_connections
            .iter()
            .filter(|(_, connections)| !connections.is_empty())
            .map(|(user_id, _)| *user_id)
            .collect()
    }

    pub async fn user_of(&self, connection_id: ConnectionId) -> Option<UserId> {
        let inner = self.inner.read().await;
        inner.connections.get(&connection_id).copied()
    }
}
