//! 输入指示协调器。
//!
//! 纯内存、短生命周期的状态，按 (频道, 用户) 记录最近一次输入
//! 活动；只做广播，从不持久化，进程重启后不存在。刷新计时由
//! 发送方客户端负责（超时前主动发 stop_typing），服务端不跑
//! 清扫任务——客户端在输入中途断线会给同伴留下一个过期的
//! "正在输入"指示，直到新的活动或显式 stop 到来。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use domain::{ChannelId, ConnectionId, UserId};

use crate::events::ServerEvent;
use crate::router::EventRouter;
use crate::subscriptions::ChannelSubscriptions;

/// 客户端超过这个时限没有刷新输入信号即视为过期。
pub const TYPING_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TypingTracker {
    states: RwLock<HashMap<(ChannelId, UserId), Instant>>,
    subscriptions: Arc<ChannelSubscriptions>,
    router: Arc<EventRouter>,
}

impl TypingTracker {
    pub fn new(subscriptions: Arc<ChannelSubscriptions>, router: Arc<EventRouter>) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            subscriptions,
            router,
        }
    }

    /// 记录/刷新输入状态，并向频道内除发起连接外的订阅者广播。
    pub async fn mark_typing(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        origin: ConnectionId,
    ) {
        self.states
            .write()
            .await
            .insert((channel_id, user_id), Instant::now());

        self.broadcast_except(origin, channel_id, ServerEvent::Typing { channel_id, user_id })
            .await;
    }

    /// 移除输入状态。状态不存在也照常广播：客户端重复发送
    /// stop 是无害的。
    pub async fn mark_stopped(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        origin: ConnectionId,
    ) {
        self.states.write().await.remove(&(channel_id, user_id));

        self.broadcast_except(
            origin,
            channel_id,
            ServerEvent::StopTyping { channel_id, user_id },
        )
        .await;
    }

    /// 用户当前是否（未过期地）在该频道输入中。
    pub async fn is_typing(&self, channel_id: ChannelId, user_id: UserId) -> bool {
        let states = self.states.read().await;
        states
            .get(&(channel_id, user_id))
            .is_some_and(|last_activity| last_activity.elapsed() < TYPING_IDLE_TIMEOUT)
    }

    async fn broadcast_except(
        &self,
        origin: ConnectionId,
        channel_id: ChannelId,
        event: ServerEvent,
    ) {
        let targets: Vec<ConnectionId> = self
            .subscriptions
            .subscribers_of(channel_id)
            .await
            .into_iter()
            .filter(|connection_id| *connection_id != origin)
            .collect();

        self.router.send_to_many(&targets, event).await;
    }
}
