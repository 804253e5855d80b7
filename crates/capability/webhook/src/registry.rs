//! 变更通知订阅表。

use crate::WebhookError;
use domain::ObjectId;
use relay_contract::BroadcastEnvelope;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// 变更通知接收方。投递不等待接收方处理完成。
pub trait ChangeSubscriber: Send + Sync {
    fn notify(&self, envelope: BroadcastEnvelope) -> Result<(), WebhookError>;
}

/// 通过无界通道转交给消费者任务的订阅者。
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    sender: mpsc::UnboundedSender<BroadcastEnvelope>,
}

impl ChannelSubscriber {
    pub fn new(sender: mpsc::UnboundedSender<BroadcastEnvelope>) -> Self {
        Self { sender }
    }
}

impl ChangeSubscriber for ChannelSubscriber {
    fn notify(&self, envelope: BroadcastEnvelope) -> Result<(), WebhookError> {
        self.sender
            .send(envelope)
            .map_err(|_| WebhookError::SubscriberClosed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    /// 只接收该实体的通知；None 表示接收全部。
    entity_filter: Option<ObjectId>,
    subscriber: Arc<dyn ChangeSubscriber>,
}

/// 订阅表。webhook 与轮询路径都通过它广播通知。
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        entity_filter: Option<ObjectId>,
        subscriber: Arc<dyn ChangeSubscriber>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut subscriptions) = self.subscriptions.write() {
            subscriptions.push(Subscription {
                id,
                entity_filter,
                subscriber,
            });
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions
            .write()
            .map(|mut subscriptions| {
                let before = subscriptions.len();
                subscriptions.retain(|subscription| subscription.id != id);
                subscriptions.len() != before
            })
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .map(|subscriptions| subscriptions.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 投递给所有匹配的订阅者，返回成功投递数。单个失败不影响其它订阅者。
    pub fn broadcast(&self, envelope: BroadcastEnvelope) -> usize {
        let Ok(subscriptions) = self.subscriptions.read() else {
            return 0;
        };
        let mut delivered = 0;
        for subscription in subscriptions.iter() {
            if subscription
                .entity_filter
                .is_some_and(|entity| entity != envelope.entity_id)
            {
                continue;
            }
            match subscription.subscriber.notify(envelope) {
                Ok(()) => {
                    delivered += 1;
                    prtg_telemetry::record_broadcast_sent();
                }
                Err(err) => {
                    prtg_telemetry::record_broadcast_dropped();
                    warn!(target: "prtg.webhook", entity_id = envelope.entity_id, error = %err, "broadcast_dropped");
                }
            }
        }
        debug!(target: "prtg.webhook", entity_id = envelope.entity_id, delivered, "broadcast_done");
        delivered
    }
}
