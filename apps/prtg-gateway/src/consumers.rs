//! 传感器消费者任务：变更通知、连接恢复与定时轮询三路驱动。

use domain::{ConnectionStatus, ObjectId};
use prtg_relay::RelayPort;
use prtg_sensor::{SensorConsumer, StateSink};
use prtg_webhook::{ChannelSubscriber, SubscriberRegistry};
use relay_contract::BroadcastEnvelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 为每个传感器 ID 启动一个消费者任务，并登记到订阅表。
pub fn spawn_sensor_consumers(
    sensor_ids: &[ObjectId],
    interval_override: u64,
    relay: Arc<dyn RelayPort>,
    sink: Arc<dyn StateSink>,
    registry: &SubscriberRegistry,
    status: watch::Receiver<ConnectionStatus>,
) -> Vec<JoinHandle<()>> {
    sensor_ids
        .iter()
        .map(|&sensor_id| {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.subscribe(Some(sensor_id), Arc::new(ChannelSubscriber::new(tx)));
            let consumer = SensorConsumer::new(sensor_id, relay.clone(), sink.clone())
                .with_interval_override(interval_override);
            info!(target: "prtg.sensor", sensor_id, "sensor_consumer_started");
            tokio::spawn(run_consumer(consumer, rx, status.clone()))
        })
        .collect()
}

/// 通知通道关闭后退出。
pub async fn run_consumer(
    consumer: SensorConsumer,
    mut notifications: mpsc::UnboundedReceiver<BroadcastEnvelope>,
    mut status: watch::Receiver<ConnectionStatus>,
) {
    let mut status_open = true;
    if status.borrow_and_update().state.is_connected() {
        refresh(&consumer).await;
    }
    loop {
        let wait = consumer.polling_interval();
        tokio::select! {
            envelope = notifications.recv() => match envelope {
                Some(envelope) => {
                    consumer.handle_notification(&envelope).await;
                }
                None => break,
            },
            changed = status.changed(), if status_open => match changed {
                Ok(()) => {
                    if status.borrow_and_update().state.is_connected() {
                        refresh(&consumer).await;
                    }
                }
                Err(_) => status_open = false,
            },
            _ = sleep_or_pending(wait) => refresh(&consumer).await,
        }
    }
    debug!(target: "prtg.sensor", sensor_id = consumer.sensor_id(), "sensor_consumer_stopped");
}

async fn refresh(consumer: &SensorConsumer) {
    if let Err(err) = consumer.request_state().await {
        debug!(target: "prtg.sensor", sensor_id = consumer.sensor_id(), error = %err, "sensor_refresh_failed");
    }
}

async fn sleep_or_pending(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}
