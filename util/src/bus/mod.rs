//! Event bus adapter.
//!
//! Request, audit, service and notification events are JSON messages routed by a
//! dotted key `<kind>.<service>.<detail>` through topic exchanges into durable
//! queues. Consumers acknowledge manually: a handler returning `Ok` acks the
//! message, an error nacks it with requeue.
//!
//! Two brokers implement [`EventBus`]:
//! - [`amqp::AmqpBus`] talks to RabbitMQ through `lapin`.
//! - [`memory::InMemoryBus`] keeps the same topology and routing rules in-process
//!   for tests and single-node development.

pub mod amqp;
pub mod memory;
pub mod topology;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::AppConfig;
pub use amqp::{AmqpBus, RetryPolicy};
pub use memory::InMemoryBus;
pub use topology::{
    AUDIT_EXCHANGE, AUDIT_QUEUE, Binding, ExchangeSpec, ExchangeType, GATEWAY_EXCHANGE,
    NOTIFICATION_EXCHANGE, NOTIFICATION_QUEUE, QueueSpec, REQUEST_QUEUE, SERVICE_EXCHANGE,
    Topology, topic_matches,
};

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("broker connection failed: {0}")]
    Connection(String),
    #[error("topology declaration failed: {0}")]
    Declare(String),
    #[error("publish failed for '{routing_key}': {reason}")]
    Publish { routing_key: String, reason: String },
    #[error("consume failed on '{queue}': {reason}")]
    Consume { queue: String, reason: String },
    #[error("event encoding failed: {0}")]
    Encoding(String),
    #[error("broker is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Request,
    Audit,
    ServiceEvent,
    Notification,
}

impl EventKind {
    /// First word of the routing key.
    pub fn prefix(&self) -> &'static str {
        match self {
            EventKind::Request => "request",
            EventKind::Audit => "audit",
            EventKind::ServiceEvent => "service",
            EventKind::Notification => "notification",
        }
    }

    /// Exchange the kind is published to.
    pub fn exchange(&self) -> &'static str {
        match self {
            EventKind::Request => GATEWAY_EXCHANGE,
            EventKind::Audit => AUDIT_EXCHANGE,
            EventKind::ServiceEvent => SERVICE_EXCHANGE,
            EventKind::Notification => NOTIFICATION_EXCHANGE,
        }
    }

    pub fn from_routing_key(key: &str) -> Option<Self> {
        match key.split('.').next()? {
            "request" => Some(EventKind::Request),
            "audit" => Some(EventKind::Audit),
            "service" => Some(EventKind::ServiceEvent),
            "notification" => Some(EventKind::Notification),
            _ => None,
        }
    }
}

/// A transient message travelling through the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub routing_key: String,
    pub body: Value,
}

impl Event {
    pub fn new(kind: EventKind, service: &str, detail: &str, body: Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            routing_key: format!("{}.{}.{}", kind.prefix(), service, detail),
            body,
        }
    }

    pub fn request(service: &str, detail: &str, body: Value) -> Self {
        Self::new(EventKind::Request, service, detail, body)
    }

    pub fn audit(service: &str, detail: &str, body: Value) -> Self {
        Self::new(EventKind::Audit, service, detail, body)
    }

    pub fn service(service: &str, detail: &str, body: Value) -> Self {
        Self::new(EventKind::ServiceEvent, service, detail, body)
    }

    pub fn notification(service: &str, detail: &str, body: Value) -> Self {
        Self::new(EventKind::Notification, service, detail, body)
    }

    pub fn exchange(&self) -> &'static str {
        self.kind.exchange()
    }
}

/// Application callback for consumed events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Event) -> anyhow::Result<()>;
}

/// A running consumer task bound to one queue.
pub struct ConsumerHandle {
    queue: String,
    tag: String,
    task: JoinHandle<()>,
}

impl ConsumerHandle {
    pub(crate) fn new(queue: &str, tag: &str, task: JoinHandle<()>) -> Self {
        Self {
            queue: queue.to_owned(),
            tag: tag.to_owned(),
            task,
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the consumer. Unacked in-flight messages go back to the queue.
    pub fn abort(self) {
        self.task.abort();
    }
}

#[async_trait]
pub trait EventBus: Send + Sync {
    /// Declares exchanges, queues and bindings. Safe to repeat.
    async fn declare(&self, topology: &Topology) -> Result<(), BusError>;

    /// Publishes a persistent JSON message to the exchange of its kind.
    async fn publish(&self, event: &Event) -> Result<(), BusError>;

    /// Starts a long-lived consumer on `queue` under a stable `consumer_tag`.
    async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<ConsumerHandle, BusError>;

    /// Closes the publishing channel, then the connection.
    async fn close(&self) -> Result<(), BusError>;
}

enum Outbound {
    Publish(Event),
    Flush(oneshot::Sender<()>),
}

/// Cheap, cloneable handle used on request paths.
///
/// Every clone feeds the same background task, which publishes one event at a
/// time in the order they were emitted. Events sharing a routing key therefore
/// reach the broker in emit order.
#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
    outbox: mpsc::UnboundedSender<Outbound>,
}

impl EventPublisher {
    /// Spawns the publishing task, so it must be called inside a Tokio runtime.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        let (outbox, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain_outbox(bus.clone(), rx));
        Self { bus, outbox }
    }

    pub fn bus(&self) -> Arc<dyn EventBus> {
        self.bus.clone()
    }

    pub async fn publish(&self, event: &Event) -> Result<(), BusError> {
        self.bus.publish(event).await
    }

    /// Queues the event for the background task; failures are logged and never
    /// reach the caller.
    pub fn emit(&self, event: Event) {
        if let Err(mpsc::error::SendError(Outbound::Publish(event))) =
            self.outbox.send(Outbound::Publish(event))
        {
            warn!(routing_key = %event.routing_key, "publisher stopped, event dropped");
        }
    }

    /// Resolves once every event emitted before the call has been handed to the broker.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.outbox.send(Outbound::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

async fn drain_outbox(bus: Arc<dyn EventBus>, mut rx: mpsc::UnboundedReceiver<Outbound>) {
    while let Some(next) = rx.recv().await {
        match next {
            Outbound::Publish(event) => {
                if let Err(e) = bus.publish(&event).await {
                    warn!(routing_key = %event.routing_key, error = %e, "event publication failed");
                }
            }
            Outbound::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Connects the broker selected by configuration and declares the campus topology.
pub async fn connect_from_config() -> Result<Arc<dyn EventBus>, BusError> {
    let (enabled, url) = {
        let cfg = AppConfig::global();
        (cfg.rabbitmq_enabled, cfg.rabbitmq_url.clone())
    };

    let bus: Arc<dyn EventBus> = if enabled {
        Arc::new(AmqpBus::connect_with_retry(&url, &RetryPolicy::default()).await?)
    } else {
        tracing::info!("RabbitMQ disabled, using in-process broker");
        Arc::new(InMemoryBus::new())
    };

    bus.declare(&Topology::campus()).await?;
    Ok(bus)
}
