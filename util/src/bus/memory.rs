//! In-process broker with the same routing and acknowledgement rules as the
//! AMQP adapter.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};
use tracing::{debug, warn};

use super::topology::{Binding, ExchangeType, Topology};
use super::{BusError, ConsumerHandle, Event, EventBus, EventHandler};

/// Pause after a failed delivery before the consumer polls again.
const REQUEUE_DELAY: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Queue {
    messages: VecDeque<Event>,
    notify: Arc<Notify>,
    consumers: Vec<String>,
}

#[derive(Default)]
struct State {
    exchanges: HashMap<String, ExchangeType>,
    queues: HashMap<String, Queue>,
    bindings: Vec<Binding>,
}

#[derive(Clone)]
pub struct InMemoryBus {
    state: Arc<Mutex<State>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Messages waiting in `queue`, not counting ones a consumer is handling.
    pub fn pending(&self, queue: &str) -> usize {
        lock(&self.state)
            .queues
            .get(queue)
            .map(|q| q.messages.len())
            .unwrap_or(0)
    }

    fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A message taken off a queue. Dropping it without [`Delivery::ack`] puts it
/// back at the head of the queue, which covers both handler errors and a
/// consumer task aborted mid-handling.
struct Delivery {
    state: Arc<Mutex<State>>,
    queue: String,
    event: Option<Event>,
}

impl Delivery {
    fn ack(mut self) {
        self.event = None;
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            let mut state = lock(&self.state);
            if let Some(queue) = state.queues.get_mut(&self.queue) {
                queue.messages.push_front(event);
                queue.notify.notify_one();
            }
        }
    }
}

/// Holds a consumer tag on its queue; released when the consumer task ends or
/// is aborted.
struct Registration {
    state: Arc<Mutex<State>>,
    queue: String,
    tag: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if let Some(q) = state.queues.get_mut(&self.queue) {
            q.consumers.retain(|t| *t != self.tag);
        }
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn declare(&self, topology: &Topology) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let mut state = lock(&self.state);

        for exchange in &topology.exchanges {
            match state.exchanges.get(&exchange.name) {
                Some(kind) if *kind != exchange.kind => {
                    return Err(BusError::Declare(format!(
                        "exchange '{}' already declared as {:?}",
                        exchange.name, kind
                    )));
                }
                Some(_) => {}
                None => {
                    state.exchanges.insert(exchange.name.clone(), exchange.kind);
                }
            }
        }
        for queue in &topology.queues {
            state.queues.entry(queue.name.clone()).or_default();
        }
        for binding in &topology.bindings {
            if !state.exchanges.contains_key(&binding.exchange) {
                return Err(BusError::Declare(format!(
                    "binding to undeclared exchange '{}'",
                    binding.exchange
                )));
            }
            if !state.queues.contains_key(&binding.queue) {
                return Err(BusError::Declare(format!(
                    "binding of undeclared queue '{}'",
                    binding.queue
                )));
            }
            if !state.bindings.contains(binding) {
                state.bindings.push(binding.clone());
            }
        }
        Ok(())
    }

    async fn publish(&self, event: &Event) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let exchange = event.exchange();
        let mut state = lock(&self.state);
        let kind = *state.exchanges.get(exchange).ok_or_else(|| BusError::Publish {
            routing_key: event.routing_key.clone(),
            reason: format!("exchange '{exchange}' is not declared"),
        })?;

        let targets: Vec<String> = state
            .bindings
            .iter()
            .filter(|b| b.exchange == exchange && b.matches(kind, &event.routing_key))
            .map(|b| b.queue.clone())
            .collect();

        if targets.is_empty() {
            debug!(routing_key = %event.routing_key, "unroutable event dropped");
        }
        for name in targets {
            if let Some(queue) = state.queues.get_mut(&name) {
                queue.messages.push_back(event.clone());
                queue.notify.notify_one();
            }
        }
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<ConsumerHandle, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let notify = {
            let mut state = lock(&self.state);
            let q = state.queues.get_mut(queue).ok_or_else(|| BusError::Consume {
                queue: queue.to_owned(),
                reason: "queue is not declared".into(),
            })?;
            if q.consumers.iter().any(|t| t == consumer_tag) {
                return Err(BusError::Consume {
                    queue: queue.to_owned(),
                    reason: format!("consumer tag '{consumer_tag}' already in use"),
                });
            }
            q.consumers.push(consumer_tag.to_owned());
            q.notify.clone()
        };

        let state = self.state.clone();
        let mut shutdown = self.shutdown.subscribe();
        let queue_name = queue.to_owned();
        let tag = consumer_tag.to_owned();

        let registration = Registration {
            state: state.clone(),
            queue: queue_name.clone(),
            tag: tag.clone(),
        };

        let task = tokio::spawn(async move {
            let _registration = registration;
            loop {
                if *shutdown.borrow() {
                    break;
                }
                let next = lock(&state)
                    .queues
                    .get_mut(&queue_name)
                    .and_then(|q| q.messages.pop_front());

                let Some(event) = next else {
                    tokio::select! {
                        _ = notify.notified() => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                    continue;
                };

                let delivery = Delivery {
                    state: state.clone(),
                    queue: queue_name.clone(),
                    event: Some(event.clone()),
                };
                match handler.handle(event).await {
                    Ok(()) => delivery.ack(),
                    Err(e) => {
                        warn!(queue = %queue_name, consumer = %tag, error = %e, "handler failed, requeueing");
                        drop(delivery);
                        tokio::time::sleep(REQUEUE_DELAY).await;
                    }
                }
            }
        });

        Ok(ConsumerHandle::new(queue, consumer_tag, task))
    }

    async fn close(&self) -> Result<(), BusError> {
        self.shutdown.send_replace(true);
        Ok(())
    }
}
