//! Broker topology shared with every consumer of the campus events.

pub const GATEWAY_EXCHANGE: &str = "gateway_events";
pub const SERVICE_EXCHANGE: &str = "service_events";
pub const NOTIFICATION_EXCHANGE: &str = "notifications";
pub const AUDIT_EXCHANGE: &str = "audit_logs";

pub const AUDIT_QUEUE: &str = "audit_queue";
pub const REQUEST_QUEUE: &str = "request_queue";
pub const NOTIFICATION_QUEUE: &str = "notification_queue";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeType {
    Topic,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeType,
    pub durable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub queue: String,
    pub exchange: String,
    pub pattern: String,
}

impl Binding {
    pub fn matches(&self, kind: ExchangeType, routing_key: &str) -> bool {
        match kind {
            ExchangeType::Topic => topic_matches(&self.pattern, routing_key),
            ExchangeType::Direct => self.pattern == routing_key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub exchanges: Vec<ExchangeSpec>,
    pub queues: Vec<QueueSpec>,
    pub bindings: Vec<Binding>,
}

impl Topology {
    pub fn exchange(mut self, name: &str, kind: ExchangeType) -> Self {
        self.exchanges.push(ExchangeSpec {
            name: name.to_owned(),
            kind,
            durable: true,
        });
        self
    }

    pub fn queue(mut self, name: &str) -> Self {
        self.queues.push(QueueSpec {
            name: name.to_owned(),
            durable: true,
        });
        self
    }

    pub fn bind(mut self, queue: &str, exchange: &str, pattern: &str) -> Self {
        self.bindings.push(Binding {
            queue: queue.to_owned(),
            exchange: exchange.to_owned(),
            pattern: pattern.to_owned(),
        });
        self
    }

    /// The exchanges, queues and bindings every campus service expects.
    ///
    /// `audit_logs` is a topic exchange so the `audit.#` binding fans out by pattern.
    pub fn campus() -> Self {
        Topology::default()
            .exchange(GATEWAY_EXCHANGE, ExchangeType::Topic)
            .exchange(SERVICE_EXCHANGE, ExchangeType::Topic)
            .exchange(NOTIFICATION_EXCHANGE, ExchangeType::Topic)
            .exchange(AUDIT_EXCHANGE, ExchangeType::Topic)
            .queue(AUDIT_QUEUE)
            .queue(REQUEST_QUEUE)
            .queue(NOTIFICATION_QUEUE)
            .bind(AUDIT_QUEUE, AUDIT_EXCHANGE, "audit.#")
            .bind(REQUEST_QUEUE, GATEWAY_EXCHANGE, "request.#")
            .bind(NOTIFICATION_QUEUE, NOTIFICATION_EXCHANGE, "notification.#")
    }
}

/// AMQP topic matching: `*` is exactly one word, `#` is zero or more words.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
        Some((word, rest)) => match key.split_first() {
            Some((k, key_rest)) => (*word == "*" || word == k) && matches_words(rest, key_rest),
            None => false,
        },
    }
}
