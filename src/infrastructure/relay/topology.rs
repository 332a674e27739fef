//! Broker topology: exchange name, per-instance queue and the wildcard
//! binding that makes every instance receive every channel's traffic.

/// Names used to declare and bind the relay on the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Shared topic exchange, also the namespace of every routing key.
    pub exchange: String,
    /// This instance's exclusive queue.
    pub queue: String,
    /// Routing key used for every publish and as the queue binding.
    pub wildcard: String,
}

impl Topology {
    pub fn new(exchange: &str, instance_id: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            queue: format!("{}.{}", exchange, instance_id),
            wildcard: format!("{}.*", exchange),
        }
    }

    /// Topology for this process, keyed by [`instance_id`].
    pub fn for_instance(exchange: &str) -> Self {
        Self::new(exchange, &instance_id())
    }
}

/// Stable identity of this process: the host name when it can be read,
/// otherwise eight random bytes, hex encoded.
pub fn instance_id() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(random_id)
}

fn random_id() -> String {
    rand::random::<[u8; 8]>()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// AMQP topic matching: words are separated by `.`, `*` matches exactly one
/// word and `#` matches zero or more words.
pub fn topic_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = key.split('.').collect();
    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&head, tail)) => (word == "*" || word == head) && matches_words(rest, tail),
            None => false,
        },
    }
}
