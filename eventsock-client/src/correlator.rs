//! Callback correlation for request/reply exchanges
//!
//! # Lifecycle
//!
//! 1. **Assign**: pick an identifier not held by any pending reply
//! 2. **Register**: store the reply target against the identifier
//! 3. **Send**: the identifier travels in the `id` field of the event frame
//! 4. **Resolve**: a reply with that `id` fires the target once and removes it
//!
//! Replies for unknown or already resolved identifiers are dropped. Once an
//! identifier is resolved it may be handed out again.
//!
//! # Identifiers
//!
//! Identifiers are random decimal strings in `[0, 2_000_000_000)`. A collision
//! with a pending identifier triggers regeneration, so uniqueness holds among
//! outstanding replies only.
//!
//! # Expiry
//!
//! Pending replies never expire unless a TTL is configured, in which case
//! [`CallbackCorrelator::sweep`] drops entries older than the TTL. Replies
//! whose awaiting future was dropped are swept regardless of TTL.

use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Upper bound (exclusive) for generated identifiers
pub const ID_SPACE: u64 = 2_000_000_000;

/// One-shot reply callback
pub type ReplyCallback = Box<dyn FnOnce(Value) + Send>;

/// Where a correlated reply is delivered
pub enum ReplyTarget {
    /// Invoke a callback with the reply payload
    Callback(ReplyCallback),
    /// Complete an awaiting `request` future
    Channel(oneshot::Sender<Value>),
}

impl ReplyTarget {
    fn deliver(self, data: Value) {
        match self {
            ReplyTarget::Callback(callback) => callback(data),
            ReplyTarget::Channel(tx) => {
                // Receiver gone means the caller stopped waiting
                let _ = tx.send(data);
            }
        }
    }

    fn is_abandoned(&self) -> bool {
        match self {
            ReplyTarget::Callback(_) => false,
            ReplyTarget::Channel(tx) => tx.is_closed(),
        }
    }
}

struct PendingReply {
    target: ReplyTarget,
    registered_at: Instant,
}

/// Source of candidate identifiers
pub type IdGenerator = Box<dyn FnMut() -> String + Send>;

fn random_id() -> String {
    rand::thread_rng().gen_range(0..ID_SPACE).to_string()
}

/// Pending reply table
pub struct CallbackCorrelator {
    pending: HashMap<String, PendingReply>,
    generate: IdGenerator,
    ttl: Option<Duration>,
}

impl CallbackCorrelator {
    /// Create a correlator with random identifiers and no expiry
    pub fn new() -> Self {
        Self::with_generator(Box::new(random_id))
    }

    /// Create a correlator with a custom identifier source
    pub fn with_generator(generate: IdGenerator) -> Self {
        Self {
            pending: HashMap::new(),
            generate,
            ttl: None,
        }
    }

    /// Expire pending replies older than `ttl` on each sweep
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Register a reply target and return its identifier
    pub fn register(&mut self, target: ReplyTarget) -> String {
        let mut id = (self.generate)();
        while self.pending.contains_key(&id) {
            tracing::trace!(id = %id, "Callback id collision, regenerating");
            id = (self.generate)();
        }

        self.pending.insert(
            id.clone(),
            PendingReply {
                target,
                registered_at: Instant::now(),
            },
        );
        id
    }

    /// Deliver a reply; returns false if nothing was waiting for `id`
    pub fn resolve(&mut self, id: &str, data: Value) -> bool {
        match self.pending.remove(id) {
            Some(pending) => {
                pending.target.deliver(data);
                true
            }
            None => false,
        }
    }

    /// Drop abandoned and expired entries; returns how many were removed
    pub fn sweep(&mut self) -> usize {
        let before = self.pending.len();
        let ttl = self.ttl;
        let now = Instant::now();

        self.pending.retain(|id, pending| {
            let expired = ttl.is_some_and(|ttl| now.duration_since(pending.registered_at) >= ttl);
            let keep = !expired && !pending.target.is_abandoned();
            if !keep {
                tracing::debug!(id = %id, expired, "Dropping pending callback");
            }
            keep
        });

        before - self.pending.len()
    }

    /// Returns true if `id` is waiting for a reply
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of replies still outstanding
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Configured expiry
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

impl Default for CallbackCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
