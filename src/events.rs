//! Boundary Event Dispatch
//!
//! Synchronous fan-out of [`BoundaryEvent`]s to registered consumers.
//! Dispatch happens on the bridge task in registration order; a consumer
//! that fails or panics is logged and skipped so the remaining consumers
//! still see the event.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::models::BoundaryEvent;

/// A sink for command boundary events.
///
/// Consumers run synchronously on the bridge task, so `on_event` should
/// return quickly. Heavy work belongs behind a channel owned by the
/// consumer itself.
pub trait EventConsumer: Send {
    /// Short identifier used in failure logs.
    fn name(&self) -> &str;

    /// Receive one boundary event.
    fn on_event(&mut self, event: &BoundaryEvent) -> Result<()>;
}

/// Counters describing dispatcher activity for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events fanned out to consumers.
    pub delivered: u64,
    /// Events dropped by the safety gate before reaching consumers.
    pub suppressed: u64,
    /// Individual consumer callbacks that returned an error or panicked.
    pub consumer_failures: u64,
}

/// Fan-out point between the marker scanner and event consumers.
pub struct EventDispatcher {
    consumers: Vec<Box<dyn EventConsumer>>,
    stats: DispatchStats,
}

impl EventDispatcher {
    /// Create a dispatcher with no consumers registered.
    pub fn new() -> Self {
        Self {
            consumers: Vec::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Register a consumer. Dispatch order follows registration order.
    pub fn register(&mut self, consumer: Box<dyn EventConsumer>) {
        debug!("Registered event consumer: {}", consumer.name());
        self.consumers.push(consumer);
    }

    /// Register a closure as a consumer.
    pub fn register_fn<F>(&mut self, name: &str, f: F)
    where
        F: FnMut(&BoundaryEvent) -> Result<()> + Send + 'static,
    {
        self.register(Box::new(FnConsumer {
            name: name.to_string(),
            f,
        }));
    }

    /// Number of registered consumers.
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Whether any consumers are registered.
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Deliver one event to every consumer in registration order.
    ///
    /// A consumer error or panic is contained: the failure is logged,
    /// counted, and the remaining consumers still receive the event.
    pub fn dispatch(&mut self, event: &BoundaryEvent) {
        for consumer in &mut self.consumers {
            let outcome = catch_unwind(AssertUnwindSafe(|| consumer.on_event(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.stats.consumer_failures += 1;
                    warn!(
                        "{}",
                        Error::ConsumerCallbackFailure {
                            consumer: consumer.name().to_string(),
                            reason: e.to_string(),
                        }
                    );
                }
                Err(panic) => {
                    self.stats.consumer_failures += 1;
                    warn!(
                        "{}",
                        Error::ConsumerCallbackFailure {
                            consumer: consumer.name().to_string(),
                            reason: panic_message(panic),
                        }
                    );
                }
            }
        }
        self.stats.delivered += 1;
    }

    /// Record an event the safety gate withheld. Nothing is queued; the
    /// event is gone.
    pub fn drop_suppressed(&mut self, event: &BoundaryEvent) {
        self.stats.suppressed += 1;
        debug!("Suppressed {} event (seq {})", event.kind.name(), event.seq);
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("consumers", &self.consumers.len())
            .field("stats", &self.stats)
            .finish()
    }
}

struct FnConsumer<F> {
    name: String,
    f: F,
}

impl<F> EventConsumer for FnConsumer<F>
where
    F: FnMut(&BoundaryEvent) -> Result<()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&mut self, event: &BoundaryEvent) -> Result<()> {
        (self.f)(event)
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Built-in consumer that logs each event as a JSON line.
pub struct EventLogger;

impl EventConsumer for EventLogger {
    fn name(&self) -> &str {
        "event_logger"
    }

    fn on_event(&mut self, event: &BoundaryEvent) -> Result<()> {
        let line = serde_json::json!({
            "event": event.kind.name(),
            "seq": event.seq,
            "timestamp": event.timestamp.to_rfc3339(),
            "exit_code": event.kind.exit_code(),
        });
        debug!("boundary event: {}", line);
        Ok(())
    }
}
