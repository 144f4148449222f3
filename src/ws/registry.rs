//! Per-service handler registry.
//!
//! Handlers and wire subscriptions are independent: unsubscribing stops the
//! streamer from pushing data but leaves handlers registered, and handlers
//! survive reconnects.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use crate::ws::codec::StreamMessage;

/// A data handler. Runs on the receive loop, so it must return quickly.
pub type Handler = Arc<dyn Fn(&StreamMessage) + Send + Sync>;

/// Ordered handler lists keyed by service name.
#[derive(Default)]
pub struct SubscriptionRegistry {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `service`. The same handler may be added twice
    /// and then runs twice.
    pub fn add_handler(&self, service: &str, handler: Handler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(service.to_owned())
            .or_default()
            .push(handler);
    }

    /// Remove the first registration of `handler` (compared by pointer).
    /// Returns whether one was found.
    pub fn remove_handler(&self, service: &str, handler: &Handler) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(service) else {
            return false;
        };
        match list.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(i) => {
                list.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn clear_handlers(&self, service: &str) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(service);
    }

    pub fn clear_all(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn handler_count(&self, service: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .map_or(0, Vec::len)
    }

    /// Run every handler for `message.service` in registration order.
    ///
    /// The list is snapshotted first so handlers may add or remove handlers
    /// themselves. A panicking handler is logged and skipped. Returns the
    /// number of handlers that completed.
    pub fn dispatch(&self, message: &StreamMessage) -> usize {
        let snapshot: Vec<Handler> = match self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.service)
        {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut completed = 0;
        for (index, handler) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(message))) {
                Ok(()) => completed += 1,
                Err(panic) => {
                    tracing::error!(
                        service = %message.service,
                        handler = index,
                        reason = %panic_reason(panic.as_ref()),
                        "Stream handler panicked"
                    );
                }
            }
        }
        completed
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_reason(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn message(service: &str) -> StreamMessage {
        StreamMessage {
            service: service.into(),
            command: "SUBS".into(),
            timestamp: 0,
            content: vec![],
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Handler {
        let log = Arc::clone(log);
        Arc::new(move |_: &StreamMessage| log.lock().unwrap().push(tag))
    }

    #[test]
    fn dispatches_in_registration_order() {
        let reg = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        reg.add_handler("CHART_EQUITY", recorder(&log, "a"));
        reg.add_handler("CHART_EQUITY", recorder(&log, "b"));
        reg.add_handler("LEVELONE_EQUITIES", recorder(&log, "other"));

        assert_eq!(reg.dispatch(&message("CHART_EQUITY")), 2);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn panicking_handler_does_not_stop_the_rest() {
        let reg = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        reg.add_handler("NASDAQ_BOOK", Arc::new(|_: &StreamMessage| panic!("boom")));
        reg.add_handler("NASDAQ_BOOK", recorder(&log, "second"));

        assert_eq!(reg.dispatch(&message("NASDAQ_BOOK")), 1);
        assert_eq!(reg.dispatch(&message("NASDAQ_BOOK")), 1);
        assert_eq!(*log.lock().unwrap(), vec!["second", "second"]);
    }

    #[test]
    fn remove_first_matching_registration() {
        let reg = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        let h = recorder(&log, "h");
        reg.add_handler("SCREENER_EQUITY", Arc::clone(&h));
        reg.add_handler("SCREENER_EQUITY", Arc::clone(&h));

        assert!(reg.remove_handler("SCREENER_EQUITY", &h));
        assert_eq!(reg.handler_count("SCREENER_EQUITY"), 1);
        assert!(reg.remove_handler("SCREENER_EQUITY", &h));
        assert!(!reg.remove_handler("SCREENER_EQUITY", &h));
        assert!(!reg.remove_handler("NOT_REGISTERED", &h));
    }

    #[test]
    fn clear_one_and_all() {
        let reg = SubscriptionRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        reg.add_handler("NYSE_BOOK", recorder(&log, "n"));
        reg.add_handler("CHART_FUTURES", recorder(&log, "c"));

        reg.clear_handlers("NYSE_BOOK");
        assert_eq!(reg.handler_count("NYSE_BOOK"), 0);
        assert_eq!(reg.handler_count("CHART_FUTURES"), 1);

        reg.clear_all();
        assert_eq!(reg.dispatch(&message("CHART_FUTURES")), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_may_register_during_dispatch() {
        let reg = Arc::new(SubscriptionRegistry::new());
        let inner = Arc::clone(&reg);
        reg.add_handler(
            "ACCT_ACTIVITY",
            Arc::new(move |_: &StreamMessage| {
                inner.add_handler("ACCT_ACTIVITY", Arc::new(|_: &StreamMessage| {}))
            }),
        );

        assert_eq!(reg.dispatch(&message("ACCT_ACTIVITY")), 1);
        assert_eq!(reg.handler_count("ACCT_ACTIVITY"), 2);
    }
}
