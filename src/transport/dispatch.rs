//! Pattern-keyed handler table and dispatch.
//!
//! Handlers are plain closures stored in a `{pattern -> Vec<handler>}` map,
//! per the design notes: `*` is just another pattern, not special-cased in
//! storage. [`Dispatcher::dispatch`] is what gives it dispatch-order meaning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::envelope::Payload;
use super::topic::match_order;

/// A subscribed handler. Returning `Err` does not stop dispatch to the
/// remaining handlers; the error is routed to the dispatcher's `on_error`
/// sink. This is the Rust-idiomatic stand-in for "handler exceptions are
/// caught and surfaced through onError" — handlers return `Result` instead
/// of throwing.
pub type Handler = Box<dyn Fn(&str, &Payload) -> Result<(), String> + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

/// Routes inbound `(topic, payload)` pairs to subscribed handlers.
///
/// Not `Clone`; share via `Arc<Dispatcher>` the way the caller shares any
/// other core singleton.
pub struct Dispatcher {
    table: Mutex<HashMap<String, Vec<Entry>>>,
    next_id: Mutex<u64>,
    on_error: Mutex<Option<Box<dyn Fn(&str, &str) + Send + Sync>>>,
}

/// Token returned by [`Dispatcher::subscribe`]; calling [`Self::unsubscribe`]
/// removes the associated handler.
pub struct Subscription {
    dispatcher: Arc<Dispatcher>,
    pattern: String,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let mut table = self.dispatcher.table.lock().unwrap();
        if let Some(entries) = table.get_mut(&self.pattern) {
            entries.retain(|e| e.id != self.id);
            if entries.is_empty() {
                table.remove(&self.pattern);
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
            on_error: Mutex::new(None),
        }
    }

    /// Registers a handler for `pattern` (an exact topic, a topic prefix, or
    /// the literal `"*"`). Returns a subscription that must be held by the
    /// caller; dropping it without calling `unsubscribe` leaves the handler
    /// active, matching an explicit "call to remove" semantics.
    pub fn subscribe(
        self: &Arc<Self>,
        pattern: impl Into<String>,
        handler: impl Fn(&str, &Payload) -> Result<(), String> + Send + Sync + 'static,
    ) -> Subscription {
        let pattern = pattern.into();
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        drop(next_id);

        self.table
            .lock()
            .unwrap()
            .entry(pattern.clone())
            .or_default()
            .push(Entry {
                id,
                handler: Box::new(handler),
            });

        Subscription {
            dispatcher: self.clone(),
            pattern,
            id,
        }
    }

    pub fn on_error(&self, handler: impl Fn(&str, &str) + Send + Sync + 'static) {
        *self.on_error.lock().unwrap() = Some(Box::new(handler));
    }

    /// Dispatches `payload` on `topic` to every subscribed handler, each
    /// visited at most once, in exact-match then longest-to-shortest-prefix
    /// then wildcard order. A handler returning `Err` is reported via
    /// `on_error` and does not prevent later handlers from running.
    pub fn dispatch(&self, topic: &str, payload: &Payload) {
        let table = self.table.lock().unwrap();
        for pattern in match_order(topic) {
            let Some(entries) = table.get(&pattern) else {
                continue;
            };
            for entry in entries {
                if let Err(msg) = (entry.handler)(topic, payload) {
                    if let Some(on_error) = self.on_error.lock().unwrap().as_ref() {
                        on_error(topic, &msg);
                    } else {
                        log::warn!("handler error on topic {topic}: {msg}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    fn payload(v: i64) -> Payload {
        Payload::Json(serde_json::json!(v))
    }

    #[test]
    fn dispatch_fanout_order_and_once_each() {
        // S1: H1@"preview", H2@"preview/frame", H3@"*".
        let dispatcher = Arc::new(Dispatcher::new());
        let order = Arc::new(StdMutex::new(Vec::new()));

        let o1 = order.clone();
        let _h1 = dispatcher.subscribe("preview", move |t, p| {
            o1.lock().unwrap().push(("H1", t.to_string(), p.clone()));
            Ok(())
        });
        let o2 = order.clone();
        let _h2 = dispatcher.subscribe("preview/frame", move |t, p| {
            o2.lock().unwrap().push(("H2", t.to_string(), p.clone()));
            Ok(())
        });
        let o3 = order.clone();
        let _h3 = dispatcher.subscribe("*", move |t, p| {
            o3.lock().unwrap().push(("H3", t.to_string(), p.clone()));
            Ok(())
        });

        dispatcher.dispatch("preview/frame", &payload(42));

        let calls = order.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, "H2");
        assert_eq!(calls[1].0, "H1");
        assert_eq!(calls[2].0, "H3");
        for (_, topic, p) in calls.iter() {
            assert_eq!(topic, "preview/frame");
            assert_eq!(*p, payload(42));
        }
    }

    #[test]
    fn subscribe_then_unsubscribe_restores_prior_state() {
        let dispatcher = Arc::new(Dispatcher::new());
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();

        let sub = dispatcher.subscribe("rig/status", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        dispatcher.dispatch("rig/status", &payload(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        dispatcher.dispatch("rig/status", &payload(2));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(dispatcher.table.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_error_reaches_on_error_and_does_not_abort_dispatch() {
        let dispatcher = Arc::new(Dispatcher::new());
        let errors = Arc::new(StdMutex::new(Vec::new()));
        let e = errors.clone();
        dispatcher.on_error(move |topic, msg| {
            e.lock().unwrap().push((topic.to_string(), msg.to_string()));
        });

        let second_called = Arc::new(AtomicUsize::new(0));
        let sc = second_called.clone();
        let _h1 = dispatcher.subscribe("preview/frame", |_, _| Err("boom".to_string()));
        let _h2 = dispatcher.subscribe("preview/frame", move |_, _| {
            sc.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        dispatcher.dispatch("preview/frame", &payload(1));

        assert_eq!(second_called.load(Ordering::SeqCst), 1);
        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(errors.lock().unwrap()[0].1, "boom");
    }
}
