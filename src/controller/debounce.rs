//! Single-shot, per-key debounce timer.
//!
//! Crop and per-channel intensity updates each get one timer, the intensity
//! one keyed by channel name. Scheduling a key again cancels its pending
//! timer and restarts the delay, via a cancel-and-respawn
//! `tokio::task::JoinHandle::abort` per key.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct Debouncer<K> {
    delay: Duration,
    pending: Arc<Mutex<HashMap<K, tokio::task::JoinHandle<()>>>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(delay_ms: i32) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms.max(0) as u64),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replaces any pending timer for `key` and restarts the delay.
    /// `action` fires once, after `delay`, unless superseded or cancelled
    /// first.
    pub fn schedule(&self, key: K, action: impl FnOnce() + Send + 'static) {
        let delay = self.delay;
        let pending = self.pending.clone();
        let key_for_task = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            pending.lock().unwrap().remove(&key_for_task);
            action();
        });

        if let Some(previous) = self.pending.lock().unwrap().insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancels `key`'s pending timer, if any, without firing its action.
    pub fn cancel(&self, key: &K) {
        if let Some(handle) = self.pending.lock().unwrap().remove(key) {
            handle.abort();
        }
    }

    pub fn has_pending(&self, key: &K) -> bool {
        self.pending.lock().unwrap().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn s5_intensity_debounce_coalesces_rapid_updates() {
        let debouncer = Debouncer::new(100);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let c1 = calls.clone();
        debouncer.schedule("green".to_string(), move || {
            c1.lock().unwrap().push((0.1, 0.9));
        });

        tokio::time::advance(Duration::from_millis(50)).await;

        let c2 = calls.clone();
        debouncer.schedule("green".to_string(), move || {
            c2.lock().unwrap().push((0.2, 0.8));
        });

        tokio::time::advance(Duration::from_millis(120)).await;
        tokio::task::yield_now().await;

        let recorded = calls.lock().unwrap();
        assert_eq!(*recorded, vec![(0.2, 0.8)]);
    }

    #[tokio::test(start_paused = true)]
    async fn independent_keys_do_not_cancel_each_other() {
        let debouncer = Debouncer::new(100);
        let count = Arc::new(AtomicUsize::new(0));

        let c1 = count.clone();
        debouncer.schedule("crop".to_string(), move || {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = count.clone();
        debouncer.schedule("green".to_string(), move || {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_action_from_firing() {
        let debouncer = Debouncer::new(100);
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        debouncer.schedule("crop".to_string(), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel(&"crop".to_string());

        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
