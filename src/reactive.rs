//! Framework-neutral observable cell.
//!
//! UI widgets bind to core state via `subscribe`, never assuming any
//! particular UI framework: `get`/`set`/`subscribe(cb) -> unsubscribe`.
//!
//! Scoped-down variant of a broadcast-based event fan-out, narrowed to a
//! single value so each piece of UI-relevant state (crop, connection
//! status, channel list) can be subscribed to independently.

use std::sync::{Arc, Mutex, RwLock};

type Subscriber<T> = Box<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Vec<(u64, Subscriber<T>)>>,
    next_id: Mutex<u64>,
}

/// A shared, observable value. Cloning an [`Observable`] shares state (it is
/// `Arc`-backed), so a device's `PropertyModel` reference stays stable
/// across updates even as its value changes.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Call to remove the associated subscription. Dropping it without calling
/// does nothing (the subscription stays active) — unlike a guard, this is
/// an explicit action.
pub struct Unsubscribe<T> {
    inner: Arc<Inner<T>>,
    id: u64,
}

impl<T> Unsubscribe<T> {
    pub fn unsubscribe(self) {
        let mut subs = self.inner.subscribers.lock().unwrap();
        subs.retain(|(id, _)| *id != self.id);
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Vec::new()),
                next_id: Mutex::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.read().unwrap().clone()
    }

    /// Replaces the value and notifies subscribers with the new value.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.inner.value.write().unwrap();
            *guard = value;
        }
        self.notify();
    }

    /// Mutates the value in place (so object identity for reference-typed
    /// `T` such as `Arc<Mutex<_>>` members is preserved) and notifies.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut guard = self.inner.value.write().unwrap();
            f(&mut guard);
        }
        self.notify();
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Unsubscribe<T> {
        let mut next_id = self.inner.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;
        drop(next_id);

        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((id, Box::new(handler)));

        Unsubscribe {
            inner: self.inner.clone(),
            id,
        }
    }

    fn notify(&self) {
        let guard = self.inner.value.read().unwrap();
        let subs = self.inner.subscribers.lock().unwrap();
        for (_, handler) in subs.iter() {
            handler(&guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn get_set_roundtrip() {
        let cell = Observable::new(42i32);
        assert_eq!(cell.get(), 42);
        cell.set(7);
        assert_eq!(cell.get(), 7);
    }

    #[test]
    fn subscribers_are_notified_on_set() {
        let cell = Observable::new(0i32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _sub = cell.subscribe(move |v| seen2.lock().unwrap().push(*v));

        cell.set(1);
        cell.set(2);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let cell = Observable::new(0i32);
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let sub = cell.subscribe(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        cell.set(1);
        sub.unsubscribe();
        cell.set(2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clone_shares_state() {
        let a = Observable::new("x".to_string());
        let b = a.clone();
        b.set("y".to_string());
        assert_eq!(a.get(), "y");
    }
}
