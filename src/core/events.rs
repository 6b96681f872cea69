//! Listener registration with explicit disposal.
//!
//! Host events (cursor movement, saves, path changes, repository status
//! changes) are delivered through an [`Emitter`]. Registering a listener
//! returns a [`Disposable`] token; a session collects all of its tokens into
//! one [`CompositeDisposable`] and disposes them together on teardown.
//!
//! Tokens do not unsubscribe on drop. Forgetting a token keeps the listener
//! alive for the lifetime of the emitter.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Shared listener callback
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Lock a mutex, recovering the guard if a listener panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Token returned by a listener registration
pub struct Disposable {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposable {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A token with nothing to release
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    /// Run the teardown. Calling this more than once is harmless.
    pub fn dispose(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.is_none()
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A group of tokens disposed together
#[derive(Debug, Default)]
pub struct CompositeDisposable {
    items: Vec<Disposable>,
    disposed: bool,
}

impl CompositeDisposable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token. Once the group is disposed, added tokens are disposed immediately.
    pub fn add(&mut self, mut item: Disposable) {
        if self.disposed {
            item.dispose();
        } else {
            self.items.push(item);
        }
    }

    /// Dispose every token and close the group
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.clear();
    }

    /// Dispose every token but keep the group open for new registrations
    pub fn clear(&mut self) {
        for mut item in self.items.drain(..) {
            item.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

struct Listeners<T> {
    next_token: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A multi-listener event source
pub struct Emitter<T> {
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners {
                next_token: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: Clone + Send + 'static> Emitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The returned token removes it again.
    pub fn subscribe(&self, callback: Callback<T>) -> Disposable {
        let token = {
            let mut listeners = lock(&self.listeners);
            let token = listeners.next_token;
            listeners.next_token += 1;
            listeners.entries.push((token, callback));
            token
        };

        let weak: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Disposable::new(move || {
            if let Some(listeners) = weak.upgrade() {
                lock(&listeners).entries.retain(|(t, _)| *t != token);
            }
        })
    }

    /// Deliver `value` to every listener registered at the time of the call.
    ///
    /// Listeners run outside the lock, so they may subscribe or dispose.
    pub fn emit(&self, value: T) {
        let callbacks: Vec<Callback<T>> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(value.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}
