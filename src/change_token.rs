//! Single-shot change notifications.
//!
//! A [`ChangeToken`] starts out active and transitions exactly once to the fired state. Cloned
//! handles share that state, so a file provider can hand out a token to a cache while keeping a
//! clone it fires when the watched file changes.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

type Callback = Box<dyn FnOnce() + Send>;

struct TokenState {
    fired: AtomicBool,
    callbacks: Mutex<Vec<Callback>>,
}

/// Shared handle to a one-time change notification.
#[derive(Clone)]
pub struct ChangeToken {
    state: Arc<TokenState>,
}

impl ChangeToken {
    /// Create an active token.
    pub fn new() -> Self {
        Self {
            state: Arc::new(TokenState {
                fired: AtomicBool::new(false),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a token that can never fire.
    ///
    /// Returned by providers that cannot observe changes for a path. Nobody holds a firing handle,
    /// so the token stays active for its whole lifetime.
    pub fn never() -> Self {
        Self::new()
    }

    /// Returns `true` once the token has fired.
    pub fn has_changed(&self) -> bool {
        self.state.fired.load(Ordering::Acquire)
    }

    /// Fire the token, running every registered callback.
    ///
    /// Returns `false` when the token had already fired; callbacks never run twice.
    pub fn fire(&self) -> bool {
        if self.state.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        let callbacks = std::mem::take(&mut *self.state.callbacks.lock());
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Run `callback` when the token fires, or right away if it already has.
    pub fn register_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut callbacks = self.state.callbacks.lock();
            // `fire` flips the flag before draining, so checking under the lock is enough to never
            // strand a callback in the queue.
            if !self.state.fired.load(Ordering::Acquire) {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    /// Returns `true` when both handles refer to the same notification.
    pub fn same_token(&self, other: &ChangeToken) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for ChangeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeToken")
            .field("has_changed", &self.has_changed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn starts_active_and_fires_once() {
        let token = ChangeToken::new();
        assert!(!token.has_changed());

        assert!(token.fire());
        assert!(token.has_changed());
        assert!(!token.fire());
        assert!(token.has_changed());
    }

    #[test]
    fn clones_share_state() {
        let token = ChangeToken::new();
        let handle = token.clone();
        handle.fire();

        assert!(token.has_changed());
        assert!(token.same_token(&handle));
        assert!(!token.same_token(&ChangeToken::new()));
    }

    #[test]
    fn callbacks_run_exactly_once_on_fire() {
        let token = ChangeToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        token.register_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        token.fire();
        token.fire();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_callbacks_run_immediately() {
        let token = ChangeToken::new();
        token.fire();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        token.register_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fires_across_threads() {
        let token = ChangeToken::new();
        let handle = token.clone();

        std::thread::spawn(move || {
            handle.fire();
        })
        .join()
        .unwrap();

        assert!(token.has_changed());
    }
}
