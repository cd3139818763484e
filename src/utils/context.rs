// src/utils/context.rs
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use flume::{Receiver, Sender};
use parking_lot::Mutex;

/// Cancellation and deadline scope handed to producers and consumers.
///
/// Contexts form a tree: a child inherits its parent's deadline (a child
/// deadline is never later than its parent's) and is done as soon as any
/// ancestor is cancelled. Cloning is cheap and shares the same node.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    deadline: Option<Instant>,
    parent: Option<Context>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    cancelled: bool,
    watchers: Vec<Sender<()>>,
}

impl Context {
    /// Root context: no deadline, never cancelled unless `cancel` is called.
    pub fn background() -> Self {
        Self::node(None, None)
    }

    fn node(deadline: Option<Instant>, parent: Option<Context>) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline,
                parent,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Child context that expires `timeout` from now, or with the parent,
    /// whichever comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            // Unrepresentable instant, so only the parent's deadline applies
            None => self.with_cancel(),
        }
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline() {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self::node(Some(deadline), Some(self.clone()))
    }

    /// Child context with the parent's deadline that can be cancelled on its own.
    pub fn with_cancel(&self) -> Self {
        Self::node(self.deadline(), Some(self.clone()))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        let watchers = {
            let mut state = self.inner.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            std::mem::take(&mut state.watchers)
        };

        for watcher in watchers {
            let _ = watcher.try_send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if ctx.inner.state.lock().cancelled {
                return true;
            }
            current = ctx.inner.parent.as_ref();
        }
        false
    }

    pub fn is_expired(&self) -> bool {
        self.deadline()
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Receiver that gets a message once this context or one of its ancestors
    /// is cancelled. Deadlines do not signal here; wait on `deadline()` for those.
    pub fn done(&self) -> Receiver<()> {
        let (tx, rx) = flume::bounded(1);

        let mut current = Some(self);
        while let Some(ctx) = current {
            let mut state = ctx.inner.state.lock();
            if state.cancelled {
                let _ = tx.try_send(());
                return rx;
            }
            state.watchers.retain(|watcher| !watcher.is_disconnected());
            state.watchers.push(tx.clone());
            drop(state);
            current = ctx.inner.parent.as_ref();
        }

        rx
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.deadline())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
