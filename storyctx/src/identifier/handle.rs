//! Deferred identifier handle and its resolver.

use crate::errors::IdentifierError;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};
use tracing::warn;

enum Slot {
    Pending(Vec<Waker>),
    Resolved(String),
    Failed(IdentifierError),
}

impl Slot {
    fn outcome(&self) -> Option<Result<String, IdentifierError>> {
        match self {
            Self::Pending(_) => None,
            Self::Resolved(id) => Some(Ok(id.clone())),
            Self::Failed(err) => Some(Err(err.clone())),
        }
    }
}

struct HandleInner {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl HandleInner {
    fn new(slot: Slot) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(slot),
            ready: Condvar::new(),
        })
    }

    /// Moves a pending slot to its terminal state. Returns false if the slot
    /// was already terminal (first outcome wins).
    fn complete(&self, outcome: Result<String, IdentifierError>) -> bool {
        let wakers = {
            let mut slot = self.slot.lock();
            let Slot::Pending(wakers) = &mut *slot else {
                return false;
            };
            let wakers = std::mem::take(wakers);
            *slot = match outcome {
                Ok(id) => Slot::Resolved(id),
                Err(err) => Slot::Failed(err),
            };
            wakers
        };

        self.ready.notify_all();
        for waker in wakers {
            waker.wake();
        }
        true
    }
}

/// An opaque handle to the identifier of a reported item.
///
/// The reporting side assigns identifiers asynchronously, so a handle may be
/// created before its value exists. Handles are cheap to clone and compare
/// by identity: two handles are equal only if they are clones of the same
/// original, regardless of the value they resolve to.
#[derive(Clone)]
pub struct IdentifierHandle {
    inner: Arc<HandleInner>,
}

impl IdentifierHandle {
    /// Creates a handle that is already resolved to `id`.
    #[must_use]
    pub fn resolved(id: impl Into<String>) -> Self {
        Self {
            inner: HandleInner::new(Slot::Resolved(id.into())),
        }
    }

    /// Creates a handle that has already failed.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            inner: HandleInner::new(Slot::Failed(IdentifierError::failed(reason))),
        }
    }

    /// Creates an unresolved handle together with the resolver that completes it.
    #[must_use]
    pub fn pending() -> (Self, IdentifierResolver) {
        let inner = HandleInner::new(Slot::Pending(Vec::new()));
        let resolver = IdentifierResolver {
            inner: inner.clone(),
            completed: false,
        };
        (Self { inner }, resolver)
    }

    /// Returns true once the handle holds a value or a failure.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(*self.inner.slot.lock(), Slot::Pending(_))
    }

    /// Returns the outcome without waiting, or `None` while still pending.
    #[must_use]
    pub fn try_get(&self) -> Option<Result<String, IdentifierError>> {
        self.inner.slot.lock().outcome()
    }

    /// Blocks the calling thread until the identifier is available.
    pub fn blocking_get(&self) -> Result<String, IdentifierError> {
        let mut slot = self.inner.slot.lock();
        loop {
            if let Some(outcome) = slot.outcome() {
                return outcome;
            }
            self.inner.ready.wait(&mut slot);
        }
    }

    /// Blocks until the identifier is available or `timeout` elapses.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn blocking_get_timeout(&self, timeout: Duration) -> Result<String, IdentifierError> {
        let mut slot = self.inner.slot.lock();
        if let Some(outcome) = slot.outcome() {
            return outcome;
        }

        let Some(deadline) = Instant::now().checked_add(timeout) else {
            loop {
                self.inner.ready.wait(&mut slot);
                if let Some(outcome) = slot.outcome() {
                    return outcome;
                }
            }
        };

        loop {
            if self.inner.ready.wait_until(&mut slot, deadline).timed_out() {
                return slot.outcome().unwrap_or_else(|| {
                    Err(IdentifierError::Timeout {
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    })
                });
            }
            if let Some(outcome) = slot.outcome() {
                return outcome;
            }
        }
    }

    /// Returns a future that completes when the identifier is available.
    ///
    /// The future does not depend on any particular async runtime.
    #[must_use]
    pub fn resolve(&self) -> Resolve {
        Resolve {
            inner: self.inner.clone(),
        }
    }
}

impl PartialEq for IdentifierHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for IdentifierHandle {}

impl Hash for IdentifierHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Display for IdentifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner.slot.lock() {
            Slot::Pending(_) => write!(f, "<pending>"),
            Slot::Resolved(id) => write!(f, "{id}"),
            Slot::Failed(_) => write!(f, "<failed>"),
        }
    }
}

impl fmt::Debug for IdentifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierHandle")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .field("outcome", &self.try_get())
            .finish()
    }
}

/// The write side of a pending [`IdentifierHandle`].
///
/// Dropping a resolver without calling [`resolve`](Self::resolve) or
/// [`fail`](Self::fail) fails every clone of the handle with
/// [`IdentifierError::Abandoned`], so waiters never hang on a lost resolver.
pub struct IdentifierResolver {
    inner: Arc<HandleInner>,
    completed: bool,
}

impl IdentifierResolver {
    /// Returns another clone of the handle this resolver completes.
    #[must_use]
    pub fn handle(&self) -> IdentifierHandle {
        IdentifierHandle {
            inner: self.inner.clone(),
        }
    }

    /// Completes the handle with the assigned identifier.
    pub fn resolve(mut self, id: impl Into<String>) {
        self.completed = true;
        self.inner.complete(Ok(id.into()));
    }

    /// Completes the handle with a failure.
    pub fn fail(mut self, reason: impl Into<String>) {
        self.completed = true;
        self.inner.complete(Err(IdentifierError::failed(reason)));
    }
}

impl Drop for IdentifierResolver {
    fn drop(&mut self) {
        if !self.completed && self.inner.complete(Err(IdentifierError::Abandoned)) {
            warn!("Identifier resolver dropped before resolving");
        }
    }
}

impl fmt::Debug for IdentifierResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierResolver")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .field("completed", &self.completed)
            .finish()
    }
}

/// Future returned by [`IdentifierHandle::resolve`].
#[must_use = "futures do nothing unless polled"]
pub struct Resolve {
    inner: Arc<HandleInner>,
}

impl Future for Resolve {
    type Output = Result<String, IdentifierError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.inner.slot.lock();
        match &mut *slot {
            Slot::Pending(wakers) => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
            Slot::Resolved(id) => Poll::Ready(Ok(id.clone())),
            Slot::Failed(err) => Poll::Ready(Err(err.clone())),
        }
    }
}

impl fmt::Debug for Resolve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolve")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .finish()
    }
}
