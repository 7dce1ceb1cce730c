//! Cooperative cancellation bound to a scope's lifetime.
//!
//! A [`CancellationSource`] owns the cancel side; any number of
//! [`CancellationToken`]s observe it. Cancellation is binary and one-way:
//! once cancelled, a source and all of its tokens stay cancelled. A scope
//! that is restarted gets a fresh source rather than resetting the old one.
//!
//! Tokens are `Send + Sync` so that consumers on other threads or inside
//! async tasks can observe the end of a scope that is itself driven from a
//! single thread. Three observation styles are supported:
//!
//! - polling via [`CancellationToken::is_cancelled`],
//! - awaiting [`CancellationToken::cancelled`] from async code,
//! - selecting on [`CancellationToken::receiver`], which disconnects on cancel.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use smallvec::SmallVec;

type Listener = Box<dyn FnOnce() + Send>;

/// Everything waiting for the cancel edge.
///
/// Guarded by one lock; drained exactly once by the first `cancel()`.
#[derive(Default)]
struct Waiters {
    wakers: SmallVec<[Waker; 2]>,
    listeners: Vec<Listener>,
    /// Held until cancel; dropping it disconnects every handed-out receiver.
    channel: Option<(Sender<()>, Receiver<()>)>,
}

struct CancelState {
    cancelled: AtomicBool,
    waiters: Mutex<Waiters>,
}

impl CancelState {
    fn new(cancelled: bool) -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(cancelled),
            waiters: Mutex::new(Waiters::default()),
        })
    }
}

/// Owner of a cancellation signal.
///
/// Dropping a source without calling [`cancel`](Self::cancel) leaves its
/// tokens un-cancelled for good.
pub struct CancellationSource {
    token: CancellationToken,
}

impl CancellationSource {
    /// Create a new, non-cancelled source.
    pub fn new() -> Self {
        Self {
            token: CancellationToken {
                state: CancelState::new(false),
            },
        }
    }

    /// A token observing this source.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call triggered the cancellation (first caller
    /// wins). Wakes every pending [`Cancelled`] future, disconnects every
    /// receiver, and runs every listener. All listeners run even if one of
    /// them panics; the first panic is resumed after the last listener.
    pub fn cancel(&self) -> bool {
        let state = &self.token.state;
        if state
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        // Drain under the lock, notify without it so listeners may touch the token.
        let drained = std::mem::take(&mut *state.waiters.lock());
        drop(drained.channel);
        for waker in drained.wakers {
            waker.wake();
        }

        let mut first_panic = None;
        for listener in drained.listeners {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(listener)) {
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        true
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Observer side of a cancellation signal.
///
/// Cheap to clone; all clones observe the same source.
#[derive(Clone)]
pub struct CancellationToken {
    state: Arc<CancelState>,
}

impl CancellationToken {
    /// A token that is already cancelled.
    ///
    /// Handed out for scopes that have already ended, so a consumer never
    /// sees a live token for a dead scope.
    pub fn new_cancelled() -> Self {
        Self {
            state: CancelState::new(true),
        }
    }

    /// A token with no source; it is never cancelled.
    pub fn never() -> Self {
        Self {
            state: CancelState::new(false),
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Run `listener` once when the token is cancelled.
    ///
    /// Runs immediately on the calling thread if already cancelled.
    pub fn on_cancel<F>(&self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Check under the lock: cancel() sets the flag before draining, so a
        // listener pushed while the flag reads false is guaranteed to be drained.
        let mut waiters = self.state.waiters.lock();
        if self.is_cancelled() {
            drop(waiters);
            listener();
            return;
        }
        waiters.listeners.push(Box::new(listener));
    }

    /// A future that completes when the token is cancelled.
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
        }
    }

    /// A channel receiver that disconnects when the token is cancelled.
    ///
    /// Nothing is ever sent on it: `recv()` blocks until cancellation and
    /// then returns `Err(RecvError)`. Meant for `crossbeam_channel::select!`
    /// loops that want the scope's end as one of their arms.
    pub fn receiver(&self) -> Receiver<()> {
        let mut waiters = self.state.waiters.lock();
        if self.is_cancelled() {
            let (tx, rx) = crossbeam_channel::bounded(0);
            drop(tx);
            return rx;
        }
        let (_, rx) = waiters
            .channel
            .get_or_insert_with(|| crossbeam_channel::bounded(0));
        rx.clone()
    }

    /// Whether two tokens observe the same source.
    pub fn same_source(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn register_waker(&self, waker: &Waker) -> bool {
        let mut waiters = self.state.waiters.lock();
        if self.is_cancelled() {
            return false;
        }
        if !waiters.wakers.iter().any(|w| w.will_wake(waker)) {
            waiters.wakers.push(waker.clone());
        }
        true
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Cancelled {
    token: CancellationToken,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() || !self.token.register_waker(cx.waker()) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
