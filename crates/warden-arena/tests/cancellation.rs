//! Integration test: cancellation tokens observe scope termination.

use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{select, unbounded};
use warden_arena::ScopeArena;

/// Minimal executor: polls on the current thread, parks between wakes.
fn block_on<F: Future>(future: F) -> F::Output {
    struct ThreadWaker(thread::Thread);

    impl Wake for ThreadWaker {
        fn wake(self: Arc<Self>) {
            self.0.unpark();
        }
    }

    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}

#[test]
fn token_cancelled_exactly_when_scope_terminates() {
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    let token = arena.token(scope);
    assert!(!token.is_cancelled());
    arena.add_cleanup(scope, || {});
    assert!(!token.is_cancelled());
    arena.terminate(scope);
    assert!(token.is_cancelled());
}

#[test]
fn token_cancelled_before_cleanup_runs() {
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    let token = arena.token(scope);
    let observed = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&observed);
    arena.add_cleanup(scope, move || seen.store(token.is_cancelled(), Ordering::SeqCst));
    arena.terminate(scope);
    assert!(observed.load(Ordering::SeqCst));
}

#[test]
fn child_token_cancelled_with_parent() {
    let mut arena = ScopeArena::default();
    let parent = arena.create();
    let child = arena.create_child(parent);
    let token = arena.token(child);
    arena.terminate(parent);
    assert!(token.is_cancelled());
}

#[test]
fn worker_thread_stops_on_scope_end() {
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    let cancelled = arena.token(scope).receiver();
    let (work_tx, work_rx) = unbounded::<u32>();
    let processed = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&processed);
    let worker = thread::spawn(move || loop {
        select! {
            recv(work_rx) -> item => match item {
                Ok(_) => { counter.fetch_add(1, Ordering::SeqCst); }
                Err(_) => return "inputs closed",
            },
            recv(cancelled) -> _ => return "cancelled",
        }
    });

    for i in 0..3 {
        work_tx.send(i).unwrap();
    }
    while processed.load(Ordering::SeqCst) < 3 {
        thread::sleep(Duration::from_millis(1));
    }
    arena.terminate(scope);
    assert_eq!(worker.join().unwrap(), "cancelled");
    drop(work_tx);
}

#[test]
fn async_consumer_resumes_on_termination() {
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    let token = arena.token(scope);

    let waiter = thread::spawn(move || {
        block_on(token.cancelled());
        true
    });
    thread::sleep(Duration::from_millis(10));
    arena.terminate(scope);
    assert!(waiter.join().unwrap());
}

#[test]
fn restart_issues_independent_activation_tokens() {
    let mut arena = ScopeArena::default();
    let scope = arena.create();
    let first = arena.token(scope);
    arena.terminate(scope);
    arena.restart(scope).unwrap();

    let second = arena.token(scope);
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());
    arena.terminate(scope);
    assert!(second.is_cancelled());
}
