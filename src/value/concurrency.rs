//! Runtime handles backing the `Goroutine` and `WaitGroup` value variants
//! (spec.md §4.5 "Concurrency built-ins", §5).

use super::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// An in-flight or completed `go()` task. The spawned task writes its result
/// (or, if an exception escaped it, the exception's message) into `result`
/// and fires `done` exactly once.
pub struct GoroutineState {
    pub result: Mutex<Option<GoroutineOutcome>>,
    pub done: Notify,
    pub finished: AtomicBool,
}

#[derive(Clone, Debug)]
pub enum GoroutineOutcome {
    Returned(Value),
    Errored(String),
}

pub type GoroutineHandle = Arc<GoroutineState>;

pub fn new_goroutine() -> GoroutineHandle {
    Arc::new(GoroutineState {
        result: Mutex::new(None),
        done: Notify::new(),
        finished: AtomicBool::new(false),
    })
}

impl GoroutineState {
    pub fn complete(&self, outcome: GoroutineOutcome) {
        *self.result.lock().unwrap() = Some(outcome);
        self.finished.store(true, Ordering::SeqCst);
        self.done.notify_waiters();
    }

    pub async fn join(&self) -> GoroutineOutcome {
        loop {
            let notified = self.done.notified();
            if self.finished.load(Ordering::SeqCst) {
                break;
            }
            notified.await;
        }
        self.result.lock().unwrap().clone().expect("goroutine marked finished without outcome")
    }

    /// Synchronous counterpart of `join`, for the synchronous `exec_frame`
    /// dispatch loop. Eager `go()` execution (see `vm::Vm::call_closure_value`
    /// via the `go` stdlib builtin) means this never actually spins in
    /// practice; kept real rather than `unreachable!()` so the VM stays
    /// correct if goroutines are ever made to run concurrently.
    pub fn join_blocking(&self) -> GoroutineOutcome {
        while !self.finished.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        self.result.lock().unwrap().clone().expect("goroutine marked finished without outcome")
    }
}

impl fmt::Debug for GoroutineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Goroutine(finished={})", self.finished.load(Ordering::SeqCst))
    }
}

/// A counted barrier. `add`/`done`/`wait` follow spec.md §4.5/§5: negative
/// counters and `add` after reaching zero are fatal errors, and every waiter
/// unblocks once the counter reaches zero.
pub struct WaitGroupState {
    counter: AtomicI64,
    done: AtomicBool,
    notify: Notify,
}

pub type WaitGroupHandle = Arc<WaitGroupState>;

pub fn new_wait_group() -> WaitGroupHandle {
    Arc::new(WaitGroupState {
        counter: AtomicI64::new(0),
        done: AtomicBool::new(false),
        notify: Notify::new(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum WaitGroupError {
    #[error("WaitGroup counter went negative")]
    NegativeCounter,
    #[error("WaitGroup::add called after counter already reached zero")]
    AddAfterDone,
}

impl WaitGroupState {
    pub fn add(&self, n: i64) -> Result<(), WaitGroupError> {
        if self.done.load(Ordering::SeqCst) {
            return Err(WaitGroupError::AddAfterDone);
        }
        let new_value = self.counter.fetch_add(n, Ordering::SeqCst) + n;
        if new_value < 0 {
            return Err(WaitGroupError::NegativeCounter);
        }
        if new_value == 0 {
            self.done.store(true, Ordering::SeqCst);
            self.notify.notify_waiters();
        }
        Ok(())
    }

    pub fn done(&self) -> Result<(), WaitGroupError> {
        self.add(-1)
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.done.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    /// Synchronous counterpart of `wait`, used by the VM's `WaitGroup::wait`
    /// method dispatch (see `vm::Vm::invoke_waitgroup_method`).
    pub fn wait_blocking(&self) {
        while !self.done.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
    }

    pub fn count(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for WaitGroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaitGroup(count={})", self.counter.load(Ordering::SeqCst))
    }
}
