//! FIFO mutex and condition variable primitives for fibers.
//!
//! Both queues are plain `VecDeque<FiberId>` per the data model; since a
//! queue alone can't carry a `Waker` or a wake-up outcome, each primitive
//! keeps a small `outcomes` side table purely as the delivery mechanism
//! between "you were dequeued" and "here's what your `poll` should return".

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use super::Engine;
use super::EngineError;
use super::fiber::{FiberId, Interrupter};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutexId(u64);

impl MutexId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A FIFO-fair mutex. Unlock hands the lock directly to the next waiter
/// (if any) rather than releasing it for open contention, so `locked`
/// stays `true` across a handoff.
pub struct Mutex {
    id: MutexId,
    engine: Engine,
    locked: Cell<bool>,
    owner: Cell<Option<FiberId>>,
    pending: RefCell<VecDeque<FiberId>>,
    outcomes: RefCell<HashMap<FiberId, Result<()>>>,
}

impl Mutex {
    pub fn new(engine: Engine) -> Rc<Self> {
        let id = MutexId(engine.next_mutex_id());
        Rc::new(Self {
            id,
            engine,
            locked: Cell::new(false),
            owner: Cell::new(None),
            pending: RefCell::new(VecDeque::new()),
            outcomes: RefCell::new(HashMap::new()),
        })
    }

    pub fn id(&self) -> MutexId {
        self.id
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    pub fn lock(self: &Rc<Self>) -> impl Future<Output = Result<()>> {
        LockFuture {
            mutex: self.clone(),
            fiber: self.engine.current_fiber().expect("lock called outside a fiber"),
            registered: false,
        }
    }

    /// Requires the caller to currently hold the lock — otherwise fails
    /// with `operation_not_permitted` rather than silently handing the
    /// lock to whoever happens to be queued.
    pub fn unlock(&self, fiber: FiberId) -> Result<()> {
        if !self.locked.get() || self.owner.get() != Some(fiber) {
            return Err(Error::from(EngineError::operation_not_permitted(format!(
                "mutex {}: unlock called without holding the lock",
                self.id.as_u64()
            ))));
        }
        self.release(fiber);
        Ok(())
    }

    /// Immediately give the lock to the next queued waiter, or release it
    /// fully if the queue is empty. Shared by `unlock()` and by
    /// `CondVar::wait`'s atomic release-and-park step.
    fn release(&self, fiber: FiberId) {
        debug_assert_eq!(self.owner.get(), Some(fiber));
        match self.pending.borrow_mut().pop_front() {
            Some(next) => {
                self.owner.set(Some(next));
                self.outcomes.borrow_mut().insert(next, Ok(()));
                self.engine.wake_fiber(next);
            }
            None => {
                self.locked.set(false);
                self.owner.set(None);
            }
        }
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        if self.locked.get() && !self.pending.borrow().is_empty() {
            self.engine
                .notify_deadlock(&format!("mutex {} dropped while locked with waiters pending", self.id.as_u64()));
        }
    }
}

struct LockFuture {
    mutex: Rc<Mutex>,
    fiber: FiberId,
    registered: bool,
}

impl Future for LockFuture {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let engine = this.mutex.engine.clone();

        if engine.take_interrupted(this.fiber) {
            if this.registered {
                this.mutex
                    .pending
                    .borrow_mut()
                    .retain(|id| *id != this.fiber);
                this.mutex.outcomes.borrow_mut().remove(&this.fiber);
            }
            engine.clear_interrupter(this.fiber);
            return Poll::Ready(Err(engine.interrupted_error()));
        }

        if !this.registered {
            if !this.mutex.locked.get() {
                this.mutex.locked.set(true);
                this.mutex.owner.set(Some(this.fiber));
                return Poll::Ready(Ok(()));
            }

            this.mutex.pending.borrow_mut().push_back(this.fiber);
            this.registered = true;
            engine.register_waker(this.fiber, cx.waker().clone());

            let mutex = this.mutex.clone();
            let fiber = this.fiber;
            let removed = super::fiber::removed_guard();
            engine.set_interrupter(
                fiber,
                Interrupter::Custom(Rc::new(move || {
                    if !removed.get() {
                        removed.set(true);
                        mutex.pending.borrow_mut().retain(|id| *id != fiber);
                        mutex.outcomes.borrow_mut().remove(&fiber);
                    }
                })),
            );
            return Poll::Pending;
        }

        match this.mutex.outcomes.borrow_mut().remove(&this.fiber) {
            Some(outcome) => {
                engine.clear_interrupter(this.fiber);
                Poll::Ready(outcome)
            }
            None => {
                engine.register_waker(this.fiber, cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// FIFO condition variable. Waiters re-acquire the mutex through the
/// ordinary `Mutex::lock` path after being notified, so a notified waiter
/// is re-queued rather than given silent priority over fibers already
/// blocked directly on the mutex.
pub struct CondVar {
    engine: Engine,
    pending: RefCell<VecDeque<FiberId>>,
    outcomes: RefCell<HashMap<FiberId, ()>>,
}

impl CondVar {
    pub fn new(engine: Engine) -> Rc<Self> {
        Rc::new(Self {
            engine,
            pending: RefCell::new(VecDeque::new()),
            outcomes: RefCell::new(HashMap::new()),
        })
    }

    pub async fn wait(self: &Rc<Self>, mutex: &Rc<Mutex>) -> Result<()> {
        let fiber = self
            .engine
            .current_fiber()
            .expect("wait called outside a fiber");

        if !mutex.is_locked() || mutex.owner.get() != Some(fiber) {
            return Err(Error::from(EngineError::operation_not_permitted(
                "condvar wait: mutex not held by the calling fiber",
            )));
        }

        // Atomic release-and-park: both steps happen in this synchronous
        // section before the first await point, so no other fiber can run
        // between releasing the mutex and joining the condvar's queue.
        mutex.release(fiber);
        self.pending.borrow_mut().push_back(fiber);

        let park_result = CondVarParkFuture {
            condvar: self.clone(),
            fiber,
            registered: false,
        }
        .await;

        // Whether woken by `notify_*` or unparked by an interrupt, the
        // fiber must re-acquire the mutex through the ordinary FIFO lock
        // path before control returns to user code.
        mutex.lock().await?;
        park_result
    }

    pub fn notify_one(&self) {
        if let Some(fiber) = self.pending.borrow_mut().pop_front() {
            self.outcomes.borrow_mut().insert(fiber, ());
            self.engine.wake_fiber(fiber);
        }
    }

    pub fn notify_all(&self) {
        let waiters: Vec<FiberId> = self.pending.borrow_mut().drain(..).collect();
        for fiber in waiters {
            self.outcomes.borrow_mut().insert(fiber, ());
            self.engine.wake_fiber(fiber);
        }
    }
}

struct CondVarParkFuture {
    condvar: Rc<CondVar>,
    fiber: FiberId,
    registered: bool,
}

impl Future for CondVarParkFuture {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let engine = this.condvar.engine.clone();

        if engine.take_interrupted(this.fiber) {
            this.condvar
                .pending
                .borrow_mut()
                .retain(|id| *id != this.fiber);
            this.condvar.outcomes.borrow_mut().remove(&this.fiber);
            engine.clear_interrupter(this.fiber);
            return Poll::Ready(Err(engine.interrupted_error()));
        }

        if this.condvar.outcomes.borrow_mut().remove(&this.fiber).is_some() {
            engine.clear_interrupter(this.fiber);
            return Poll::Ready(Ok(()));
        }

        engine.register_waker(this.fiber, cx.waker().clone());

        if !this.registered {
            this.registered = true;
            let condvar = this.condvar.clone();
            let fiber = this.fiber;
            let removed = super::fiber::removed_guard();
            engine.set_interrupter(
                fiber,
                Interrupter::Custom(Rc::new(move || {
                    if !removed.get() {
                        removed.set(true);
                        condvar.pending.borrow_mut().retain(|id| *id != fiber);
                        condvar.outcomes.borrow_mut().remove(&fiber);
                    }
                })),
            );
        }

        Poll::Pending
    }
}
