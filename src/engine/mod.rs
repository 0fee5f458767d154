//! The fiber scheduler: spawn/join/interrupt, the scope-cleanup stack, and
//! the error-as-value type fibers and builtins report through.
//!
//! A fiber's continuation is an ordinary Rust `Future`. [`FiberTask`] wraps
//! it to perform prologue/epilogue bookkeeping (which fiber is "current",
//! status transitions, result storage, waking joiners) around each real
//! `poll()` call; the actual suspend points (mutex lock, condvar wait,
//! timer sleep, join) are hand-written futures driven by `smol`'s
//! single-threaded `LocalExecutor`. There is no manual step-loop: the
//! executor's own poll scheduling *is* the fiber scheduler.

pub mod fiber;
pub mod sync;
pub mod timer;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use smol::LocalExecutor;

use crate::error::{Error, Result};
use crate::types::Value;

pub use fiber::{CleanupHandler, Fiber, FiberId, FiberStatus, Interrupter};
pub use timer::{PendingOp, PendingOpId};

/// Error categories mirroring the host system's errno-style reporting
/// surfaces, plus a catch-all for this engine's own conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Generic,
    AsioBasic,
    AsioNetdb,
    AsioAddrinfo,
    AsioMisc,
    Json,
    Regex,
    Engine,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Generic => "generic",
            Category::AsioBasic => "asio.basic",
            Category::AsioNetdb => "asio.netdb",
            Category::AsioAddrinfo => "asio.addrinfo",
            Category::AsioMisc => "asio.misc",
            Category::Json => "json",
            Category::Regex => "regex",
            Category::Engine => "engine",
        };
        write!(f, "{name}")
    }
}

/// Numeric codes used within `Category::Engine`. Named rather than
/// scattered magic numbers so `EngineError::code` comparisons read clearly.
pub mod codes {
    pub const INTERRUPTED: i32 = 1;
    pub const OPERATION_NOT_PERMITTED: i32 = 2;
    pub const DEADLOCK: i32 = 3;
    pub const CLEANUP_FAILED: i32 = 4;
    pub const RESOURCE_EXHAUSTED: i32 = 5;
    pub const BAD_INDEX: i32 = 6;
    pub const INTERRUPTION_ALREADY_ALLOWED: i32 = 7;
    pub const UNMATCHED_SCOPE_CLEANUP: i32 = 8;
    pub const MODULE_NOT_FOUND: i32 = 9;
    pub const BAD_COROUTINE: i32 = 10;
    pub const BAD_ROOT_CONTEXT: i32 = 11;
    pub const FAILED_TO_LOAD_MODULE: i32 = 12;
}

/// An error value: category plus code identify it for equality purposes;
/// `message` is human-readable context only and deliberately excluded from
/// `PartialEq` so two instances of "the same" error compare equal even if
/// their messages differ in detail (e.g. which mutex deadlocked).
#[derive(Debug, Clone)]
pub struct EngineError {
    pub category: Category,
    pub code: i32,
    pub message: String,
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.code == other.code
    }
}

impl Eq for EngineError {}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.category, self.code, self.message)
    }
}

impl EngineError {
    pub fn new(category: Category, code: i32, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn interrupted() -> Self {
        Self::new(Category::Engine, codes::INTERRUPTED, "fiber was interrupted")
    }

    pub fn operation_not_permitted(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::OPERATION_NOT_PERMITTED, message)
    }

    pub fn deadlock(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::DEADLOCK, message)
    }

    pub fn cleanup_failed(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::CLEANUP_FAILED, message)
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::RESOURCE_EXHAUSTED, message)
    }

    pub fn bad_index(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::BAD_INDEX, message)
    }

    pub fn interruption_already_allowed(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::INTERRUPTION_ALREADY_ALLOWED, message)
    }

    pub fn unmatched_scope_cleanup(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::UNMATCHED_SCOPE_CLEANUP, message)
    }

    pub fn module_not_found(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::MODULE_NOT_FOUND, message)
    }

    pub fn bad_coroutine(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::BAD_COROUTINE, message)
    }

    pub fn bad_root_context(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::BAD_ROOT_CONTEXT, message)
    }

    pub fn failed_to_load_module(message: impl Into<String>) -> Self {
        Self::new(Category::Engine, codes::FAILED_TO_LOAD_MODULE, message)
    }
}

struct Inner {
    fibers: HashMap<FiberId, Fiber>,
    next_fiber_id: u64,
    next_mutex_id: u64,
    next_pending_op_id: u64,
    current_fiber: Option<FiberId>,
    pending_ops: HashMap<PendingOpId, PendingOp>,
    fiber_pending_op: HashMap<FiberId, PendingOpId>,
    /// Single outstanding waker per fiber: a fiber is only ever suspended
    /// at one await point at a time, so one slot is sufficient.
    wakers: HashMap<FiberId, Waker>,
    joiners: HashMap<FiberId, Vec<Waker>>,
    executor: Rc<LocalExecutor<'static>>,
}

/// A single scripting VM's scheduler state. Cheap to clone — it's a handle
/// (`Rc`) to shared interior-mutable state, not the state itself. Not
/// `Send`: this engine is strictly single-threaded, driven by one
/// `LocalExecutor` on one OS thread.
#[derive(Clone)]
pub struct Engine(Rc<RefCell<Inner>>);

impl Engine {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Inner {
            fibers: HashMap::new(),
            next_fiber_id: 0,
            next_mutex_id: 0,
            next_pending_op_id: 0,
            current_fiber: None,
            pending_ops: HashMap::new(),
            fiber_pending_op: HashMap::new(),
            wakers: HashMap::new(),
            joiners: HashMap::new(),
            executor: Rc::new(LocalExecutor::new()),
        })))
    }

    /// Spawn a new fiber running `body`, returning its handle immediately
    /// without running any of it. `parent` lets cleanup/diagnostics report
    /// provenance; it has no scheduling effect.
    pub fn spawn_fiber<F>(&self, body: F) -> FiberId
    where
        F: FnOnce() -> Pin<Box<dyn Future<Output = Result<Value>>>> + 'static,
    {
        let parent = self.current_fiber();
        let id = {
            let mut inner = self.0.borrow_mut();
            let id = FiberId::new(inner.next_fiber_id);
            inner.next_fiber_id += 1;
            inner.fibers.insert(id, Fiber::new(id, parent));
            id
        };

        let task = FiberTask {
            engine: self.clone(),
            id,
            inner: body(),
        };

        let executor = self.0.borrow().executor.clone();
        executor.spawn(task).detach();
        id
    }

    /// Drive the executor until `fiber` (typically the program's root
    /// fiber) finishes, returning its result. Used by the CLI entry point;
    /// script-level code awaits fibers through [`Engine::join`] instead.
    pub fn run_to_completion(&self, fiber: FiberId) -> Result<Value> {
        let executor = self.0.borrow().executor.clone();
        smol::block_on(executor.run(self.join(fiber)))
    }

    pub fn current_fiber(&self) -> Option<FiberId> {
        self.0.borrow().current_fiber
    }

    fn set_current_fiber(&self, fiber: Option<FiberId>) {
        self.0.borrow_mut().current_fiber = fiber;
    }

    pub fn status(&self, fiber: FiberId) -> Option<FiberStatus> {
        self.0.borrow().fibers.get(&fiber).map(|f| f.status)
    }

    // -- interruption -----------------------------------------------------

    pub fn interrupt(&self, fiber: FiberId) {
        let interrupter = {
            let mut inner = self.0.borrow_mut();
            let Some(f) = inner.fibers.get_mut(&fiber) else {
                return;
            };
            if f.is_finished() {
                return;
            }
            f.interrupted = true;
            f.interrupter.clone()
        };

        match interrupter {
            Interrupter::None => {}
            Interrupter::Cancel(op_id) => self.cancel_pending_op(op_id),
            Interrupter::Custom(run) => run(),
        }

        self.wake_fiber(fiber);
    }

    pub fn check_not_interrupted(&self, fiber: FiberId) -> Result<()> {
        let inner = self.0.borrow();
        if let Some(f) = inner.fibers.get(&fiber) {
            if f.interrupted && f.interruption_disabled == 0 {
                return Err(self.interrupted_error());
            }
        }
        Ok(())
    }

    /// Consume the sticky interrupted flag if interruption is currently
    /// enabled, reporting whether it fired. Called by suspension-point
    /// futures on every poll.
    pub fn take_interrupted(&self, fiber: FiberId) -> bool {
        let mut inner = self.0.borrow_mut();
        if let Some(f) = inner.fibers.get_mut(&fiber) {
            if f.interrupted && f.interruption_disabled == 0 {
                f.interrupted = false;
                return true;
            }
        }
        false
    }

    /// Set the sticky flag without consulting the disabled counter, and
    /// wake whatever the fiber is parked on. Used by interrupter closures
    /// (timer cancel, mutex/condvar dequeue) rather than script code.
    pub fn mark_interrupted(&self, fiber: FiberId) {
        if let Some(f) = self.0.borrow_mut().fibers.get_mut(&fiber) {
            f.interrupted = true;
        }
        self.wake_fiber(fiber);
    }

    pub fn set_interrupter(&self, fiber: FiberId, interrupter: Interrupter) {
        if let Some(f) = self.0.borrow_mut().fibers.get_mut(&fiber) {
            f.interrupter = interrupter;
        }
    }

    pub fn clear_interrupter(&self, fiber: FiberId) {
        self.set_interrupter(fiber, Interrupter::None);
    }

    pub fn disable_interruption(&self, fiber: FiberId) {
        if let Some(f) = self.0.borrow_mut().fibers.get_mut(&fiber) {
            f.interruption_disabled += 1;
        }
    }

    /// Decrement the interruption-disabled counter. Errors with
    /// `interruption_already_allowed` if called without a matching prior
    /// `disable_interruption()` — the counter is never allowed to go
    /// negative.
    pub fn restore_interruption(&self, fiber: FiberId) -> Result<()> {
        let mut inner = self.0.borrow_mut();
        let Some(f) = inner.fibers.get_mut(&fiber) else {
            return Ok(());
        };
        match f.interruption_disabled.checked_sub(1) {
            Some(n) => {
                f.interruption_disabled = n;
                Ok(())
            }
            None => Err(Error::from(EngineError::interruption_already_allowed(
                "restore_interruption: no matching disable_interruption",
            ))),
        }
    }

    pub fn interrupted_error(&self) -> Error {
        Error::from(EngineError::interrupted())
    }

    // -- scope / cleanup stack ---------------------------------------------

    pub fn enter_scope(&self, fiber: FiberId) {
        if let Some(f) = self.0.borrow_mut().fibers.get_mut(&fiber) {
            f.scope_stack.push(Vec::new());
        }
    }

    pub fn scope_cleanup_push(&self, fiber: FiberId, handler: CleanupHandler) {
        if let Some(f) = self.0.borrow_mut().fibers.get_mut(&fiber) {
            if let Some(scope) = f.scope_stack.last_mut() {
                scope.push(handler);
            }
        }
    }

    /// Remove and return the top handler of the current scope, with
    /// interruption disabled for the caller to run it under. The caller
    /// must `restore_interruption` once it has invoked (or decided not to
    /// invoke) the returned handler. Errors with `unmatched_scope_cleanup`
    /// if the current scope has no handler left to pop.
    pub fn scope_cleanup_pop(&self, fiber: FiberId) -> Result<CleanupHandler> {
        let mut inner = self.0.borrow_mut();
        let Some(f) = inner.fibers.get_mut(&fiber) else {
            return Err(Error::from(EngineError::unmatched_scope_cleanup(
                "scope_cleanup_pop: no such fiber",
            )));
        };
        let handler = f.scope_stack.last_mut().and_then(|scope| scope.pop());
        match handler {
            Some(handler) => {
                f.interruption_disabled += 1;
                Ok(handler)
            }
            None => Err(Error::from(EngineError::unmatched_scope_cleanup(
                "scope_cleanup_pop: no matching scope_cleanup_push",
            ))),
        }
    }

    /// Pop the innermost scope and run its handlers in LIFO order with
    /// interruption disabled. All handlers run even after one fails; the
    /// first failure is reported, since a dropped resource's cleanup
    /// failing is fatal and later handlers still need their chance to run.
    pub fn exit_scope(&self, fiber: FiberId) -> Result<()> {
        let handlers = {
            let mut inner = self.0.borrow_mut();
            match inner.fibers.get_mut(&fiber) {
                Some(f) => f.scope_stack.pop().unwrap_or_default(),
                None => Vec::new(),
            }
        };

        self.disable_interruption(fiber);
        let mut first_err = None;
        for handler in handlers.into_iter().rev() {
            if let Err(e) = handler() {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        // Balanced with the disable_interruption just above; cannot underflow.
        let _ = self.restore_interruption(fiber);

        if let Some(err) = first_err {
            self.notify_cleanup_error(&err);
            return Err(err);
        }
        Ok(())
    }

    // -- generic single-slot waking (mutex/condvar) ------------------------

    pub fn register_waker(&self, fiber: FiberId, waker: Waker) {
        self.0.borrow_mut().wakers.insert(fiber, waker);
    }

    pub fn wake_fiber(&self, fiber: FiberId) {
        if let Some(waker) = self.0.borrow_mut().wakers.remove(&fiber) {
            waker.wake();
        }
    }

    // -- join / finish ------------------------------------------------------

    pub fn join(&self, target: FiberId) -> impl Future<Output = Result<Value>> {
        JoinFuture {
            engine: self.clone(),
            target,
        }
    }

    fn finished_result(&self, fiber: FiberId) -> Option<Result<Value>> {
        self.0
            .borrow()
            .fibers
            .get(&fiber)
            .and_then(|f| f.result.clone())
    }

    fn register_joiner(&self, target: FiberId, waker: Waker) {
        let mut inner = self.0.borrow_mut();
        if let Some(f) = inner.fibers.get_mut(&target) {
            f.join_in_progress = true;
        }
        inner.joiners.entry(target).or_default().push(waker);
    }

    fn wake_joiners(&self, target: FiberId) {
        if let Some(wakers) = self.0.borrow_mut().joiners.remove(&target) {
            for waker in wakers {
                waker.wake();
            }
        }
    }

    // -- pending-operation table (timers today; any cancellable op later) --

    pub fn register_pending_op(&self, fiber: FiberId, op: PendingOp) -> PendingOpId {
        let mut inner = self.0.borrow_mut();
        let id = PendingOpId::new(inner.next_pending_op_id);
        inner.next_pending_op_id += 1;
        inner.pending_ops.insert(id, op);
        inner.fiber_pending_op.insert(fiber, id);
        id
    }

    pub fn clear_pending_op(&self, fiber: FiberId) {
        let mut inner = self.0.borrow_mut();
        if let Some(id) = inner.fiber_pending_op.remove(&fiber) {
            inner.pending_ops.remove(&id);
        }
    }

    fn cancel_pending_op(&self, id: PendingOpId) {
        let op = self.0.borrow_mut().pending_ops.remove(&id);
        if let Some(op) = op {
            (op.cancel)();
        }
    }

    // -- mutex id allocation (used by engine::sync) -------------------------

    pub fn next_mutex_id(&self) -> u64 {
        let mut inner = self.0.borrow_mut();
        let id = inner.next_mutex_id;
        inner.next_mutex_id += 1;
        id
    }

    // -- diagnostics ---------------------------------------------------------

    pub fn notify_deadlock(&self, description: &str) {
        log::error!("deadlock detected: {description}");
    }

    pub fn notify_cleanup_error(&self, err: &Error) {
        log::error!("cleanup handler failed: {err}");
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine")
    }
}

/// Wraps a fiber's boxed continuation future, providing the prologue and
/// epilogue every poll needs: marking the fiber current/suspended, storing
/// its final result, and waking anyone joined on it.
struct FiberTask {
    engine: Engine,
    id: FiberId,
    inner: Pin<Box<dyn Future<Output = Result<Value>>>>,
}

impl Future for FiberTask {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        {
            let mut inner = this.engine.0.borrow_mut();
            if let Some(f) = inner.fibers.get_mut(&this.id) {
                f.status = FiberStatus::Running;
            }
            inner.current_fiber = Some(this.id);
        }

        log::debug!("fiber {} polled", this.id);
        let poll_result = this.inner.as_mut().poll(cx);

        this.engine.0.borrow_mut().current_fiber = None;

        match poll_result {
            Poll::Pending => {
                if let Some(f) = this.engine.0.borrow_mut().fibers.get_mut(&this.id) {
                    f.status = FiberStatus::Suspended;
                }
                Poll::Pending
            }
            Poll::Ready(mut result) => {
                // Drain whatever scopes the fiber didn't unwind itself —
                // at minimum the root scope seeded at spawn — so every
                // `cleanup-push`'d handler runs exactly once even when the
                // fiber never entered an explicit `scope` block.
                loop {
                    let has_scope = this
                        .engine
                        .0
                        .borrow()
                        .fibers
                        .get(&this.id)
                        .map(|f| !f.scope_stack.is_empty())
                        .unwrap_or(false);
                    if !has_scope {
                        break;
                    }
                    if let Err(cleanup_err) = this.engine.exit_scope(this.id) {
                        if result.is_ok() {
                            result = Err(cleanup_err);
                        }
                    }
                }

                let status = if result.is_ok() {
                    FiberStatus::FinishedOk
                } else {
                    FiberStatus::FinishedErr
                };
                if let Err(ref e) = result {
                    log::warn!("fiber {} finished with error: {e}", this.id);
                } else {
                    log::debug!("fiber {} finished", this.id);
                }
                if let Some(f) = this.engine.0.borrow_mut().fibers.get_mut(&this.id) {
                    f.status = status;
                    f.result = Some(result);
                }
                this.engine.wake_joiners(this.id);
                Poll::Ready(())
            }
        }
    }
}

struct JoinFuture {
    engine: Engine,
    target: FiberId,
}

impl Future for JoinFuture {
    type Output = Result<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let waiting = this.engine.current_fiber();
        if let Some(fiber) = waiting {
            if this.engine.take_interrupted(fiber) {
                return Poll::Ready(Err(this.engine.interrupted_error()));
            }
        }

        if let Some(result) = this.engine.finished_result(this.target) {
            return Poll::Ready(result);
        }

        this.engine.register_joiner(this.target, cx.waker().clone());

        if let Some(fiber) = waiting {
            let engine = this.engine.clone();
            this.engine
                .set_interrupter(fiber, Interrupter::Custom(Rc::new(move || {
                    engine.mark_interrupted(fiber);
                })));
        }

        Poll::Pending
    }
}
