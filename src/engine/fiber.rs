//! Fiber records: identity, status, interruption state, and the scope stack.
//!
//! A `Fiber` here is bookkeeping, not the execution itself — the actual
//! continuation is a boxed `Future` driven by [`super::FiberTask`]. This
//! module only holds the metadata the scheduler core needs to answer
//! "is this fiber running, suspended, or done" and "what closure cancels
//! whatever it's currently parked on".

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::types::Value;

use super::timer::PendingOpId;

/// Stable, opaque handle to a fiber, used by the fiber table and by
/// `Value::Fiber` handles returned to script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(u64);

impl FiberId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a fiber. `Running` is implied by being the VM's
/// `current_fiber`; it is not tracked redundantly here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberStatus {
    Ready,
    Running,
    Suspended,
    FinishedOk,
    FinishedErr,
}

/// A closure run on scope exit, with interruption disabled for its duration.
pub type CleanupHandler = Box<dyn FnOnce() -> Result<()>>;

/// The closure a suspension point installs into a fiber's `interrupter`
/// slot so that `interrupt(fiber)` can cancel whatever it's parked on.
///
/// `Cancel` is the lightweight case: the operation registered a
/// [`PendingOpId`] with the engine's pending-operation table (timers, and
/// by extension any future I/O-style suspension) and the engine knows how
/// to cancel it generically. `Custom` is for operations — mutex and
/// condvar waits — whose cancellation means "remove me from this specific
/// queue", which doesn't fit a single generic id.
#[derive(Clone)]
pub enum Interrupter {
    None,
    Cancel(PendingOpId),
    Custom(Rc<dyn Fn()>),
}

impl Interrupter {
    pub fn is_set(&self) -> bool {
        !matches!(self, Interrupter::None)
    }
}

impl fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupter::None => write!(f, "Interrupter::None"),
            Interrupter::Cancel(id) => write!(f, "Interrupter::Cancel({id:?})"),
            Interrupter::Custom(_) => write!(f, "Interrupter::Custom(..)"),
        }
    }
}

/// Per-fiber record owned by the engine's fiber table.
pub struct Fiber {
    pub id: FiberId,
    pub status: FiberStatus,
    /// Non-negative counter; strictly positive means interruption delivery
    /// is deferred. A counter (not a boolean) so cleanup handlers can nest.
    pub interruption_disabled: u32,
    /// Sticky: once set, the next suspension point with the counter at
    /// zero surfaces `interrupted`.
    pub interrupted: bool,
    pub interrupter: Interrupter,
    pub join_in_progress: bool,
    /// Ordered scopes, each an ordered list of cleanup closures (push
    /// order; LIFO on pop). Seeded with one root scope at spawn so
    /// `scope_cleanup_push`/`pop` are valid even outside an explicit
    /// `scope(...)` block.
    pub scope_stack: Vec<Vec<CleanupHandler>>,
    pub result: Option<Result<Value>>,
    pub parent: Option<FiberId>,
}

impl Fiber {
    pub fn new(id: FiberId, parent: Option<FiberId>) -> Self {
        Self {
            id,
            status: FiberStatus::Ready,
            interruption_disabled: 0,
            interrupted: false,
            interrupter: Interrupter::None,
            join_in_progress: false,
            scope_stack: vec![Vec::new()],
            result: None,
            parent,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            FiberStatus::FinishedOk | FiberStatus::FinishedErr
        )
    }
}

/// Convenience wrapper used by interrupter closures to guard against firing
/// twice: a second `interrupt()` while the first interrupter is still
/// scheduled for resumption is absorbed rather than double-removing the
/// fiber from its wait queue.
pub fn removed_guard() -> Rc<Cell<bool>> {
    Rc::new(Cell::new(false))
}
