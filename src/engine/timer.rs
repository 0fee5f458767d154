//! Timer suspension: `sleep` built as a hand-written future over `smol::Timer`,
//! registered with the engine's pending-operation table so it can be
//! cancelled by `interrupt`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use smol::Timer;

use super::Engine;
use super::fiber::{FiberId, Interrupter};
use crate::error::Result;

/// Identity for an entry in the engine's pending-operation table. Distinct
/// from `FiberId`/`MutexId` because a single fiber can, in principle, have
/// more than one cancellable operation registered in flight across its
/// lifetime (never concurrently, but the id space is kept separate for
/// clarity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingOpId(u64);

impl PendingOpId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A cancellable operation registered with the engine. `cancel` is called
/// at most once, from `interrupt()`, and must be safe to call even if the
/// operation has already naturally completed (the table entry is removed
/// first in that case, so in practice this only fires while still pending).
pub struct PendingOp {
    pub cancel: Box<dyn Fn()>,
}

/// Suspend the current fiber until `duration` elapses or it is interrupted.
///
/// Mirrors the mutex/condvar suspension shape: register a cancel-capable
/// interrupter before first poll, clear it on completion, and surface
/// `interrupted` as an error if cancellation fired.
pub fn sleep_for(engine: Engine, fiber: FiberId, duration: Duration) -> impl Future<Output = Result<()>> {
    SleepFuture {
        engine,
        fiber,
        timer: Timer::after(duration),
        registered: false,
    }
}

struct SleepFuture {
    engine: Engine,
    fiber: FiberId,
    timer: Timer,
    registered: bool,
}

impl Future for SleepFuture {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.engine.take_interrupted(this.fiber) {
            this.engine.clear_pending_op(this.fiber);
            return Poll::Ready(Err(this.engine.interrupted_error()));
        }

        if !this.registered {
            this.registered = true;
            let engine = this.engine.clone();
            let fiber = this.fiber;
            let op_id = engine.register_pending_op(
                fiber,
                PendingOp {
                    cancel: Box::new({
                        let engine = engine.clone();
                        move || engine.mark_interrupted(fiber)
                    }),
                },
            );
            engine.set_interrupter(fiber, Interrupter::Cancel(op_id));
        }

        match Pin::new(&mut this.timer).poll(cx) {
            Poll::Ready(_) => {
                this.engine.clear_pending_op(this.fiber);
                Poll::Ready(Ok(()))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
