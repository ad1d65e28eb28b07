use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

use crate::context::SimulationContext;
use crate::error::{SimulationError, SimulationResult};
use crate::event::EventId;
use crate::process::{Routine, Step};

/// Routine polling a future once per step.
pub(crate) struct AsyncRoutine {
    process: EventId,
    future: Pin<Box<dyn Future<Output = ()>>>,
}

impl AsyncRoutine {
    pub fn new(process: EventId, future: impl Future<Output = ()> + 'static) -> Self {
        Self {
            process,
            future: Box::pin(future),
        }
    }
}

impl Routine for AsyncRoutine {
    fn resume(&mut self, ctx: &SimulationContext) -> SimulationResult<Step> {
        // drop a leftover from an event future polled outside of any process
        ctx.sim_state().borrow_mut().take_awaited();

        let mut cx = Context::from_waker(noop_waker_ref());
        if let Poll::Ready(()) = self.future.as_mut().poll(&mut cx) {
            return Ok(Step::Done);
        }
        let mut awaited = ctx.sim_state().borrow_mut().take_awaited();
        match awaited.len() {
            0 => Err(SimulationError::MalformedYield {
                process: self.process,
                yielded: None,
                reason: "future is pending on something other than a simulation event",
            }),
            1 => Ok(Step::Wait(awaited.remove(0))),
            _ => Ok(Step::WaitAny(awaited)),
        }
    }
}
