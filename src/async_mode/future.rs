use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::event::EventId;
use crate::state::SimulationState;

/// Future completing once the event has fired, see [`SimulationContext::wait`](crate::SimulationContext::wait).
pub struct EventFuture {
    event: EventId,
    sim_state: Rc<RefCell<SimulationState>>,
}

impl EventFuture {
    pub(crate) fn new(event: EventId, sim_state: Rc<RefCell<SimulationState>>) -> Self {
        Self { event, sim_state }
    }

    /// Returns the awaited event.
    pub fn event(&self) -> EventId {
        self.event
    }
}

impl Future for EventFuture {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.sim_state.borrow_mut();
        if state.is_triggered(self.event) {
            Poll::Ready(())
        } else {
            state.await_event(self.event);
            Poll::Pending
        }
    }
}
