//! Shared resources.
//!
//! A [`Resource`] hands out [`Request`]s and keeps them in a FIFO pending queue. A request is not
//! scheduled when created: a process yields it to suspend, and it fires only after being released,
//! either via [`Request::release`] or [`Resource::release`]. Released requests fire before any other
//! event scheduled for the same time.
//!
//! The capacity of a resource is informational. Requesting beyond it is allowed and never blocks.

use crate::context::SimulationContext;
use crate::error::SimulationResult;
use crate::event::EventId;
use crate::log_debug;

/// Identifier of a resource, unique within a simulation.
pub type ResourceId = usize;

/// Capacity of resources created with [`Resource::new`].
pub const DEFAULT_CAPACITY: usize = 1;

/// Handle of a resource. Clones refer to the same resource.
#[derive(Clone)]
pub struct Resource {
    id: ResourceId,
    ctx: SimulationContext,
}

impl Resource {
    /// Creates a resource with [`DEFAULT_CAPACITY`].
    pub fn new(ctx: &SimulationContext) -> Self {
        Self::with_capacity(ctx, DEFAULT_CAPACITY)
    }

    /// Creates a resource with the given capacity.
    pub fn with_capacity(ctx: &SimulationContext, capacity: usize) -> Self {
        let id = ctx.sim_state().borrow_mut().add_resource(capacity);
        Self { id, ctx: ctx.clone() }
    }

    /// Returns the identifier of the resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Returns the declared capacity.
    pub fn capacity(&self) -> usize {
        self.ctx.sim_state().borrow().capacity(self.id)
    }

    /// Returns the number of requests which have not been released yet.
    pub fn pending_count(&self) -> usize {
        self.ctx.sim_state().borrow().pending_requests(self.id)
    }

    /// Checks whether the request is pending in this resource.
    pub fn is_pending(&self, request: &Request) -> bool {
        self.ctx.sim_state().borrow().is_pending(self.id, request.id)
    }

    /// Creates a request and appends it to the pending queue.
    ///
    /// The request is not scheduled. Yield it from a process to wait until it is released.
    pub fn request(&self) -> Request {
        let (id, outstanding, capacity) = {
            let mut state = self.ctx.sim_state().borrow_mut();
            let id = state.request(self.id);
            (id, state.pending_requests(self.id), state.capacity(self.id))
        };
        if outstanding > capacity {
            log_debug!(
                self.ctx,
                "resource {} has {} outstanding requests over capacity {}",
                self.id,
                outstanding,
                capacity
            );
        }
        Request {
            id,
            resource: self.id,
            ctx: self.ctx.clone(),
        }
    }

    /// Releases a request pending in this resource.
    ///
    /// Fails with [`NotFound`](crate::SimulationError::NotFound) if the request was already released
    /// or belongs to another resource.
    pub fn release(&self, request: &Request) -> SimulationResult<()> {
        self.ctx.sim_state().borrow_mut().release(self.id, request.id)
    }
}

/// Pending claim on a [`Resource`].
#[derive(Clone)]
pub struct Request {
    id: EventId,
    resource: ResourceId,
    ctx: SimulationContext,
}

impl Request {
    /// Returns the event identifier.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Returns the owning resource.
    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// Releases the request in its owning resource, same as [`Resource::release`].
    pub fn release(&self) -> SimulationResult<()> {
        self.ctx.sim_state().borrow_mut().release(self.resource, self.id)
    }
}

impl From<&Request> for EventId {
    fn from(request: &Request) -> Self {
        request.id
    }
}

impl From<Request> for EventId {
    fn from(request: Request) -> Self {
        request.id
    }
}
