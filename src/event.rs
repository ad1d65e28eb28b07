//! Simulation events.

use serde::Serialize;

use crate::resource::ResourceId;

/// Identifier of a simulation event.
///
/// Identifiers are assigned in creation order and never reused, so an identifier below the next one
/// to be assigned always refers to an event that exists or has already been triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EventId(u64);

impl EventId {
    /// Wraps a raw value.
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// Returns the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        EventId(self.0 + 1)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// Tie-break key among events sharing the same time, lower value fires first.
pub type Priority = u32;

/// Priority of released resource requests. They fire before anything else scheduled at the same time.
pub const RELEASE_PRIORITY: Priority = 0;

/// Priority used by timeouts, processes and [`schedule`](crate::SimulationContext::schedule) callers
/// without special needs.
pub const DEFAULT_PRIORITY: Priority = 1;

/// Event variant. Determines what happens when the event is resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// Bare event without computation, created via [`event`](crate::SimulationContext::event).
    Event,
    /// Pure delay.
    Timeout,
    /// Event driven by a [`Routine`](crate::Routine), triggered when the routine terminates.
    Process,
    /// Claim on a resource, scheduled only on release.
    Request {
        /// Owning resource.
        resource: ResourceId,
    },
}

/// Lifecycle of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventStatus {
    /// Created but not in the queue (e.g. a request that has not been released yet).
    Created,
    /// In the queue.
    Scheduled,
    /// Process whose routine is currently executing.
    Running,
    /// Process suspended until the given event fires.
    Waiting(EventId),
    /// Fired. Its waiters have been resumed.
    Triggered,
}

/// Handle of a scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeout(pub(crate) EventId);

impl Timeout {
    /// Returns the event identifier.
    pub fn id(&self) -> EventId {
        self.0
    }
}

impl From<Timeout> for EventId {
    fn from(timeout: Timeout) -> Self {
        timeout.0
    }
}

/// Handle of a spawned process.
///
/// Other processes may wait on it, they are resumed when its routine terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Process(pub(crate) EventId);

impl Process {
    /// Returns the event identifier.
    pub fn id(&self) -> EventId {
        self.0
    }
}

impl From<Process> for EventId {
    fn from(process: Process) -> Self {
        process.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_display() {
        assert_eq!(format!("{}", EventId::new(42)), "E#42");
    }

    #[test]
    fn test_event_id_next() {
        let id = EventId::new(0);
        assert_eq!(id.next().raw(), 1);
        assert!(id < id.next());
    }

    #[test]
    fn test_kind_serialization() {
        let kind = serde_json::to_value(EventKind::Request { resource: 3 }).unwrap();
        assert_eq!(kind, serde_json::json!({"Request": {"resource": 3}}));
        let kind = serde_json::to_value(EventKind::Timeout).unwrap();
        assert_eq!(kind, serde_json::json!("Timeout"));
    }
}
