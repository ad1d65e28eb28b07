//! Error types.
//!
//! Every failure in the engine is a local precondition violation. None of them is transient, so the
//! engine never retries: the error is returned to the caller of the failing operation and, when it
//! happens while stepping, aborts the enclosing [`run`](crate::Simulation::run).

use crate::event::EventId;
use crate::resource::ResourceId;

/// The error type returned by fallible simulation operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A process routine yielded something that is not a live event.
    MalformedYield {
        /// The process whose routine misbehaved.
        process: EventId,
        /// The yielded event, if the routine yielded one at all.
        yielded: Option<EventId>,
        /// What is wrong with the yielded value.
        reason: &'static str,
    },

    /// A request was released while not pending in the resource (double release or wrong resource).
    NotFound {
        /// The released request.
        request: EventId,
        /// The resource the request was expected in.
        resource: ResourceId,
    },

    /// Internal consistency failure. Continuing would break the ordering guarantees.
    InvariantViolation(String),

    /// A negative or NaN delay was passed to [`schedule`](crate::SimulationContext::schedule).
    InvalidDelay(f64),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::MalformedYield {
                process,
                yielded: Some(event),
                reason,
            } => write!(f, "process {} yielded {}: {}", process, event, reason),
            SimulationError::MalformedYield {
                process,
                yielded: None,
                reason,
            } => write!(f, "process {} yielded no event: {}", process, reason),
            SimulationError::NotFound { request, resource } => {
                write!(f, "request {} is not pending in resource {}", request, resource)
            }
            SimulationError::InvariantViolation(msg) => write!(f, "invariant violation: {}", msg),
            SimulationError::InvalidDelay(delay) => write!(f, "invalid delay {}", delay),
        }
    }
}

impl std::error::Error for SimulationError {}

/// Convenience alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_malformed_yield() {
        let e = SimulationError::MalformedYield {
            process: EventId::new(3),
            yielded: Some(EventId::new(1)),
            reason: "event has already been triggered",
        };
        assert_eq!(e.to_string(), "process E#3 yielded E#1: event has already been triggered");

        let e = SimulationError::MalformedYield {
            process: EventId::new(3),
            yielded: None,
            reason: "nothing to wait on",
        };
        assert!(e.to_string().contains("yielded no event"));
    }

    #[test]
    fn test_display_not_found() {
        let e = SimulationError::NotFound {
            request: EventId::new(7),
            resource: 2,
        };
        assert_eq!(e.to_string(), "request E#7 is not pending in resource 2");
    }

    #[test]
    fn test_error_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(SimulationError::InvalidDelay(-1.));
        assert_eq!(e.to_string(), "invalid delay -1");
    }
}
