//! Error types for task operations.
//!
//! [`Error`] is the taxonomy surfaced by the task repository. Failures of the
//! link-following transport arrive as [`TransportError`] and are wrapped
//! unchanged in [`Error::Transport`]; the repository never retries or logs
//! them.

use std::time::Duration;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by task creation, task actions and completion polling.
///
/// # Examples
///
/// ```
/// use octopus_client::Error;
///
/// let err = Error::OutOfScope {
///     space_id: "Spaces-1".to_string(),
///     context: "Spaces-2".to_string(),
/// };
/// assert!(err.to_string().contains("Spaces-1"));
/// assert!(err.to_string().contains("Current space context: Spaces-2"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mutating action targeted a task outside the caller's space context.
    #[error(
        "attempted to perform a space scoped operation within space {space_id}, but the current \
         space context does not contain that space id. Current space context: {context}"
    )]
    OutOfScope {
        /// Space the task belongs to.
        space_id: String,
        /// Rendering of the current context (comma-joined ids or "all spaces").
        context: String,
    },

    /// A single-space creation was attempted while zero or several spaces are selected.
    #[error(
        "this operation requires exactly one space in the current space context, but the current \
         space context is: {context}"
    )]
    AmbiguousSpace {
        /// Rendering of the current context.
        context: String,
        /// Number of explicitly selected spaces; `None` when all spaces are selected.
        space_count: Option<usize>,
    },

    /// Malformed caller input, rejected before any request is made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Polling gave up before every task reached a terminal state.
    ///
    /// The tasks keep running on the server.
    #[error(
        "one or more tasks did not complete before the timeout was reached. We waited {} for the \
         tasks to complete",
        format_elapsed(.elapsed)
    )]
    Timeout {
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// Polling was interrupted through the wait's cancellation token.
    #[error("waiting for task completion was cancelled after {}", format_elapsed(.elapsed))]
    Cancelled {
        /// Time spent waiting before cancellation.
        elapsed: Duration,
    },

    /// A resource does not expose a link an operation needs.
    #[error("resource {resource} does not have a link named '{link}'")]
    MissingLink {
        /// Identifier of the resource (or its name when it has no id yet).
        resource: String,
        /// The missing link name.
        link: String,
    },

    /// Failure reported by the transport, propagated unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors produced by a [`LinkClient`](crate::transport::LinkClient).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Connection-level failure (DNS, TCP, TLS, request timeout).
    #[error("connection error: {0}")]
    Connection(String),

    /// The response payload could not be decoded into the requested shape.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The transport could not be built from its configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

/// Renders a duration as `hh:mm:ss`.
pub(crate) fn format_elapsed(elapsed: &Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_scope_names_task_space_and_context() {
        let err = Error::OutOfScope {
            space_id: "S1".to_string(),
            context: "S2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("within space S1"));
        assert!(msg.ends_with("Current space context: S2"));
    }

    #[test]
    fn timeout_renders_elapsed_as_timespan() {
        let err = Error::Timeout {
            elapsed: Duration::from_secs(3_725),
        };
        assert!(err.to_string().contains("We waited 01:02:05"));
    }

    #[test]
    fn transport_errors_are_transparent() {
        let err: Error = TransportError::Http {
            status: 503,
            body: "busy".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "HTTP 503: busy");
        assert!(matches!(err, Error::Transport(TransportError::Http { status: 503, .. })));
    }

    #[test]
    fn serde_errors_become_deserialization_errors() {
        let json_err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let err = TransportError::from(json_err);
        assert!(matches!(err, TransportError::Deserialization(_)));
    }

    #[test]
    fn format_elapsed_pads_components() {
        assert_eq!(format_elapsed(&Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_elapsed(&Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_elapsed(&Duration::from_secs(36_000)), "10:00:00");
    }
}
