//! Server task resource shapes.
//!
//! [`TaskResource`] mirrors the server's `ServerTask` document: identity,
//! owning space, lifecycle state, the argument map the task was created with,
//! and the named [`Links`] used to navigate to its actions and sub-resources.
//!
//! # Serialization
//!
//! Field names use the server's `PascalCase` convention. Timestamps are
//! RFC 3339 strings parsed into `chrono` values.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Link names exposed by task resources.
pub mod links {
    /// The task itself; re-fetched by the completion poller.
    pub const SELF: &str = "Self";
    /// Task details with activity logs.
    pub const DETAILS: &str = "Details";
    /// Raw, unstructured output log.
    pub const RAW: &str = "Raw";
    /// Re-run a finished task.
    pub const RERUN: &str = "Rerun";
    /// Cancel a queued or executing task.
    pub const CANCEL: &str = "Cancel";
    /// Force the task into a given state.
    pub const STATE: &str = "State";
    /// Tasks queued on the same execution queue.
    pub const QUEUED_BEHIND: &str = "QueuedBehind";
    /// Next page of a paginated collection.
    pub const PAGE_NEXT: &str = "Page.Next";
}

/// Lifecycle state of a server task.
///
/// ```text
/// Queued -> Executing -> Success | Failed | TimedOut
///      \            \-> Cancelling -> Canceled
///       \-> Canceled
/// ```
///
/// # Examples
///
/// ```
/// use octopus_client::TaskState;
///
/// assert!(!TaskState::Executing.is_terminal());
/// assert!(TaskState::Canceled.is_terminal());
/// assert_eq!(TaskState::TimedOut.to_string(), "TimedOut");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting for an execution slot.
    #[default]
    Queued,
    /// Running on a server node.
    Executing,
    /// Finished with an error (terminal).
    Failed,
    /// Cancelled before completion (terminal).
    Canceled,
    /// Exceeded its server-side time limit (terminal).
    TimedOut,
    /// Finished successfully (terminal).
    Success,
    /// Cancellation requested but not yet honoured.
    Cancelling,
}

impl TaskState {
    /// Returns `true` for states after which the task makes no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Canceled | Self::TimedOut | Self::Success
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "Queued",
            Self::Executing => "Executing",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
            Self::TimedOut => "TimedOut",
            Self::Success => "Success",
            Self::Cancelling => "Cancelling",
        };
        f.write_str(name)
    }
}

/// Named links of a resource, keyed by link name.
///
/// # Examples
///
/// ```
/// use octopus_client::Links;
///
/// let links = Links::default().with("Self", "/api/tasks/ServerTasks-1");
/// assert_eq!(links.get("Self"), Some("/api/tasks/ServerTasks-1"));
/// assert!(links.get("Cancel").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(IndexMap<String, String>);

impl Links {
    /// Adds or replaces a link.
    pub fn with(mut self, name: impl Into<String>, href: impl Into<String>) -> Self {
        self.0.insert(name.into(), href.into());
        self
    }

    /// Looks up a link by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns `true` if no links are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Argument map a task was created with.
///
/// Insertion order is preserved so that request bodies list arguments in
/// catalog order.
pub type TaskArguments = IndexMap<String, Value>;

/// A server task.
///
/// The client never mutates a task it received from the server; fresh state
/// is obtained by re-fetching through the task's `Self` link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskResource {
    /// Server-assigned identifier (`ServerTasks-123`). `None` before creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Built-in task name (`Health`, `AdHocScript`, ...).
    pub name: String,

    /// Human readable description.
    #[serde(default)]
    pub description: String,

    /// Owning space; `None` for system tasks that are not space scoped.
    #[serde(default)]
    pub space_id: Option<String>,

    /// Current lifecycle state.
    #[serde(default)]
    pub state: TaskState,

    /// Server-computed terminal flag; the single predicate used when polling.
    #[serde(default)]
    pub is_completed: bool,

    /// Whether the task finished in [`TaskState::Success`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_successfully: Option<bool>,

    /// Whether the task log contains warnings or errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_warnings_or_errors: Option<bool>,

    /// Error summary for failed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Arguments the task was created with.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arguments: TaskArguments,

    /// When the task entered the queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<DateTime<FixedOffset>>,

    /// When execution started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,

    /// When the task reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<FixedOffset>>,

    /// Human readable run time reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// Node that picked the task up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_node: Option<String>,

    /// Whether the task may be re-run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_rerun: Option<bool>,

    /// Whether the task is blocked on a manual intervention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_pending_interruptions: Option<bool>,

    /// Named links to actions and sub-resources.
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl TaskResource {
    /// Creates an unsaved task with the given name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Resolves a named link, failing with [`Error::MissingLink`] when absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use octopus_client::{Links, TaskResource};
    ///
    /// let mut task = TaskResource::new("Health", "Manual health check");
    /// assert!(task.link("Self").is_err());
    ///
    /// task.links = Links::default().with("Self", "/api/tasks/ServerTasks-1");
    /// assert_eq!(task.link("Self").unwrap(), "/api/tasks/ServerTasks-1");
    /// ```
    pub fn link(&self, name: &str) -> Result<&str, Error> {
        self.links.get(name).ok_or_else(|| Error::MissingLink {
            resource: self.id.clone().unwrap_or_else(|| self.name.clone()),
            link: name.to_string(),
        })
    }
}

/// Body posted to a task's `State` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyTaskState {
    /// Target state.
    pub state: TaskState,
    /// Audit reason recorded with the change.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_states() {
        for state in [
            TaskState::Success,
            TaskState::Failed,
            TaskState::Canceled,
            TaskState::TimedOut,
        ] {
            assert!(state.is_terminal(), "{state} should be terminal");
        }
        for state in [TaskState::Queued, TaskState::Executing, TaskState::Cancelling] {
            assert!(!state.is_terminal(), "{state} should not be terminal");
        }
    }

    #[test]
    fn deserializes_server_task() {
        let task: TaskResource = serde_json::from_value(json!({
            "Id": "ServerTasks-42",
            "Name": "Health",
            "Description": "Manual health check",
            "SpaceId": "Spaces-1",
            "State": "Executing",
            "IsCompleted": false,
            "QueueTime": "2024-05-01T10:00:00.000+00:00",
            "Arguments": { "Timeout": "00:05:00" },
            "Links": {
                "Self": "/api/Spaces-1/tasks/ServerTasks-42",
                "Cancel": "/api/Spaces-1/tasks/ServerTasks-42/cancel"
            }
        }))
        .unwrap();

        assert_eq!(task.id.as_deref(), Some("ServerTasks-42"));
        assert_eq!(task.space_id.as_deref(), Some("Spaces-1"));
        assert_eq!(task.state, TaskState::Executing);
        assert!(!task.is_completed);
        assert!(task.queue_time.is_some());
        assert_eq!(task.arguments["Timeout"], json!("00:05:00"));
        assert_eq!(
            task.link(links::CANCEL).unwrap(),
            "/api/Spaces-1/tasks/ServerTasks-42/cancel"
        );
    }

    #[test]
    fn null_space_id_means_system_task() {
        let task: TaskResource = serde_json::from_value(json!({
            "Id": "ServerTasks-7",
            "Name": "Backup",
            "SpaceId": null,
            "State": "Success",
            "IsCompleted": true
        }))
        .unwrap();
        assert!(task.space_id.is_none());
        assert!(task.links.is_empty());
    }

    #[test]
    fn new_task_serializes_without_server_fields() {
        let task = TaskResource::new("Backup", "Manual backup");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["Name"], "Backup");
        assert_eq!(json["Description"], "Manual backup");
        assert!(json["SpaceId"].is_null());
        assert!(json.get("Id").is_none());
        assert!(json.get("Links").is_none());
        assert!(json.get("Arguments").is_none());
    }

    #[test]
    fn links_keep_insertion_order() {
        let links = Links::default()
            .with("Self", "/api/tasks/ServerTasks-1")
            .with("Details", "/api/tasks/ServerTasks-1/details")
            .with("Cancel", "/api/tasks/ServerTasks-1/cancel")
            .with("Raw", "/api/tasks/ServerTasks-1/raw");
        assert_eq!(
            serde_json::to_string(&links).unwrap(),
            r#"{"Self":"/api/tasks/ServerTasks-1","Details":"/api/tasks/ServerTasks-1/details","Cancel":"/api/tasks/ServerTasks-1/cancel","Raw":"/api/tasks/ServerTasks-1/raw"}"#
        );

        let parsed: Links = serde_json::from_str(r#"{"Raw":"/r","Self":"/s"}"#).unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"Raw":"/r","Self":"/s"}"#);
    }

    #[test]
    fn missing_link_names_resource() {
        let task = TaskResource {
            id: Some("ServerTasks-9".to_string()),
            ..TaskResource::new("Upgrade", "Manual upgrade")
        };
        let err = task.link(links::RERUN).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingLink { ref resource, ref link }
                if resource == "ServerTasks-9" && link == "Rerun"
        ));
    }

    #[test]
    fn modify_state_body_uses_lowercase_keys() {
        let body = ModifyTaskState {
            state: TaskState::Failed,
            reason: "stuck".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "state": "Failed", "reason": "stuck" })
        );
    }
}
