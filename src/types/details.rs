//! Task details: progress and the activity log tree.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::task::{Links, TaskResource};

/// Response of a task's `Details` link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDetailsResource {
    /// The task the details belong to.
    pub task: TaskResource,

    /// Overall progress, when the server can estimate it.
    #[serde(default)]
    pub progress: Option<TaskProgress>,

    /// Root activities of the task log.
    #[serde(default)]
    pub activity_logs: Vec<ActivityElement>,

    /// Size in bytes of the raw log on disk.
    #[serde(default)]
    pub physical_log_size: Option<u64>,

    /// Links of the details document.
    #[serde(default)]
    pub links: Links,
}

/// Progress estimate for a running task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskProgress {
    /// Completion percentage, 0-100.
    pub progress_percentage: u8,
    /// Human readable estimate of the remaining time.
    #[serde(default)]
    pub estimated_time_remaining: Option<String>,
}

/// Status of one node in the activity log tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// Not started yet.
    Pending,
    /// In progress.
    Running,
    /// Finished without problems.
    Success,
    /// Finished with an error.
    Failed,
    /// Skipped by a condition.
    Skipped,
    /// Finished with warnings.
    SuccessWithWarning,
    /// Cancelled.
    Canceled,
}

/// One node of the activity log tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityElement {
    /// Node identifier.
    pub id: String,
    /// Step, action or machine name.
    pub name: String,
    /// Node status.
    pub status: ActivityStatus,
    /// When the activity started.
    #[serde(default)]
    pub started: Option<DateTime<FixedOffset>>,
    /// When the activity ended.
    #[serde(default)]
    pub ended: Option<DateTime<FixedOffset>>,
    /// Child activities.
    #[serde(default)]
    pub children: Vec<ActivityElement>,
    /// Log lines written directly under this node.
    #[serde(default)]
    pub log_elements: Vec<ActivityLogElement>,
    /// Progress of this activity, 0-100.
    #[serde(default)]
    pub progress_percentage: Option<u8>,
    /// Progress message of this activity.
    #[serde(default)]
    pub progress_message: Option<String>,
}

impl ActivityElement {
    /// Iterates this node and all descendants, depth first.
    pub fn walk(&self) -> Vec<&ActivityElement> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// A single log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityLogElement {
    /// `Info`, `Verbose`, `Warning`, `Error`, ...
    pub category: String,
    /// The message.
    pub message_text: String,
    /// Extra detail such as a stack trace.
    #[serde(default)]
    pub detail: Option<String>,
    /// When the line was written.
    pub occurred_at: DateTime<FixedOffset>,
}
