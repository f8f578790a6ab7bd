//! Resource shapes exchanged with the server.
//!
//! These are plain data holders. Behaviour lives in
//! [`tasks`](crate::tasks); the only logic here is link lookup, state
//! classification and the built-in task catalog.

pub mod action_template;
pub mod builtin;
pub mod details;
pub mod script;
pub mod task;

pub use action_template::{ActionTemplateResource, PropertyValueResource, PropertyValues};
pub use builtin::{BuiltInTask, BuiltInTaskSpec};
pub use details::{ActivityElement, ActivityLogElement, ActivityStatus, TaskDetailsResource, TaskProgress};
pub use script::ScriptSyntax;
pub use task::{links, Links, ModifyTaskState, TaskArguments, TaskResource, TaskState};
