//! Task repository: creation, actions and completion polling.
//!
//! [`TaskRepository`] is the entry point for everything task related. It owns
//! a [`LinkClient`] for network access and a [`SpaceGuard`] for space scoping,
//! and its operations are split across three files:
//!
//! - [`factory`] -- builds and submits the built-in task kinds
//!   (`execute_health_check`, `execute_backup`, ...).
//! - [`actions`] -- reads and mutations on an existing task
//!   (`get_details`, `cancel`, `rerun`, ...). Mutations are gated by
//!   [`SpaceGuard::authorize`]; reads are not.
//! - [`poller`] -- waits for one or more tasks to complete.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use octopus_client::transport::memory::InMemoryLinkClient;
//! use octopus_client::{HealthCheckOptions, SpaceContext, TaskRepository};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = Arc::new(InMemoryLinkClient::new());
//! let repository = TaskRepository::new(client, Arc::new(SpaceContext::single("Spaces-1")));
//!
//! let task = repository
//!     .execute_health_check(HealthCheckOptions::default().with_machine_ids(["Machines-1"]))
//!     .await
//!     .unwrap();
//! assert_eq!(task.name, "Health");
//! assert_eq!(task.space_id.as_deref(), Some("Spaces-1"));
//! # });
//! ```

pub mod actions;
pub mod factory;
pub mod poller;

use std::sync::Arc;

use crate::space::{SpaceContext, SpaceContextProvider, SpaceGuard};
use crate::transport::LinkClient;

pub use factory::{
    combine_machine_ids, format_timespan, ActionTemplateRunOptions, AdHocScriptOptions,
    CalamariUpdateOptions, HealthCheckOptions, TentacleUpgradeOptions,
};
pub use poller::TaskProgressHandler;

/// Name of the task collection link.
pub const TASKS_COLLECTION: &str = "Tasks";

/// Repository for server tasks.
///
/// Cloning is cheap; clones share the transport and the space context
/// provider.
#[derive(Clone)]
pub struct TaskRepository {
    client: Arc<dyn LinkClient>,
    guard: SpaceGuard,
}

impl std::fmt::Debug for TaskRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRepository")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl TaskRepository {
    /// Creates a repository over `client`, reading the space context from `spaces`.
    pub fn new(client: Arc<dyn LinkClient>, spaces: Arc<dyn SpaceContextProvider>) -> Self {
        Self {
            client,
            guard: SpaceGuard::new(spaces),
        }
    }

    /// Creates a repository that talks HTTP to the configured server, using
    /// the configured default space selection.
    #[cfg(feature = "http-client")]
    pub fn from_config(
        config: &crate::config::ClientConfig,
    ) -> Result<Self, crate::error::TransportError> {
        let client = crate::transport::http::HttpLinkClient::new(config)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(config.space_context()),
        ))
    }

    /// Returns a repository bound to `context`, sharing this repository's transport.
    pub fn using_context(&self, context: SpaceContext) -> Self {
        Self::new(self.client.clone(), Arc::new(context))
    }

    /// The underlying transport.
    pub fn client(&self) -> &Arc<dyn LinkClient> {
        &self.client
    }

    /// The space context in effect right now.
    pub fn space_context(&self) -> SpaceContext {
        self.guard.context()
    }

    pub(crate) fn guard(&self) -> &SpaceGuard {
        &self.guard
    }
}
