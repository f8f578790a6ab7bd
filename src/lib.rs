//! # octopus-client
//!
//! Async client for the task API of an Octopus Deploy server.
//!
//! The crate covers the task lifecycle:
//!
//! - **Creation** of the server's built-in tasks (health checks, Calamari
//!   updates, backups, Tentacle upgrades, ad-hoc scripts, step template runs
//!   and community step template synchronisation).
//! - **Actions** on existing tasks (details, raw log, rerun, cancel, state
//!   changes, queued-behind and active task listings).
//! - **Completion polling** over one or more tasks with progress reporting,
//!   timeout and cancellation.
//!
//! Every operation respects the caller's [`SpaceContext`]: creation inside a
//! space requires exactly one selected space, and mutations on a task are
//! refused when the task's space is outside the context.
//!
//! ## Quick Start
//!
//! ```no_run
//! use octopus_client::{ClientConfig, HealthCheckOptions, TaskRepository};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://octopus.example.com")
//!     .with_header("X-Octopus-ApiKey", "API-XXXXXXXX")
//!     .with_spaces(["Spaces-1"]);
//! let repository = TaskRepository::from_config(&config)?;
//!
//! let task = repository
//!     .execute_health_check(HealthCheckOptions::default().with_environment_id("Environments-1"))
//!     .await?;
//! let finished = repository.wait_for_task(&task, &config.wait_options()).await?;
//! println!("{} finished as {}", finished.description, finished.state);
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! The repository talks to the server through the [`LinkClient`] contract.
//! [`HttpLinkClient`](transport::http::HttpLinkClient) (feature
//! `http-client`, on by default) uses `reqwest`;
//! [`InMemoryLinkClient`](transport::memory::InMemoryLinkClient) is a scripted
//! in-process server for tests.

#![warn(missing_docs)]

pub mod config;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod space;
pub mod tasks;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, WaitOptions};
pub use error::{Error, Result, TransportError};
pub use space::{SharedSpaceContext, SpaceContext, SpaceContextProvider, SpaceGuard};
pub use tasks::{
    combine_machine_ids, format_timespan, ActionTemplateRunOptions, AdHocScriptOptions,
    CalamariUpdateOptions, HealthCheckOptions, TaskProgressHandler, TaskRepository,
    TentacleUpgradeOptions,
};
pub use transport::{LinkClient, LinkClientExt, QueryParameters};
pub use types::{
    ActionTemplateResource, BuiltInTask, BuiltInTaskSpec, Links, ModifyTaskState,
    PropertyValueResource, PropertyValues, ScriptSyntax, TaskArguments, TaskDetailsResource,
    TaskResource, TaskState,
};
