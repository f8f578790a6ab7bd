//! Built-in task creation.
//!
//! Every `execute_*` method builds a [`TaskResource`] from the static
//! [`BuiltInTask`] catalog: the catalog name, the caller's description (or
//! the catalog default when blank), and an argument map written in catalog
//! key order. Optional arguments the caller leaves out are still written, as
//! JSON `null`, so the server sees the full argument set for the task kind.
//!
//! Space-scoped kinds (health check, Calamari update, upgrade, ad-hoc script,
//! step template run) require exactly one selected space and are submitted to
//! that space's task collection. Backup and community step template
//! synchronisation are system tasks and are submitted to the unscoped
//! collection.
//!
//! All validation happens before any request is made.

use std::time::Duration;

use serde_json::{json, Value};

use super::{TaskRepository, TASKS_COLLECTION};
use crate::error::{Error, Result};
use crate::transport::LinkClientExt;
use crate::types::builtin::{ad_hoc_script, health, update_calamari, upgrade};
use crate::types::{
    ActionTemplateResource, BuiltInTask, PropertyValues, ScriptSyntax, TaskArguments,
    TaskResource,
};

fn collect_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Concatenates explicit machine ids with worker ids.
///
/// Workers are appended after machines. Either list may be absent; when both
/// are absent the result is absent.
///
/// # Examples
///
/// ```
/// use octopus_client::combine_machine_ids;
///
/// let machines = vec!["m1".to_string()];
/// let workers = vec!["w1".to_string()];
/// assert_eq!(
///     combine_machine_ids(Some(&machines[..]), Some(&workers[..])),
///     Some(vec!["m1".to_string(), "w1".to_string()])
/// );
/// assert_eq!(combine_machine_ids(None, Some(&workers[..])), Some(workers.clone()));
/// assert_eq!(combine_machine_ids(None, None), None);
/// ```
pub fn combine_machine_ids(
    machine_ids: Option<&[String]>,
    worker_ids: Option<&[String]>,
) -> Option<Vec<String>> {
    match (machine_ids, worker_ids) {
        (Some(machines), workers) => Some(
            machines
                .iter()
                .chain(workers.unwrap_or_default())
                .cloned()
                .collect(),
        ),
        (None, Some(workers)) => Some(workers.to_vec()),
        (None, None) => None,
    }
}

/// Renders a duration in the server's time span form, `[d.]hh:mm:ss`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use octopus_client::format_timespan;
///
/// assert_eq!(format_timespan(Duration::from_secs(5 * 60)), "00:05:00");
/// assert_eq!(format_timespan(Duration::from_secs(26 * 3600)), "1.02:00:00");
/// ```
pub fn format_timespan(duration: Duration) -> String {
    let secs = duration.as_secs();
    let days = secs / 86_400;
    let hms = format!(
        "{:02}:{:02}:{:02}",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    );
    if days > 0 {
        format!("{days}.{hms}")
    } else {
        hms
    }
}

fn minutes(minutes: u64) -> Value {
    json!(format_timespan(Duration::from_secs(minutes.saturating_mul(60))))
}

/// Options for [`TaskRepository::execute_health_check`].
///
/// | Setting                        | Default |
/// |--------------------------------|---------|
/// | `timeout_after_minutes`        | 5       |
/// | `machine_timeout_after_minutes`| 1       |
/// | everything else                | absent  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckOptions {
    /// Task description. Blank uses "Manual health check".
    pub description: Option<String>,
    /// Overall timeout in minutes.
    pub timeout_after_minutes: u64,
    /// Per-machine timeout in minutes.
    pub machine_timeout_after_minutes: u64,
    /// Environment to check.
    pub environment_id: Option<String>,
    /// Worker pool to check.
    pub worker_pool_id: Option<String>,
    /// Restriction filter.
    pub restrict_to: Option<String>,
    /// Explicit machines to check.
    pub machine_ids: Option<Vec<String>>,
    /// Explicit workers to check; appended after `machine_ids`.
    pub worker_ids: Option<Vec<String>>,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            description: None,
            timeout_after_minutes: 5,
            machine_timeout_after_minutes: 1,
            environment_id: None,
            worker_pool_id: None,
            restrict_to: None,
            machine_ids: None,
            worker_ids: None,
        }
    }
}

impl HealthCheckOptions {
    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the overall timeout.
    pub fn with_timeout_after_minutes(mut self, minutes: u64) -> Self {
        self.timeout_after_minutes = minutes;
        self
    }

    /// Sets the per-machine timeout.
    pub fn with_machine_timeout_after_minutes(mut self, minutes: u64) -> Self {
        self.machine_timeout_after_minutes = minutes;
        self
    }

    /// Restricts the check to an environment.
    pub fn with_environment_id(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    /// Restricts the check to a worker pool.
    pub fn with_worker_pool_id(mut self, worker_pool_id: impl Into<String>) -> Self {
        self.worker_pool_id = Some(worker_pool_id.into());
        self
    }

    /// Sets the restriction filter.
    pub fn with_restrict_to(mut self, restrict_to: impl Into<String>) -> Self {
        self.restrict_to = Some(restrict_to.into());
        self
    }

    /// Sets the machines to check.
    pub fn with_machine_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machine_ids = Some(collect_ids(ids));
        self
    }

    /// Sets the workers to check.
    pub fn with_worker_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.worker_ids = Some(collect_ids(ids));
        self
    }
}

/// Options for [`TaskRepository::execute_calamari_update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalamariUpdateOptions {
    /// Task description. Blank uses "Manual Calamari update".
    pub description: Option<String>,
    /// Machines to update.
    pub machine_ids: Option<Vec<String>>,
}

impl CalamariUpdateOptions {
    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the machines to update.
    pub fn with_machine_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machine_ids = Some(collect_ids(ids));
        self
    }
}

/// Options for [`TaskRepository::execute_tentacle_upgrade`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TentacleUpgradeOptions {
    /// Task description. Blank uses "Manual upgrade".
    pub description: Option<String>,
    /// Environment to upgrade.
    pub environment_id: Option<String>,
    /// Worker pool to upgrade.
    pub worker_pool_id: Option<String>,
    /// Restriction filter.
    pub restrict_to: Option<String>,
    /// Explicit machines to upgrade.
    pub machine_ids: Option<Vec<String>>,
    /// Explicit workers to upgrade; appended after `machine_ids`.
    pub worker_ids: Option<Vec<String>>,
}

impl TentacleUpgradeOptions {
    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restricts the upgrade to an environment.
    pub fn with_environment_id(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    /// Restricts the upgrade to a worker pool.
    pub fn with_worker_pool_id(mut self, worker_pool_id: impl Into<String>) -> Self {
        self.worker_pool_id = Some(worker_pool_id.into());
        self
    }

    /// Sets the restriction filter.
    pub fn with_restrict_to(mut self, restrict_to: impl Into<String>) -> Self {
        self.restrict_to = Some(restrict_to.into());
        self
    }

    /// Sets the machines to upgrade.
    pub fn with_machine_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machine_ids = Some(collect_ids(ids));
        self
    }

    /// Sets the workers to upgrade.
    pub fn with_worker_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.worker_ids = Some(collect_ids(ids));
        self
    }
}

/// Options for [`TaskRepository::execute_ad_hoc_script`].
///
/// # Examples
///
/// ```
/// use octopus_client::{AdHocScriptOptions, ScriptSyntax};
///
/// let options = AdHocScriptOptions::new("echo hello")
///     .with_syntax(ScriptSyntax::Bash)
///     .with_target_roles(["web"]);
/// assert_eq!(options.syntax, ScriptSyntax::Bash);
/// assert!(options.machine_ids.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdHocScriptOptions {
    /// Script source. Must not be blank.
    pub script_body: String,
    /// Script language.
    pub syntax: ScriptSyntax,
    /// Task description. Blank uses "Run ad-hoc PowerShell script".
    pub description: Option<String>,
    /// Target machines.
    pub machine_ids: Option<Vec<String>>,
    /// Target environments.
    pub environment_ids: Option<Vec<String>>,
    /// Target roles.
    pub target_roles: Option<Vec<String>>,
}

impl AdHocScriptOptions {
    /// Creates options running `script_body` as PowerShell.
    pub fn new(script_body: impl Into<String>) -> Self {
        Self {
            script_body: script_body.into(),
            syntax: ScriptSyntax::default(),
            description: None,
            machine_ids: None,
            environment_ids: None,
            target_roles: None,
        }
    }

    /// Sets the script language.
    pub fn with_syntax(mut self, syntax: ScriptSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the target machines.
    pub fn with_machine_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machine_ids = Some(collect_ids(ids));
        self
    }

    /// Sets the target environments.
    pub fn with_environment_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environment_ids = Some(collect_ids(ids));
        self
    }

    /// Sets the target roles.
    pub fn with_target_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_roles = Some(collect_ids(roles));
        self
    }
}

/// Options for [`TaskRepository::execute_action_template`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTemplateRunOptions {
    /// Task description. Blank uses "Run step template: {template name}".
    pub description: Option<String>,
    /// Target machines.
    pub machine_ids: Option<Vec<String>>,
    /// Target environments.
    pub environment_ids: Option<Vec<String>>,
    /// Target roles.
    pub target_roles: Option<Vec<String>>,
}

impl ActionTemplateRunOptions {
    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the target machines.
    pub fn with_machine_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machine_ids = Some(collect_ids(ids));
        self
    }

    /// Sets the target environments.
    pub fn with_environment_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environment_ids = Some(collect_ids(ids));
        self
    }

    /// Sets the target roles.
    pub fn with_target_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_roles = Some(collect_ids(roles));
        self
    }
}

impl TaskRepository {
    /// Creates a health check in the selected space.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousSpace`] unless exactly one space is selected.
    pub async fn execute_health_check(&self, options: HealthCheckOptions) -> Result<TaskResource> {
        let space_id = self.guard().require_single_space()?;

        let mut arguments = TaskArguments::new();
        arguments.insert(health::TIMEOUT.into(), minutes(options.timeout_after_minutes));
        arguments.insert(
            health::MACHINE_TIMEOUT.into(),
            minutes(options.machine_timeout_after_minutes),
        );
        arguments.insert(health::ENVIRONMENT_ID.into(), json!(options.environment_id));
        arguments.insert(health::WORKERPOOL_ID.into(), json!(options.worker_pool_id));
        arguments.insert(health::RESTRICTED_TO.into(), json!(options.restrict_to));
        arguments.insert(
            health::MACHINE_IDS.into(),
            json!(combine_machine_ids(
                options.machine_ids.as_deref(),
                options.worker_ids.as_deref()
            )),
        );

        let task = build_task(
            BuiltInTask::Health,
            BuiltInTask::Health.describe(options.description.as_deref()),
            arguments,
        );
        self.create_in_space(&space_id, task).await
    }

    /// Creates a Calamari update in the selected space.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousSpace`] unless exactly one space is selected.
    pub async fn execute_calamari_update(
        &self,
        options: CalamariUpdateOptions,
    ) -> Result<TaskResource> {
        let space_id = self.guard().require_single_space()?;

        let mut arguments = TaskArguments::new();
        arguments.insert(update_calamari::MACHINE_IDS.into(), json!(options.machine_ids));

        let task = build_task(
            BuiltInTask::UpdateCalamari,
            BuiltInTask::UpdateCalamari.describe(options.description.as_deref()),
            arguments,
        );
        self.create_in_space(&space_id, task).await
    }

    /// Creates a server backup. System task; never space scoped.
    pub async fn execute_backup(&self, description: Option<&str>) -> Result<TaskResource> {
        let task = build_task(
            BuiltInTask::Backup,
            BuiltInTask::Backup.describe(description),
            TaskArguments::new(),
        );
        self.create_system_task(task).await
    }

    /// Creates a Tentacle upgrade in the selected space.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousSpace`] unless exactly one space is selected.
    pub async fn execute_tentacle_upgrade(
        &self,
        options: TentacleUpgradeOptions,
    ) -> Result<TaskResource> {
        let space_id = self.guard().require_single_space()?;

        let mut arguments = TaskArguments::new();
        arguments.insert(upgrade::ENVIRONMENT_ID.into(), json!(options.environment_id));
        arguments.insert(upgrade::WORKERPOOL_ID.into(), json!(options.worker_pool_id));
        arguments.insert(upgrade::RESTRICTED_TO.into(), json!(options.restrict_to));
        arguments.insert(
            upgrade::MACHINE_IDS.into(),
            json!(combine_machine_ids(
                options.machine_ids.as_deref(),
                options.worker_ids.as_deref()
            )),
        );

        let task = build_task(
            BuiltInTask::Upgrade,
            BuiltInTask::Upgrade.describe(options.description.as_deref()),
            arguments,
        );
        self.create_in_space(&space_id, task).await
    }

    /// Creates an ad-hoc script run in the selected space.
    ///
    /// # Errors
    ///
    /// - [`Error::AmbiguousSpace`] unless exactly one space is selected.
    /// - [`Error::InvalidArgument`] when the script body is blank.
    pub async fn execute_ad_hoc_script(&self, options: AdHocScriptOptions) -> Result<TaskResource> {
        let space_id = self.guard().require_single_space()?;
        if options.script_body.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "the script body must not be empty".to_string(),
            ));
        }

        let mut arguments = TaskArguments::new();
        arguments.insert(
            ad_hoc_script::ENVIRONMENT_IDS.into(),
            json!(options.environment_ids),
        );
        arguments.insert(ad_hoc_script::TARGET_ROLES.into(), json!(options.target_roles));
        arguments.insert(ad_hoc_script::MACHINE_IDS.into(), json!(options.machine_ids));
        arguments.insert(ad_hoc_script::SCRIPT_BODY.into(), json!(options.script_body));
        arguments.insert(ad_hoc_script::SYNTAX.into(), json!(options.syntax));

        let task = build_task(
            BuiltInTask::AdHocScript,
            BuiltInTask::AdHocScript.describe(options.description.as_deref()),
            arguments,
        );
        self.create_in_space(&space_id, task).await
    }

    /// Runs a step template as an ad-hoc script task.
    ///
    /// The task belongs to the template's space, falling back to the selected
    /// space when the template has none. A template from another space is
    /// submitted there even when that space is outside the current context;
    /// only the single-space selection is checked.
    ///
    /// # Errors
    ///
    /// - [`Error::AmbiguousSpace`] unless exactly one space is selected.
    /// - [`Error::InvalidArgument`] when the template has no id.
    pub async fn execute_action_template(
        &self,
        template: &ActionTemplateResource,
        properties: PropertyValues,
        options: ActionTemplateRunOptions,
    ) -> Result<TaskResource> {
        let selected_space = self.guard().require_single_space()?;
        let template_id = template
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                Error::InvalidArgument("the step template has no id".to_string())
            })?;

        let mut arguments = TaskArguments::new();
        arguments.insert(
            ad_hoc_script::ENVIRONMENT_IDS.into(),
            json!(options.environment_ids),
        );
        arguments.insert(ad_hoc_script::TARGET_ROLES.into(), json!(options.target_roles));
        arguments.insert(ad_hoc_script::MACHINE_IDS.into(), json!(options.machine_ids));
        arguments.insert(ad_hoc_script::ACTION_TEMPLATE_ID.into(), json!(template_id));
        arguments.insert(ad_hoc_script::PROPERTIES.into(), json!(properties));

        let description = match options.description.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => format!("Run step template: {}", template.name),
        };
        let space_id = template
            .space_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or(selected_space);

        let task = build_task(BuiltInTask::AdHocScript, description, arguments);
        self.create_in_space(&space_id, task).await
    }

    /// Synchronises community step templates. System task; never space scoped.
    pub async fn execute_community_action_templates_synchronisation(
        &self,
        description: Option<&str>,
    ) -> Result<TaskResource> {
        let task = build_task(
            BuiltInTask::SyncCommunityActionTemplates,
            BuiltInTask::SyncCommunityActionTemplates.describe(description),
            TaskArguments::new(),
        );
        self.create_system_task(task).await
    }

    async fn create_in_space(&self, space_id: &str, mut task: TaskResource) -> Result<TaskResource> {
        task.space_id = Some(space_id.to_string());
        let collection = self
            .client()
            .collection_link(TASKS_COLLECTION, Some(space_id))
            .await?;
        tracing::debug!(
            task = %task.name,
            space_id,
            collection = %collection,
            "submitting task"
        );
        Ok(self.client().create_as::<TaskResource, _>(&collection, &task).await?)
    }

    async fn create_system_task(&self, task: TaskResource) -> Result<TaskResource> {
        let collection = self
            .client()
            .collection_link(TASKS_COLLECTION, None)
            .await?;
        tracing::debug!(task = %task.name, collection = %collection, "submitting system task");
        Ok(self.client().create_as::<TaskResource, _>(&collection, &task).await?)
    }
}

fn build_task(kind: BuiltInTask, description: String, arguments: TaskArguments) -> TaskResource {
    TaskResource {
        arguments,
        ..TaskResource::new(kind.name(), description)
    }
}
