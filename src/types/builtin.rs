//! Catalog of the server's built-in task kinds.
//!
//! Each [`BuiltInTask`] maps to one static [`BuiltInTaskSpec`] holding the
//! server-side task name, the default description applied when the caller
//! supplies none, and the argument keys the task understands. The catalog is
//! a compile-time table so argument keys are identical on every call.

use std::fmt;

/// Argument keys of the `Health` task.
pub mod health {
    /// Overall timeout, as a time span.
    pub const TIMEOUT: &str = "Timeout";
    /// Per-machine timeout, as a time span.
    pub const MACHINE_TIMEOUT: &str = "MachineTimeout";
    /// Environment to check.
    pub const ENVIRONMENT_ID: &str = "EnvironmentId";
    /// Worker pool to check.
    pub const WORKERPOOL_ID: &str = "WorkerpoolId";
    /// Restriction filter.
    pub const RESTRICTED_TO: &str = "RestrictedTo";
    /// Explicit machines and workers to check.
    pub const MACHINE_IDS: &str = "MachineIds";
}

/// Argument keys of the `UpdateCalamari` task.
pub mod update_calamari {
    /// Machines to update.
    pub const MACHINE_IDS: &str = "MachineIds";
}

/// Argument keys of the `Upgrade` task.
pub mod upgrade {
    /// Environment to upgrade.
    pub const ENVIRONMENT_ID: &str = "EnvironmentId";
    /// Worker pool to upgrade.
    pub const WORKERPOOL_ID: &str = "WorkerpoolId";
    /// Restriction filter.
    pub const RESTRICTED_TO: &str = "RestrictedTo";
    /// Explicit machines and workers to upgrade.
    pub const MACHINE_IDS: &str = "MachineIds";
}

/// Argument keys of the `AdHocScript` task, shared by step template runs.
pub mod ad_hoc_script {
    /// Target environments.
    pub const ENVIRONMENT_IDS: &str = "EnvironmentIds";
    /// Target roles.
    pub const TARGET_ROLES: &str = "TargetRoles";
    /// Target machines.
    pub const MACHINE_IDS: &str = "MachineIds";
    /// Script source.
    pub const SCRIPT_BODY: &str = "ScriptBody";
    /// Script language.
    pub const SYNTAX: &str = "Syntax";
    /// Step template to run instead of a script body.
    pub const ACTION_TEMPLATE_ID: &str = "ActionTemplateId";
    /// Step template parameter values.
    pub const PROPERTIES: &str = "Properties";
}

/// A catalog entry for one built-in task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltInTaskSpec {
    /// Task name understood by the server.
    pub name: &'static str,
    /// Description used when the caller supplies none or a blank one.
    pub default_description: &'static str,
    /// Argument keys, in the order they are written to the task.
    pub arguments: &'static [&'static str],
}

/// Built-in task kinds the repository can create.
///
/// # Examples
///
/// ```
/// use octopus_client::BuiltInTask;
///
/// let spec = BuiltInTask::Health.spec();
/// assert_eq!(spec.name, "Health");
/// assert!(spec.arguments.contains(&"MachineTimeout"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInTask {
    /// Machine and worker health check.
    Health,
    /// Calamari (agent tooling) update on machines.
    UpdateCalamari,
    /// Server backup. System level.
    Backup,
    /// Tentacle agent upgrade.
    Upgrade,
    /// Ad-hoc script or step template run.
    AdHocScript,
    /// Community step template synchronisation. System level.
    SyncCommunityActionTemplates,
}

static HEALTH: BuiltInTaskSpec = BuiltInTaskSpec {
    name: "Health",
    default_description: "Manual health check",
    arguments: &[
        health::TIMEOUT,
        health::MACHINE_TIMEOUT,
        health::ENVIRONMENT_ID,
        health::WORKERPOOL_ID,
        health::RESTRICTED_TO,
        health::MACHINE_IDS,
    ],
};

static UPDATE_CALAMARI: BuiltInTaskSpec = BuiltInTaskSpec {
    name: "UpdateCalamari",
    default_description: "Manual Calamari update",
    arguments: &[update_calamari::MACHINE_IDS],
};

static BACKUP: BuiltInTaskSpec = BuiltInTaskSpec {
    name: "Backup",
    default_description: "Manual backup",
    arguments: &[],
};

static UPGRADE: BuiltInTaskSpec = BuiltInTaskSpec {
    name: "Upgrade",
    default_description: "Manual upgrade",
    arguments: &[
        upgrade::ENVIRONMENT_ID,
        upgrade::WORKERPOOL_ID,
        upgrade::RESTRICTED_TO,
        upgrade::MACHINE_IDS,
    ],
};

static AD_HOC_SCRIPT: BuiltInTaskSpec = BuiltInTaskSpec {
    name: "AdHocScript",
    default_description: "Run ad-hoc PowerShell script",
    arguments: &[
        ad_hoc_script::ENVIRONMENT_IDS,
        ad_hoc_script::TARGET_ROLES,
        ad_hoc_script::MACHINE_IDS,
        ad_hoc_script::SCRIPT_BODY,
        ad_hoc_script::SYNTAX,
        ad_hoc_script::ACTION_TEMPLATE_ID,
        ad_hoc_script::PROPERTIES,
    ],
};

static SYNC_COMMUNITY_ACTION_TEMPLATES: BuiltInTaskSpec = BuiltInTaskSpec {
    name: "SyncCommunityActionTemplates",
    default_description: "Run SyncCommunityActionTemplates",
    arguments: &[],
};

impl BuiltInTask {
    /// Every catalog entry.
    pub const ALL: [BuiltInTask; 6] = [
        Self::Health,
        Self::UpdateCalamari,
        Self::Backup,
        Self::Upgrade,
        Self::AdHocScript,
        Self::SyncCommunityActionTemplates,
    ];

    /// Returns the catalog entry for this kind.
    pub fn spec(self) -> &'static BuiltInTaskSpec {
        match self {
            Self::Health => &HEALTH,
            Self::UpdateCalamari => &UPDATE_CALAMARI,
            Self::Backup => &BACKUP,
            Self::Upgrade => &UPGRADE,
            Self::AdHocScript => &AD_HOC_SCRIPT,
            Self::SyncCommunityActionTemplates => &SYNC_COMMUNITY_ACTION_TEMPLATES,
        }
    }

    /// Server-side task name.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Whether the task runs at system level rather than inside a space.
    pub fn is_system_task(self) -> bool {
        matches!(self, Self::Backup | Self::SyncCommunityActionTemplates)
    }

    /// Returns `description` unless it is absent or blank, in which case the
    /// catalog default is used.
    pub fn describe(self, description: Option<&str>) -> String {
        match description {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => self.spec().default_description.to_string(),
        }
    }
}

impl fmt::Display for BuiltInTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
