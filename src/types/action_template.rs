//! Step (action) template shapes consumed by step template runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The parts of a step template needed to run it as an ad-hoc task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionTemplateResource {
    /// Template identifier (`ActionTemplates-1`). Required to run the template.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name, used in the default task description.
    #[serde(default)]
    pub name: String,

    /// Space the template lives in.
    #[serde(default)]
    pub space_id: Option<String>,

    /// Template version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Step type the template wraps (`Octopus.Script`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
}

impl ActionTemplateResource {
    /// Creates a template reference with an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the owning space.
    pub fn with_space(mut self, space_id: impl Into<String>) -> Self {
        self.space_id = Some(space_id.into());
        self
    }
}

/// A template parameter value, optionally marked sensitive.
///
/// Plain values serialize as a bare string; sensitive values as
/// `{ "HasValue": true, "NewValue": "..." }`, matching the server's property
/// value encoding.
///
/// # Examples
///
/// ```
/// use octopus_client::PropertyValueResource;
///
/// let plain = serde_json::to_value(PropertyValueResource::from("hello")).unwrap();
/// assert_eq!(plain, "hello");
///
/// let secret = serde_json::to_value(PropertyValueResource::sensitive("s3cr3t")).unwrap();
/// assert_eq!(secret["HasValue"], true);
/// assert_eq!(secret["NewValue"], "s3cr3t");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValueResource {
    /// Ordinary value.
    Value(String),
    /// Sensitive value, never echoed back by the server.
    Sensitive {
        /// Whether a value is set.
        #[serde(rename = "HasValue")]
        has_value: bool,
        /// The new value, when setting one.
        #[serde(rename = "NewValue", default, skip_serializing_if = "Option::is_none")]
        new_value: Option<String>,
    },
}

impl PropertyValueResource {
    /// Creates a sensitive value.
    pub fn sensitive(value: impl Into<String>) -> Self {
        Self::Sensitive {
            has_value: true,
            new_value: Some(value.into()),
        }
    }
}

impl From<&str> for PropertyValueResource {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for PropertyValueResource {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

/// Template parameter values keyed by parameter name.
pub type PropertyValues = HashMap<String, PropertyValueResource>;
