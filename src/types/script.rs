//! Script languages accepted by ad-hoc script tasks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language of an ad-hoc script body.
///
/// Defaults to PowerShell, the language every server-side Tentacle can run.
///
/// # Examples
///
/// ```
/// use octopus_client::ScriptSyntax;
///
/// assert_eq!(ScriptSyntax::default(), ScriptSyntax::PowerShell);
/// assert_eq!(serde_json::to_value(ScriptSyntax::CSharp).unwrap(), "CSharp");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptSyntax {
    /// Windows PowerShell / PowerShell Core.
    #[default]
    PowerShell,
    /// Bash.
    Bash,
    /// C# script.
    CSharp,
    /// F# script.
    FSharp,
    /// Python.
    Python,
}

impl fmt::Display for ScriptSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PowerShell => "PowerShell",
            Self::Bash => "Bash",
            Self::CSharp => "CSharp",
            Self::FSharp => "FSharp",
            Self::Python => "Python",
        };
        f.write_str(name)
    }
}
