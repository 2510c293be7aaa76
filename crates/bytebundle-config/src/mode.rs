//! Compiler modes
//!
//! A mode names one of the built-in compiler delegate strategies. Only the
//! module-unification layout ships today; `basic` is a reserved name and is
//! rejected like any other unknown mode.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in compiler strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerMode {
    /// Module-unification project layout
    ModuleUnification,
}

impl CompilerMode {
    /// Names of every recognized mode
    pub const NAMES: &'static [&'static str] = &["module-unification"];

    /// Get the configuration name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleUnification => "module-unification",
        }
    }
}

impl fmt::Display for CompilerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompilerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module-unification" => Ok(Self::ModuleUnification),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}
