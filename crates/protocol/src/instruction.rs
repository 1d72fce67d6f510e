use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEPENDENCY_PREFIX: &str = "dependency:";

/// Where an instruction was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InstructionSource {
    /// Authored inside the project itself.
    #[default]
    Local,
    /// Shipped by an installed dependency package.
    Dependency(String),
}

impl fmt::Display for InstructionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Dependency(name) => write!(f, "{DEPENDENCY_PREFIX}{name}"),
        }
    }
}

impl FromStr for InstructionSource {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw == "local" {
            return Ok(Self::Local);
        }
        match raw.strip_prefix(DEPENDENCY_PREFIX) {
            Some(name) if !name.trim().is_empty() => Ok(Self::Dependency(name.trim().to_string())),
            Some(_) => Err("dependency source requires a package name".to_string()),
            None => Err(format!(
                "unknown instruction source '{raw}' (expected 'local' or 'dependency:<name>')"
            )),
        }
    }
}

impl TryFrom<String> for InstructionSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstructionSource> for String {
    fn from(value: InstructionSource) -> Self {
        value.to_string()
    }
}

/// A scoped markdown directive produced by the discovery stage.
///
/// The engine never mutates instructions; it only decides where copies of
/// them get materialized. Identity is the owning file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub name: String,

    /// File the instruction was parsed from
    pub file_path: PathBuf,

    #[serde(default)]
    pub source: InstructionSource,

    /// Scope glob; `None` or blank means the instruction is global
    #[serde(default, alias = "applyTo", skip_serializing_if = "Option::is_none")]
    pub apply_to: Option<String>,

    /// Opaque markdown body
    #[serde(default)]
    pub content: String,
}

impl Instruction {
    pub fn new(
        name: impl Into<String>,
        file_path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            source: InstructionSource::Local,
            apply_to: None,
            content: content.into(),
        }
    }

    pub fn with_scope(mut self, pattern: impl Into<String>) -> Self {
        self.apply_to = Some(pattern.into());
        self
    }

    pub fn with_source(mut self, source: InstructionSource) -> Self {
        self.source = source;
        self
    }

    /// Normalized scope pattern, if any.
    pub fn scope(&self) -> Option<&str> {
        self.apply_to
            .as_deref()
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
    }

    pub fn is_global(&self) -> bool {
        self.scope().is_none()
    }

    pub fn identity(&self) -> &Path {
        &self.file_path
    }

    pub fn same_as(&self, other: &Instruction) -> bool {
        self.file_path == other.file_path
    }
}
