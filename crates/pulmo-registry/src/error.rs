use std::fmt;

/// Errors a [`crate::ModelRegistry`] implementation or the publisher may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Promotion was requested but the model has no registered versions.
    NoVersionsRegistered { name: String },
    /// A specific version does not exist for this model name.
    VersionNotFound { name: String, version: u32 },
    /// A stage transition was rejected, or succeeded only partially
    /// (promotion without archival or vice versa). Never silently ignored.
    TransitionFailure { name: String, detail: String },
    /// Network or transport failure reaching the registry.
    Transport(String),
    /// A registry response could not be decoded.
    Decode(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NoVersionsRegistered { name } => {
                write!(f, "NO_VERSIONS_REGISTERED: model {name} has no versions")
            }
            RegistryError::VersionNotFound { name, version } => {
                write!(f, "VERSION_NOT_FOUND: model {name} version {version}")
            }
            RegistryError::TransitionFailure { name, detail } => {
                write!(f, "TRANSITION_FAILURE: model {name}: {detail}")
            }
            RegistryError::Transport(msg) => write!(f, "registry transport error: {msg}"),
            RegistryError::Decode(msg) => write!(f, "registry decode error: {msg}"),
        }
    }
}

impl std::error::Error for RegistryError {}
