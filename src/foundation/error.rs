use crate::runtime::ImportResult;

/// Convenience result type used across the bridge.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Top-level error taxonomy used by bridge APIs.
///
/// Expected domain conditions (unknown names, out-of-range indices, queries on an
/// uninitialized artboard) are logged and answered with defaults instead of surfacing here.
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// The entity has not finished initializing (or was invalidated).
    #[error("not initialized: {0}")]
    NotInitialized(String),

    /// Importing an animation file failed.
    #[error("import failed: {0:?}")]
    Import(ImportResult),

    /// A cached device resource no longer matches the texture it was built for.
    #[error("device resource is stale: {0}")]
    DeviceResourceStale(String),

    /// The GPU device rejected an operation.
    #[error("device error: {0}")]
    Device(String),

    /// Render-target provisioning failed.
    #[error("provisioning error: {0}")]
    Provision(String),

    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Build a [`BridgeError::NotInitialized`] value.
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Self::NotInitialized(msg.into())
    }

    /// Build a [`BridgeError::DeviceResourceStale`] value.
    pub fn stale(msg: impl Into<String>) -> Self {
        Self::DeviceResourceStale(msg.into())
    }

    /// Build a [`BridgeError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`BridgeError::Provision`] value.
    pub fn provision(msg: impl Into<String>) -> Self {
        Self::Provision(msg.into())
    }

    /// Build a [`BridgeError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`BridgeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
