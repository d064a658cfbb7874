use thiserror::Error;

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("plugin {plugin_id} is already installed in {workspace_id}/{project_id}")]
    AlreadyInstalled {
        plugin_id: String,
        workspace_id: String,
        project_id: String,
    },

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("storage quota exceeded writing '{key}': {attempted} bytes over a {limit} byte limit")]
    QuotaExceeded {
        key: String,
        attempted: u64,
        limit: u64,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MarketplaceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyInstalled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PluginNotFound(_))
    }

    /// Callers should ask for a smaller payload rather than retry.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

impl From<config::ConfigError> for MarketplaceError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_field() {
        let err = MarketplaceError::MissingField {
            field: "workspaceId",
        };
        assert_eq!(err.to_string(), "missing required field: workspaceId");
        assert!(err.is_validation());
        assert!(!err.is_quota_exceeded());
    }

    #[test]
    fn test_categories_are_distinguishable() {
        let quota = MarketplaceError::QuotaExceeded {
            key: "submittedPlugins".into(),
            attempted: 10,
            limit: 5,
        };
        assert!(quota.is_quota_exceeded());
        assert!(!quota.is_conflict());

        let generic = MarketplaceError::Internal(anyhow::anyhow!("boom"));
        assert!(!generic.is_quota_exceeded());
        assert!(!generic.is_not_found());
        assert!(!generic.is_validation());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: MarketplaceError = config::ConfigError::Message("bad backend".into()).into();
        assert!(matches!(err, MarketplaceError::Config(ref msg) if msg.contains("bad backend")));
    }
}
