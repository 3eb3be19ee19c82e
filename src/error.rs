use thiserror::Error;

/// Saved-search input that cannot be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Saved search name must not be empty")]
    EmptyName,
}

/// Failures that are reported to the user. Anything else degrades to a
/// default value and is only logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Error loading pull requests: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AppError {
    pub fn missing(field: &str) -> Self {
        AppError::Configuration(format!("{field} is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            AppError::missing("Organization").to_string(),
            "Configuration error: Organization is required"
        );

        let err = AppError::Fetch(anyhow::anyhow!("timeout").context("Failed to list pull requests"));
        assert_eq!(
            err.to_string(),
            "Error loading pull requests: Failed to list pull requests: timeout"
        );

        let err: AppError = ValidationError::EmptyName.into();
        assert_eq!(err.to_string(), "Saved search name must not be empty");
    }
}
