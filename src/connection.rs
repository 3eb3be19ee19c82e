//! Where to fetch pull requests from, and with which credential.

use crate::auth::{self, TokenSource};
use crate::devops::AzureDevOpsClient;
use crate::error::AppError;
use crate::settings::Settings;
use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Azure DevOps organization
    #[arg(short, long, global = true)]
    pub organization: Option<String>,

    /// Project containing the repository
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Git repository name
    #[arg(short, long, global = true)]
    pub repository: Option<String>,

    /// Personal access token (can also be set via AZURE_DEVOPS_PAT env var)
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Repository web URL, e.g. https://dev.azure.com/org/project/_git/repo
    #[arg(long, global = true)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub token: String,
    pub token_source: TokenSource,
}

impl Connection {
    /// Writes the connection back so the next run can omit the flags. Tokens
    /// found in authinfo or the environment stay where they are.
    pub fn remember(&self, settings: &mut Settings) {
        settings.organization = self.organization.clone();
        settings.project = self.project.clone();
        settings.repository = self.repository.clone();
        if matches!(
            self.token_source,
            TokenSource::CommandLine | TokenSource::Settings
        ) {
            settings.personal_access_token = self.token.clone();
        }
    }
}

fn pick(flag: Option<&str>, from_url: Option<&str>, stored: &str) -> Option<String> {
    [flag, from_url, Some(stored)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Combines flags, the repository URL and stored settings, in that order.
/// Fails before any network call when a parameter is missing.
pub fn resolve_connection(args: &ConnectionArgs, settings: &Settings) -> Result<Connection, AppError> {
    let parsed = args
        .url
        .as_deref()
        .map(AzureDevOpsClient::parse_repository_url)
        .transpose()
        .map_err(|e| AppError::Configuration(format!("{e:#}")))?;

    let organization = pick(
        args.organization.as_deref(),
        parsed.as_ref().map(|p| p.organization.as_str()),
        &settings.organization,
    )
    .ok_or_else(|| AppError::missing("Organization"))?;
    let project = pick(
        args.project.as_deref(),
        parsed.as_ref().map(|p| p.project.as_str()),
        &settings.project,
    )
    .ok_or_else(|| AppError::missing("Project"))?;
    let repository = pick(
        args.repository.as_deref(),
        parsed.as_ref().map(|p| p.repository.as_str()),
        &settings.repository,
    )
    .ok_or_else(|| AppError::missing("Repository"))?;

    let (token, token_source) =
        auth::resolve_token(args.token.as_deref(), &settings.personal_access_token).ok_or_else(
            || {
                AppError::Configuration(
                    "Personal access token is required. Pass --token, set AZURE_DEVOPS_PAT or add \
                     'machine dev.azure.com login USER^azpr password TOKEN' to ~/.authinfo"
                        .to_string(),
                )
            },
        )?;

    tracing::debug!(%organization, %project, %repository, ?token_source, "resolved connection");

    Ok(Connection {
        organization,
        project,
        repository,
        token,
        token_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Settings {
        Settings {
            organization: "stored-org".to_string(),
            project: "stored-project".to_string(),
            repository: "stored-repo".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_flags_override_url_and_settings() {
        let args = ConnectionArgs {
            organization: Some("flag-org".to_string()),
            url: Some("https://dev.azure.com/url-org/url-project/_git/url-repo".to_string()),
            token: Some("secret".to_string()),
            ..ConnectionArgs::default()
        };

        let connection = resolve_connection(&args, &stored()).unwrap();
        assert_eq!(connection.organization, "flag-org");
        assert_eq!(connection.project, "url-project");
        assert_eq!(connection.repository, "url-repo");
        assert_eq!(connection.token, "secret");
        assert_eq!(connection.token_source, TokenSource::CommandLine);
    }

    #[test]
    fn test_settings_fill_missing_flags() {
        let args = ConnectionArgs {
            repository: Some("  ".to_string()),
            token: Some("secret".to_string()),
            ..ConnectionArgs::default()
        };

        let connection = resolve_connection(&args, &stored()).unwrap();
        assert_eq!(connection.organization, "stored-org");
        assert_eq!(connection.repository, "stored-repo");
    }

    #[test]
    fn test_missing_parameter_is_configuration_error() {
        let args = ConnectionArgs {
            token: Some("secret".to_string()),
            ..ConnectionArgs::default()
        };

        let err = resolve_connection(&args, &Settings::default()).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(err.to_string(), "Configuration error: Organization is required");
    }

    #[test]
    fn test_bad_url_is_configuration_error() {
        let args = ConnectionArgs {
            url: Some("https://example.com/nothing".to_string()),
            token: Some("secret".to_string()),
            ..ConnectionArgs::default()
        };

        let err = resolve_connection(&args, &stored()).unwrap_err();
        assert!(err.to_string().contains("Invalid Azure DevOps repository URL format"));
    }

    #[test]
    fn test_remember_keeps_external_tokens_out_of_settings() {
        let mut connection = Connection {
            organization: "o".to_string(),
            project: "p".to_string(),
            repository: "r".to_string(),
            token: "from-env".to_string(),
            token_source: TokenSource::Environment,
        };

        let mut settings = Settings::default();
        connection.remember(&mut settings);
        assert_eq!(settings.organization, "o");
        assert!(settings.personal_access_token.is_empty());

        connection.token_source = TokenSource::CommandLine;
        connection.remember(&mut settings);
        assert_eq!(settings.personal_access_token, "from-env");
    }
}
