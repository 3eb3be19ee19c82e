use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MACHINE: &str = "dev.azure.com";
const LOGIN_SUFFIX: &str = "^azpr";
const TOKEN_ENV: &str = "AZURE_DEVOPS_PAT";

/// One `machine ... login ... password ...` entry of an authinfo/netrc file
#[derive(Debug, Clone, PartialEq)]
pub struct AuthInfo {
    pub machine: String,
    pub login: String,
    pub password: String,
}

impl AuthInfo {
    fn is_azpr_entry(&self) -> bool {
        self.machine == MACHINE && self.login.ends_with(LOGIN_SUFFIX)
    }
}

/// Where the personal access token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    CommandLine,
    AuthInfo,
    Environment,
    Settings,
}

/// Picks the personal access token by priority: command line, then
/// `~/.authinfo`/`~/.netrc`, then `AZURE_DEVOPS_PAT`, then the stored setting.
pub fn resolve_token(cli_token: Option<&str>, stored: &str) -> Option<(String, TokenSource)> {
    let home = std::env::var("HOME").ok().map(PathBuf::from);
    let env_token = std::env::var(TOKEN_ENV).ok();
    resolve_token_from(cli_token, home.as_deref(), env_token.as_deref(), stored)
}

fn resolve_token_from(
    cli_token: Option<&str>,
    home: Option<&Path>,
    env_token: Option<&str>,
    stored: &str,
) -> Option<(String, TokenSource)> {
    let non_empty = |t: &str| !t.trim().is_empty();

    if let Some(token) = cli_token.filter(|t| non_empty(t)) {
        return Some((token.trim().to_string(), TokenSource::CommandLine));
    }

    if let Some(home) = home {
        match read_authinfo_token(home) {
            Ok(Some(token)) => return Some((token, TokenSource::AuthInfo)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "skipping authinfo"),
        }
    }

    if let Some(token) = env_token.filter(|t| non_empty(t)) {
        return Some((token.trim().to_string(), TokenSource::Environment));
    }

    if non_empty(stored) {
        return Some((stored.trim().to_string(), TokenSource::Settings));
    }

    None
}

/// Reads the token from `~/.authinfo`, then `~/.netrc`.
/// Looks for entries matching: machine dev.azure.com login USERNAME^azpr password TOKEN
fn read_authinfo_token(home: &Path) -> Result<Option<String>> {
    for path in [home.join(".authinfo"), home.join(".netrc")] {
        if !path.exists() {
            continue;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = fs::metadata(&path)?.permissions().mode() & 0o777;
            if mode != 0o600 && mode != 0o400 {
                tracing::warn!(
                    path = %path.display(),
                    mode = %format!("{mode:o}"),
                    "credentials file should be 600 or 400"
                );
            }
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if let Some(entry) = parse_authinfo(&contents).into_iter().find(AuthInfo::is_azpr_entry) {
            return Ok(Some(entry.password));
        }
    }

    Ok(None)
}

/// Parses every complete entry of an authinfo/netrc file.
/// Format: machine HOSTNAME login USERNAME password PASSWORD
fn parse_authinfo(contents: &str) -> Vec<AuthInfo> {
    let mut entries = Vec::new();
    let mut machine: Option<&str> = None;
    let mut login: Option<&str> = None;
    let mut password: Option<&str> = None;

    let mut push = |m: Option<&str>, l: Option<&str>, p: Option<&str>| {
        if let (Some(machine), Some(login), Some(password)) = (m, l, p) {
            entries.push(AuthInfo {
                machine: machine.to_string(),
                login: login.to_string(),
                password: password.to_string(),
            });
        }
    };

    let mut tokens = contents.split_whitespace();
    while let Some(keyword) = tokens.next() {
        match keyword {
            "machine" => {
                push(machine, login, password);
                machine = tokens.next();
                login = None;
                password = None;
            }
            "login" => login = tokens.next(),
            "password" => password = tokens.next(),
            _ => {}
        }
    }
    push(machine, login, password);

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authinfo_basic() {
        let entries = parse_authinfo("machine dev.azure.com login me^azpr password pat123");
        assert_eq!(
            entries,
            vec![AuthInfo {
                machine: "dev.azure.com".to_string(),
                login: "me^azpr".to_string(),
                password: "pat123".to_string(),
            }]
        );
        assert!(entries[0].is_azpr_entry());
    }

    #[test]
    fn test_parse_authinfo_multiple_entries() {
        let content = r#"
            machine example.com login user1 password pass1
            machine dev.azure.com login me^azpr password pat123
            machine other.com login user2 password pass2
        "#;
        let entries = parse_authinfo(content);
        assert_eq!(entries.len(), 3);

        let found = entries.into_iter().find(AuthInfo::is_azpr_entry).unwrap();
        assert_eq!(found.password, "pat123");
    }

    #[test]
    fn test_parse_authinfo_multiline() {
        let content = r#"
machine dev.azure.com
login me^azpr
password pat123
"#;
        let entries = parse_authinfo(content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].password, "pat123");
    }

    #[test]
    fn test_entries_without_suffix_or_machine_are_ignored() {
        let entries = parse_authinfo(
            "machine dev.azure.com login me password a\nmachine azure.com login me^azpr password b",
        );
        assert!(!entries.iter().any(AuthInfo::is_azpr_entry));
    }

    #[test]
    fn test_priority_order() {
        let home = tempfile::tempdir().unwrap();
        let authinfo = home.path().join(".authinfo");
        fs::write(&authinfo, "machine dev.azure.com login me^azpr password from-file").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&authinfo, fs::Permissions::from_mode(0o600)).unwrap();
        }

        let resolved = resolve_token_from(Some("cli"), Some(home.path()), Some("env"), "stored");
        assert_eq!(resolved, Some(("cli".to_string(), TokenSource::CommandLine)));

        let resolved = resolve_token_from(None, Some(home.path()), Some("env"), "stored");
        assert_eq!(resolved, Some(("from-file".to_string(), TokenSource::AuthInfo)));

        let empty_home = tempfile::tempdir().unwrap();
        let resolved = resolve_token_from(None, Some(empty_home.path()), Some("env"), "stored");
        assert_eq!(resolved, Some(("env".to_string(), TokenSource::Environment)));

        let resolved = resolve_token_from(Some("  "), Some(empty_home.path()), None, "stored");
        assert_eq!(resolved, Some(("stored".to_string(), TokenSource::Settings)));

        assert_eq!(resolve_token_from(None, None, None, ""), None);
    }
}
