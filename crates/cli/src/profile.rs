use crate::{env::EnvManager, error::CliError};
use connectors::salesforce::profile::ConnectionProfile;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tracing::debug;

const PROFILE_DIR: &str = ".soql-export";
const PROFILE_FILE: &str = "connection.json";

/// Variables read into the profile, with the profile field each one fills.
const ENV_FIELDS: &[(&str, &str)] = &[
    ("SF_HOST", "host"),
    ("SF_LOGIN", "login"),
    ("SF_PASSWORD", "password"),
    ("SF_SECURITY_TOKEN", "security_token"),
    ("SF_SANDBOX", "sandbox"),
    ("SF_API_VERSION", "api_version"),
];

/// Resolves the connection profile.
///
/// An explicit `--connection` file wins, then `SF_*` variables, then
/// `~/.soql-export/connection.json`.
pub fn load_profile(path: Option<&Path>, env: &EnvManager) -> Result<ConnectionProfile, CliError> {
    if let Some(path) = path {
        debug!(path = %path.display(), "Reading connection profile");
        return read_profile(path);
    }

    if let Some(profile) = profile_from_env(env)? {
        debug!("Using connection profile from environment");
        return Ok(profile);
    }

    let default = default_profile_path()?;
    if default.exists() {
        debug!(path = %default.display(), "Reading default connection profile");
        return read_profile(&default);
    }

    Err(CliError::Config(format!(
        "No connection profile: pass --connection, set SF_* variables or create {}",
        default.display()
    )))
}

fn read_profile(path: &Path) -> Result<ConnectionProfile, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("Failed to read connection profile {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(CliError::ProfileParse)
}

fn default_profile_path() -> Result<PathBuf, CliError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Config("Could not determine home directory".into()))?;
    Ok(home.join(PROFILE_DIR).join(PROFILE_FILE))
}

/// Builds a profile from `SF_*` variables; `None` when neither a login nor a host is set.
fn profile_from_env(env: &EnvManager) -> Result<Option<ConnectionProfile>, CliError> {
    if env.get("SF_LOGIN").is_none() && env.get("SF_HOST").is_none() {
        return Ok(None);
    }

    let mut fields = Map::new();
    fields.insert(
        "auth_type".into(),
        json!(env.get("SF_AUTH_TYPE").unwrap_or("password").to_lowercase()),
    );
    for (var, field) in ENV_FIELDS {
        if let Some(value) = env.get(var) {
            fields.insert((*field).into(), json!(value));
        }
    }
    if let Some(raw) = env.get("SF_TIMEOUT_SECS") {
        let secs: u64 = raw
            .parse()
            .map_err(|_| CliError::Config(format!("SF_TIMEOUT_SECS is not a number: {raw}")))?;
        fields.insert("request_timeout_secs".into(), json!(secs));
    }

    serde_json::from_value(Value::Object(fields))
        .map(Some)
        .map_err(CliError::ProfileParse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::salesforce::profile::Credentials;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> EnvManager {
        let mut env = EnvManager::default();
        for (k, v) in pairs {
            env.set(*k, *v);
        }
        env
    }

    #[test]
    fn test_password_profile_from_env() {
        let env = env(&[
            ("SF_LOGIN", "ops@example.com"),
            ("SF_PASSWORD", "pw"),
            ("SF_SECURITY_TOKEN", "tok"),
            ("SF_SANDBOX", "1"),
            ("SF_TIMEOUT_SECS", "30"),
        ]);

        let profile = profile_from_env(&env).unwrap().unwrap();
        assert_eq!(profile.request_timeout_secs, 30);
        assert_eq!(
            profile.credentials,
            Credentials::Password {
                login: "ops@example.com".into(),
                password: "pw".into(),
                security_token: Some("tok".into()),
                sandbox: true,
                host: None,
            }
        );
    }

    #[test]
    fn test_direct_profile_from_env() {
        let env = env(&[
            ("SF_AUTH_TYPE", "DIRECT"),
            ("SF_HOST", "https://na1.salesforce.com"),
            ("SF_PASSWORD", "00D!sid"),
            ("SF_API_VERSION", "v42.0"),
        ]);

        let profile = profile_from_env(&env).unwrap().unwrap();
        assert_eq!(profile.version(), "42.0");
        assert!(matches!(
            profile.credentials,
            Credentials::Direct { ref instance_url, .. } if instance_url == "https://na1.salesforce.com"
        ));
    }

    #[test]
    fn test_empty_env_gives_no_profile() {
        assert!(profile_from_env(&EnvManager::default()).unwrap().is_none());
        assert!(profile_from_env(&env(&[("SF_LOGIN", "x"), ("SF_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_connection_file_wins_over_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conn.json");
        std::fs::write(
            &path,
            r#"{"auth_type": "direct", "instance_url": "https://eu1.salesforce.com", "session_id": "sid"}"#,
        )
        .unwrap();

        let env = env(&[("SF_LOGIN", "ops@example.com"), ("SF_PASSWORD", "pw")]);
        let profile = load_profile(Some(&path), &env).unwrap();
        assert!(matches!(profile.credentials, Credentials::Direct { .. }));
    }
}
