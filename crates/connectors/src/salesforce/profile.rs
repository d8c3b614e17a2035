use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_API_VERSION: &str = "38.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// How a session is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum Credentials {
    /// Username/password login; the security token is appended to the password.
    Password {
        login: String,
        password: String,
        #[serde(default)]
        security_token: Option<String>,
        #[serde(default, deserialize_with = "deserialize_flag")]
        sandbox: bool,
        /// Login domain override (`login.salesforce.com` / `test.salesforce.com` otherwise).
        #[serde(default)]
        host: Option<String>,
    },

    /// An already issued session: instance URL plus session id.
    Direct {
        #[serde(alias = "host")]
        instance_url: String,
        #[serde(alias = "password")]
        session_id: String,
    },
}

/// Everything needed to open a session against the remote query API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(flatten)]
    pub credentials: Credentials,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl ConnectionProfile {
    pub fn new(credentials: Credentials) -> Self {
        ConnectionProfile {
            credentials,
            api_version: default_api_version(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// API version without a leading `v` ("v38.0" and "38.0" both give "38.0").
    pub fn version(&self) -> &str {
        self.api_version.trim_start_matches(['v', 'V'])
    }

    /// Base path of the versioned REST API.
    pub fn data_path(&self) -> String {
        format!("/services/data/v{}", self.version())
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Reads a loose truthy flag: `true`, `1`, `yes`, `y` (any case).
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => parse_flag(&s),
        _ => false,
    })
}
