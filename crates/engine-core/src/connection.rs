use crate::error::EngineError;
use connectors::salesforce::{auth, profile::ConnectionProfile, session::Session};
use tokio::sync::OnceCell;
use tracing::info;

/// A connection profile plus the session opened from it.
///
/// Login happens on first use and at most once; every page of every query
/// issued through the same `Connection` reuses that session.
#[derive(Debug)]
pub struct Connection {
    profile: ConnectionProfile,
    session: OnceCell<Session>,
}

impl Connection {
    pub fn new(profile: ConnectionProfile) -> Self {
        Connection {
            profile,
            session: OnceCell::new(),
        }
    }

    /// Wraps an already opened session.
    pub fn with_session(profile: ConnectionProfile, session: Session) -> Self {
        Connection {
            profile,
            session: OnceCell::new_with(Some(session)),
        }
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.initialized()
    }

    pub async fn session(&self) -> Result<&Session, EngineError> {
        self.session
            .get_or_try_init(|| async {
                let session = auth::login(&self.profile)
                    .await
                    .map_err(EngineError::Authentication)?;
                info!(instance = %session.instance_url(), "Session established");
                Ok(session)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::salesforce::profile::Credentials;

    fn direct() -> ConnectionProfile {
        ConnectionProfile::new(Credentials::Direct {
            instance_url: "https://na1.salesforce.com".into(),
            session_id: "00D!sid".into(),
        })
    }

    #[tokio::test]
    async fn test_session_is_reused() {
        let conn = Connection::new(direct());
        assert!(!conn.is_logged_in());

        let first = conn.session().await.unwrap() as *const Session;
        let second = conn.session().await.unwrap() as *const Session;
        assert!(conn.is_logged_in());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_existing_session_skips_login() {
        let session = auth::login(&direct()).await.unwrap();
        let conn = Connection::with_session(
            ConnectionProfile::new(Credentials::Direct {
                instance_url: "".into(),
                session_id: "".into(),
            }),
            session,
        );

        assert!(conn.is_logged_in());
        let session = conn.session().await.unwrap();
        assert_eq!(session.instance_url().as_str(), "https://na1.salesforce.com/");
    }

    #[tokio::test]
    async fn test_bad_profile_is_authentication_error() {
        let conn = Connection::new(ConnectionProfile::new(Credentials::Direct {
            instance_url: "".into(),
            session_id: "00D!sid".into(),
        }));
        assert!(matches!(
            conn.session().await,
            Err(EngineError::Authentication(_))
        ));
        assert!(!conn.is_logged_in());
    }
}
