// 🔑 Admin Session - Explicit, persisted login state
//
// The admin console receives an AdminSession value; nothing reads a
// global logged-in flag. Credential checking is delegated to a
// CredentialVerifier supplied by the embedding application (an identity
// service in production) - this crate ships no credential material.
//
// Lifecycle: begin() verifies and persists the session, resume() reloads
// it on startup, end() deletes it on logout.

use crate::db::StorageError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum AuthError {
    /// The verifier rejected the username/password pair
    InvalidCredentials,
    /// The verifier itself failed (identity service unreachable, etc.)
    Verifier(String),
    /// Session row could not be read or written
    Storage(StorageError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::Verifier(msg) => write!(f, "credential verifier failed: {}", msg),
            AuthError::Storage(e) => write!(f, "session storage failed: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::Storage(e)
    }
}

// ============================================================================
// CREDENTIAL VERIFIER
// ============================================================================

/// External identity collaborator. Implementations decide what a valid
/// username/password pair is; this crate only consumes the verdict.
pub trait CredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> Result<bool, AuthError>;
}

// ============================================================================
// ADMIN SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct AdminSession {
    /// Opaque session token (UUID)
    pub token: String,
    pub username: String,
    pub started_at: DateTime<Utc>,
}

impl AdminSession {
    /// Verify credentials and persist a new session. Any previous session
    /// is replaced - there is at most one admin session at a time.
    pub fn begin(
        conn: &Connection,
        verifier: &dyn CredentialVerifier,
        username: &str,
        password: &str,
    ) -> Result<AdminSession, AuthError> {
        if !verifier.verify(username, password)? {
            return Err(AuthError::InvalidCredentials);
        }

        let session = AdminSession {
            token: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            started_at: Utc::now(),
        };

        conn.execute("DELETE FROM admin_sessions", [])
            .map_err(StorageError::from)?;
        conn.execute(
            "INSERT INTO admin_sessions (token, username, started_at) VALUES (?1, ?2, ?3)",
            params![
                session.token,
                session.username,
                session.started_at.to_rfc3339()
            ],
        )
        .map_err(StorageError::from)?;

        Ok(session)
    }

    /// Reload the persisted session on startup, if one exists
    pub fn resume(conn: &Connection) -> Result<Option<AdminSession>, StorageError> {
        let mut stmt =
            conn.prepare("SELECT token, username, started_at FROM admin_sessions LIMIT 1")?;
        let mut rows = stmt.query_map([], |row| {
            let started_at: String = row.get(2)?;
            Ok(AdminSession {
                token: row.get(0)?,
                username: row.get(1)?,
                started_at: DateTime::parse_from_rfc3339(&started_at)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
            })
        })?;

        match rows.next() {
            Some(session) => Ok(Some(session?)),
            None => Ok(None),
        }
    }

    /// Log out: remove the persisted session
    pub fn end(self, conn: &Connection) -> Result<(), StorageError> {
        conn.execute(
            "DELETE FROM admin_sessions WHERE token = ?1",
            params![self.token],
        )?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    /// Test stand-in for the identity service
    struct StubVerifier {
        accept: bool,
    }

    impl CredentialVerifier for StubVerifier {
        fn verify(&self, _username: &str, _password: &str) -> Result<bool, AuthError> {
            Ok(self.accept)
        }
    }

    struct BrokenVerifier;

    impl CredentialVerifier for BrokenVerifier {
        fn verify(&self, _username: &str, _password: &str) -> Result<bool, AuthError> {
            Err(AuthError::Verifier("identity service unreachable".into()))
        }
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_begin_resume_end() {
        let conn = conn();
        let verifier = StubVerifier { accept: true };

        let session = AdminSession::begin(&conn, &verifier, "admin", "secret").unwrap();
        assert_eq!(session.username, "admin");

        let resumed = AdminSession::resume(&conn).unwrap().unwrap();
        assert_eq!(resumed.token, session.token);

        session.end(&conn).unwrap();
        assert!(AdminSession::resume(&conn).unwrap().is_none());
    }

    #[test]
    fn test_rejected_credentials_leave_no_session() {
        let conn = conn();
        let verifier = StubVerifier { accept: false };

        let result = AdminSession::begin(&conn, &verifier, "admin", "wrong");
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(AdminSession::resume(&conn).unwrap().is_none());
    }

    #[test]
    fn test_verifier_failure_propagates() {
        let conn = conn();
        let result = AdminSession::begin(&conn, &BrokenVerifier, "admin", "secret");
        assert!(matches!(result, Err(AuthError::Verifier(_))));
    }

    #[test]
    fn test_new_login_replaces_old_session() {
        let conn = conn();
        let verifier = StubVerifier { accept: true };

        let first = AdminSession::begin(&conn, &verifier, "admin", "secret").unwrap();
        let second = AdminSession::begin(&conn, &verifier, "admin", "secret").unwrap();
        assert_ne!(first.token, second.token);

        let resumed = AdminSession::resume(&conn).unwrap().unwrap();
        assert_eq!(resumed.token, second.token);
    }
}
