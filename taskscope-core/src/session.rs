//! Session context — the signed-in user's Drive token and profile
//!
//! Replaces ambient browser storage with an explicit object handed to the
//! loaders. The token is set on login and cleared on logout or when the
//! archive source rejects it.
//!
//! The session also hands out load generations: a new load supersedes any
//! load still in flight, and callers drop results whose generation is no
//! longer current.

use crate::error::{ArchiveError, TaskscopeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile returned by the identity provider's userinfo endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Hosted (workspace) domain of the account, if any.
    #[serde(default)]
    pub hd: Option<String>,
}

/// Token handed over by the authentication provider.
#[derive(Debug, Clone)]
struct Credentials {
    access_token: String,
    profile: UserProfile,
    logged_in_at: DateTime<Utc>,
}

/// Ticket for one load. Compare with [`Session::is_current`] before applying
/// its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadGeneration(u64);

#[derive(Debug, Default)]
pub struct Session {
    credentials: Option<Credentials>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token after checking the profile's hosted domain against
    /// `allowed_domains`. An empty allow-list accepts any account.
    pub fn login(
        &mut self,
        access_token: impl Into<String>,
        profile: UserProfile,
        allowed_domains: &[String],
    ) -> Result<(), TaskscopeError> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(TaskscopeError::Login("empty access token".to_string()));
        }

        if !allowed_domains.is_empty() {
            let permitted = profile
                .hd
                .as_deref()
                .is_some_and(|hd| allowed_domains.iter().any(|d| d.eq_ignore_ascii_case(hd)));
            if !permitted {
                tracing::warn!(domain = ?profile.hd, "Login rejected: email domain not permitted");
                return Err(TaskscopeError::Login(
                    "Your email domain is not permitted.".to_string(),
                ));
            }
        }

        tracing::info!(email = ?profile.email, "Session started");
        self.credentials = Some(Credentials {
            access_token,
            profile,
            logged_in_at: Utc::now(),
        });
        Ok(())
    }

    pub fn logout(&mut self) {
        if self.credentials.take().is_some() {
            tracing::info!("Session cleared");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn token(&self) -> Result<&str, ArchiveError> {
        self.credentials
            .as_ref()
            .map(|c| c.access_token.as_str())
            .ok_or(ArchiveError::NotLoggedIn)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.credentials.as_ref().map(|c| &c.profile)
    }

    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.credentials.as_ref().map(|c| c.logged_in_at)
    }

    /// Start a new load, superseding any earlier one.
    pub fn begin_load(&mut self) -> LoadGeneration {
        self.generation += 1;
        LoadGeneration(self.generation)
    }

    pub fn is_current(&self, generation: LoadGeneration) -> bool {
        generation.0 == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(hd: Option<&str>) -> UserProfile {
        UserProfile {
            email: Some("dev@example.com".to_string()),
            name: Some("Dev".to_string()),
            picture: None,
            hd: hd.map(str::to_string),
        }
    }

    #[test]
    fn test_login_and_logout() {
        let mut session = Session::new();
        assert!(matches!(session.token(), Err(ArchiveError::NotLoggedIn)));

        session.login("tok", profile(None), &[]).unwrap();
        assert_eq!(session.token().unwrap(), "tok");
        assert!(session.logged_in_at().is_some());
        assert_eq!(session.profile().unwrap().name.as_deref(), Some("Dev"));

        session.logout();
        assert!(!session.is_logged_in());
        assert!(session.profile().is_none());
    }

    #[test]
    fn test_domain_allow_list() {
        let allowed = vec!["example.com".to_string()];
        let mut session = Session::new();

        assert!(session.login("tok", profile(Some("other.org")), &allowed).is_err());
        assert!(session.login("tok", profile(None), &allowed).is_err());
        assert!(!session.is_logged_in());

        session.login("tok", profile(Some("Example.com")), &allowed).unwrap();
        assert!(session.is_logged_in());
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut session = Session::new();
        assert!(session.login("", profile(None), &[]).is_err());
    }

    #[test]
    fn test_new_load_supersedes_previous() {
        let mut session = Session::new();
        let first = session.begin_load();
        assert!(session.is_current(first));

        let second = session.begin_load();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert!(second > first);
    }
}
