//! Authentication collaborator used by the login endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Wrong login or password")]
    InvalidCredentials,
    #[error("Account {0} is disabled")]
    AccountDisabled(String),
    #[error("Authentication backend unavailable: {0}")]
    Unavailable(String),
}

/// Checks a credential pair. `auth` is whatever the user typed as their
/// identifier, either a login or an email address.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, auth: &str, password: &str) -> Result<LoginResult, AuthError>;
}

/// An account known to [`MemoryAuthenticator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Plain in-memory account list, for development and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthenticator {
    accounts: Vec<Account>,
}

impl MemoryAuthenticator {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn find(&self, auth: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| {
            account.login == auth
                || account
                    .email
                    .as_deref()
                    .is_some_and(|email| email.eq_ignore_ascii_case(auth))
        })
    }
}

#[async_trait]
impl Authenticator for MemoryAuthenticator {
    async fn authenticate(&self, auth: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some(account) = self.find(auth) else {
            debug!("No account matches {}", auth);
            return Err(AuthError::InvalidCredentials);
        };

        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        if account.disabled {
            return Err(AuthError::AccountDisabled(account.login.clone()));
        }

        Ok(LoginResult {
            login: account.login.clone(),
            email: account.email.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> MemoryAuthenticator {
        MemoryAuthenticator::new(vec![
            Account {
                login: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
                password: "wonderland".to_string(),
                disabled: false,
            },
            Account {
                login: "mallory".to_string(),
                email: None,
                password: "secret".to_string(),
                disabled: true,
            },
        ])
    }

    #[tokio::test]
    async fn test_login_by_name_or_email() {
        let auth = authenticator();

        let by_login = auth.authenticate("alice", "wonderland").await.unwrap();
        let by_email = auth
            .authenticate("Alice@Example.com", "wonderland")
            .await
            .unwrap();

        assert_eq!(by_login, by_email);
        assert_eq!(by_login.login, "alice");
    }

    #[tokio::test]
    async fn test_rejections() {
        let auth = authenticator();

        assert_eq!(
            auth.authenticate("alice", "nope").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.authenticate("bob", "wonderland").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.authenticate("mallory", "secret").await,
            Err(AuthError::AccountDisabled("mallory".to_string()))
        );
    }
}
