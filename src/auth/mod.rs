//! Identity provider boundary.
//!
//! The client never owns credentials beyond a single session: it asks the
//! provider to sign in, sign up or sign out and learns about the result
//! through [`IdentityProvider::subscribe`].

mod bridge;
mod firebase;

pub use bridge::mirror_auth_state;
pub use firebase::{FirebaseAuth, DEFAULT_IDENTITY_URL};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::store::User;

/// User record as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        User {
            id: user.uid,
            name: user.display_name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email")]
    InvalidEmail,

    #[error("user not found")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("no user is signed in")]
    NotSignedIn,

    /// Any other provider error, carrying its raw message.
    #[error("{0}")]
    Provider(String),

    #[error("could not reach identity provider: {0}")]
    Network(#[from] reqwest::Error),
}

impl AuthError {
    /// Message shown on the login screen.
    pub fn login_message(&self) -> String {
        match self {
            AuthError::InvalidEmail => "Invalid email".to_string(),
            AuthError::UserNotFound => "User not found".to_string(),
            AuthError::WrongPassword => "Wrong password".to_string(),
            AuthError::InvalidCredential => "Invalid credential".to_string(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Creates the account and signs the new user in.
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Sets the display name of the signed-in user.
    async fn update_profile(&self, display_name: &str) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Current sign-in state; a new value is published on every change.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}
