use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use super::{AuthError, AuthUser, IdentityProvider};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
struct Session {
    user: AuthUser,
    id_token: String,
}

/// Email/password accounts over the Identity Toolkit REST API.
///
/// The session lives only for the life of the process.
pub struct FirebaseAuth {
    client: Client,
    base_url: String,
    api_key: String,
    session: Mutex<Option<Session>>,
    state: watch::Sender<Option<AuthUser>>,
}

impl FirebaseAuth {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            session: Mutex::new(None),
            state,
        }
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<AccountResponse, AuthError> {
        let url = format!("{}/accounts:{method}", self.base_url);
        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(resp.json().await?);
        }
        let status = resp.status();
        match resp.json::<ErrorEnvelope>().await {
            Ok(envelope) => Err(map_error(&envelope.error.message)),
            Err(_) => Err(AuthError::Provider(format!("identity provider returned {status}"))),
        }
    }

    fn start_session(&self, account: AccountResponse) -> Result<AuthUser, AuthError> {
        let user = AuthUser {
            uid: account.local_id,
            display_name: account.display_name.filter(|name| !name.is_empty()),
            email: account.email,
        };
        let id_token = account
            .id_token
            .ok_or_else(|| AuthError::Provider("response carried no id token".into()))?;
        self.replace_session(Some(Session {
            user: user.clone(),
            id_token,
        }));
        Ok(user)
    }

    fn replace_session(&self, session: Option<Session>) {
        let user = session.as_ref().map(|s| s.user.clone());
        match self.session.lock() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
        self.state.send_replace(user);
    }

    fn current_session(&self) -> Option<Session> {
        match self.session.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Error messages look like `EMAIL_NOT_FOUND` or `WEAK_PASSWORD : Password should be ...`.
fn map_error(message: &str) -> AuthError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "INVALID_PASSWORD" => AuthError::WrongPassword,
        "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredential,
        _ => AuthError::Provider(message.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let account = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.start_session(account)
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let account = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.start_session(account)
    }

    async fn update_profile(&self, display_name: &str) -> Result<(), AuthError> {
        let session = self.current_session().ok_or(AuthError::NotSignedIn)?;
        let account = self
            .call(
                "update",
                &ProfileRequest {
                    id_token: &session.id_token,
                    display_name,
                    return_secure_token: true,
                },
            )
            .await?;

        let mut user = session.user;
        user.display_name = Some(display_name.to_string());
        if account.email.is_some() {
            user.email = account.email;
        }
        let id_token = account.id_token.unwrap_or(session.id_token);
        if account.local_id != user.uid {
            warn!(expected = %user.uid, got = %account.local_id, "profile update returned another account");
        }
        self.replace_session(Some(Session { user, id_token }));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.replace_session(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }
}
