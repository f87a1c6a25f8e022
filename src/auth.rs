use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// An authenticated session. `user_id` is the stable identifier stamped onto
/// every task and list the user owns; `id_token` authorizes store requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("email ou senha inválidos")]
    InvalidCredentials,
    #[error("este email já está registado")]
    EmailExists,
    #[error("senha demasiado fraca")]
    WeakPassword,
    #[error("falha de rede: {0}")]
    Network(String),
    #[error("erro do provedor de identidade: {0}")]
    Backend(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialResponse {
    local_id: String,
    id_token: String,
    email: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity-provider client speaking an Identity-Toolkit-style password API:
/// `accounts:signInWithPassword` and `accounts:signUp`, keyed by the project
/// API key.
#[derive(Clone)]
pub struct AuthClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AuthError> {
        let http = Client::builder()
            .build()
            .map_err(|e| AuthError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    /// Exchange email and password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .post_credentials("accounts:signInWithPassword", email, password)
            .await?;
        log::info!("signed in as {}", session.user_id);
        Ok(session)
    }

    /// Register a new account; on success the user is already signed in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.post_credentials("accounts:signUp", email, password).await?;
        log::info!("registered new account {}", session.user_id);
        Ok(session)
    }

    /// End the session. The token is a bearer credential with no server-side
    /// revocation endpoint, so signing out is dropping it.
    pub fn sign_out(&self, session: Session) {
        log::info!("signed out {}", session.user_id);
        drop(session);
    }

    async fn post_credentials(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/v1/{}", self.base_url, endpoint);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("{} request failed: {}", endpoint, e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("failed to read {} response: {}", endpoint, e)))?;

        if !status.is_success() {
            return Err(map_error_body(&text, status.as_u16()));
        }

        let creds: CredentialResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::Backend(format!("malformed credential response: {}", e)))?;
        Ok(Session {
            user_id: creds.local_id,
            email: creds.email,
            id_token: creds.id_token,
        })
    }
}

fn map_error_body(body: &str, status: u16) -> AuthError {
    let code = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_default();
    // Compound codes arrive as e.g. "WEAK_PASSWORD : Password should be ...".
    let code = code.split_whitespace().next().unwrap_or("");
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "" => AuthError::Backend(format!("status {}", status)),
        other => AuthError::Backend(other.to_string()),
    }
}
