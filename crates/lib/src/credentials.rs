//! Credential resolution: API key or username/password, plus the endpoint URL.

use crate::config::AssistantSettings;

/// How requests to the assistant service authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    ApiKey(String),
    /// Username/password. Either may be empty; the remote service decides whether they are valid.
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::ApiKey(_) => f.debug_tuple("ApiKey").field(&"[REDACTED]").finish(),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Resolved credentials bound to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint_url: String,
    pub auth: Auth,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("missing credentials: {0} is not configured")]
    Missing(&'static str),
}

/// Pick the auth mode from settings. An API key wins over username/password.
pub fn resolve(settings: &AssistantSettings) -> Result<Credentials, CredentialsError> {
    let endpoint_url = settings
        .url
        .clone()
        .ok_or(CredentialsError::Missing("service_url"))?;
    let auth = match &settings.apikey {
        Some(key) => Auth::ApiKey(key.clone()),
        None => Auth::Basic {
            username: settings.username.clone().unwrap_or_default(),
            password: settings.password.clone().unwrap_or_default(),
        },
    };
    Ok(Credentials { endpoint_url, auth })
}
