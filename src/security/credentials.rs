//! Credential providers for publishing
//!
//! Publishing never reads credentials implicitly: the publisher is handed a
//! [`CredentialProvider`] and asks it for the extra npm arguments to pass.
//! Tokens are held as `secrecy::SecretString` and only ever displayed masked.

use crate::core::traits::{AuthArg, mask_token};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

/// Environment variable consulted by [`TokenCredentials::from_env`]
pub const TOKEN_ENV: &str = "NPM_TOKEN";

/// Source of authentication for `npm publish`
pub trait CredentialProvider: Send + Sync {
    /// Extra arguments to append to the publish command
    fn publish_args(&self) -> Vec<AuthArg>;

    /// Human-readable description, safe to log
    fn describe(&self) -> String;
}

/// Defers to whatever the invoking user's `~/.npmrc` provides
#[derive(Debug, Default, Clone, Copy)]
pub struct AmbientCredentials;

impl CredentialProvider for AmbientCredentials {
    fn publish_args(&self) -> Vec<AuthArg> {
        Vec::new()
    }

    fn describe(&self) -> String {
        "ambient npm configuration (~/.npmrc)".to_string()
    }
}

/// A bearer token scoped to one registry
///
/// # Examples
///
/// ```
/// use npm_bulk::security::{CredentialProvider, TokenCredentials};
/// use secrecy::SecretString;
///
/// let credentials = TokenCredentials::new(
///     "https://registry.example.com/npm/",
///     SecretString::new("abcdef123456".into()),
/// );
/// assert_eq!(credentials.registry_key(), "//registry.example.com/npm/");
/// assert!(credentials.describe().contains("abc...456"));
/// ```
pub struct TokenCredentials {
    registry_key: String,
    token: SecretString,
}

impl TokenCredentials {
    pub fn new(registry_url: &str, token: SecretString) -> Self {
        Self {
            registry_key: registry_key(registry_url),
            token,
        }
    }

    /// Build from `NPM_TOKEN` if it is set and non-empty
    pub fn from_env(registry_url: &str, env: &HashMap<String, String>) -> Option<Self> {
        let token = env.get(TOKEN_ENV)?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self::new(registry_url, SecretString::new(token.into())))
    }

    /// The `//host/path/` key npm scopes auth settings by
    pub fn registry_key(&self) -> &str {
        &self.registry_key
    }
}

impl CredentialProvider for TokenCredentials {
    fn publish_args(&self) -> Vec<AuthArg> {
        vec![AuthArg::new(
            format!("--{}:_authToken", self.registry_key),
            SecretString::new(self.token.expose_secret().into()),
        )]
    }

    fn describe(&self) -> String {
        format!(
            "{} from {} for {}",
            mask_token(self.token.expose_secret()),
            TOKEN_ENV,
            self.registry_key
        )
    }
}

/// Pick credentials for an explicit registry: a token from the environment
/// when present, otherwise the ambient npm configuration.
pub fn credentials_for_registry(
    registry_url: &str,
    env: &HashMap<String, String>,
) -> Box<dyn CredentialProvider> {
    match TokenCredentials::from_env(registry_url, env) {
        Some(token) => Box::new(token),
        None => Box::new(AmbientCredentials),
    }
}

/// `https://host/path` -> `//host/path/`
fn registry_key(registry_url: &str) -> String {
    let without_scheme = registry_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(registry_url)
        .trim_start_matches('/')
        .trim_end_matches('/');
    format!("//{}/", without_scheme)
}
