use std::path::PathBuf;

use anyhow::Context;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The signed-in user. Written once at sign-in, read by every view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub display_name: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// Display name, or `fallback` when the provider did not supply one.
    pub fn greeting_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.display_name.trim().is_empty() {
            fallback
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("identity token is not a three-part JWT")]
    Malformed,
    #[error("identity token payload is not valid base64url")]
    Encoding,
    #[error("identity token payload is not valid JSON")]
    Claims,
    #[error("identity token has no email claim")]
    MissingEmail,
}

#[derive(Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Reads `email` and `name` from an identity token payload.
///
/// The signature is not checked; the provider widget already verified it and
/// the service re-checks the email on every call.
pub fn decode_identity_token(token: &str) -> Result<Session, TokenError> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(TokenError::Malformed),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;
    let claims: IdentityClaims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Claims)?;

    let email = claims
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or(TokenError::MissingEmail)?;
    Ok(Session {
        email,
        display_name: claims.name.unwrap_or_default(),
    })
}

/// Session file standing in for tab-scoped storage between commands.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Missing file means signed out and yields an empty session.
    pub fn load(&self) -> anyhow::Result<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("session file {} is corrupt", self.path.display()))
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(session)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session file {}", self.path.display()))
    }

    pub fn clear(&self) -> anyhow::Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("failed to remove session file {}", self.path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) fn test_token(claims: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims);
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_email_and_name_claims() {
        let token = test_token(r#"{"email":"asha@example.com","name":"Asha Rao","sub":"1"}"#);
        let session = decode_identity_token(&token).unwrap();
        assert_eq!(
            session,
            Session {
                email: "asha@example.com".to_string(),
                display_name: "Asha Rao".to_string()
            }
        );
    }

    #[test]
    fn rejects_tokens_without_email() {
        let token = test_token(r#"{"name":"Asha Rao"}"#);
        assert_eq!(decode_identity_token(&token), Err(TokenError::MissingEmail));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(decode_identity_token("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(decode_identity_token("a.!!!.c"), Err(TokenError::Encoding));
        let token = format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"));
        assert_eq!(decode_identity_token(&token), Err(TokenError::Claims));
    }

    #[test]
    fn greeting_falls_back_when_name_is_blank() {
        let session = Session {
            email: "asha@example.com".to_string(),
            display_name: " ".to_string(),
        };
        assert_eq!(session.greeting_name("User"), "User");
        assert!(session.is_authenticated());
        assert!(!Session::default().is_authenticated());
    }

    #[test]
    fn store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().unwrap(), Session::default());

        let session = Session {
            email: "asha@example.com".to_string(),
            display_name: "Asha".to_string(),
        };
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), session);
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("taskflow").join("session.json"));
        let session = Session {
            email: "asha@example.com".to_string(),
            display_name: "Asha".to_string(),
        };

        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), session);
    }
}
