use thiserror::Error;

use crate::client::TaskService;
use crate::error::ClientError;
use crate::models::Role;
use crate::notify::{Notifier, Surface};
use crate::session::{decode_identity_token, Session, TokenError};
use crate::views::Page;

#[derive(Debug, Error)]
pub enum SignInError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("role lookup failed: {0}")]
    RoleLookup(#[from] ClientError),
    #[error("unknown user role: {0}")]
    UnknownRole(String),
}

impl SignInError {
    /// Text of the blocking alert shown before the sign-in flow halts.
    pub fn alert_text(&self) -> &'static str {
        match self {
            SignInError::RoleLookup(err) if err.is_application() => {
                "Authentication failed: Could not determine user role."
            }
            SignInError::UnknownRole(_) => "Authentication failed: Unknown user role.",
            _ => "An error occurred during authentication. Please try again.",
        }
    }
}

pub struct Portal<'a, S: TaskService, U: Surface> {
    service: &'a S,
    notifier: &'a Notifier<U>,
}

impl<'a, S: TaskService, U: Surface> Portal<'a, S, U> {
    pub fn new(service: &'a S, notifier: &'a Notifier<U>) -> Self {
        Self { service, notifier }
    }

    /// Decodes the provider token into `session`, then routes by role.
    ///
    /// `session` is written as soon as the token decodes, before the role is
    /// known. Every failure raises an alert and ends the flow.
    pub async fn sign_in(&self, credential: &str, session: &mut Session) -> Result<Page, SignInError> {
        let result = self.resolve(credential, session).await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "sign-in failed");
            self.notifier.alert(err.alert_text());
        }
        result
    }

    async fn resolve(&self, credential: &str, session: &mut Session) -> Result<Page, SignInError> {
        *session = decode_identity_token(credential)?;
        tracing::info!(email = %session.email, "signed in");

        let _loader = self.notifier.acquire();
        match self.service.user_role(&session.email).await? {
            Role::Admin => Ok(Page::Admin),
            Role::User => Ok(Page::Performance),
            Role::Other(role) => Err(SignInError::UnknownRole(role)),
        }
    }
}
