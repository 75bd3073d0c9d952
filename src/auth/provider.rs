use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// A signed-up account as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// A signed-in client. `token` identifies the login for later calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Outcome of a registration: the account exists but is not verified yet.
#[derive(Debug, Clone, Serialize)]
pub struct SignUp {
    pub user: User,
    pub verification_sent: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("An account already exists for this email. Please sign in.")]
    EmailAlreadyInUse,

    #[error("Please verify your email before signing in.")]
    EmailNotVerified,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Password must be at least {min} characters.")]
    WeakPassword { min: usize },

    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("Verification link is invalid or has already been used.")]
    UnknownVerificationToken,
}

impl AuthError {
    /// Stable machine-readable code for clients that localize messages.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::EmailNotVerified => "auth/email-not-verified",
            AuthError::InvalidCredentials => "auth/invalid-credential",
            AuthError::WeakPassword { .. } => "auth/weak-password",
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::UnknownVerificationToken => "auth/invalid-action-code",
        }
    }
}

/// Email/password identity provider.
///
/// Sign-in state belongs to each client: every successful sign-in opens its
/// own session, and only the holder of that session's token can read or end it.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register an account and send its verification link.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUp, AuthError>;

    /// Sign in. Unverified accounts are rejected and no session is opened.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// End the session behind `token`. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str);

    /// Redeem a verification link token.
    async fn verify_email(&self, token: &str) -> Result<User, AuthError>;

    /// User signed in under `token`, if that session is still open.
    async fn current_user(&self, token: &str) -> Option<User>;

    /// Receiver observing the session behind `token` until it is signed out.
    async fn on_auth_state_change(&self, token: &str) -> Option<watch::Receiver<Option<User>>>;
}
