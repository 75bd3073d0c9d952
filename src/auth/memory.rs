//! In-process identity provider for development and tests.
//!
//! Accounts live in memory for the lifetime of the process. The
//! verification "email" is a log line carrying the token that
//! `GET /api/auth/verify?token=` redeems.
//!
//! Every sign-in opens its own session keyed by a random bearer token, so
//! clients sharing the server never see or end each other's logins.

use async_trait::async_trait;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha256;
use std::collections::HashMap;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use super::provider::{AuthError, AuthProvider, AuthSession, SignUp, User};

pub const MIN_PASSWORD_LEN: usize = 6;

/// PBKDF2-HMAC-SHA256 rounds for stored passwords.
pub const PBKDF2_ITERATIONS: u32 = 210_000;

/// Open sessions kept per account; the oldest is closed beyond this.
pub const MAX_SESSIONS_PER_ACCOUNT: usize = 8;

const KEY_LEN: usize = 32;

struct Account {
    user: User,
    salt: [u8; 16],
    key: [u8; KEY_LEN],
}

struct LoginSession {
    /// normalized email of the signed-in account
    email: String,
    opened: u64,
    state: watch::Sender<Option<User>>,
}

#[derive(Default)]
struct Store {
    /// normalized email → account
    accounts: HashMap<String, Account>,
    /// verification token → normalized email
    pending_verifications: HashMap<String, String>,
    /// bearer token → login
    sessions: HashMap<String, LoginSession>,
    next_session: u64,
}

pub struct MemoryAuth {
    store: Mutex<Store>,
    iterations: u32,
}

impl MemoryAuth {
    pub fn new() -> Self {
        MemoryAuth::with_iterations(PBKDF2_ITERATIONS)
    }

    /// Lower round counts keep unit tests fast.
    pub fn with_iterations(iterations: u32) -> Self {
        MemoryAuth {
            store: Mutex::new(Store::default()),
            iterations: iterations.max(1),
        }
    }

    /// Outstanding verification token for `email`, if any.
    #[cfg(test)]
    pub async fn pending_token(&self, email: &str) -> Option<String> {
        let email = normalize_email(email);
        let store = self.store.lock().await;
        store
            .pending_verifications
            .iter()
            .find(|(_, e)| **e == email)
            .map(|(token, _)| token.clone())
    }

    fn derive_key(&self, salt: &[u8], password: &str) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut key);
        key
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        MemoryAuth::new()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Equality whose running time does not depend on where the inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUp, AuthError> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.store.lock().await.accounts.contains_key(&email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        // Key derivation runs outside the lock.
        let salt: [u8; 16] = rand::thread_rng().gen();
        let key = self.derive_key(&salt, password);

        let mut store = self.store.lock().await;
        if store.accounts.contains_key(&email) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        let user = User {
            uid: random_hex(10),
            email: email.clone(),
            display_name: display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            email_verified: false,
        };
        store.accounts.insert(
            email.clone(),
            Account {
                user: user.clone(),
                salt,
                key,
            },
        );

        let token = random_hex(16);
        store.pending_verifications.insert(token.clone(), email.clone());
        info!(
            "Account created for {}; verification link: /api/auth/verify?token={}",
            email, token
        );

        Ok(SignUp {
            user,
            verification_sent: true,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let (salt, expected) = {
            let store = self.store.lock().await;
            let account = store
                .accounts
                .get(&email)
                .ok_or(AuthError::InvalidCredentials)?;
            (account.salt, account.key)
        };
        if !constant_time_eq(&self.derive_key(&salt, password), &expected) {
            return Err(AuthError::InvalidCredentials);
        }

        let mut store = self.store.lock().await;
        let user = store
            .accounts
            .get(&email)
            .map(|a| a.user.clone())
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.email_verified {
            info!("Sign-in refused for {}: email not verified", email);
            return Err(AuthError::EmailNotVerified);
        }

        let mut open: Vec<(u64, String)> = store
            .sessions
            .iter()
            .filter(|(_, s)| s.email == email)
            .map(|(token, s)| (s.opened, token.clone()))
            .collect();
        if open.len() >= MAX_SESSIONS_PER_ACCOUNT {
            open.sort();
            let excess = open.len() + 1 - MAX_SESSIONS_PER_ACCOUNT;
            for (_, token) in open.into_iter().take(excess) {
                if let Some(old) = store.sessions.remove(&token) {
                    old.state.send_replace(None);
                    debug!("Closed oldest session of {}", email);
                }
            }
        }

        let token = random_hex(24);
        let opened = store.next_session;
        store.next_session += 1;
        let (state, _) = watch::channel(Some(user.clone()));
        store.sessions.insert(
            token.clone(),
            LoginSession {
                email: email.clone(),
                opened,
                state,
            },
        );

        info!("Signed in {}", email);
        Ok(AuthSession { token, user })
    }

    async fn sign_out(&self, token: &str) {
        let removed = self.store.lock().await.sessions.remove(token);
        if let Some(session) = removed {
            session.state.send_replace(None);
            info!("Signed out {}", session.email);
        }
    }

    async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let mut store = self.store.lock().await;
        let email = store
            .pending_verifications
            .remove(token)
            .ok_or(AuthError::UnknownVerificationToken)?;
        let account = store
            .accounts
            .get_mut(&email)
            .ok_or(AuthError::UnknownVerificationToken)?;
        account.user.email_verified = true;
        info!("Email verified for {}", email);
        Ok(account.user.clone())
    }

    async fn current_user(&self, token: &str) -> Option<User> {
        let store = self.store.lock().await;
        let session = store.sessions.get(token)?;
        let user = session.state.borrow().clone();
        user
    }

    async fn on_auth_state_change(&self, token: &str) -> Option<watch::Receiver<Option<User>>> {
        let store = self.store.lock().await;
        store.sessions.get(token).map(|s| s.state.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> MemoryAuth {
        MemoryAuth::with_iterations(1_000)
    }

    async fn verified(auth: &MemoryAuth, email: &str, password: &str) {
        auth.sign_up(email, password, Some("Ana")).await.unwrap();
        let token = auth.pending_token(email).await.unwrap();
        auth.verify_email(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_up_starts_unverified() {
        let auth = auth();
        let signup = auth
            .sign_up("Ana@Example.com", "secret1", Some(" Ana "))
            .await
            .unwrap();
        assert!(signup.verification_sent);
        assert_eq!(signup.user.email, "ana@example.com");
        assert_eq!(signup.user.display_name.as_deref(), Some("Ana"));
        assert!(!signup.user.email_verified);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let auth = auth();
        auth.sign_up("ana@example.com", "secret1", None).await.unwrap();
        let err = auth
            .sign_up("ANA@example.com", "other-pass", None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::EmailAlreadyInUse);
        assert_eq!(err.code(), "auth/email-already-in-use");
    }

    #[tokio::test]
    async fn test_unverified_sign_in_rejected() {
        let auth = auth();
        auth.sign_up("ana@example.com", "secret1", None).await.unwrap();
        let err = auth.sign_in("ana@example.com", "secret1").await.unwrap_err();
        assert_eq!(err, AuthError::EmailNotVerified);
    }

    #[tokio::test]
    async fn test_verified_sign_in_and_out() {
        let auth = auth();
        verified(&auth, "ana@example.com", "secret1").await;

        let session = auth.sign_in("ana@example.com", "secret1").await.unwrap();
        assert!(session.user.email_verified);
        assert_eq!(auth.current_user(&session.token).await, Some(session.user.clone()));

        auth.sign_out(&session.token).await;
        assert!(auth.current_user(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_client() {
        let auth = auth();
        verified(&auth, "ana@example.com", "secret1").await;
        verified(&auth, "bob@example.com", "secret2").await;

        let ana = auth.sign_in("ana@example.com", "secret1").await.unwrap();
        assert_ne!(ana.token, "");
        assert!(auth.current_user("").await.is_none());
        assert!(auth.current_user("someone-else").await.is_none());

        // Another client's sign-out and a failed sign-in leave ana alone.
        auth.sign_out("someone-else").await;
        let bob = auth.sign_in("bob@example.com", "secret2").await.unwrap();
        auth.sign_out(&bob.token).await;
        auth.sign_up("eve@example.com", "secret3", None).await.unwrap();
        assert!(auth.sign_in("eve@example.com", "secret3").await.is_err());

        assert_eq!(
            auth.current_user(&ana.token).await.map(|u| u.email),
            Some("ana@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_oldest_session_closed_beyond_cap() {
        let auth = auth();
        verified(&auth, "ana@example.com", "secret1").await;
        let first = auth.sign_in("ana@example.com", "secret1").await.unwrap();
        let mut later = Vec::new();
        for _ in 0..MAX_SESSIONS_PER_ACCOUNT {
            later.push(auth.sign_in("ana@example.com", "secret1").await.unwrap());
        }
        assert!(auth.current_user(&first.token).await.is_none());
        for session in &later {
            assert!(auth.current_user(&session.token).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let auth = auth();
        verified(&auth, "ana@example.com", "secret1").await;
        assert_eq!(
            auth.sign_in("ana@example.com", "nope!!").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.sign_in("bob@example.com", "secret1").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_password_stored_as_salted_pbkdf2() {
        let auth = auth();
        auth.sign_up("ana@example.com", "secret1", None).await.unwrap();
        auth.sign_up("bob@example.com", "secret1", None).await.unwrap();
        let store = auth.store.lock().await;
        let ana = &store.accounts["ana@example.com"];
        let bob = &store.accounts["bob@example.com"];
        assert_ne!(ana.key, bob.key, "same password must not share a key");

        let mut expected = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(b"secret1", &ana.salt, 1_000, &mut expected);
        assert_eq!(ana.key, expected);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[tokio::test]
    async fn test_input_validation() {
        let auth = auth();
        assert_eq!(
            auth.sign_up("not-an-email", "secret1", None).await.unwrap_err(),
            AuthError::InvalidEmail
        );
        assert_eq!(
            auth.sign_up("ana@example.com", "123", None).await.unwrap_err(),
            AuthError::WeakPassword { min: 6 }
        );
    }

    #[tokio::test]
    async fn test_verification_token_single_use() {
        let auth = auth();
        auth.sign_up("ana@example.com", "secret1", None).await.unwrap();
        let token = auth.pending_token("ana@example.com").await.unwrap();
        assert!(auth.verify_email(&token).await.is_ok());
        assert_eq!(
            auth.verify_email(&token).await.unwrap_err(),
            AuthError::UnknownVerificationToken
        );
    }

    #[tokio::test]
    async fn test_state_change_observed() {
        let auth = auth();
        verified(&auth, "ana@example.com", "secret1").await;
        assert!(auth.on_auth_state_change("nope").await.is_none());

        let session = auth.sign_in("ana@example.com", "secret1").await.unwrap();
        let mut rx = auth.on_auth_state_change(&session.token).await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|u| u.email.as_str()),
            Some("ana@example.com")
        );

        auth.sign_out(&session.token).await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
