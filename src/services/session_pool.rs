//! Authenticated session pool
//!
//! Holds one base API client per account and hands accounts out in a fixed
//! cyclic order. The overseer renews sessions close to expiry before each
//! iteration; workers fork per-request handles from the base client.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::retry_policy::RetryPolicy;
use crate::domain::models::{Coordinate, Credentials};
use crate::domain::ports::{ApiClientError, GameApiClient};
use crate::domain::ScanError;

struct Session {
    client: Box<dyn GameApiClient>,
    expires_at: Option<DateTime<Utc>>,
}

/// One scanning account and its session
pub struct Account {
    index: usize,
    credentials: Credentials,
    session: Mutex<Session>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Account {
    fn new(index: usize, credentials: Credentials, client: Box<dyn GameApiClient>) -> Self {
        let expires_at = client.session_expiry();
        Self {
            index,
            credentials,
            session: Mutex::new(Session { client, expires_at }),
        }
    }

    /// Position of this account in the rotation
    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Expiry of the current session, if logged in
    pub async fn session_expires_at(&self) -> Option<DateTime<Utc>> {
        self.session.lock().await.expires_at
    }

    /// Independent request handle sharing this account's session
    pub async fn fork_client(&self) -> Box<dyn GameApiClient> {
        self.session.lock().await.client.fork()
    }
}

/// Whether a session expiring at `expires_at` must be renewed at `now`
///
/// Sessions without an expiry have never logged in and always need one.
pub fn needs_renewal(
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> bool {
    let Some(expires_at) = expires_at else {
        return true;
    };
    // A negative remaining time (already expired) fails the conversion.
    (expires_at - now)
        .to_std()
        .ok()
        .is_none_or(|remaining| remaining <= threshold)
}

/// Round-robin pool of authenticated accounts
pub struct SessionPool {
    accounts: Vec<Arc<Account>>,
    cursor: AtomicUsize,
    refresh_threshold: Duration,
    login_policy: RetryPolicy,
    logins: AtomicU64,
}

impl std::fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPool")
            .field("accounts", &self.accounts)
            .field("refresh_threshold", &self.refresh_threshold)
            .finish_non_exhaustive()
    }
}

impl SessionPool {
    /// Create a pool from credentials paired with their base clients
    ///
    /// # Arguments
    /// * `accounts` - At least one account with its own client handle
    /// * `refresh_threshold` - Remaining validity at or below which a session is renewed
    /// * `login_policy` - Retry policy applied to login attempts
    pub fn new(
        accounts: Vec<(Credentials, Box<dyn GameApiClient>)>,
        refresh_threshold: Duration,
        login_policy: RetryPolicy,
    ) -> Result<Self, ScanError> {
        if accounts.is_empty() {
            return Err(ScanError::NoAccounts);
        }

        let accounts = accounts
            .into_iter()
            .enumerate()
            .map(|(index, (credentials, client))| Arc::new(Account::new(index, credentials, client)))
            .collect();

        Ok(Self {
            accounts,
            cursor: AtomicUsize::new(0),
            refresh_threshold,
            login_policy,
            logins: AtomicU64::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Next account in the rotation
    ///
    /// The k-th call (0-based) returns account `k mod len`. The cursor is a
    /// single atomic, so concurrent workers each advance it exactly once.
    pub fn next(&self) -> Arc<Account> {
        let position = self.cursor.fetch_add(1, Ordering::Relaxed);
        Arc::clone(&self.accounts[position % self.accounts.len()])
    }

    pub fn account(&self, index: usize) -> Result<&Arc<Account>, ScanError> {
        self.accounts.get(index).ok_or(ScanError::UnknownAccount {
            index,
            size: self.accounts.len(),
        })
    }

    /// Successful logins performed since the pool was created
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    /// Renew the session of account `index` if it is close to expiry
    ///
    /// # Returns
    /// * `Ok(true)` - A login was performed
    /// * `Ok(false)` - Session still valid, left untouched
    pub async fn ensure_valid(&self, index: usize, position: Coordinate) -> Result<bool, ScanError> {
        let account = self.account(index)?;
        let expires_at = account.session_expires_at().await;

        if !needs_renewal(expires_at, Utc::now(), self.refresh_threshold) {
            debug!(username = account.username(), ?expires_at, "Session still valid");
            return Ok(false);
        }

        self.login(index, position).await?;
        Ok(true)
    }

    /// Log account `index` in at `position`, retrying per the login policy
    #[instrument(skip(self), fields(username))]
    pub async fn login(&self, index: usize, position: Coordinate) -> Result<(), ScanError> {
        let account = Arc::clone(self.account(index)?);
        tracing::Span::current().record("username", account.username());
        info!("Attempting login");

        let label = format!("login {}", account.username());
        let account_ref: &Account = &account;
        let result = self
            .login_policy
            .execute(&label, move || async move {
                let mut session = account_ref.session.lock().await;
                session.client.set_position(position);
                match session.client.login(&account_ref.credentials).await {
                    Ok(true) => {
                        session.expires_at = session.client.session_expiry();
                        Ok(())
                    }
                    Ok(false) => Err(ApiClientError::LoginRefused(
                        account_ref.credentials.username.clone(),
                    )),
                    Err(err) => Err(err),
                }
            })
            .await;

        match result {
            Ok(()) => {
                self.logins.fetch_add(1, Ordering::Relaxed);
                let expires_at = account.session_expires_at().await;
                info!(?expires_at, "Login successful");
                Ok(())
            }
            Err(exhausted) => Err(ScanError::LoginExhausted {
                username: account.username().to_string(),
                attempts: exhausted.attempts,
            }),
        }
    }
}
