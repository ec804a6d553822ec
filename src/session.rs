//! Session
//!
//! Login, registration and logout against the durable key-value store.
//! Authentication is a local simulation: credentials are shape-checked but
//! never verified against a backend, matching the storefront's offline
//! behaviour.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::storage::{Storage, StorageError, keys};

/// Errors related to session management.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A login or registration field was left empty.
    #[error("all fields are required")]
    MissingCredentials,

    /// Registration password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored user record could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] serde_json::Error),
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name shown in the account area.
    pub name: String,

    /// Email address used to sign in.
    pub email: String,

    /// First name; captured at registration, absent for plain logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Last name; captured at registration, absent for plain logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Session state backed by a [`Storage`] implementation.
#[derive(Debug)]
pub struct Session<S: Storage> {
    user: Option<User>,
    storage: S,
}

impl<S: Storage> Session<S> {
    /// Restore the session from `storage`.
    ///
    /// The user record is loaded only when the logged-in flag is set; a
    /// stale record without the flag is treated as logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or holds an undecodable record.
    pub fn open(storage: S) -> Result<Self, SessionError> {
        let logged_in = storage.get(keys::IS_LOGGED_IN)?.as_deref() == Some("true");

        let user = if logged_in {
            storage
                .get(keys::CURRENT_USER)?
                .map(|raw| serde_json::from_str(&raw))
                .transpose()?
        } else {
            None
        };

        Ok(Self { user, storage })
    }

    /// Sign in with an email and password.
    ///
    /// The display name is derived from the local part of the email, the
    /// whole address when it has no `@`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCredentials`] when either field is
    /// empty, or a storage error if persisting the session fails.
    pub fn login(&mut self, email: &str, password: &str) -> Result<&User, SessionError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let name = email
            .split_once('@')
            .map_or(email, |(local, _)| local)
            .to_owned();

        let user = User {
            name,
            email: email.to_owned(),
            first_name: None,
            last_name: None,
        };

        self.persist(&user)?;
        info!(email = %user.email, "signed in");

        Ok(self.user.insert(user))
    }

    /// Register a new account and sign in.
    ///
    /// The display name is the first and last name joined with a space.
    /// The password confirmation is checked before the required-field
    /// check, so a mismatch is reported even when other fields are empty.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PasswordMismatch`] when the confirmation
    /// differs, [`SessionError::MissingCredentials`] when a field is empty,
    /// or a storage error if persisting the session fails.
    pub fn register(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<&User, SessionError> {
        if password != confirm {
            return Err(SessionError::PasswordMismatch);
        }

        let first_name = first_name.trim();
        let last_name = last_name.trim();
        let email = email.trim();
        if first_name.is_empty() || last_name.is_empty() || email.is_empty() || password.is_empty()
        {
            return Err(SessionError::MissingCredentials);
        }

        let user = User {
            name: format!("{first_name} {last_name}"),
            email: email.to_owned(),
            first_name: Some(first_name.to_owned()),
            last_name: Some(last_name.to_owned()),
        };

        self.persist(&user)?;
        info!(email = %user.email, "account registered");

        Ok(self.user.insert(user))
    }

    /// Sign out and clear the persisted session.
    ///
    /// # Errors
    ///
    /// Returns a storage error if removing the session keys fails.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.storage.remove(keys::IS_LOGGED_IN)?;
        self.storage.remove(keys::CURRENT_USER)?;
        self.user = None;

        Ok(())
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Consume the session and return the backing store.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&mut self, user: &User) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(user)?;
        self.storage.set(keys::IS_LOGGED_IN, "true")?;
        self.storage.set(keys::CURRENT_USER, &encoded)?;

        Ok(())
    }
}
