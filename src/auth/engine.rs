//! Decision engine.
//!
//! Resolves a validated request to exactly one [`Outcome`], in this order:
//! store availability, lookup, blocked status, password. Each step
//! short-circuits.

use super::{
    outcome::{AuthenticatedUser, Outcome},
    request::{validate, CredentialRequest},
    store::AccountStore,
    verifier::{CredentialVerifier, PlaintextVerifier},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Account store configuration injected at construction.
#[derive(Clone, Default)]
pub enum StoreConfig {
    /// No connection string was supplied; every attempt is a configuration error.
    #[default]
    Missing,
    Configured(Arc<dyn AccountStore>),
}

impl StoreConfig {
    #[must_use]
    pub fn configured(store: impl AccountStore + 'static) -> Self {
        Self::Configured(Arc::new(store))
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    #[must_use]
    pub fn store(&self) -> Option<&Arc<dyn AccountStore>> {
        match self {
            Self::Missing => None,
            Self::Configured(store) => Some(store),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("Missing"),
            Self::Configured(_) => f.write_str("Configured"),
        }
    }
}

#[derive(Clone)]
pub struct DecisionEngine {
    store: StoreConfig,
    verifier: Arc<dyn CredentialVerifier>,
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl DecisionEngine {
    /// Engine comparing passwords with [`PlaintextVerifier`].
    #[must_use]
    pub fn new(store: StoreConfig) -> Self {
        Self::with_verifier(store, Arc::new(PlaintextVerifier))
    }

    #[must_use]
    pub fn with_verifier(store: StoreConfig, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { store, verifier }
    }

    #[must_use]
    pub const fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Validate a raw request body and decide on it.
    pub async fn authenticate(&self, body: &[u8]) -> Outcome {
        match validate(body) {
            Ok(request) => self.decide(&request).await,
            Err(reason) => {
                debug!("Invalid credential payload: {}", reason);

                Outcome::from(reason)
            }
        }
    }

    /// Run the decision procedure for an already validated request.
    #[instrument(skip_all, fields(email = %request.email(), role = %request.role()))]
    pub async fn decide(&self, request: &CredentialRequest) -> Outcome {
        let Some(store) = self.store.store() else {
            error!("Account store is not configured");

            return Outcome::ConfigError;
        };

        let account = match store.find_account(request.email(), request.role()).await {
            Ok(Some(account)) => account,

            Ok(None) => {
                debug!("Account not found");

                return Outcome::NotFound;
            }

            Err(e) => {
                error!("Account lookup failed: {}", e);

                return Outcome::ConfigError;
            }
        };

        if account.is_blocked {
            debug!("Account is blocked, uid: {}", account.uid);

            return Outcome::Blocked;
        }

        if !self.verifier.verify(request.password(), &account.password) {
            debug!("Password mismatch, uid: {}", account.uid);

            return Outcome::WrongPassword;
        }

        debug!("Login successful, uid: {}", account.uid);

        Outcome::Success(AuthenticatedUser {
            uid: account.uid,
            email: account.email,
            role: account.role,
            label: account.label,
        })
    }
}
