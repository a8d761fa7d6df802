//! Password verification strategies.

use secrecy::{ExposeSecret, SecretString};

/// Checks a supplied password against what the store holds.
///
/// The decision engine only asks yes or no, so moving to salted hashes means
/// adding an implementation here without touching the decision order.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, supplied: &SecretString, stored: &SecretString) -> bool;
}

/// Exact, case-sensitive equality against a plaintext column.
///
/// This matches how accounts are stored today. It is not a safe way to keep
/// passwords.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, supplied: &SecretString, stored: &SecretString) -> bool {
        supplied.expose_secret() == stored.expose_secret()
    }
}
