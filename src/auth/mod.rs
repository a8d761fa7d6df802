//! Authentication decision procedure.

mod engine;
mod outcome;
mod request;
mod store;
mod verifier;

pub use engine::{DecisionEngine, StoreConfig};
pub use outcome::{AuthenticatedUser, ErrorClass, Outcome};
pub use request::{validate, validate_payload, CredentialRequest, InputError, Role};
pub use store::{AccountRecord, AccountStore, MemoryAccountStore, PgAccountStore, StoreError};
pub use verifier::{CredentialVerifier, PlaintextVerifier};
