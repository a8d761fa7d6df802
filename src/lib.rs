//! # Nightvolt Auth
//!
//! `nightvolt-auth` authenticates artists and administrators against the
//! `users` table and answers with a role-scoped identity or a precise failure
//! reason. It keeps no session state and issues no tokens.
//!
//! ## Decision order
//!
//! 1. The request body is validated (`email` and `password` must be non-empty
//!    after trimming, `role` defaults to `artist`).
//! 2. Without a configured store every request ends in a configuration error.
//! 3. The account is resolved by exact `(email, role)` match.
//! 4. Blocked accounts are rejected before the password is looked at.
//! 5. The password is compared through a [`auth::CredentialVerifier`].
//!
//! Every path ends in an [`auth::Outcome`]; the HTTP layer in [`api`] only
//! encodes it.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
