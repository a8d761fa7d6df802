//! HTTP handlers.

pub mod health;
pub mod login;

#[cfg(test)]
mod tests;
