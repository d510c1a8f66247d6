//! Read-only access to the MaIS Account API.
//!
//! [`AccountClient`] fetches accounts, caches them for the life of the
//! client and hands out shared [`Account`] snapshots. Filtered views
//! (`only_active`, `only_people`, ...) share the same cache. [`validate`]
//! sorts a batch of identifiers into full, base, inactive and unknown.

pub mod account;
pub mod changed;
pub mod client;
pub mod filter;
pub mod service;
pub mod validate;

pub use account::{Account, AccountKind};
pub use changed::{AccountStatus, PartialAccount};
pub use client::AccountClient;
pub use filter::AccountFilter;
pub use service::{Service, ServiceKind, ServiceStatus, Services};
pub use validate::{ValidationResult, validate, validate_str};

#[cfg(test)]
mod tests;
