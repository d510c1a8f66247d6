//! Shared plumbing for the MaIS directory clients.
//!
//! This crate owns everything the resource families have in common: the
//! error vocabulary, the [`Transport`] seam and its reqwest implementation,
//! the per-family base-URL table, configuration loading and logging setup.
//! Handles built here are `Rc`-based and therefore confined to one thread.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod transport;

pub use client::{ApiFamily, MaisClient};
pub use config::{Environment, MaisConfig};
pub use error::{Error, Result};
pub use transport::{HttpTransport, Method, Response, Timeout, Transport, check_status};
