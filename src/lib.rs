//! lbxd: a convenience layer over the Letterboxd web API.
//!
//! # Architecture
//!
//! - [`config`] - credentials, base URLs and timeouts ([`ApiConfig`])
//! - [`api`] - signed request issuer ([`ApiClient`]) and its error taxonomy
//! - [`fetch`] - concurrent fetching of many endpoints with bounded retries
//! - [`codec`] - conversion between internal numeric IDs and public IDs
//! - [`members`] - username to member ID lookup
//! - [`pagination`] - cursor-paged watchlist and watch history calls
//!
//! [`fetch`] and [`codec`] are independent of each other; [`fetch`] only
//! needs something that implements [`RequestIssuer`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod codec;
pub mod config;
pub mod fetch;
pub mod members;
pub mod pagination;

// Re-export commonly used types
pub use api::{ApiClient, ApiError};
pub use codec::{CodecError, ExternalId, IdKind, decode_id, decode_id_with_kind, encode_id};
pub use config::{ApiConfig, ConfigError};
pub use fetch::{
    DEFAULT_MAX_RETRIES, FailureClass, FetchError, FetchOptions, FetchReport, Fetcher,
    RequestIssuer, RetryPolicy, classify_error, fetch_all,
};
pub use members::resolve_member_id;
