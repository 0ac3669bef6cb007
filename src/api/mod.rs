//! Letterboxd API access.
//!
//! - [`ApiClient`] - signed request issuer, one JSON body per call
//! - [`ApiError`] - error taxonomy shared by every caller of the API
//!
//! Requests are authenticated by query parameters plus an HMAC-SHA256
//! signature; see the `signing` module.

mod client;
mod error;
mod signing;

pub use client::ApiClient;
pub use error::{ApiError, NOT_FOUND_MARKER};
