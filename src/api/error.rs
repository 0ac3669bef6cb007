//! Error types for API operations.
//!
//! Every variant carries the URL (without signed query parameters) or the
//! username that failed, so messages are actionable without leaking credentials.

use thiserror::Error;

/// Prefix that the rendered form of a not-found error always starts with.
pub const NOT_FOUND_MARKER: &str = "404";

/// Errors that can occur while talking to the Letterboxd API or site.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource does not exist (HTTP 404).
    ///
    /// The message begins with [`NOT_FOUND_MARKER`]; the fetcher relies on it.
    #[error("404 Not Found: {url}")]
    NotFound {
        /// The URL that was not found.
        url: String,
    },

    /// Any other non-success HTTP response.
    #[error("HTTP {status} calling {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request timed out in the transport.
    #[error("timeout calling {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Connection-level failure (DNS, refused, TLS, reset).
    #[error("network error calling {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON shape we expected.
    #[error("malformed response from {url}: {message}")]
    Decode {
        /// The URL whose body failed to parse.
        url: String,
        /// What was wrong with the body.
        message: String,
    },

    /// The endpoint path could not be turned into a URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// The username is empty or contains characters the site never uses.
    #[error("invalid username {username:?}: expected letters, digits or underscores")]
    InvalidUsername {
        /// The rejected username.
        username: String,
    },

    /// The member page did not answer with 200.
    #[error("member lookup failed for {username}: HTTP {status}")]
    MemberLookup {
        /// The username being looked up.
        username: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The member page answered but without the identifier header.
    #[error(
        "member page for {username} did not include the X-Letterboxd-Identifier header\n  Suggestion: the site may have changed how it exposes member IDs"
    )]
    MissingIdentifier {
        /// The username being looked up.
        username: String,
    },

    /// Request signing could not be set up.
    #[error("failed to sign request for {url}")]
    Signing {
        /// The URL being signed.
        url: String,
    },

    /// The underlying HTTP client could not be built.
    #[error("HTTP client construction failed: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Creates a not-found error.
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error, or a timeout error if the transport reports one.
    ///
    /// The transport error's own URL is dropped: it carries the signed query.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::Network {
                url: url.into(),
                source: source.without_url(),
            }
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns true if this error means the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
