//! Username to member ID lookup.
//!
//! The API addresses members by ID only. The public profile page exposes the
//! ID in a response header, so a HEAD request on `{site_base}/{username}/` is
//! enough to resolve it.

use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiError};

/// Response header carrying the member's public ID.
pub const IDENTIFIER_HEADER: &str = "X-Letterboxd-Identifier";

/// Resolves a username to the member's public ID.
///
/// # Errors
///
/// - [`ApiError::InvalidUsername`] if the username is empty or has characters
///   other than ASCII letters, digits, or underscores
/// - [`ApiError::MemberLookup`] if the profile page does not answer 200,
///   including redirects, which are not followed
/// - [`ApiError::MissingIdentifier`] if the header is absent or not text
/// - [`ApiError::Timeout`] / [`ApiError::Network`] for transport failures
#[instrument(skip(client))]
pub async fn resolve_member_id(client: &ApiClient, username: &str) -> Result<String, ApiError> {
    let username = validate_username(username)?;
    let url = format!("{}/{}/", client.config().site_base(), username);

    let response = client
        .site_http()
        .head(&url)
        .send()
        .await
        .map_err(|e| ApiError::transport(&url, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(ApiError::MemberLookup {
            username: username.to_string(),
            status: status.as_u16(),
        });
    }

    let member_id = response
        .headers()
        .get(IDENTIFIER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::MissingIdentifier {
            username: username.to_string(),
        })?;

    debug!(member_id, "resolved member");
    Ok(member_id.to_string())
}

fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(trimmed)
    } else {
        Err(ApiError::InvalidUsername {
            username: username.to_string(),
        })
    }
}
