//! Cursor pagination over list endpoints, and the two list calls built on it.
//!
//! Paged endpoints return `{ "items": [...], "next": "<cursor>" }`; the last
//! page omits `next`. [`paginate`] turns that into a lazy stream of pages,
//! fetched one at a time as the consumer pulls.
//!
//! # Example
//!
//! ```no_run
//! use lbxd::{ApiClient, ApiConfig};
//! use lbxd::pagination::member_watchlist;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ApiConfig::from_env()?)?;
//! for entry in member_watchlist(&client, "1Ap5").await? {
//!     println!("{}\t{}", entry.film, entry.name.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::pin;

use futures_util::stream::{self, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::api::ApiError;
use crate::fetch::RequestIssuer;

/// Items requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Cursor that requests the first page.
pub const START_CURSOR: &str = "start=0";

#[derive(Debug, Deserialize)]
struct Page {
    items: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

/// One film on a member's watchlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    /// Member whose watchlist this came from.
    pub member: String,
    /// Public film ID.
    pub film: String,
    pub name: Option<String>,
    pub release_year: Option<i64>,
    /// The watchlist item exactly as the API returned it.
    pub item: Value,
}

/// One film a member has watched, with their rating if they gave one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchEntry {
    pub member: String,
    pub film: String,
    pub rating: Option<f64>,
}

/// Appends page size and cursor parameters to an endpoint path.
#[must_use]
pub fn page_path(path: &str, cursor: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{path}{separator}perPage={PAGE_SIZE}&cursor={}",
        urlencoding::encode(cursor)
    )
}

/// Streams the `items` of every page of `path`, following `next` cursors.
///
/// The stream ends after the first page without a `next` field, or after the
/// first error.
pub fn paginate<'a, I>(
    issuer: &'a I,
    path: &'a str,
) -> impl Stream<Item = Result<Vec<Value>, ApiError>> + 'a
where
    I: RequestIssuer + ?Sized,
{
    stream::try_unfold(Some(START_CURSOR.to_string()), move |cursor| async move {
        let Some(cursor) = cursor else {
            return Ok::<_, ApiError>(None);
        };

        let request = page_path(path, &cursor);
        let body = issuer.issue(&request).await?;
        let page: Page = serde_json::from_value(body)
            .map_err(|e| ApiError::decode(&request, e.to_string()))?;

        debug!(
            path = %request,
            items = page.items.len(),
            has_next = page.next.is_some(),
            "fetched page"
        );
        Ok(Some((page.items, page.next)))
    })
}

/// Returns every film on a member's watchlist.
///
/// # Errors
///
/// Propagates the first failed page call, or [`ApiError::Decode`] if an item
/// has no `id`.
#[instrument(skip(issuer))]
pub async fn member_watchlist<I>(issuer: &I, member_id: &str) -> Result<Vec<WatchlistEntry>, ApiError>
where
    I: RequestIssuer + ?Sized,
{
    let path = format!("member/{}/watchlist", urlencoding::encode(member_id));
    let mut pages = pin!(paginate(issuer, &path));
    let mut entries = Vec::new();

    while let Some(items) = pages.try_next().await? {
        for item in items {
            entries.push(WatchlistEntry {
                member: member_id.to_string(),
                film: film_id(&path, &item)?,
                name: item.get("name").and_then(Value::as_str).map(str::to_string),
                release_year: item.get("releaseYear").and_then(Value::as_i64),
                item,
            });
        }
    }

    info!(member_id, films = entries.len(), "watchlist fetched");
    Ok(entries)
}

/// Returns the watchlists of several members, concatenated in the given order.
///
/// # Errors
///
/// Stops at the first member whose watchlist fails.
pub async fn combined_watchlists<I, S>(
    issuer: &I,
    member_ids: &[S],
) -> Result<Vec<WatchlistEntry>, ApiError>
where
    I: RequestIssuer + ?Sized,
    S: AsRef<str>,
{
    let mut combined = Vec::new();
    for member_id in member_ids {
        combined.extend(member_watchlist(issuer, member_id.as_ref()).await?);
    }
    Ok(combined)
}

/// Returns every film a member has marked watched, highest rated first.
///
/// # Errors
///
/// Propagates the first failed page call, or [`ApiError::Decode`] if an item
/// has no `id`.
#[instrument(skip(issuer))]
pub async fn member_watches<I>(issuer: &I, member_id: &str) -> Result<Vec<WatchEntry>, ApiError>
where
    I: RequestIssuer + ?Sized,
{
    let path = format!(
        "films/?member={}&memberRelationship=Watched&sort=MemberRatingHighToLow",
        urlencoding::encode(member_id)
    );
    let mut pages = pin!(paginate(issuer, &path));
    let mut entries = Vec::new();

    while let Some(items) = pages.try_next().await? {
        for item in items {
            entries.push(WatchEntry {
                member: member_id.to_string(),
                film: film_id(&path, &item)?,
                rating: first_relationship_rating(&item),
            });
        }
    }

    info!(member_id, films = entries.len(), "watches fetched");
    Ok(entries)
}

fn film_id(path: &str, item: &Value) -> Result<String, ApiError> {
    item.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::decode(path, "film item without an id"))
}

fn first_relationship_rating(item: &Value) -> Option<f64> {
    item.get("relationships")?
        .as_array()?
        .first()?
        .get("relationship")?
        .get("rating")?
        .as_f64()
}
