//! Incremental loading of listing pages. A [`PostListState`] is created from
//! the first [`PostPage`] and grown one page at a time by [`load_more`], which
//! follows the CMS's `next_page` cursor.

use crate::cms::Error as FetchError;
use crate::post::PostSummary;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// One page of post summaries plus the cursor for the page after it. Decodes
/// directly from the CMS search response (`results` and `next_page`).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PostPage {
    #[serde(rename = "results")]
    pub items: Vec<PostSummary>,

    /// An absolute URL for the next page, or `None` on the last page.
    #[serde(rename = "next_page")]
    pub next_page_token: Option<String>,
}

/// Retrieves a [`PostPage`] given an opaque next-page token.
pub trait PageFetcher {
    fn fetch_page(&self, token: &str) -> std::result::Result<PostPage, FetchError>;
}

/// The accumulated listing. `items` only ever grows and keeps every post in
/// the order it was received, duplicates included.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostListState {
    pub items: Vec<PostSummary>,
    pub next_page_token: Option<String>,
}

impl PostListState {
    /// Whether [`load_more`] would fetch anything.
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

impl From<PostPage> for PostListState {
    fn from(page: PostPage) -> PostListState {
        PostListState {
            items: page.items,
            next_page_token: page.next_page_token,
        }
    }
}

/// Fetches the page after `state` and returns the grown state: the new page's
/// items appended after the existing ones and the cursor replaced by the new
/// page's cursor. Makes exactly one fetch, or none at all (returning a copy of
/// `state`) when there is no next page. Fetch failures are returned as-is and
/// leave `state` untouched.
pub fn load_more<F>(state: &PostListState, fetcher: &F) -> Result<PostListState>
where
    F: PageFetcher + ?Sized,
{
    let token = match &state.next_page_token {
        None => return Ok(state.clone()),
        Some(token) => token,
    };

    let page = fetcher.fetch_page(token)?;
    debug!(
        fetched = page.items.len(),
        has_next = page.next_page_token.is_some(),
        "loaded next page"
    );

    let mut items = Vec::with_capacity(state.items.len() + page.items.len());
    items.extend_from_slice(&state.items);
    items.extend(page.items);
    Ok(PostListState {
        items,
        next_page_token: page.next_page_token,
    })
}

/// The result of a fallible pagination operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the next page.
#[derive(Debug)]
pub enum Error {
    /// Returned when the page couldn't be fetched or decoded.
    Fetch(FetchError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Fetch(err) => write!(f, "Loading next page: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fetch(err) => Some(err),
        }
    }
}

impl From<FetchError> for Error {
    /// Converts a [`FetchError`] into an [`Error`]. This allows us to use the
    /// `?` operator on [`PageFetcher::fetch_page`].
    fn from(err: FetchError) -> Error {
        Error::Fetch(err)
    }
}
