//! Defines the [`ContentSource`] capability through which the site reads posts
//! and [`PrismicClient`], its implementation over the Prismic REST API (v2).
//! [`PrismicClient`] also implements [`PageFetcher`] so listing pages can be
//! followed by their `next_page` URLs.

use crate::pagination::{PageFetcher, PostPage};
use crate::post::Post;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, instrument};
use url::Url;

/// The custom type of post documents.
const POST_TYPE: &str = "post";

/// The fields fetched for listing pages.
const SUMMARY_FIELDS: &str = "post.title,post.subtitle,post.author";

/// The page size used when walking every post.
const MAX_PAGE_SIZE: usize = 100;

/// Read access to the posts stored in the CMS.
pub trait ContentSource {
    /// Returns the first listing page of `page_size` posts (title, subtitle
    /// and author only).
    fn query_posts(&self, page_size: usize) -> Result<PostPage>;

    /// Returns the uid of every post.
    fn post_uids(&self) -> Result<Vec<String>>;

    /// Returns the full post with the given uid.
    fn post_by_uid(&self, uid: &str) -> Result<Post>;
}

/// A blocking client for a Prismic repository's REST API.
pub struct PrismicClient {
    /// The API root, e.g. `https://spacetraveling.cdn.prismic.io/api/v2`.
    endpoint: Url,

    /// Appended to search URLs as `access_token` for private repositories.
    access_token: Option<String>,

    /// The content release queried: the master ref, or a preview ref.
    reference: String,

    http: Client,
}

impl PrismicClient {
    /// Constructs a new client. When `reference` is `None`, the repository's
    /// master ref is looked up from the API root.
    pub fn new(
        endpoint: Url,
        access_token: Option<String>,
        reference: Option<String>,
    ) -> Result<PrismicClient> {
        let http = Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let reference = match reference {
            Some(reference) => reference,
            None => master_ref(&http, &endpoint, access_token.as_deref())?,
        };
        info!(endpoint = %endpoint, reference = %reference, "connected to content API");
        Ok(PrismicClient {
            endpoint,
            access_token,
            reference,
            http,
        })
    }

    /// The content release this client reads from.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    fn search_url(
        &self,
        query: &str,
        page_size: usize,
        fetch: Option<&str>,
    ) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidEndpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push("documents")
            .push("search");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("ref", &self.reference)
                .append_pair("q", query)
                .append_pair("pageSize", &page_size.to_string());
            if let Some(fetch) = fetch {
                pairs.append_pair("fetch", fetch);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        get_json(&self.http, url)
    }
}

impl ContentSource for PrismicClient {
    #[instrument(skip(self))]
    fn query_posts(&self, page_size: usize) -> Result<PostPage> {
        let url = self.search_url(
            &type_predicate(POST_TYPE),
            page_size,
            Some(SUMMARY_FIELDS),
        )?;
        self.get(url.as_str())
    }

    #[instrument(skip(self))]
    fn post_uids(&self) -> Result<Vec<String>> {
        let url = self.search_url(&type_predicate(POST_TYPE), MAX_PAGE_SIZE, None)?;
        let mut page: PostPage = self.get(url.as_str())?;
        let mut uids = Vec::new();
        loop {
            uids.extend(page.items.into_iter().map(|summary| summary.id));
            match page.next_page_token {
                None => break,
                Some(next) => page = self.get(&next)?,
            }
        }
        debug!(count = uids.len(), "listed post uids");
        Ok(uids)
    }

    #[instrument(skip(self))]
    fn post_by_uid(&self, uid: &str) -> Result<Post> {
        let url = self.search_url(&uid_predicate(POST_TYPE, uid), 1, None)?;
        let response: SearchResponse<Post> = self.get(url.as_str())?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(uid.to_owned()))
    }
}

impl PageFetcher for PrismicClient {
    #[instrument(skip(self))]
    fn fetch_page(&self, token: &str) -> Result<PostPage> {
        self.get(token)
    }
}

fn type_predicate(document_type: &str) -> String {
    format!("[[at(document.type,\"{}\")]]", document_type)
}

fn uid_predicate(document_type: &str, uid: &str) -> String {
    format!("[[at(my.{}.uid,{})]]", document_type, quote(uid))
}

// Renders `value` as a double-quoted predicate string literal.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn master_ref(
    http: &Client,
    endpoint: &Url,
    access_token: Option<&str>,
) -> Result<String> {
    let mut url = endpoint.clone();
    if let Some(token) = access_token {
        url.query_pairs_mut().append_pair("access_token", token);
    }
    let api: ApiRoot = get_json(http, url.as_str())?;
    api.refs
        .into_iter()
        .find(|r| r.is_master_ref)
        .map(|r| r.reference)
        .ok_or(Error::MissingMasterRef)
}

fn get_json<T: DeserializeOwned>(http: &Client, url: &str) -> Result<T> {
    debug!(url = %url, "GET");
    let response = http.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_owned(),
            status,
        });
    }
    Ok(serde_json::from_str(&response.text()?)?)
}

#[derive(Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,

    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

#[derive(Deserialize)]
struct SearchResponse<T> {
    results: Vec<T>,
}

/// The result of a fallible CMS operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error talking to the CMS.
#[derive(Debug)]
pub enum Error {
    /// Returned when the request couldn't be sent or its body couldn't be
    /// read.
    Http(reqwest::Error),

    /// Returned when the API answers with a non-success status.
    Status { url: String, status: StatusCode },

    /// Returned when a response body isn't the expected JSON.
    Json(serde_json::Error),

    /// Returned when the API endpoint can't have path segments appended.
    InvalidEndpoint(Url),

    /// Returned when the API root lists no master ref.
    MissingMasterRef,

    /// Returned when a requested document doesn't exist.
    NotFound(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "{}", err),
            Error::Status { url, status } => {
                write!(f, "GET {}: unexpected status {}", url, status)
            }
            Error::Json(err) => write!(f, "Decoding response: {}", err),
            Error::InvalidEndpoint(url) => {
                write!(f, "Invalid API endpoint `{}`", url)
            }
            Error::MissingMasterRef => {
                write!(f, "API root doesn't list a master ref")
            }
            Error::NotFound(what) => write!(f, "Document `{}` not found", what),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Status { .. }
            | Error::InvalidEndpoint(_)
            | Error::MissingMasterRef
            | Error::NotFound(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator on requests.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator when decoding response bodies.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
