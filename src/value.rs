//! Conversions from the site's records into template [`Value`]s.

use crate::config::Comments;
use crate::date::{self, Timestamp};
use crate::post::{ContentBlock, Post, PostSummary};
use crate::read_time;
use crate::richtext;
use gtmpl::Value;
use std::collections::HashMap;
use url::Url;

fn string<S: Into<String>>(s: S) -> Value {
    Value::String(s.into())
}

// Templates don't escape their output, so CMS text is escaped here. Rendered
// rich text is already HTML and goes through `string`.
fn text(s: &str) -> Value {
    string(html_escape::encode_text(s))
}

fn object(fields: Vec<(&str, Value)>) -> Value {
    let m: HashMap<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    Value::Object(m)
}

fn option_to_value<T, F: FnOnce(&T) -> Value>(opt: Option<&T>, f: F) -> Value {
    match opt {
        Some(t) => f(t),
        None => Value::Nil,
    }
}

/// The URL of a post's page under `posts_url`.
pub fn post_url(posts_url: &Url, uid: &str) -> Url {
    // `posts_url` always ends in a slash and uids are URL-safe slugs, so the
    // join can't fail.
    posts_url
        .join(&format!("{}.html", uid))
        .unwrap_or_else(|_| posts_url.clone())
}

impl PostSummary {
    /// Converts a listing row into a [`Value::Object`] with fields `id`,
    /// `url`, `title`, `subtitle`, `author` and `published` (a formatted date,
    /// or nil for unpublished documents).
    pub fn to_value(&self, posts_url: &Url) -> Value {
        let summary = self;
        object(vec![
            ("id", string(summary.id.as_str())),
            ("url", string(post_url(posts_url, &summary.id).as_str())),
            ("title", text(&summary.title)),
            ("subtitle", text(&summary.subtitle)),
            ("author", text(&summary.author)),
            (
                "published",
                option_to_value(summary.published_at.as_ref(), |t| {
                    string(date::format_date(t))
                }),
            ),
        ])
    }
}

impl From<&ContentBlock> for Value {
    /// Converts a content block into escaped `heading` text and rendered
    /// `body` HTML.
    fn from(block: &ContentBlock) -> Value {
        object(vec![
            ("heading", text(&block.heading)),
            ("body", string(richtext::as_html(&block.body))),
        ])
    }
}

impl Post {
    /// Converts a post into the `item` of its detail page. Besides the
    /// summary fields this carries `banner_url`, `read_time`, `content`, and
    /// `edited` (an object with `date` and `time`).
    pub fn to_value(&self, posts_url: &Url) -> Value {
        let post = self;
        let edited = |t: &Timestamp| {
            object(vec![
                ("date", string(date::format_date(t))),
                ("time", string(date::format_time(t))),
            ])
        };

        let mut value = post.summary().to_value(posts_url);
        if let Value::Object(m) = &mut value {
            m.insert(
                "banner_url".to_owned(),
                option_to_value(post.banner_url.as_ref(), |url| {
                    string(url.as_str())
                }),
            );
            m.insert(
                "edited".to_owned(),
                option_to_value(post.last_publication_date.as_ref(), edited),
            );
            m.insert(
                "read_time".to_owned(),
                match post.content.is_empty() {
                    true => Value::Nil,
                    false => string(read_time::estimate(&post.content)),
                },
            );
            m.insert(
                "content".to_owned(),
                Value::Array(post.content.iter().map(Value::from).collect()),
            );
        }
        value
    }
}

impl From<&Comments> for Value {
    /// Converts the comment widget settings for templating.
    fn from(comments: &Comments) -> Value {
        object(vec![
            ("repo", string(comments.repo.as_str())),
            ("label", string(comments.label.as_str())),
            ("issue_term", string(comments.issue_term.as_str())),
            ("theme", string(comments.theme.as_str())),
        ])
    }
}
