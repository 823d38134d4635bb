//! Defines the post records rendered by the site: [`PostSummary`] for listing
//! pages and [`Post`] for detail pages, along with the CMS document shapes
//! they're projected from. Only the projected fields are retained.

use crate::date::{self, Timestamp};
use crate::richtext::{self, RichText};
use serde::Deserialize;

/// One row in a listing page.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "SummaryDocument")]
pub struct PostSummary {
    pub id: String,
    pub published_at: Option<Timestamp>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A heading plus its structured-text body.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: String,

    #[serde(default)]
    pub body: RichText,
}

/// A fully-loaded post, as rendered on its detail page.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "PostDocument")]
pub struct Post {
    pub uid: String,
    pub first_publication_date: Option<Timestamp>,
    pub last_publication_date: Option<Timestamp>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub content: Vec<ContentBlock>,
}

impl Post {
    /// The listing-page projection of this post.
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.uid.clone(),
            published_at: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}

/// Text fields may be configured as key text (a plain string) or as a
/// structured-text title, in which case they're flattened to plain text.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextField {
    Plain(String),
    Rich(RichText),
}

// Missing and `null` fields both render as empty strings.
fn text(field: Option<TextField>) -> String {
    match field {
        None => String::new(),
        Some(TextField::Plain(s)) => s,
        Some(TextField::Rich(nodes)) => richtext::as_text(&nodes),
    }
}

#[derive(Deserialize)]
struct SummaryDocument {
    #[serde(default)]
    uid: Option<String>,

    #[serde(default, deserialize_with = "date::deserialize_opt")]
    first_publication_date: Option<Timestamp>,

    data: SummaryData,
}

#[derive(Deserialize)]
struct SummaryData {
    #[serde(default)]
    title: Option<TextField>,
    #[serde(default)]
    subtitle: Option<TextField>,
    #[serde(default)]
    author: Option<TextField>,
}

impl From<SummaryDocument> for PostSummary {
    fn from(doc: SummaryDocument) -> PostSummary {
        PostSummary {
            id: doc.uid.unwrap_or_default(),
            published_at: doc.first_publication_date,
            title: text(doc.data.title),
            subtitle: text(doc.data.subtitle),
            author: text(doc.data.author),
        }
    }
}

#[derive(Deserialize)]
struct PostDocument {
    #[serde(default)]
    uid: Option<String>,

    #[serde(default, deserialize_with = "date::deserialize_opt")]
    first_publication_date: Option<Timestamp>,

    #[serde(default, deserialize_with = "date::deserialize_opt")]
    last_publication_date: Option<Timestamp>,

    data: PostData,
}

#[derive(Deserialize)]
struct PostData {
    #[serde(default)]
    title: Option<TextField>,
    #[serde(default)]
    subtitle: Option<TextField>,
    #[serde(default)]
    author: Option<TextField>,
    #[serde(default)]
    banner: Banner,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Default)]
struct Banner {
    #[serde(default)]
    url: Option<String>,
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Post {
        Post {
            uid: doc.uid.unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            title: text(doc.data.title),
            subtitle: text(doc.data.subtitle),
            author: text(doc.data.author),
            banner_url: doc.data.banner.url,
            content: doc.data.content,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::richtext::RichTextNode;

    #[test]
    fn test_summary_projection() -> serde_json::Result<()> {
        let summary: PostSummary = serde_json::from_str(
            r#"{
                "id": "YF0x",
                "uid": "como-utilizar-hooks",
                "type": "post",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "last_publication_date": "2021-03-16T10:00:00+0000",
                "data": {
                    "title": "Como utilizar Hooks",
                    "subtitle": "Pensando em sincronização",
                    "author": "Joseph Oliveira",
                    "banner": {"url": "https://images.prismic.io/x.png"}
                }
            }"#,
        )?;

        assert_eq!("como-utilizar-hooks", summary.id);
        assert_eq!("Como utilizar Hooks", summary.title);
        assert_eq!("Pensando em sincronização", summary.subtitle);
        assert_eq!("Joseph Oliveira", summary.author);
        assert_eq!(
            Some("15 mar 2021".to_owned()),
            summary.published_at.as_ref().map(date::format_date)
        );
        Ok(())
    }

    #[test]
    fn test_summary_null_publication_date() -> serde_json::Result<()> {
        let summary: PostSummary = serde_json::from_str(
            r#"{
                "uid": "draft",
                "first_publication_date": null,
                "data": {"title": "t", "subtitle": "s", "author": "a"}
            }"#,
        )?;
        assert_eq!(None, summary.published_at);
        Ok(())
    }

    #[test]
    fn test_post_rich_title_and_content() -> serde_json::Result<()> {
        let post: Post = serde_json::from_str(
            r#"{
                "uid": "criando-um-app",
                "first_publication_date": "2021-03-25T19:25:28+0000",
                "last_publication_date": "2021-03-25T19:27:35+0000",
                "data": {
                    "title": [{"type": "heading1", "text": "Criando um app", "spans": []}],
                    "subtitle": "Tudo sobre como criar",
                    "author": "Danilo Vieira",
                    "banner": {"url": "https://images.prismic.io/banner.png"},
                    "content": [
                        {
                            "heading": "Proin et varius",
                            "body": [{"type": "paragraph", "text": "Lorem ipsum", "spans": []}]
                        }
                    ]
                }
            }"#,
        )?;

        assert_eq!("Criando um app", post.title);
        assert_eq!(
            Some("https://images.prismic.io/banner.png"),
            post.banner_url.as_deref()
        );
        assert_eq!(
            vec![ContentBlock {
                heading: "Proin et varius".to_owned(),
                body: vec![RichTextNode::paragraph("Lorem ipsum")],
            }],
            post.content
        );
        assert_eq!("criando-um-app", post.summary().id);
        Ok(())
    }
}
