use crate::config::Comments;
use crate::pagination::PostListState;
use crate::post::Post;
use crate::value::post_url;
use gtmpl::{Template, Value};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Responsible for templating and writing the listing and post HTML pages to
/// disk.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The base URL for listing pages after the first. The listing grown by
    /// `n` "load more" steps lives at `{index_url}/{n}.html`.
    pub index_url: &'a Url,

    /// The base URL for post pages, `{posts_url}/{uid}.html`.
    pub posts_url: &'a Url,

    /// The directory the first listing page (`index.html`) is written to.
    pub root_output_directory: &'a Path,

    /// The directory the other listing pages are written to.
    pub index_output_directory: &'a Path,

    /// The directory post pages are written to.
    pub posts_output_directory: &'a Path,

    /// The URL for the site's home page. This is made available to both post and
    /// index templates, typically as the destination for the site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets. This is made available to both post and
    /// index templates, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The site title, available to both templates as `site_title`.
    pub title: &'a str,

    /// The comment widget settings, available to post templates as
    /// `comments` (nil when comments are disabled).
    pub comments: Option<&'a Comments>,

    /// Whether the site is built from a preview ref. Available to both
    /// templates as `preview`.
    pub preview: bool,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
            obj.insert(
                "site_title".to_owned(),
                Value::String(self.title.to_owned()),
            );
            obj.insert("preview".to_owned(), Value::Bool(self.preview));
            obj.insert(
                "comments".to_owned(),
                match self.comments {
                    Some(comments) => comments.into(),
                    None => Value::Nil,
                },
            );
        }

        if let Some(dir) = page.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        debug!(path = %page.file_path.display(), "writing page");
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        Ok(())
    }

    /// Writes one listing page per [`PostListState`]. `listings[0]` is the
    /// initial listing and each following state is the previous one grown by
    /// one "load more" step.
    pub fn write_index(&self, listings: &[PostListState]) -> Result<()> {
        index_pages(
            listings,
            self.index_url,
            self.posts_url,
            self.root_output_directory,
            self.index_output_directory,
            self.index_template,
        )
        .map(|page| self.write_page(&page))
        .collect()
    }

    /// Writes a detail page for each post, linking every post to its
    /// neighbors.
    pub fn write_posts(&self, posts: &[Post]) -> Result<()> {
        post_pages(
            posts,
            self.posts_url,
            self.posts_output_directory,
            self.posts_template,
        )
        .map(|page| self.write_page(&page))
        .collect()
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, and `next` (see [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// Creates all of the post [`Page`]s for a set of [`Post`]s.
fn post_pages<'a>(
    posts: &'a [Post],
    posts_url: &'a Url,
    posts_output_directory: &'a Path,
    template: &'a Template,
) -> impl Iterator<Item = Page<'a>> {
    posts.iter().enumerate().map(move |(i, post)| Page {
        item: post.to_value(posts_url),
        file_path: posts_output_directory.join(format!("{}.html", post.uid)),
        prev: match i < 1 {
            true => None,
            false => Some(post_url(posts_url, &posts[i - 1].uid)),
        },
        next: match i + 1 >= posts.len() {
            true => None,
            false => Some(post_url(posts_url, &posts[i + 1].uid)),
        },
        template,
    })
}

/// Creates the listing [`Page`]s. Page `i` shows every post accumulated in
/// `listings[i]`; its `next` link (the "load more" button) points at page
/// `i + 1` and is only present while the CMS still has a next page and that
/// page was rendered.
fn index_pages<'a>(
    listings: &'a [PostListState],
    index_url: &'a Url,
    posts_url: &'a Url,
    root_output_directory: &'a Path,
    index_output_directory: &'a Path,
    template: &'a Template,
) -> impl Iterator<Item = Page<'a>> {
    let page_url = move |i: usize| -> Option<Url> {
        match i {
            0 => index_url.join("../").ok(),
            _ => index_url.join(&format!("{}.html", i)).ok(),
        }
    };

    listings.iter().enumerate().map(move |(i, listing)| Page {
        item: Value::Array(
            listing
                .items
                .iter()
                .map(|summary| summary.to_value(posts_url))
                .collect(),
        ),
        file_path: match i {
            0 => root_output_directory.join("index.html"),
            _ => index_output_directory.join(format!("{}.html", i)),
        },
        prev: match i {
            0 => None,
            _ => page_url(i - 1),
        },
        next: match listing.has_more() && i + 1 < listings.len() {
            false => None,
            true => page_url(i + 1),
        },
        template,
    })
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => write!(f, "Rendering template: {}", err),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::PostSummary;

    fn summary(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_owned(),
            published_at: None,
            title: id.to_uppercase(),
            subtitle: String::new(),
            author: String::new(),
        }
    }

    fn listing(ids: &[&str], next: Option<&str>) -> PostListState {
        PostListState {
            items: ids.iter().map(|id| summary(id)).collect(),
            next_page_token: next.map(str::to_owned),
        }
    }

    fn template(source: &str) -> std::result::Result<Template, String> {
        let mut template = Template::default();
        template.parse(source)?;
        Ok(template)
    }

    #[test]
    fn test_index_pages_links() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index_url = Url::parse("https://example.org/pages/")?;
        let posts_url = Url::parse("https://example.org/post/")?;
        let template = template("")?;
        let listings = vec![
            listing(&["a"], Some("p2")),
            listing(&["a", "b"], Some("p3")),
            listing(&["a", "b", "c"], Some("p4")),
        ];

        let pages: Vec<Page> = index_pages(
            &listings,
            &index_url,
            &posts_url,
            Path::new("out"),
            Path::new("out/pages"),
            &template,
        )
        .collect();

        let files: Vec<&Path> = pages.iter().map(|p| p.file_path.as_path()).collect();
        assert_eq!(
            vec![
                Path::new("out/index.html"),
                Path::new("out/pages/1.html"),
                Path::new("out/pages/2.html"),
            ],
            files
        );

        let next: Vec<Option<&str>> =
            pages.iter().map(|p| p.next.as_ref().map(Url::as_str)).collect();
        // The last rendered listing still has a CMS cursor, but there is no
        // page to link it to.
        assert_eq!(
            vec![
                Some("https://example.org/pages/1.html"),
                Some("https://example.org/pages/2.html"),
                None,
            ],
            next
        );
        assert_eq!(
            Some("https://example.org/"),
            pages[1].prev.as_ref().map(Url::as_str)
        );
        match &pages[2].item {
            Value::Array(items) => assert_eq!(3, items.len()),
            _ => panic!("listing item isn't an array"),
        }
        Ok(())
    }

    #[test]
    fn test_index_pages_exhausted() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index_url = Url::parse("https://example.org/pages/")?;
        let posts_url = Url::parse("https://example.org/post/")?;
        let template = template("")?;
        let listings = vec![listing(&["a"], Some("p2")), listing(&["a", "b"], None)];

        let pages: Vec<Page> = index_pages(
            &listings,
            &index_url,
            &posts_url,
            Path::new("out"),
            Path::new("out/pages"),
            &template,
        )
        .collect();

        assert!(pages[0].next.is_some());
        assert!(pages[1].next.is_none());
        Ok(())
    }

    #[test]
    fn test_write_index() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let out = tempfile::tempdir()?;
        let home_page = Url::parse("https://example.org/")?;
        let index_url = home_page.join("pages/")?;
        let posts_url = home_page.join("post/")?;
        let static_url = home_page.join("static/")?;
        let index_template = template(
            "{{ .site_title }}:{{ range .item }}[{{ .title }} {{ .url }}]{{ end }}{{ if .next }} more={{ .next }}{{ end }}",
        )?;
        let posts_template = template("")?;
        let writer = Writer {
            posts_template: &posts_template,
            index_template: &index_template,
            index_url: &index_url,
            posts_url: &posts_url,
            root_output_directory: out.path(),
            index_output_directory: &out.path().join("pages"),
            posts_output_directory: &out.path().join("post"),
            home_page: &home_page,
            static_url: &static_url,
            title: "spacetraveling",
            comments: None,
            preview: false,
        };

        writer.write_index(&[listing(&["a"], Some("p2")), listing(&["a", "b"], None)])?;

        assert_eq!(
            "spacetraveling:[A https://example.org/post/a.html] more=https://example.org/pages/1.html",
            std::fs::read_to_string(out.path().join("index.html"))?
        );
        assert_eq!(
            "spacetraveling:[A https://example.org/post/a.html][B https://example.org/post/b.html]",
            std::fs::read_to_string(out.path().join("pages").join("1.html"))?
        );
        Ok(())
    }

    #[test]
    fn test_write_index_escapes_titles() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let out = tempfile::tempdir()?;
        let home_page = Url::parse("https://example.org/")?;
        let index_url = home_page.join("pages/")?;
        let posts_url = home_page.join("post/")?;
        let static_url = home_page.join("static/")?;
        let index_template =
            template("{{ range .item }}<strong>{{ .title }}</strong>{{ end }}")?;
        let posts_template = template("")?;
        let writer = Writer {
            posts_template: &posts_template,
            index_template: &index_template,
            index_url: &index_url,
            posts_url: &posts_url,
            root_output_directory: out.path(),
            index_output_directory: &out.path().join("pages"),
            posts_output_directory: &out.path().join("post"),
            home_page: &home_page,
            static_url: &static_url,
            title: "spacetraveling",
            comments: None,
            preview: false,
        };
        let mut generics = summary("generics");
        generics.title = "Generics <T> & you".to_owned();

        writer.write_index(&[PostListState {
            items: vec![generics],
            next_page_token: None,
        }])?;

        assert_eq!(
            "<strong>Generics &lt;T&gt; &amp; you</strong>",
            std::fs::read_to_string(out.path().join("index.html"))?
        );
        Ok(())
    }
}
