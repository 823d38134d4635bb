//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: querying the listing and its
//! "load more" pages ([`crate::pagination`]), loading every post
//! ([`crate::cms`]), rendering listing and post pages ([`crate::write`]), and
//! copying the theme's static directory into the static output directory.

use crate::cms::{ContentSource, Error as CmsError, PrismicClient};
use crate::config::Config;
use crate::pagination::{load_more, Error as PaginationError, PageFetcher, PostListState};
use crate::post::Post;
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Builds the site from a [`Config`] object against the configured Prismic
/// repository. See [`build_site_from`].
pub fn build_site(config: &Config) -> Result<()> {
    let client = PrismicClient::new(
        config.api_endpoint.clone(),
        config.access_token.clone(),
        config.preview_ref.clone(),
    )?;
    build_site_from(config, &client)
}

/// Builds the site from a [`Config`] object, reading posts from `source`.
pub fn build_site_from<S>(config: &Config, source: &S) -> Result<()>
where
    S: ContentSource + PageFetcher,
{
    let listings = listings(source, config.page_size, config.max_index_pages)?;
    info!(pages = listings.len(), "loaded listing pages");

    let posts = source
        .post_uids()?
        .iter()
        .map(|uid| source.post_by_uid(uid))
        .collect::<std::result::Result<Vec<Post>, CmsError>>()?;
    info!(posts = posts.len(), "loaded posts");

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    // Blow away the old output directories so we don't have any collisions. We
    // don't naively delete the whole root output directory in case the user
    // accidentally passes the wrong directory.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;
    std::fs::create_dir_all(&config.root_output_directory)?;

    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        index_url: &config.index_url,
        posts_url: &config.posts_url,
        root_output_directory: &config.root_output_directory,
        index_output_directory: &config.index_output_directory,
        posts_output_directory: &config.posts_output_directory,
        home_page: &config.home_page,
        static_url: &config.static_url,
        title: &config.title,
        comments: config.comments.as_ref(),
        preview: config.preview_ref.is_some(),
    };
    writer.write_index(&listings)?;
    writer.write_posts(&posts)?;

    copy_dir(
        &config.static_source_directory,
        &config.static_output_directory,
    )?;
    Ok(())
}

/// Returns the initial listing followed by each listing after one more
/// [`load_more`] step, stopping when the CMS runs out of pages or after
/// `max_pages` listings.
fn listings<S>(
    source: &S,
    page_size: usize,
    max_pages: usize,
) -> Result<Vec<PostListState>>
where
    S: ContentSource + PageFetcher,
{
    let mut listings = vec![PostListState::from(source.query_posts(page_size)?)];
    while listings.len() < max_pages {
        let last = &listings[listings.len() - 1];
        if !last.has_more() {
            break;
        }
        let next = load_more(last, source)?;
        listings.push(next);
    }

    if listings[listings.len() - 1].has_more() {
        warn!(max_pages, "stopped paginating before the last page");
    }
    Ok(listings)
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        warn!(path = %src.display(), "no static directory to copy");
        return Ok(());
    }

    use walkdir::WalkDir;
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix shouldn't fail since `src` is always an ancestor of
        // the entry's path
        let target = match entry.path().strip_prefix(src) {
            Ok(relative) => dst.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(
    template_files: impl Iterator<Item = P>,
) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be while reading from the
/// CMS, paginating, writing, cleaning output directories, parsing template
/// files, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors reading from the CMS.
    Cms(CmsError),

    /// Returned for errors loading listing pages.
    Pagination(PaginationError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors walking the static directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Cms(err) => write!(f, "{}", err),
            Error::Pagination(err) => write!(f, "{}", err),
            Error::Write(err) => write!(f, "{}", err),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Cms(err) => Some(err),
            Error::Pagination(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<CmsError> for Error {
    /// Converts [`CmsError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: CmsError) -> Error {
        Error::Cms(err)
    }
}

impl From<PaginationError> for Error {
    /// Converts [`PaginationError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: PaginationError) -> Error {
        Error::Pagination(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
