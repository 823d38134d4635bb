//! Loads the project configuration. A project is a directory containing a
//! `spacetraveling.yaml` project file and a `theme/` directory whose
//! `theme.yaml` lists the template files for index and post pages.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

const PROJECT_FILE: &str = "spacetraveling.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(1)
    }
}

#[derive(Deserialize)]
struct MaxIndexPages(usize);
impl Default for MaxIndexPages {
    fn default() -> Self {
        MaxIndexPages(50)
    }
}

#[derive(Deserialize)]
struct Project {
    pub title: String,
    pub site_root: Url,
    pub api_endpoint: Url,

    #[serde(default)]
    pub page_size: PageSize,

    #[serde(default)]
    pub max_index_pages: MaxIndexPages,

    #[serde(default)]
    pub comments: Option<Comments>,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// Settings for the utterances comment widget embedded on post pages.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Comments {
    /// The GitHub repository (`owner/name`) whose issues hold the comments.
    pub repo: String,

    #[serde(default = "Comments::default_label")]
    pub label: String,

    #[serde(default = "Comments::default_issue_term")]
    pub issue_term: String,

    #[serde(default = "Comments::default_theme")]
    pub theme: String,
}

impl Comments {
    fn default_label() -> String {
        String::from("blog-comment")
    }

    fn default_issue_term() -> String {
        String::from("pathname")
    }

    fn default_theme() -> String {
        String::from("github-dark")
    }
}

/// Settings supplied on the command line rather than in the project file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    /// The CMS access token for private repositories.
    pub access_token: Option<String>,

    /// Build against this content release instead of the master ref.
    pub preview_ref: Option<String>,
}

pub struct Config {
    pub title: String,
    pub api_endpoint: Url,
    pub access_token: Option<String>,
    pub preview_ref: Option<String>,
    pub page_size: usize,
    pub max_index_pages: usize,
    pub comments: Option<Comments>,
    pub home_page: Url,
    pub index_url: Url,
    pub posts_url: Url,
    pub static_url: Url,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub static_source_directory: PathBuf,
    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for the project file.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        overrides: Overrides,
    ) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            match Config::from_project_file(&path, output_directory, overrides)
            {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => {
                    Config::from_directory(parent, output_directory, overrides)
                }
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        overrides: Overrides,
    ) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        let theme_dir = project_root.join("theme");
        let theme_file = open(&theme_dir.join("theme.yaml"), "theme")?;
        let theme: Theme = serde_yaml::from_reader(theme_file)?;

        let site_root = with_trailing_slash(project.site_root);
        Ok(Config {
            title: project.title,
            api_endpoint: project.api_endpoint,
            access_token: overrides.access_token,
            preview_ref: overrides.preview_ref,
            page_size: project.page_size.0,
            max_index_pages: project.max_index_pages.0,
            comments: project.comments,
            index_url: site_root.join("pages/")?,
            posts_url: site_root.join("post/")?,
            static_url: site_root.join("static/")?,
            home_page: site_root,
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            static_source_directory: theme_dir.join("static"),
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("post"),
            static_output_directory: output_directory.join("static"),
        })
    }
}

// Relative joins against a URL without a trailing slash replace its last path
// segment instead of appending to it.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}
