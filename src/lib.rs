//! The library code for the `spacetraveling` blog generator. Posts live in a
//! Prismic repository; building the site is broken down into three steps:
//!
//! 1. Reading posts from the CMS ([`crate::cms`]) through the
//!    [`cms::ContentSource`] capability
//! 2. Paginating the post listing ([`crate::pagination`])
//! 3. Rendering listing and post pages to disk ([`crate::write`])
//!
//! The listing is paginated the way the blog's "load more" button works: the
//! first listing page holds the first `page_size` posts, and each following
//! page holds everything before it plus the next page fetched from the CMS's
//! `next_page` cursor (see [`pagination::load_more`]).
//!
//! Post pages additionally carry a reading-time estimate
//! ([`read_time::estimate`]), pt-BR formatted publication and edit dates
//! ([`crate::date`]), the rendered rich-text content ([`crate::richtext`]),
//! and the settings for the utterances comment widget.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod cms;
pub mod config;
pub mod date;
pub mod pagination;
pub mod post;
pub mod read_time;
pub mod richtext;
pub mod value;
pub mod write;
