//! Application services: content fetching, feeds and sitemap.

pub mod error;
pub mod site;
pub mod sitemap;
pub mod source;
pub mod syndication;
