//! URL handling module for pagesift
//!
//! This module provides link normalization, site-origin comparison and the
//! wildcard pattern matcher used to admit discovered URLs.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{same_site, site_origin};
pub use matcher::{matches, PatternMatcher, UrlPattern};
pub use normalize::{normalize_url, strip_tracking_params};
