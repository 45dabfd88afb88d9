//! Shared utilities.
//!
//! Currently a single concern: security-focused URL validation applied to
//! user-supplied feed and page URLs before any fetch is issued.
//!
//! # Examples
//!
//! ```
//! use satchel::util::validate_url;
//!
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//! ```

mod url_validator;

pub use url_validator::{validate_url, UrlValidationError};
