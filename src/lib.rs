//! Rehost - rule-based rewriting of generated URLs.
//!
//! A URL generator hands rehost the path it was asked to link to together
//! with the URL it built. Ordered rules match that path and override the
//! URL's scheme, host, port or path prefix, so links can point at CDNs,
//! asset hosts or versioned prefixes without touching call sites.
//!
//! This library provides:
//! - Configuration file parsing and cascade discovery
//! - The rewrite spec grammar (`https://`, `cdn.example.com:8080`, `/v3`, ...)
//! - The rule engine applying matching rules to a URL
//!
//! # Example
//!
//! ```
//! use rehost::config::Rule;
//! use rehost::rules::RuleSet;
//! use url::Url;
//!
//! let rules = RuleSet::new([
//!     Rule::new("^/static", "/v1").and_continue(),
//!     Rule::new("^/static/js", "http://js.example.com"),
//! ])
//! .unwrap();
//!
//! let url = Url::parse("https://localhost/static/js/app.js").unwrap();
//! let rewritten = rules.apply("/static/js/app.js", url).unwrap();
//! assert_eq!(rewritten.as_str(), "http://js.example.com/v1/static/js/app.js");
//! ```

pub mod config;
pub mod error;
pub mod rules;

pub use error::{RehostError, Result};
