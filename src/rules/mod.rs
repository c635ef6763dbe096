//! Rewrite rules for rehost.
//!
//! This module handles:
//! - Parsing rewrite specs into URL component overrides
//! - Matching rules against the original path and applying their overrides

pub mod engine;
pub mod spec;
pub mod target;

pub use engine::{CompiledRule, RuleSet, compile_rules};
pub use spec::RewriteSpec;
pub use target::TargetUri;
