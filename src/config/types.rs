use crate::error::{RehostError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Keys that select the explicit rule form.
const RESERVED_KEYS: [&str; 3] = ["match", "rewrite", "continue"];

/// Top-level contents of a `.rehost.toml` file, before rule normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigFile {
	#[serde(default)]
	pub root: bool,

	#[serde(default)]
	pub no_external_lookup: bool,

	#[serde(default)]
	pub root_config_lookup_disable_env_var: Option<String>,

	#[serde(default)]
	pub rules: Vec<RuleEntry>,
}

/// A rule as written in configuration.
///
/// Either `{ match = "...", rewrite = "...", continue = true }` or a table
/// with exactly one `"<pattern>" = "<rewrite>"` entry. The shape is decided
/// in [`RuleEntry::normalize`] so every bad shape reports a `MalformedRule`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RuleEntry(pub toml::Table);

/// Top-level configuration with every rule resolved to its canonical shape.
#[derive(Debug, Clone, Default)]
pub struct Config {
	/// If true, stop directory cascade and jump directly to ~/.rehost.toml.
	pub root: bool,

	/// If true, only this file is used; parent and user configs are ignored.
	pub no_external_lookup: bool,

	/// Environment variable name that, if truthy, skips ~/.rehost.toml lookup.
	/// Useful for CI environments.
	pub root_config_lookup_disable_env_var: Option<String>,

	/// Rewrite rules in declaration order.
	pub rules: Vec<Rule>,
}

/// A rewrite rule in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
	/// Regex searched (unanchored) in the original path.
	pub pattern: String,

	/// Raw rewrite spec, parsed when the rule matches.
	pub rewrite: String,

	/// Keep evaluating later rules after this one applies.
	pub continue_evaluation: bool,
}

impl Rule {
	pub fn new(pattern: impl Into<String>, rewrite: impl Into<String>) -> Self {
		Rule {
			pattern: pattern.into(),
			rewrite: rewrite.into(),
			continue_evaluation: false,
		}
	}

	pub fn and_continue(mut self) -> Self {
		self.continue_evaluation = true;
		self
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from multiple config files in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// All rules from all configs, in cascade order.
	pub rules: Vec<RuleWithSource>,

	/// Whether external lookup is disabled (from any config in cascade).
	pub no_external_lookup: bool,
}

/// A rule with its source config path for debugging/display.
#[derive(Debug, Clone)]
pub struct RuleWithSource {
	/// The rule itself.
	pub rule: Rule,

	/// The config file this rule came from.
	pub source: PathBuf,
}

impl RuleEntry {
	/// Resolve this entry to exactly one (pattern, rewrite) pair.
	///
	/// Any of `match`, `rewrite` or `continue` selects the explicit form;
	/// otherwise the table must hold a single `pattern = rewrite` entry.
	pub fn normalize(self, index: usize) -> Result<Rule> {
		let malformed = move |reason: String| RehostError::MalformedRule { index, reason };
		let mut table = self.0;

		if RESERVED_KEYS.iter().any(|key| table.contains_key(*key)) {
			let pattern = take_string(&mut table, "match").map_err(malformed)?;
			let rewrite = take_string(&mut table, "rewrite").map_err(malformed)?;
			let continue_evaluation = match table.remove("continue") {
				None => false,
				Some(toml::Value::Boolean(flag)) => flag,
				Some(other) => {
					return Err(malformed(format!(
						"`continue` must be a boolean, found {}",
						other.type_str()
					)));
				}
			};

			if let Some(key) = table.keys().next() {
				return Err(malformed(format!("unknown key `{key}` in explicit rule")));
			}

			return Ok(Rule {
				pattern,
				rewrite,
				continue_evaluation,
			});
		}

		let count = table.len();
		let mut entries = table.into_iter();
		let (Some((pattern, value)), None) = (entries.next(), entries.next()) else {
			return Err(malformed(format!(
				"expected a single `pattern = rewrite` entry or explicit `match`/`rewrite` keys, found {count} keys"
			)));
		};

		match value {
			toml::Value::String(rewrite) => Ok(Rule::new(pattern, rewrite)),
			other => Err(malformed(format!(
				"rewrite for `{pattern}` must be a string, found {}",
				other.type_str()
			))),
		}
	}
}

/// Remove a required string key from an explicit rule table.
fn take_string(table: &mut toml::Table, key: &str) -> std::result::Result<String, String> {
	match table.remove(key) {
		Some(toml::Value::String(value)) => Ok(value),
		Some(other) => Err(format!("`{key}` must be a string, found {}", other.type_str())),
		None => Err(format!("explicit rule is missing `{key}`")),
	}
}

impl ConfigFile {
	/// Normalize every rule, failing on the first malformed one.
	pub fn into_config(self) -> Result<Config> {
		let rules = self
			.rules
			.into_iter()
			.enumerate()
			.map(|(index, entry)| entry.normalize(index))
			.collect::<Result<Vec<_>>>()?;

		Ok(Config {
			root: self.root,
			no_external_lookup: self.no_external_lookup,
			root_config_lookup_disable_env_var: self.root_config_lookup_disable_env_var,
			rules,
		})
	}
}
