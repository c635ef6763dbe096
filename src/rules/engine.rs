use crate::config::types::{MergedConfig, Rule};
use crate::error::{RehostError, Result};
use crate::rules::spec::RewriteSpec;
use crate::rules::target::TargetUri;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, trace};
use url::Url;

/// A compiled rule ready for matching.
#[derive(Debug)]
pub struct CompiledRule {
	/// The original rule.
	pub rule: Rule,

	/// Compiled match pattern.
	pub regex: Regex,

	/// Source config path, when the rule came from a file.
	pub source: Option<PathBuf>,
}

impl CompiledRule {
	pub fn new(rule: Rule, source: Option<PathBuf>) -> Result<Self> {
		let regex = compile_regex(&rule.pattern)?;
		Ok(CompiledRule {
			rule,
			regex,
			source,
		})
	}

	/// Unanchored search: `/static` also matches `/im/not/static`.
	pub fn matches(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}
}

/// Compile a regex pattern string.
fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| RehostError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

/// An ordered, immutable list of compiled rewrite rules.
///
/// Patterns are compiled when the set is built, so a typo in a pattern fails
/// at load time. Rewrite specs are parsed each time their rule matches.
#[derive(Debug, Default)]
pub struct RuleSet {
	rules: Vec<CompiledRule>,
}

impl RuleSet {
	/// Compile rules that did not come from a config file.
	pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self> {
		let rules = rules
			.into_iter()
			.map(|rule| CompiledRule::new(rule, None))
			.collect::<Result<Vec<_>>>()?;
		Ok(RuleSet { rules })
	}

	/// Compile all rules in a merged config, keeping cascade order.
	pub fn from_config(config: &MergedConfig) -> Result<Self> {
		let rules = config
			.rules
			.iter()
			.map(|rws| CompiledRule::new(rws.rule.clone(), Some(rws.source.clone())))
			.collect::<Result<Vec<_>>>()?;
		Ok(RuleSet { rules })
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
		self.rules.iter()
	}

	/// Parse every rule's rewrite spec without applying anything.
	pub fn check_specs(&self) -> Result<()> {
		for compiled in &self.rules {
			RewriteSpec::parse(&compiled.rule.rewrite)?;
		}
		Ok(())
	}

	/// Rewrite `target` using the rules whose pattern is found in `path`.
	///
	/// `path` is the path originally handed to the URL generator; every rule
	/// is matched against it, never against the partially rewritten target.
	/// Evaluation stops after the first matching rule unless that rule sets
	/// `continue`. Path overrides are prefixed to the target's current path.
	///
	/// On error the target is dropped, so no partially rewritten URL escapes.
	pub fn apply<T: TargetUri>(&self, path: &str, mut target: T) -> Result<T> {
		for (index, compiled) in self.rules.iter().enumerate() {
			if !compiled.matches(path) {
				trace!(index, pattern = %compiled.regex, path, "rule did not match");
				continue;
			}

			debug!(
				index,
				pattern = %compiled.regex,
				rewrite = %compiled.rule.rewrite,
				path,
				"rule matched"
			);
			let spec = RewriteSpec::parse(&compiled.rule.rewrite)?;
			apply_spec(&spec, &mut target)?;

			if !compiled.rule.continue_evaluation {
				break;
			}
		}

		Ok(target)
	}

	/// Build `base.join(path)` and rewrite it, matching rules against `path`.
	pub fn rewrite_url(&self, base: &Url, path: &str) -> Result<Url> {
		let url = base.join(path).map_err(|source| RehostError::InvalidUrl {
			url: format!("{base} + {path}"),
			source,
		})?;
		self.apply(path, url)
	}
}

impl<'a> IntoIterator for &'a RuleSet {
	type Item = &'a CompiledRule;
	type IntoIter = std::slice::Iter<'a, CompiledRule>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Compile all rules in a merged config.
pub fn compile_rules(config: &MergedConfig) -> Result<RuleSet> {
	RuleSet::from_config(config)
}

fn apply_spec<T: TargetUri>(spec: &RewriteSpec, target: &mut T) -> Result<()> {
	if let Some(ref scheme) = spec.scheme {
		debug!(%scheme, "overriding scheme");
		target.set_scheme(scheme)?;
	}
	if let Some(ref host) = spec.host {
		debug!(%host, "overriding host");
		target.set_host(host)?;
	}
	if let Some(port) = spec.port {
		debug!(port, "overriding port");
		target.set_port(port)?;
	}
	if let Some(ref prefix) = spec.path {
		let path = format!("{prefix}{}", target.path());
		debug!(%path, "prefixing path");
		target.set_path(&path);
	}
	Ok(())
}
