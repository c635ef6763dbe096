use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig, RuleWithSource};
use crate::error::{RehostError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in every directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".rehost.toml";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.rehost.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.rehost.toml (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();

	for dir in start_dir.ancestors() {
		let config_path = dir.join(CONFIG_FILE_NAME);
		if !config_path.exists() {
			continue;
		}

		debug!(path = %config_path.display(), "loading config");
		let config = parse_config_file(&config_path)?;
		let isolated = config.no_external_lookup;
		let root = config.root;

		configs.push(LoadedConfig {
			config,
			path: config_path,
		});

		if isolated {
			return Ok(configs);
		}
		if root {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.rehost.toml if it exists and isn't disabled.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	let disabled = existing_configs.iter().any(|loaded| {
		loaded
			.config
			.root_config_lookup_disable_env_var
			.as_deref()
			.is_some_and(is_env_truthy)
	});
	if disabled {
		debug!("user config lookup disabled by environment");
		return Ok(None);
	}

	let user_config_path = user_config_path()?;
	if !user_config_path.exists() {
		return Ok(None);
	}

	debug!(path = %user_config_path.display(), "loading user config");
	let config = parse_config_file(&user_config_path)?;
	Ok(Some(LoadedConfig {
		config,
		path: user_config_path,
	}))
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Merge multiple configs into a single effective config.
///
/// Rules are concatenated in cascade order, so rules from the most specific
/// file are evaluated first.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		merged
			.rules
			.extend(loaded.config.rules.iter().map(|rule| RuleWithSource {
				rule: rule.clone(),
				source: loaded.path.clone(),
			}));

		if loaded.config.no_external_lookup {
			merged.no_external_lookup = true;
		}
	}

	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(RehostError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn test_is_env_truthy() {
		// SAFETY: These env var operations are safe in single-threaded test context
		unsafe {
			std::env::remove_var("TEST_REHOST_ENV_1");
			assert!(!is_env_truthy("TEST_REHOST_ENV_1"));

			std::env::set_var("TEST_REHOST_ENV_2", "");
			assert!(!is_env_truthy("TEST_REHOST_ENV_2"));

			std::env::set_var("TEST_REHOST_ENV_3", "0");
			assert!(!is_env_truthy("TEST_REHOST_ENV_3"));

			std::env::set_var("TEST_REHOST_ENV_4", "FALSE");
			assert!(!is_env_truthy("TEST_REHOST_ENV_4"));

			std::env::set_var("TEST_REHOST_ENV_5", "no");
			assert!(!is_env_truthy("TEST_REHOST_ENV_5"));

			std::env::set_var("TEST_REHOST_ENV_6", "1");
			assert!(is_env_truthy("TEST_REHOST_ENV_6"));

			std::env::set_var("TEST_REHOST_ENV_7", "yes");
			assert!(is_env_truthy("TEST_REHOST_ENV_7"));

			for i in 1..=7 {
				std::env::remove_var(format!("TEST_REHOST_ENV_{}", i));
			}
		}
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path().unwrap();
		assert!(path.ends_with(CONFIG_FILE_NAME));
	}

	#[test]
	fn test_root_config_stops_cascade() {
		let temp_dir = tempfile::tempdir().unwrap();
		let child = temp_dir.path().join("app");
		fs::create_dir(&child).unwrap();

		fs::write(
			temp_dir.path().join(CONFIG_FILE_NAME),
			"[[rules]]\n\"^/parent\" = \"/p\"\n",
		)
		.unwrap();
		fs::write(
			child.join(CONFIG_FILE_NAME),
			"root = true\nno-external-lookup = true\n[[rules]]\n\"^/child\" = \"/c\"\n",
		)
		.unwrap();

		let configs = discover_configs(&child).unwrap();
		assert_eq!(configs.len(), 1);
		assert_eq!(configs[0].config.rules[0].pattern, "^/child");
	}

	#[test]
	fn test_nested_configs_merge_most_specific_first() {
		let temp_dir = tempfile::tempdir().unwrap();
		let child = temp_dir.path().join("app");
		fs::create_dir(&child).unwrap();

		fs::write(
			temp_dir.path().join(CONFIG_FILE_NAME),
			"no-external-lookup = true\n[[rules]]\n\"^/parent\" = \"/p\"\n",
		)
		.unwrap();
		fs::write(
			child.join(CONFIG_FILE_NAME),
			"[[rules]]\n\"^/child\" = \"/c\"\n",
		)
		.unwrap();

		let merged = load_merged_config(&child).unwrap();
		let patterns: Vec<_> = merged
			.rules
			.iter()
			.map(|r| r.rule.pattern.as_str())
			.collect();
		assert_eq!(patterns, vec!["^/child", "^/parent"]);
		assert!(merged.no_external_lookup);
		assert_eq!(merged.rules[0].source, child.join(CONFIG_FILE_NAME));
	}
}
