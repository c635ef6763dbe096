use std::path::PathBuf;

/// Library-level structured errors for rehost.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum RehostError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Malformed rule #{index}: {reason}")]
	MalformedRule { index: usize, reason: String },

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Unrecognized rewrite spec: {spec:?}")]
	UnrecognizedSpec { spec: String },

	#[error("Cannot set URL {component} to {value:?}")]
	UriUpdate {
		component: &'static str,
		value: String,
	},

	#[error("Invalid URL: {url}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using RehostError.
pub type Result<T> = std::result::Result<T, RehostError>;
