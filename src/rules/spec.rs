use crate::error::{RehostError, Result};
use regex::{Captures, Regex};
use std::str::FromStr;
use std::sync::LazyLock;
use url::{Host, Url};

/// `[scheme]://[host][:port][/path][?query]`
static ABSOLUTE_FORM: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^(?P<scheme>https?)?://(?P<host>\[[^\]]*\]|[^/:?#\[\]]*)(?::(?P<port>[^/?#]*))?(?P<path>/[^?#]*)?(?:\?[^#]*)?$",
	)
	.expect("absolute form regex is valid")
});

static BARE_SCHEME_FORM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?P<scheme>https?)://$").expect("bare scheme regex is valid"));

/// `host[:port]`
static AUTHORITY_FORM: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?P<host>\[[^\]]*\]|[^/:?#\[\]]+)(?::(?P<port>\d*))?$")
		.expect("authority form regex is valid")
});

/// Paths are checked by round-tripping them through this URL.
static PATH_PROBE: LazyLock<Url> =
	LazyLock::new(|| Url::parse("http://path.invalid/").expect("probe URL is valid"));

/// Sparse set of URL component overrides parsed from a rewrite spec.
///
/// Only the fields that are present get applied to the target URL. `path` is
/// a prefix: it always starts with `/` and never ends with one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSpec {
	pub scheme: Option<String>,
	pub host: Option<String>,
	pub port: Option<u16>,
	pub path: Option<String>,
}

impl RewriteSpec {
	/// Parse a rewrite spec such as `https://`, `cdn.example.com:8080`, `/v3`
	/// or `http://bucket.example.com/v1`.
	///
	/// The forms are tried in order and the first one that matches wins:
	/// absolute URL, bare scheme, `host[:port]`, absolute path.
	pub fn parse(spec: &str) -> Result<Self> {
		[
			parse_absolute_form,
			parse_bare_scheme_form,
			parse_authority_form,
			parse_path_form,
		]
		.into_iter()
		.filter_map(|form| form(spec))
		.find(|parsed| !parsed.is_empty())
		.ok_or_else(|| RehostError::UnrecognizedSpec {
			spec: spec.to_string(),
		})
	}

	/// True when the spec overrides nothing.
	pub fn is_empty(&self) -> bool {
		self.scheme.is_none() && self.host.is_none() && self.port.is_none() && self.path.is_none()
	}
}

impl FromStr for RewriteSpec {
	type Err = RehostError;

	fn from_str(s: &str) -> Result<Self> {
		RewriteSpec::parse(s)
	}
}

fn parse_absolute_form(spec: &str) -> Option<RewriteSpec> {
	let caps = ABSOLUTE_FORM.captures(spec)?;

	let path = match caps.name("path") {
		Some(raw) => normalize_path(raw.as_str())?,
		None => None,
	};

	Some(RewriteSpec {
		scheme: caps.name("scheme").map(|m| m.as_str().to_string()),
		host: parse_optional_host(&caps)?,
		port: parse_optional_port(&caps)?,
		path,
	})
}

fn parse_bare_scheme_form(spec: &str) -> Option<RewriteSpec> {
	let caps = BARE_SCHEME_FORM.captures(spec)?;

	Some(RewriteSpec {
		scheme: Some(caps["scheme"].to_string()),
		..Default::default()
	})
}

fn parse_authority_form(spec: &str) -> Option<RewriteSpec> {
	let caps = AUTHORITY_FORM.captures(spec)?;

	Some(RewriteSpec {
		host: parse_optional_host(&caps)?,
		port: parse_optional_port(&caps)?,
		..Default::default()
	})
}

fn parse_path_form(spec: &str) -> Option<RewriteSpec> {
	// path-absolute never starts with "//"
	if !spec.starts_with('/') || spec.starts_with("//") {
		return None;
	}

	Some(RewriteSpec {
		path: normalize_path(spec)?,
		..Default::default()
	})
}

/// `None` when the captured host is not a valid URL host, `Some(None)` when
/// no host was written.
///
/// IPv4 addresses must be written in dotted-decimal form; `8080` or `0x7f.1`
/// would otherwise be read as numeric addresses.
fn parse_optional_host(caps: &Captures) -> Option<Option<String>> {
	match caps.name("host").map(|m| m.as_str()) {
		None | Some("") => Some(None),
		Some(raw) => match Host::parse(raw).ok()? {
			Host::Ipv4(addr) if addr.to_string() != raw => None,
			host => Some(Some(host.to_string())),
		},
	}
}

/// `None` when the captured port is not a decimal `u16`, `Some(None)` when no
/// port was written. An empty port (`host:`) counts as absent.
fn parse_optional_port(caps: &Captures) -> Option<Option<u16>> {
	match caps.name("port").map(|m| m.as_str()) {
		None | Some("") => Some(None),
		Some(raw) if raw.bytes().all(|b| b.is_ascii_digit()) => raw.parse().ok().map(Some),
		Some(_) => None,
	}
}

/// Validate an absolute path and turn it into a prefix.
///
/// `None` when the path would be changed by URL serialization (characters
/// that need percent-encoding, dot segments). `Some(None)` when nothing but
/// slashes remain after stripping the trailing ones.
fn normalize_path(raw: &str) -> Option<Option<String>> {
	let mut probe = PATH_PROBE.clone();
	probe.set_path(raw);
	if probe.path() != raw {
		return None;
	}

	let trimmed = raw.trim_end_matches('/');
	if trimmed.is_empty() {
		Some(None)
	} else {
		Some(Some(trimmed.to_string()))
	}
}
