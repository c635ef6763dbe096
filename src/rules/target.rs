use crate::error::{RehostError, Result};
use url::Url;

/// A URL value the rule engine can rewrite in place.
///
/// Implementations own their own validation; a setter that refuses a value
/// reports it as [`RehostError::UriUpdate`].
pub trait TargetUri {
	fn path(&self) -> &str;

	fn set_scheme(&mut self, scheme: &str) -> Result<()>;

	fn set_host(&mut self, host: &str) -> Result<()>;

	fn set_port(&mut self, port: u16) -> Result<()>;

	fn set_path(&mut self, path: &str);
}

impl TargetUri for Url {
	fn path(&self) -> &str {
		Url::path(self)
	}

	fn set_scheme(&mut self, scheme: &str) -> Result<()> {
		Url::set_scheme(self, scheme).map_err(|()| RehostError::UriUpdate {
			component: "scheme",
			value: scheme.to_string(),
		})
	}

	fn set_host(&mut self, host: &str) -> Result<()> {
		Url::set_host(self, Some(host)).map_err(|_| RehostError::UriUpdate {
			component: "host",
			value: host.to_string(),
		})
	}

	fn set_port(&mut self, port: u16) -> Result<()> {
		Url::set_port(self, Some(port)).map_err(|()| RehostError::UriUpdate {
			component: "port",
			value: port.to_string(),
		})
	}

	fn set_path(&mut self, path: &str) {
		Url::set_path(self, path);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_url_setters() {
		let mut url = Url::parse("http://localhost/static/app.js").unwrap();

		TargetUri::set_scheme(&mut url, "https").unwrap();
		TargetUri::set_host(&mut url, "cdn.example.com").unwrap();
		TargetUri::set_port(&mut url, 8443).unwrap();
		TargetUri::set_path(&mut url, "/v1/static/app.js");

		assert_eq!(url.as_str(), "https://cdn.example.com:8443/v1/static/app.js");
	}

	#[test]
	fn test_default_port_is_elided() {
		let mut url = Url::parse("https://localhost:8443/").unwrap();
		TargetUri::set_port(&mut url, 443).unwrap();
		assert_eq!(url.as_str(), "https://localhost/");
	}

	#[test]
	fn test_url_without_host_rejects_host() {
		let mut url = Url::parse("mailto:someone@example.com").unwrap();
		let err = TargetUri::set_host(&mut url, "cdn.example.com").unwrap_err();
		assert!(matches!(
			err,
			RehostError::UriUpdate {
				component: "host",
				..
			}
		));
	}
}
