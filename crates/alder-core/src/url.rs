//! URL value type.
//!
//! A [`Url`] is the sole runtime input to adaptive extension dispatch: an
//! immutable bag of `protocol://host:port/path?key=value` pieces. All
//! "mutation" is copy-on-write via the `with_*` builders, so a `Url` handed
//! to an extension can never change underneath it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use snafu::Snafu;

/// Errors from parsing a URL string.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum UrlError {
    /// The string carries no `protocol://` separator.
    #[snafu(display("url '{url}' is missing a protocol separator"))]
    MissingProtocol { url: String },

    /// The port segment is not a valid u16.
    #[snafu(display("url '{url}' has an invalid port '{port}'"))]
    InvalidPort { url: String, port: String },
}

/// Immutable URL: protocol scheme, address, path, and a sorted
/// string-to-string parameter map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Url {
    protocol: String,
    host: String,
    port: u16,
    path: String,
    parameters: BTreeMap<String, String>,
}

impl Url {
    /// Create a URL with no path and no parameters.
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            path: String::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Parse a `protocol://host:port/path?k=v&k2=v2` string.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let (protocol, rest) = url.split_once("://").ok_or_else(|| UrlError::MissingProtocol {
            url: url.to_string(),
        })?;

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };
        let (address, path) = match rest.split_once('/') {
            Some((address, path)) => (address, path.to_string()),
            None => (rest, String::new()),
        };
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| UrlError::InvalidPort {
                    url: url.to_string(),
                    port: port.to_string(),
                })?;
                (host.to_string(), port)
            }
            None => (address.to_string(), 0),
        };

        let mut parameters = BTreeMap::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((k, v)) => parameters.insert(k.to_string(), v.to_string()),
                    None => parameters.insert(pair.to_string(), String::new()),
                };
            }
        }

        Ok(Self {
            protocol: protocol.to_string(),
            host,
            port,
            path,
            parameters,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` (bare host when no port is set).
    pub fn address(&self) -> String {
        if self.port == 0 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Raw parameter lookup. Present-but-empty values are returned as-is;
    /// use [`Url::parameter_or`] when empty should fall back.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Parameter lookup falling back to `default` when the key is absent or
    /// its value is empty.
    pub fn parameter_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.parameter(key) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    /// True when the key is present with a non-empty value.
    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameter(key).is_some_and(|v| !v.is_empty())
    }

    /// Numeric parameter that must be strictly positive; anything absent,
    /// unparsable, or non-positive yields `default`.
    pub fn positive_parameter(&self, key: &str, default: usize) -> usize {
        match self.parameter(key).and_then(|v| v.parse::<usize>().ok()) {
            Some(value) if value > 0 => value,
            _ => default,
        }
    }

    /// Method-scoped parameter: `<method>.<key>` when present and non-empty,
    /// otherwise the plain `key`.
    pub fn method_parameter(&self, method: &str, key: &str) -> Option<&str> {
        let scoped = format!("{method}.{key}");
        match self.parameter(&scoped) {
            Some(value) if !value.is_empty() => Some(value),
            _ => self.parameter(key),
        }
    }

    /// Copy-on-write parameter insertion.
    pub fn with_parameter(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.parameters.insert(key.into(), value.into());
        next
    }

    /// Copy-on-write bulk parameter insertion.
    pub fn with_parameters<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        for (k, v) in pairs {
            next.parameters.insert(k.into(), v.into());
        }
        next
    }

    /// Copy-on-write path replacement.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.path = path.into();
        next
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.host)?;
        if self.port != 0 {
            write!(f, ":{}", self.port)?;
        }
        if !self.path.is_empty() {
            write!(f, "/{}", self.path)?;
        }
        let mut separator = '?';
        for (key, value) in &self.parameters {
            write!(f, "{separator}{key}={value}")?;
            separator = '&';
        }
        Ok(())
    }
}

impl FromStr for Url {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Url::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_url() {
        let url = Url::parse("mesh://10.0.0.1:20880/com.example.Demo?cache=lru&timeout=3000")
            .expect("valid url");
        assert_eq!(url.protocol(), "mesh");
        assert_eq!(url.host(), "10.0.0.1");
        assert_eq!(url.port(), 20880);
        assert_eq!(url.path(), "com.example.Demo");
        assert_eq!(url.parameter("cache"), Some("lru"));
        assert_eq!(url.parameter("timeout"), Some("3000"));
        assert_eq!(url.address(), "10.0.0.1:20880");
    }

    #[test]
    fn parse_minimal_url() {
        let url = Url::parse("exchange://localhost").expect("valid url");
        assert_eq!(url.port(), 0);
        assert_eq!(url.path(), "");
        assert!(url.parameters().is_empty());
        assert_eq!(url.address(), "localhost");
    }

    #[test]
    fn parse_rejects_missing_protocol() {
        assert!(matches!(
            Url::parse("localhost:20880"),
            Err(UrlError::MissingProtocol { .. })
        ));
    }

    #[test]
    fn parse_rejects_bad_port() {
        assert!(matches!(
            Url::parse("a://h:99999"),
            Err(UrlError::InvalidPort { .. })
        ));
    }

    #[test]
    fn display_round_trips() {
        let text = "mesh://h:20880/svc?a=1&b=2";
        let url = Url::parse(text).expect("valid url");
        assert_eq!(url.to_string(), text);
        assert_eq!(Url::parse(&url.to_string()).expect("valid"), url);
    }

    #[test]
    fn parameter_or_falls_back_on_empty() {
        let url = Url::parse("a://h?empty=&set=x").expect("valid url");
        assert_eq!(url.parameter_or("empty", "d"), "d");
        assert_eq!(url.parameter_or("missing", "d"), "d");
        assert_eq!(url.parameter_or("set", "d"), "x");
        assert!(!url.has_parameter("empty"));
        assert!(url.has_parameter("set"));
    }

    #[test]
    fn positive_parameter_guards_range() {
        let url = Url::parse("a://h?zero=0&neg=-1&ok=42&junk=x").expect("valid url");
        assert_eq!(url.positive_parameter("zero", 7), 7);
        assert_eq!(url.positive_parameter("neg", 7), 7);
        assert_eq!(url.positive_parameter("junk", 7), 7);
        assert_eq!(url.positive_parameter("missing", 7), 7);
        assert_eq!(url.positive_parameter("ok", 7), 42);
    }

    #[test]
    fn method_parameter_prefers_scoped_key() {
        let url = Url::parse("a://h?loadbalance=random&find.loadbalance=hash").expect("valid url");
        assert_eq!(url.method_parameter("find", "loadbalance"), Some("hash"));
        assert_eq!(url.method_parameter("list", "loadbalance"), Some("random"));
    }

    #[test]
    fn builders_do_not_mutate_the_source() {
        let url = Url::new("a", "h", 1);
        let other = url.with_parameter("k", "v").with_path("p");
        assert!(url.parameters().is_empty());
        assert_eq!(url.path(), "");
        assert_eq!(other.parameter("k"), Some("v"));
        assert_eq!(other.path(), "p");
    }
}
