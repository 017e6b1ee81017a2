//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL for the remote workspace API.
///
/// Network URLs must use HTTPS, or HTTP for localhost (which keeps
/// local mock servers usable in tests).
///
/// # Example
///
/// ```
/// use tome_core::ApiUrl;
///
/// let api = ApiUrl::new("https://api.example.com").unwrap();
/// assert_eq!(api.endpoint("/v1/databases"),
///            "https://api.example.com/v1/databases");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or uses a scheme other
    /// than HTTPS (or HTTP on localhost).
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ApiUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // Normalize: remove trailing slash
        let normalized = if url.path() == "/" {
            let mut u = url.clone();
            u.set_path("");
            u
        } else {
            url
        };

        Ok(Self(normalized))
    }

    /// Returns the full URL for an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}{}", base, path)
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        match url.scheme() {
            "https" => Ok(()),
            "http" => {
                let is_local = matches!(
                    url.host_str(),
                    Some("localhost") | Some("127.0.0.1") | Some("[::1]")
                );
                if is_local {
                    Ok(())
                } else {
                    Err(InvalidInputError::ApiUrl {
                        value: original.to_string(),
                        reason: "http is only allowed for localhost".to_string(),
                    }
                    .into())
                }
            }
            other => Err(InvalidInputError::ApiUrl {
                value: original.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }
            .into()),
        }
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_url() {
        let api = ApiUrl::new("https://api.example.com").unwrap();
        assert_eq!(
            api.endpoint("/v1/databases"),
            "https://api.example.com/v1/databases"
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let api = ApiUrl::new("https://api.example.com/").unwrap();
        assert_eq!(api.endpoint("/v1/users"), "https://api.example.com/v1/users");
    }

    #[test]
    fn http_localhost_is_allowed() {
        assert!(ApiUrl::new("http://127.0.0.1:8080").is_ok());
        assert!(ApiUrl::new("http://localhost:3000").is_ok());
    }

    #[test]
    fn http_remote_is_rejected() {
        assert!(ApiUrl::new("http://api.example.com").is_err());
    }

    #[test]
    fn bad_scheme_is_rejected() {
        assert!(ApiUrl::new("ftp://api.example.com").is_err());
        assert!(ApiUrl::new("not a url").is_err());
    }
}
