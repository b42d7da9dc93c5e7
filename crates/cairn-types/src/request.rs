use std::fmt;

use serde::{Deserialize, Serialize};

/// Where and how to send a write request for an asset.
///
/// Produced by URL templates for create/update operations. The transport
/// that acts on it is outside the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Fully interpolated target URL.
    pub url: String,
    /// Whether the request must carry the user's credentials (cookies).
    pub with_credentials: bool,
}

impl RequestDescriptor {
    /// A descriptor that sends no credentials.
    pub fn anonymous(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            with_credentials: false,
        }
    }

    /// A descriptor that sends the user's credentials.
    pub fn credentialed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            with_credentials: true,
        }
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.with_credentials {
            write!(f, "{} (with credentials)", self.url)
        } else {
            write!(f, "{}", self.url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_credential_flag() {
        assert!(!RequestDescriptor::anonymous("http://a").with_credentials);
        assert!(RequestDescriptor::credentialed("http://a").with_credentials);
    }

    #[test]
    fn display_mentions_credentials() {
        let d = RequestDescriptor::credentialed("https://projects.example/");
        assert_eq!(d.to_string(), "https://projects.example/ (with credentials)");
        let d = RequestDescriptor::anonymous("https://projects.example/");
        assert_eq!(d.to_string(), "https://projects.example/");
    }

    #[test]
    fn serde_shape() {
        let d = RequestDescriptor::credentialed("https://p/42");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["url"], "https://p/42");
        assert_eq!(json["with_credentials"], true);
    }
}
