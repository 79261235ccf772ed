//! Detail view request: target URL plus session cookies.

use std::fmt;

use notice_protocol::SessionInfo;

/// A cookie injected into the detail view before navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: &'static str,
    pub value: String,
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Everything the detail viewer needs to open a notice page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub url: String,
    pub cookies: Vec<Cookie>,
}

impl DetailRequest {
    /// Builds the request, leaving out cookies whose value is empty.
    pub fn new(url: impl Into<String>, session: &SessionInfo, lang_code: &str) -> Self {
        let fields = [
            ("CLIENT_ID", session.client_id.as_deref()),
            ("SESSION_ID", session.session_id.as_deref()),
            ("SIGNING", session.signing.as_deref()),
            ("LANG_CODE", Some(lang_code)),
        ];

        let cookies = fields
            .into_iter()
            .filter_map(|(name, value)| {
                let value = value?;
                (!value.is_empty()).then(|| Cookie {
                    name,
                    value: value.to_string(),
                })
            })
            .collect();

        Self {
            url: url.into(),
            cookies,
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }
}
