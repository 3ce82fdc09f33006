//! Download authentication
//!
//! - [`AuthHeader`] - a single `Name: value` request header
//! - [`CredentialBroker`] - picks the header (if any) for a given URL
//! - [`b2`] - Backblaze B2 account authorization feeding the broker

pub mod b2;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderParseError {
    #[error("expected 'Name: value', no ':' found")]
    MissingSeparator,

    #[error("header name is empty")]
    EmptyName,

    #[error("invalid header name '{0}'")]
    InvalidName(String),

    #[error("header value contains invalid characters")]
    InvalidValue,
}

/// One request header. The value is marked sensitive so it is redacted from
/// debug output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl AuthHeader {
    pub fn new(name: HeaderName, mut value: HeaderValue) -> Self {
        value.set_sensitive(true);
        Self { name, value }
    }

    /// Parse a `Name: value` pair, the format operators use for `AUTH_HEADER`
    pub fn parse(raw: &str) -> Result<Self, HeaderParseError> {
        let (name, value) = raw
            .split_once(':')
            .ok_or(HeaderParseError::MissingSeparator)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(HeaderParseError::EmptyName);
        }

        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HeaderParseError::InvalidName(name.to_string()))?;
        let value =
            HeaderValue::from_str(value.trim()).map_err(|_| HeaderParseError::InvalidValue)?;

        Ok(Self::new(name, value))
    }

    /// `Authorization: <token>`
    pub fn authorization(token: &str) -> Result<Self, HeaderParseError> {
        let value = HeaderValue::from_str(token).map_err(|_| HeaderParseError::InvalidValue)?;
        Ok(Self::new(AUTHORIZATION, value))
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

/// Token-based scheme that only applies to URLs of one storage provider
#[derive(Debug, Clone)]
pub struct ThirdPartyScheme {
    header: AuthHeader,
    download_base_url: Option<String>,
    provider_domain: String,
}

impl ThirdPartyScheme {
    pub fn new(
        header: AuthHeader,
        download_base_url: Option<String>,
        provider_domain: impl Into<String>,
    ) -> Self {
        Self {
            header,
            download_base_url: download_base_url.filter(|base| !base.is_empty()),
            provider_domain: provider_domain.into(),
        }
    }

    pub fn header(&self) -> &AuthHeader {
        &self.header
    }

    /// True if `url` lives under the authorized download base URL, or its
    /// host is the provider domain (or a subdomain of it).
    ///
    /// The host check catches artifact URLs written before the download base
    /// URL was known.
    pub fn applies_to(&self, url: &str) -> bool {
        if let Some(ref base) = self.download_base_url {
            if is_under_base(url, base) {
                return true;
            }
        }

        host_in_domain(url, &self.provider_domain)
    }
}

fn is_under_base(url: &str, base: &str) -> bool {
    match url.strip_prefix(base) {
        Some(rest) => {
            base.ends_with('/')
                || rest.is_empty()
                || rest.starts_with(['/', '?', '#'])
        }
        None => false,
    }
}

fn host_in_domain(url: &str, domain: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    let domain = domain.to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|sub| sub.ends_with('.'))
}

/// The scheme selected for one URL
#[derive(Debug, Clone, Copy)]
pub enum AuthScheme<'a> {
    None,
    Explicit(&'a AuthHeader),
    ThirdParty(&'a ThirdPartyScheme),
}

impl<'a> AuthScheme<'a> {
    pub fn header(&self) -> Option<&'a AuthHeader> {
        match *self {
            AuthScheme::None => None,
            AuthScheme::Explicit(header) => Some(header),
            AuthScheme::ThirdParty(scheme) => Some(scheme.header()),
        }
    }
}

impl fmt::Display for AuthScheme<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthScheme::None => "none",
            AuthScheme::Explicit(_) => "explicit",
            AuthScheme::ThirdParty(_) => "third-party",
        };
        f.write_str(label)
    }
}

/// Decides which header each download carries.
///
/// An explicit header applies to every URL and shadows the third-party
/// scheme, even for URLs the third-party scheme would match.
#[derive(Debug, Clone, Default)]
pub struct CredentialBroker {
    explicit: Option<AuthHeader>,
    third_party: Option<ThirdPartyScheme>,
}

impl CredentialBroker {
    pub fn new(explicit: Option<AuthHeader>, third_party: Option<ThirdPartyScheme>) -> Self {
        Self {
            explicit,
            third_party,
        }
    }

    pub fn scheme_for(&self, url: &str) -> AuthScheme<'_> {
        if let Some(ref header) = self.explicit {
            return AuthScheme::Explicit(header);
        }

        match self.third_party {
            Some(ref scheme) if scheme.applies_to(url) => AuthScheme::ThirdParty(scheme),
            _ => AuthScheme::None,
        }
    }

    pub fn resolve_header(&self, url: &str) -> Option<&AuthHeader> {
        self.scheme_for(url).header()
    }
}
