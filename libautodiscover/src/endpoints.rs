// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Well-known autodiscover URLs and the endpoints advertised by a host.

use std::fmt;

use email_address::EmailAddress;
use http::{uri::InvalidUri, HeaderMap, Uri};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::auth::Credentials;

/// Path to the legacy (POX) autodiscover service.
pub const LEGACY_PATH: &str = "/autodiscover/autodiscover.xml";
/// Path to the SOAP autodiscover service.
pub const SOAP_PATH: &str = "/autodiscover/autodiscover.svc";

static LEGACY_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/autodiscover/([^/]+/)*autodiscover\.xml")
        .expect("legacy path regex is valid")
});

/// Set of endpoints that a server advertises via response headers.
///
/// Every host that answers a probe is assumed to serve the legacy endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Endpoints(u8);

impl Endpoints {
    pub const NONE: Endpoints = Endpoints(0);
    pub const LEGACY: Endpoints = Endpoints(1);
    pub const SOAP: Endpoints = Endpoints(1 << 1);
    pub const WS_SECURITY: Endpoints = Endpoints(1 << 2);
    pub const WS_SECURITY_SYMMETRIC_KEY: Endpoints = Endpoints(1 << 3);
    pub const WS_SECURITY_X509_CERT: Endpoints = Endpoints(1 << 4);
    pub const OAUTH: Endpoints = Endpoints(1 << 5);

    const HEADERS: [(&'static str, Endpoints); 5] = [
        ("X-SOAP-Enabled", Endpoints::SOAP),
        ("X-WSSecurity-Enabled", Endpoints::WS_SECURITY),
        (
            "X-WSSecurity-SymmetricKey-Enabled",
            Endpoints::WS_SECURITY_SYMMETRIC_KEY,
        ),
        ("X-WSSecurity-X509Cert-Enabled", Endpoints::WS_SECURITY_X509_CERT),
        ("X-OAuth-Enabled", Endpoints::OAUTH),
    ];

    /// Determines advertised endpoints from the headers of a probe response.
    ///
    /// Only the presence of each header matters; its value is ignored.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Endpoints {
        let mut endpoints = Endpoints::LEGACY;
        for (header, endpoint) in Self::HEADERS {
            if headers.contains_key(header) {
                endpoints.insert(endpoint);
            }
        }
        endpoints
    }

    #[must_use]
    pub fn contains(self, other: Endpoints) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Endpoints) {
        self.0 |= other.0;
    }

    /// Whether any endpoint other than the legacy one is advertised.
    #[must_use]
    pub fn has_soap_variant(self) -> bool {
        self.0 & !Endpoints::LEGACY.0 != 0
    }
}

impl std::ops::BitOr for Endpoints {
    type Output = Endpoints;

    fn bitor(self, rhs: Self) -> Self::Output {
        Endpoints(self.0 | rhs.0)
    }
}

impl fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            ("Legacy", Endpoints::LEGACY),
            ("Soap", Endpoints::SOAP),
            ("WsSecurity", Endpoints::WS_SECURITY),
            ("WsSecuritySymmetricKey", Endpoints::WS_SECURITY_SYMMETRIC_KEY),
            ("WsSecurityX509Cert", Endpoints::WS_SECURITY_X509_CERT),
            ("OAuth", Endpoints::OAUTH),
        ];
        f.debug_set()
            .entries(
                names
                    .iter()
                    .filter(|(_, e)| self.contains(*e))
                    .map(|(name, _)| name),
            )
            .finish()
    }
}

/// Variants of the SOAP service, one per family of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapFlavour {
    Plain,
    WsSecurity,
    SymmetricKey,
    X509Cert,
}

impl SoapFlavour {
    const ALL_SUFFIXES: [&'static str; 3] = [
        "/wssecurity/symmetrickey",
        "/wssecurity/x509cert",
        "/wssecurity",
    ];

    /// Path suffix appended to the SOAP service URL.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            SoapFlavour::Plain => "",
            SoapFlavour::WsSecurity => "/wssecurity",
            SoapFlavour::SymmetricKey => "/wssecurity/symmetrickey",
            SoapFlavour::X509Cert => "/wssecurity/x509cert",
        }
    }

    /// The endpoint that a host must advertise for this flavour to be usable.
    #[must_use]
    pub fn required_endpoint(self) -> Endpoints {
        match self {
            SoapFlavour::Plain => Endpoints::SOAP,
            SoapFlavour::WsSecurity => Endpoints::WS_SECURITY,
            SoapFlavour::SymmetricKey => Endpoints::WS_SECURITY_SYMMETRIC_KEY,
            SoapFlavour::X509Cert => Endpoints::WS_SECURITY_X509_CERT,
        }
    }

    /// Replaces any flavour suffix in `path` with this flavour's.
    pub(crate) fn apply_to_path(self, path: &str) -> String {
        let trimmed = path.trim_end_matches('/');
        let lower = trimmed.to_ascii_lowercase();
        let base = Self::ALL_SUFFIXES
            .iter()
            .find(|suffix| lower.ends_with(*suffix))
            .map_or(trimmed, |suffix| &trimmed[..trimmed.len() - suffix.len()]);
        format!("{base}{}", self.suffix())
    }
}

/// Whether the path looks like that of a legacy autodiscover service.
#[must_use]
pub fn is_legacy_path(path: &str) -> bool {
    LEGACY_PATH_RE.is_match(path)
}

/// URL of the legacy service on `host` over HTTPS.
///
/// # Errors
///
/// If `host` is not a valid authority.
pub fn legacy_https_url(host: &str) -> Result<Uri, InvalidUri> {
    format!("https://{host}{LEGACY_PATH}").parse()
}

/// URL of the legacy service on `host` over plain-text HTTP.
///
/// Only used for unauthenticated redirect probes.
///
/// # Errors
///
/// If `host` is not a valid authority.
pub fn legacy_http_url(host: &str) -> Result<Uri, InvalidUri> {
    format!("http://{host}{LEGACY_PATH}").parse()
}

/// URL of the SOAP service on `host` for the given flavour.
///
/// # Errors
///
/// If `host` is not a valid authority.
pub fn soap_url(host: &str, flavour: SoapFlavour) -> Result<Uri, InvalidUri> {
    format!("https://{host}{SOAP_PATH}{}", flavour.suffix()).parse()
}

/// Returns `url` if it points to a legacy service, otherwise the legacy URL on the same host.
///
/// # Errors
///
/// If the resulting URL is not valid.
pub fn with_legacy_path(url: &Uri) -> Result<Uri, http::Error> {
    if is_legacy_path(url.path()) {
        return Ok(url.clone());
    }
    let mut builder = Uri::builder().path_and_query(LEGACY_PATH);
    builder = builder.scheme(url.scheme().cloned().unwrap_or(http::uri::Scheme::HTTPS));
    if let Some(authority) = url.authority() {
        builder = builder.authority(authority.clone());
    }
    builder.build()
}

/// Resolves the value of a `Location` header relative to the request's URL.
///
/// # Errors
///
/// If the location is not valid UTF-8 or does not form a valid URL.
pub fn resolve_location(base: &Uri, location: &[u8]) -> Result<Uri, InvalidLocation> {
    let location = std::str::from_utf8(location).map_err(|_| InvalidLocation)?;
    if location.starts_with('/') {
        let mut builder = Uri::builder().path_and_query(location);
        if let Some(scheme) = base.scheme() {
            builder = builder.scheme(scheme.clone());
        }
        if let Some(authority) = base.authority() {
            builder = builder.authority(authority.clone());
        }
        builder.build().map_err(|_| InvalidLocation)
    } else {
        let uri = location.parse::<Uri>().map_err(|_| InvalidLocation)?;
        if uri.host().is_none() {
            return Err(InvalidLocation);
        }
        Ok(uri)
    }
}

/// A `Location` header that cannot be turned into a URL.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("redirection location is not a valid URL")]
pub struct InvalidLocation;

/// Returns the domain part of an email address.
///
/// # Errors
///
/// If `email` is not a valid email address.
pub fn domain_from_email(email: &str) -> Result<String, email_address::Error> {
    let address = email.parse::<EmailAddress>()?;
    Ok(address.domain().to_string())
}

/// Returns the SOAP endpoint on `host` to use with `credentials`, if the host advertises it.
#[must_use]
pub fn select_endpoint(host: &str, endpoints: Endpoints, credentials: &Credentials) -> Option<Uri> {
    let flavour = credentials.flavour();
    if !endpoints.contains(flavour.required_endpoint()) {
        log::debug!(
            "{host} does not advertise the {flavour:?} endpoint (advertises {endpoints:?})"
        );
        return None;
    }
    match soap_url(host, flavour) {
        Ok(url) => Some(url),
        Err(err) => {
            log::warn!("cannot build SOAP url for {host}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue, Uri};

    use crate::auth::Credentials;
    use crate::endpoints::{
        domain_from_email, is_legacy_path, resolve_location, select_endpoint, with_legacy_path,
        Endpoints, SoapFlavour,
    };

    #[test]
    fn test_legacy_path() {
        assert!(is_legacy_path("/autodiscover/autodiscover.xml"));
        assert!(is_legacy_path("/AutoDiscover/AutoDiscover.xml"));
        assert!(is_legacy_path("/autodiscover/nested/path/autodiscover.xml"));
        assert!(!is_legacy_path("/autodiscover/autodiscover.svc"));
        assert!(!is_legacy_path("/ews/exchange.asmx"));
    }

    #[test]
    fn test_with_legacy_path() {
        let url = Uri::from_static("https://mail.example.com/autodiscover/autodiscover.svc");
        assert_eq!(
            with_legacy_path(&url).unwrap(),
            Uri::from_static("https://mail.example.com/autodiscover/autodiscover.xml")
        );
        let url = Uri::from_static("https://mail.example.com/Autodiscover/Autodiscover.xml");
        assert_eq!(with_legacy_path(&url).unwrap(), url);
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Endpoints::from_headers(&headers), Endpoints::LEGACY);
        assert!(!Endpoints::from_headers(&headers).has_soap_variant());

        headers.insert("x-wssecurity-enabled", HeaderValue::from_static(""));
        headers.insert("x-oauth-enabled", HeaderValue::from_static("true"));
        let endpoints = Endpoints::from_headers(&headers);
        assert!(endpoints.has_soap_variant());
        assert!(endpoints.contains(Endpoints::WS_SECURITY));
        assert!(endpoints.contains(Endpoints::OAUTH));
        assert!(!endpoints.contains(Endpoints::SOAP));
        assert!(!endpoints.contains(Endpoints::NONE));
    }

    #[test]
    fn test_select_endpoint() {
        let oauth = Credentials::OAuth {
            token: "abc".into(),
        };
        let ws = Credentials::WsSecurity {
            security_token: String::new(),
        };
        let only_ws = Endpoints::LEGACY | Endpoints::WS_SECURITY;

        assert_eq!(select_endpoint("mail.example.com", only_ws, &oauth), None);
        assert_eq!(
            select_endpoint("mail.example.com", only_ws, &ws),
            Some(Uri::from_static(
                "https://mail.example.com/autodiscover/autodiscover.svc/wssecurity"
            ))
        );
        assert_eq!(
            select_endpoint("mail.example.com", Endpoints::SOAP, &oauth),
            Some(Uri::from_static(
                "https://mail.example.com/autodiscover/autodiscover.svc"
            ))
        );
    }

    #[test]
    fn test_apply_to_path() {
        let base = "/autodiscover/autodiscover.svc";
        assert_eq!(
            SoapFlavour::X509Cert.apply_to_path("/autodiscover/autodiscover.svc/WSSecurity"),
            "/autodiscover/autodiscover.svc/wssecurity/x509cert"
        );
        assert_eq!(
            SoapFlavour::Plain.apply_to_path("/autodiscover/autodiscover.svc/wssecurity/symmetrickey"),
            base
        );
        assert_eq!(
            SoapFlavour::SymmetricKey.apply_to_path(base),
            "/autodiscover/autodiscover.svc/wssecurity/symmetrickey"
        );
    }

    #[test]
    fn test_resolve_location() {
        let base = Uri::from_static("https://example.com/autodiscover/autodiscover.xml");
        assert_eq!(
            resolve_location(&base, b"/other/autodiscover.xml").unwrap(),
            Uri::from_static("https://example.com/other/autodiscover.xml")
        );
        assert_eq!(
            resolve_location(&base, b"https://mail.example.org/autodiscover/autodiscover.xml")
                .unwrap()
                .host(),
            Some("mail.example.org")
        );
        resolve_location(&base, b"not a url").unwrap_err();
    }

    #[test]
    fn test_domain_from_email() {
        assert_eq!(domain_from_email("user@example.com").unwrap(), "example.com");
        domain_from_email("not an address").unwrap_err();
    }
}
