// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Authentication-related types.

use base64::{prelude::BASE64_STANDARD, write::EncoderWriter};
use core::fmt;
use http::{header::InvalidHeaderValue, request::Builder, HeaderValue, Uri};
use std::io::Write;

use crate::endpoints::{Endpoints, SoapFlavour};

/// Wrapper around a [`String`] that is not printed when debugging.
///
/// # Examples
///
/// ```
/// # use libautodiscover::auth::Password;
/// let p1 = Password::from("secret");
/// let p2 = String::from("secret").into();
///
/// assert_eq!(p1, p2);
/// assert_eq!(format!("{p1:?}"), "<REDACTED>");
/// ```
///
/// # Display
///
/// The [`core::fmt::Display`] trait is intentionally not implemented. Use either
/// [`Password::into_string`] or [`Password::as_str()`].
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl<S> From<S> for Password
where
    String: From<S>,
{
    fn from(value: S) -> Self {
        Password(String::from(value))
    }
}

impl Password {
    /// Returns the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns a reference to the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Credentials used when talking to autodiscover services.
///
/// Besides determining which headers are sent, the kind of credentials determines which variant
/// of the SOAP service is used (see [`SoapFlavour`]).
///
/// WS-Security tokens are produced elsewhere; they are carried here already serialised, and
/// inserted verbatim into the SOAP header of each request.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Credentials {
    None,
    Basic {
        username: String,
        password: Option<Password>,
    },
    OAuth {
        token: Password,
    },
    WsSecurity {
        security_token: String,
    },
    /// A token issued by a partner STS, as returned by
    /// [`AutodiscoverService::try_get_partner_access`](crate::AutodiscoverService::try_get_partner_access).
    PartnerToken {
        token: String,
        reference: String,
    },
    X509 {
        security_token: String,
    },
}

impl Credentials {
    /// The variant of the SOAP service required by these credentials.
    #[must_use]
    pub fn flavour(&self) -> SoapFlavour {
        match self {
            Credentials::None | Credentials::Basic { .. } | Credentials::OAuth { .. } => {
                SoapFlavour::Plain
            }
            Credentials::WsSecurity { .. } => SoapFlavour::WsSecurity,
            Credentials::PartnerToken { .. } => SoapFlavour::SymmetricKey,
            Credentials::X509 { .. } => SoapFlavour::X509Cert,
        }
    }

    /// The endpoint that a host must advertise for these credentials to be usable.
    #[must_use]
    pub fn required_endpoint(&self) -> Endpoints {
        self.flavour().required_endpoint()
    }

    /// Serialised WS-Security header for SOAP requests, if any.
    #[must_use]
    pub fn soap_security_header(&self) -> Option<&str> {
        match self {
            Credentials::None | Credentials::Basic { .. } | Credentials::OAuth { .. } => None,
            Credentials::WsSecurity { security_token } | Credentials::X509 { security_token } => {
                Some(security_token)
            }
            Credentials::PartnerToken { token, .. } => Some(token),
        }
    }

    /// Adjusts a SOAP service URL to the variant required by these credentials.
    ///
    /// # Errors
    ///
    /// If the resulting URL is not valid.
    pub fn adjust_url(&self, url: &Uri) -> Result<Uri, http::Error> {
        let path = self.flavour().apply_to_path(url.path());
        let path_and_query = match url.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        let mut builder = Uri::builder().path_and_query(path_and_query);
        if let Some(scheme) = url.scheme() {
            builder = builder.scheme(scheme.clone());
        }
        if let Some(authority) = url.authority() {
            builder = builder.authority(authority.clone());
        }
        builder.build()
    }
}

/// Internal error resolving authentication.
///
/// This error is returned when there is an internal error handling authentication (e.g.: the input
/// is invalid). It IS NOT returned when authentication was rejected by the server.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("error encoding credentials")]
    Encoding(#[from] std::io::Error),

    #[error("token contains characters invalid in a header")]
    InvalidToken(#[from] InvalidHeaderValue),
}

pub(crate) trait AuthExt: Sized {
    /// Apply this authentication to an object.
    fn authenticate(self, credentials: &Credentials) -> Result<Self, AuthError>;
}

impl AuthExt for Builder {
    /// Apply this authentication to a request builder.
    fn authenticate(self, credentials: &Credentials) -> Result<Builder, AuthError> {
        match credentials {
            Credentials::Basic { username, password } => {
                let mut sequence = b"Basic ".to_vec();
                let mut encoder = EncoderWriter::new(sequence, &BASE64_STANDARD);
                if let Some(pwd) = password {
                    write!(encoder, "{username}:{}", pwd.0)?;
                } else {
                    write!(encoder, "{username}:")?;
                }
                sequence = encoder.finish()?;

                let mut header = HeaderValue::from_bytes(&sequence)
                    .expect("base64 string contains only ascii characters");
                header.set_sensitive(true);
                Ok(self.header(http::header::AUTHORIZATION, header))
            }
            Credentials::OAuth { token } => {
                let mut header = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))?;
                header.set_sensitive(true);
                Ok(self.header(http::header::AUTHORIZATION, header))
            }
            // WS-Security variants authenticate in the SOAP header.
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{Request, Uri};

    use crate::auth::{AuthExt, Credentials};
    use crate::endpoints::Endpoints;

    #[test]
    fn test_basic_header() {
        let credentials = Credentials::Basic {
            username: "user".to_string(),
            password: Some("pass".into()),
        };
        let request = Request::builder()
            .authenticate(&credentials)
            .unwrap()
            .body(())
            .unwrap();
        let header = request.headers().get(http::header::AUTHORIZATION).unwrap();
        assert_eq!(header, "Basic dXNlcjpwYXNz");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_oauth_header() {
        let credentials = Credentials::OAuth {
            token: "token123".into(),
        };
        let request = Request::builder()
            .authenticate(&credentials)
            .unwrap()
            .body(())
            .unwrap();
        assert_eq!(
            request.headers().get(http::header::AUTHORIZATION).unwrap(),
            "Bearer token123"
        );

        let bad = Credentials::OAuth {
            token: "line\nbreak".into(),
        };
        Request::builder().authenticate(&bad).unwrap_err();
    }

    #[test]
    fn test_ws_security_has_no_http_header() {
        let credentials = Credentials::X509 {
            security_token: "<wsse:Security/>".to_string(),
        };
        let request = Request::builder()
            .authenticate(&credentials)
            .unwrap()
            .body(())
            .unwrap();
        assert!(request.headers().is_empty());
        assert_eq!(credentials.soap_security_header(), Some("<wsse:Security/>"));
        assert_eq!(
            credentials.required_endpoint(),
            Endpoints::WS_SECURITY_X509_CERT
        );
    }

    #[test]
    fn test_adjust_url() {
        let url = Uri::from_static("https://mail.example.com/autodiscover/autodiscover.svc");
        let partner = Credentials::PartnerToken {
            token: String::new(),
            reference: String::new(),
        };
        assert_eq!(
            partner.adjust_url(&url).unwrap(),
            Uri::from_static(
                "https://mail.example.com/autodiscover/autodiscover.svc/wssecurity/symmetrickey"
            )
        );

        let ws = Uri::from_static("https://mail.example.com/autodiscover/autodiscover.svc/wssecurity");
        assert_eq!(Credentials::None.adjust_url(&ws).unwrap(), url);
    }
}
