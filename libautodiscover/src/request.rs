// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! The kinds of requests sent to autodiscover services.

use http::{uri::Scheme, Uri};

use crate::{
    auth::Credentials,
    endpoints::is_legacy_path,
    pox::{self, DiscoveryResponse, OutlookSettings},
    settings::{
        AutodiscoverErrorCode, DomainSettingName, ExchangeVersion,
        GetDomainSettingsResponseCollection, GetUserSettingsResponseCollection, UserSettingName,
    },
    soap::{self, SoapAction, DOMAIN_RESPONSE_NAMES, USER_RESPONSE_NAMES},
    AutodiscoverError, ParseError,
};

/// A single request, which may be sent to several candidate endpoints in turn.
#[derive(Debug, Clone)]
pub enum AutodiscoverRequest<'a> {
    /// A request to a legacy (POX) service.
    LegacyPox { email: &'a str },
    /// A `GetUserSettings` request to a SOAP service.
    UserSettings {
        addresses: &'a [String],
        settings: &'a [UserSettingName],
    },
    /// A `GetDomainSettings` request to a SOAP service.
    DomainSettings {
        domains: &'a [String],
        settings: &'a [DomainSettingName],
        requested_version: Option<ExchangeVersion>,
    },
}

impl AutodiscoverRequest<'_> {
    /// Whether this request is sent to a SOAP service.
    #[must_use]
    pub fn is_soap(&self) -> bool {
        !matches!(self, AutodiscoverRequest::LegacyPox { .. })
    }

    /// Value for the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        "text/xml; charset=utf-8"
    }

    /// Renders the body of this request for the service at `url`.
    #[must_use]
    pub fn render(&self, url: &Uri, version: ExchangeVersion, credentials: &Credentials) -> String {
        match self {
            AutodiscoverRequest::LegacyPox { email } => pox::render_request(email),
            AutodiscoverRequest::UserSettings {
                addresses,
                settings,
            } => soap::render_envelope(
                SoapAction::GetUserSettings,
                version,
                url,
                credentials.soap_security_header(),
                &soap::render_user_settings_body(addresses, settings),
            ),
            AutodiscoverRequest::DomainSettings {
                domains,
                settings,
                requested_version,
            } => soap::render_envelope(
                SoapAction::GetDomainSettings,
                version,
                url,
                credentials.soap_security_header(),
                &soap::render_domain_settings_body(domains, settings, *requested_version),
            ),
        }
    }

    /// Parses the body of a response to this request.
    ///
    /// # Errors
    ///
    /// If the body is malformed, or contains a SOAP fault.
    pub fn parse(&self, raw: &[u8]) -> Result<ParsedResponse, ParseError> {
        Ok(match self {
            AutodiscoverRequest::LegacyPox { .. } => {
                ParsedResponse::Legacy(pox::parse_response(raw)?)
            }
            AutodiscoverRequest::UserSettings { .. } => ParsedResponse::UserSettings(
                soap::parse_settings_response(raw, &USER_RESPONSE_NAMES)?,
            ),
            AutodiscoverRequest::DomainSettings { .. } => ParsedResponse::DomainSettings(
                soap::parse_settings_response(raw, &DOMAIN_RESPONSE_NAMES)?,
            ),
        })
    }

    /// A response representing an HTTP redirection to `url`.
    #[must_use]
    pub fn redirection_response(&self, url: Uri) -> ParsedResponse {
        match self {
            AutodiscoverRequest::LegacyPox { .. } => {
                ParsedResponse::Legacy(DiscoveryResponse::RedirectUrl(url.to_string()))
            }
            AutodiscoverRequest::UserSettings { .. } => ParsedResponse::UserSettings(
                GetUserSettingsResponseCollection::redirection(url),
            ),
            AutodiscoverRequest::DomainSettings { .. } => ParsedResponse::DomainSettings(
                GetDomainSettingsResponseCollection::redirection(url),
            ),
        }
    }

    /// Whether an HTTP redirection to `url` may be followed by this request.
    ///
    /// Legacy requests carry credentials in the clear, so they are only redirected to other
    /// legacy services over HTTPS.
    #[must_use]
    pub fn accepts_redirect(&self, url: &Uri) -> bool {
        let scheme = url.scheme();
        match self {
            AutodiscoverRequest::LegacyPox { .. } => {
                scheme == Some(&Scheme::HTTPS) && is_legacy_path(url.path())
            }
            AutodiscoverRequest::UserSettings { .. }
            | AutodiscoverRequest::DomainSettings { .. } => {
                scheme == Some(&Scheme::HTTPS) || scheme == Some(&Scheme::HTTP)
            }
        }
    }
}

/// A parsed response, of the kind matching the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    Legacy(DiscoveryResponse<OutlookSettings>),
    UserSettings(GetUserSettingsResponseCollection),
    DomainSettings(GetDomainSettingsResponseCollection),
}

/// How a response affects discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    RedirectUrl(String),
    RedirectAddress(String),
    Error,
}

impl ParsedResponse {
    /// Classifies this response.
    ///
    /// SOAP responses are classified at the request level only; errors and redirections for
    /// individual users or domains are reported within each of their responses.
    #[must_use]
    pub fn classify(&self) -> Classification {
        match self {
            ParsedResponse::Legacy(response) => match response {
                DiscoveryResponse::Success(_) => Classification::Success,
                DiscoveryResponse::RedirectUrl(url) => Classification::RedirectUrl(url.clone()),
                DiscoveryResponse::RedirectAddress(address) => {
                    Classification::RedirectAddress(address.clone())
                }
                DiscoveryResponse::Error(_) => Classification::Error,
            },
            ParsedResponse::UserSettings(collection) => classify_collection(
                collection.error_code,
                collection.redirect_url.as_ref(),
            ),
            ParsedResponse::DomainSettings(collection) => classify_collection(
                collection.error_code,
                collection.redirect_url.as_ref(),
            ),
        }
    }
}

fn classify_collection(code: AutodiscoverErrorCode, redirect_url: Option<&Uri>) -> Classification {
    match (code, redirect_url) {
        (AutodiscoverErrorCode::RedirectUrl, Some(url)) => {
            Classification::RedirectUrl(url.to_string())
        }
        (AutodiscoverErrorCode::NoError, _) => Classification::Success,
        _ => Classification::Error,
    }
}

impl TryFrom<ParsedResponse> for DiscoveryResponse<OutlookSettings> {
    type Error = AutodiscoverError;

    fn try_from(value: ParsedResponse) -> Result<Self, AutodiscoverError> {
        match value {
            ParsedResponse::Legacy(response) => Ok(response),
            _ => Err(AutodiscoverError::InvalidResponse("expected a legacy response")),
        }
    }
}

impl TryFrom<ParsedResponse> for GetUserSettingsResponseCollection {
    type Error = AutodiscoverError;

    fn try_from(value: ParsedResponse) -> Result<Self, Self::Error> {
        match value {
            ParsedResponse::UserSettings(collection) => Ok(collection),
            _ => Err(AutodiscoverError::InvalidResponse(
                "expected a user settings response",
            )),
        }
    }
}

impl TryFrom<ParsedResponse> for GetDomainSettingsResponseCollection {
    type Error = AutodiscoverError;

    fn try_from(value: ParsedResponse) -> Result<Self, Self::Error> {
        match value {
            ParsedResponse::DomainSettings(collection) => Ok(collection),
            _ => Err(AutodiscoverError::InvalidResponse(
                "expected a domain settings response",
            )),
        }
    }
}
