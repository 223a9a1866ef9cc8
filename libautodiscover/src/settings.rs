// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Typed values exchanged with autodiscover services.
//!
//! Setting names, error codes and server versions all have a wire representation; each of
//! them implements [`FromStr`] and [`fmt::Display`] to convert from and into it.

use std::{collections::BTreeMap, fmt, str::FromStr};

use http::Uri;

/// Version of Exchange that requests are targeted at.
///
/// Variants are ordered chronologically, so they can be compared to check feature support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExchangeVersion {
    Exchange2007Sp1,
    Exchange2010,
    Exchange2010Sp1,
    Exchange2010Sp2,
    Exchange2013,
    Exchange2013Sp1,
}

impl ExchangeVersion {
    /// First version that exposes the SOAP autodiscover service.
    pub const MINIMUM_FOR_SOAP: ExchangeVersion = ExchangeVersion::Exchange2010;
    /// First version that supports requesting partner tokens.
    pub const MINIMUM_FOR_PARTNER_TOKEN: ExchangeVersion = ExchangeVersion::Exchange2010Sp1;

    /// Returns the wire name for this version.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeVersion::Exchange2007Sp1 => "Exchange2007_SP1",
            ExchangeVersion::Exchange2010 => "Exchange2010",
            ExchangeVersion::Exchange2010Sp1 => "Exchange2010_SP1",
            ExchangeVersion::Exchange2010Sp2 => "Exchange2010_SP2",
            ExchangeVersion::Exchange2013 => "Exchange2013",
            ExchangeVersion::Exchange2013Sp1 => "Exchange2013_SP1",
        }
    }

    /// Whether requests with this version are sent to the SOAP service.
    #[must_use]
    pub fn supports_soap(self) -> bool {
        self >= Self::MINIMUM_FOR_SOAP
    }
}

impl Default for ExchangeVersion {
    fn default() -> Self {
        ExchangeVersion::Exchange2013Sp1
    }
}

impl fmt::Display for ExchangeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown wire name.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownName {
    kind: &'static str,
    value: String,
}

impl FromStr for ExchangeVersion {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Exchange2007_SP1" => ExchangeVersion::Exchange2007Sp1,
            "Exchange2010" => ExchangeVersion::Exchange2010,
            "Exchange2010_SP1" => ExchangeVersion::Exchange2010Sp1,
            "Exchange2010_SP2" => ExchangeVersion::Exchange2010Sp2,
            "Exchange2013" => ExchangeVersion::Exchange2013,
            "Exchange2013_SP1" => ExchangeVersion::Exchange2013Sp1,
            other => {
                return Err(UnknownName {
                    kind: "exchange version",
                    value: other.to_string(),
                })
            }
        })
    }
}

/// Error codes returned by autodiscover services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutodiscoverErrorCode {
    #[default]
    NoError,
    /// The caller must retry with the address in the redirect target.
    RedirectAddress,
    /// The caller must retry at the URL in the redirect target.
    RedirectUrl,
    InvalidUser,
    InvalidRequest,
    InvalidSetting,
    SettingIsNotAvailable,
    ServerBusy,
    InvalidDomain,
    NotFederated,
    InternalServerError,
}

impl AutodiscoverErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AutodiscoverErrorCode::NoError => "NoError",
            AutodiscoverErrorCode::RedirectAddress => "RedirectAddress",
            AutodiscoverErrorCode::RedirectUrl => "RedirectUrl",
            AutodiscoverErrorCode::InvalidUser => "InvalidUser",
            AutodiscoverErrorCode::InvalidRequest => "InvalidRequest",
            AutodiscoverErrorCode::InvalidSetting => "InvalidSetting",
            AutodiscoverErrorCode::SettingIsNotAvailable => "SettingIsNotAvailable",
            AutodiscoverErrorCode::ServerBusy => "ServerBusy",
            AutodiscoverErrorCode::InvalidDomain => "InvalidDomain",
            AutodiscoverErrorCode::NotFederated => "NotFederated",
            AutodiscoverErrorCode::InternalServerError => "InternalServerError",
        }
    }

    /// Parses a wire error code.
    ///
    /// Servers may return codes newer than this library; those are reported as
    /// [`AutodiscoverErrorCode::InternalServerError`].
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "NoError" => AutodiscoverErrorCode::NoError,
            "RedirectAddress" => AutodiscoverErrorCode::RedirectAddress,
            "RedirectUrl" => AutodiscoverErrorCode::RedirectUrl,
            "InvalidUser" => AutodiscoverErrorCode::InvalidUser,
            "InvalidRequest" => AutodiscoverErrorCode::InvalidRequest,
            "InvalidSetting" => AutodiscoverErrorCode::InvalidSetting,
            "SettingIsNotAvailable" => AutodiscoverErrorCode::SettingIsNotAvailable,
            "ServerBusy" => AutodiscoverErrorCode::ServerBusy,
            "InvalidDomain" => AutodiscoverErrorCode::InvalidDomain,
            "NotFederated" => AutodiscoverErrorCode::NotFederated,
            "InternalServerError" => AutodiscoverErrorCode::InternalServerError,
            other => {
                log::warn!("unknown autodiscover error code: {other}");
                AutodiscoverErrorCode::InternalServerError
            }
        }
    }
}

impl fmt::Display for AutodiscoverErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common behaviour for [`UserSettingName`] and [`DomainSettingName`].
pub trait SettingName: Copy + Ord + fmt::Debug + fmt::Display + FromStr {}

macro_rules! setting_names {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) { $($variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($variant,)+
        }

        impl $name {
            /// Returns the wire name of this setting.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(UnknownName {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl SettingName for $name {}
    };
}

setting_names! {
    /// Settings which can be requested for a user.
    pub enum UserSettingName ("user setting") {
        UserDisplayName,
        UserDN,
        UserDeploymentId,
        InternalMailboxServer,
        InternalRpcClientServer,
        InternalMailboxServerDN,
        InternalWebClientUrls,
        InternalEwsUrl,
        InternalEcpUrl,
        InternalOABUrl,
        InternalUMUrl,
        InternalPop3Connections,
        InternalImap4Connections,
        InternalSmtpConnections,
        ExternalMailboxServer,
        ExternalMailboxServerRequiresSSL,
        ExternalMailboxServerAuthenticationMethods,
        ExternalWebClientUrls,
        ExternalEwsUrl,
        ExternalEcpUrl,
        ExternalOABUrl,
        ExternalUMUrl,
        ExternalPop3Connections,
        ExternalImap4Connections,
        ExternalSmtpConnections,
        ExternalEwsVersion,
        MailboxDN,
        PublicFolderServer,
        ActiveDirectoryServer,
        CasVersion,
        EwsSupportedSchemas,
        AutoDiscoverSMTPAddress,
        GroupingInformation,
    }
}

setting_names! {
    /// Settings which can be requested for a domain.
    pub enum DomainSettingName ("domain setting") {
        ExternalEwsUrl,
        ExternalEwsVersion,
    }
}

/// A URL to Outlook Web Access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebClientUrl {
    pub authentication_methods: String,
    pub url: String,
}

/// A protocol endpoint (e.g.: IMAP or SMTP) for the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConnection {
    pub encryption_method: Option<String>,
    pub hostname: String,
    pub port: Option<u16>,
}

/// The value of a single returned setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    String(String),
    WebClientUrls(Vec<WebClientUrl>),
    ProtocolConnections(Vec<ProtocolConnection>),
}

impl SettingValue {
    /// Returns the inner string, if this is a string setting.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::String(s) => f.write_str(s),
            SettingValue::WebClientUrls(urls) => {
                let mut first = true;
                for url in urls {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{} ({})", url.url, url.authentication_methods)?;
                }
                Ok(())
            }
            SettingValue::ProtocolConnections(connections) => {
                let mut first = true;
                for c in connections {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    f.write_str(&c.hostname)?;
                    if let Some(port) = c.port {
                        write!(f, ":{port}")?;
                    }
                    if let Some(encryption) = &c.encryption_method {
                        write!(f, " ({encryption})")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

/// A setting that was requested but could not be returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingError {
    pub error_code: AutodiscoverErrorCode,
    pub error_message: Option<String>,
    pub setting_name: String,
}

/// Information about the server that handled a SOAP request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerVersionInfo {
    pub major_version: u16,
    pub minor_version: u16,
    pub major_build_number: u16,
    pub minor_build_number: u16,
    pub version: Option<String>,
}

/// Settings returned for a single user or domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse<N: SettingName> {
    /// The address (for user settings) or domain (for domain settings) these settings are for.
    pub identity: String,
    pub error_code: AutodiscoverErrorCode,
    pub error_message: Option<String>,
    /// Address or URL to retry at when `error_code` is a redirection.
    pub redirect_target: Option<String>,
    pub settings: BTreeMap<N, SettingValue>,
    pub setting_errors: Vec<SettingError>,
}

impl<N: SettingName> SettingsResponse<N> {
    pub(crate) fn new(identity: String) -> Self {
        SettingsResponse {
            identity,
            error_code: AutodiscoverErrorCode::NoError,
            error_message: None,
            redirect_target: None,
            settings: BTreeMap::new(),
            setting_errors: Vec::new(),
        }
    }

    /// Returns the value for a setting, if it was returned.
    pub fn get(&self, name: N) -> Option<&SettingValue> {
        self.settings.get(&name)
    }
}

/// Settings for a single user.
pub type GetUserSettingsResponse = SettingsResponse<UserSettingName>;
/// Settings for a single domain.
pub type GetDomainSettingsResponse = SettingsResponse<DomainSettingName>;

/// The result of a single SOAP request, which may cover several users or domains.
///
/// A failure for a single identity is reported in its own response; the collection-level error
/// code only reflects failures of the request as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponseCollection<N: SettingName> {
    pub error_code: AutodiscoverErrorCode,
    pub error_message: Option<String>,
    /// Set when the server redirected the whole request to another URL.
    pub redirect_url: Option<Uri>,
    pub responses: Vec<SettingsResponse<N>>,
    pub server_info: Option<ServerVersionInfo>,
    pub(crate) partner_token: Option<String>,
    pub(crate) partner_token_reference: Option<String>,
}

impl<N: SettingName> SettingsResponseCollection<N> {
    pub(crate) fn empty() -> Self {
        SettingsResponseCollection {
            error_code: AutodiscoverErrorCode::NoError,
            error_message: None,
            redirect_url: None,
            responses: Vec::new(),
            server_info: None,
            partner_token: None,
            partner_token_reference: None,
        }
    }

    /// A collection representing an HTTP-level redirection to `url`.
    pub(crate) fn redirection(url: Uri) -> Self {
        SettingsResponseCollection {
            error_code: AutodiscoverErrorCode::RedirectUrl,
            redirect_url: Some(url),
            ..Self::empty()
        }
    }
}

/// Result of querying settings for several users.
pub type GetUserSettingsResponseCollection = SettingsResponseCollection<UserSettingName>;
/// Result of querying settings for several domains.
pub type GetDomainSettingsResponseCollection = SettingsResponseCollection<DomainSettingName>;

#[cfg(test)]
mod tests {
    use super::{AutodiscoverErrorCode, DomainSettingName, ExchangeVersion, UserSettingName};

    #[test]
    fn test_version_ordering() {
        assert!(ExchangeVersion::Exchange2007Sp1 < ExchangeVersion::MINIMUM_FOR_SOAP);
        assert!(!ExchangeVersion::Exchange2007Sp1.supports_soap());
        assert!(ExchangeVersion::Exchange2010.supports_soap());
        assert!(ExchangeVersion::Exchange2010 < ExchangeVersion::MINIMUM_FOR_PARTNER_TOKEN);
    }

    #[test]
    fn test_version_wire_names() {
        assert_eq!(
            "Exchange2010_SP2".parse::<ExchangeVersion>(),
            Ok(ExchangeVersion::Exchange2010Sp2)
        );
        assert_eq!(ExchangeVersion::Exchange2007Sp1.to_string(), "Exchange2007_SP1");
        "Exchange2030".parse::<ExchangeVersion>().unwrap_err();
    }

    #[test]
    fn test_setting_names() {
        assert_eq!(
            "ExternalEwsUrl".parse::<UserSettingName>(),
            Ok(UserSettingName::ExternalEwsUrl)
        );
        assert_eq!(UserSettingName::UserDN.as_str(), "UserDN");
        assert_eq!(
            "ExternalEwsVersion".parse::<DomainSettingName>(),
            Ok(DomainSettingName::ExternalEwsVersion)
        );
        "UserDisplayName".parse::<DomainSettingName>().unwrap_err();
    }

    #[test]
    fn test_unknown_error_code() {
        assert_eq!(
            AutodiscoverErrorCode::from_wire("RedirectAddress"),
            AutodiscoverErrorCode::RedirectAddress
        );
        assert_eq!(
            AutodiscoverErrorCode::from_wire("SomethingNew"),
            AutodiscoverErrorCode::InternalServerError
        );
    }
}
