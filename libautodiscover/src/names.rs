// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Namespaces and names of common autodiscover elements.

use roxmltree::ExpandedName;

/// Namespace for SOAP 1.1 envelopes.
pub const SOAP11: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Namespace for SOAP 1.2 envelopes.
pub const SOAP12: &str = "http://www.w3.org/2003/05/soap-envelope";
/// Namespace for WS-Addressing headers.
pub const WSA: &str = "http://www.w3.org/2005/08/addressing";
/// Namespace for XML schema instance attributes (`type`, `nil`).
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Namespace of the SOAP autodiscover service.
pub const AUTODISCOVER: &str = "http://schemas.microsoft.com/exchange/2010/Autodiscover";
/// Namespace of legacy (POX) requests.
pub const POX_REQUEST: &str =
    "http://schemas.microsoft.com/exchange/autodiscover/outlook/requestschema/2006";
/// Response schema requested in legacy (POX) requests.
pub const POX_RESPONSE: &str =
    "http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a";

/// Base for WS-Addressing actions of the SOAP service.
pub const ACTION_BASE: &str = "http://schemas.microsoft.com/exchange/2010/Autodiscover/Autodiscover";

pub const SERVER_VERSION_INFO: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "ServerVersionInfo");
pub const MAJOR_VERSION: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "MajorVersion");
pub const MINOR_VERSION: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "MinorVersion");
pub const MAJOR_BUILD_NUMBER: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "MajorBuildNumber");
pub const MINOR_BUILD_NUMBER: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "MinorBuildNumber");
pub const VERSION: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Version");
pub const PARTNER_TOKEN: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "PartnerToken");
pub const PARTNER_TOKEN_REFERENCE: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "PartnerTokenReference");

pub const GET_USER_SETTINGS_RESPONSE_MESSAGE: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "GetUserSettingsResponseMessage");
pub const GET_DOMAIN_SETTINGS_RESPONSE_MESSAGE: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "GetDomainSettingsResponseMessage");
pub const RESPONSE: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Response");
pub const ERROR_CODE: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "ErrorCode");
pub const ERROR_MESSAGE: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "ErrorMessage");
pub const REDIRECT_TARGET: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "RedirectTarget");
pub const NAME: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Name");
pub const VALUE: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Value");
pub const SETTING_NAME: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "SettingName");

pub const USER_RESPONSES: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "UserResponses");
pub const USER_RESPONSE: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "UserResponse");
pub const USER_SETTINGS: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "UserSettings");
pub const USER_SETTING: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "UserSetting");
pub const USER_SETTING_ERRORS: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "UserSettingErrors");
pub const USER_SETTING_ERROR: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "UserSettingError");

pub const DOMAIN_RESPONSES: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "DomainResponses");
pub const DOMAIN_RESPONSE: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "DomainResponse");
pub const DOMAIN_SETTINGS: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "DomainSettings");
pub const DOMAIN_SETTING: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "DomainSetting");
pub const DOMAIN_SETTING_ERRORS: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "DomainSettingErrors");
pub const DOMAIN_SETTING_ERROR: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "DomainSettingError");

pub const WEB_CLIENT_URLS: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "WebClientUrls");
pub const WEB_CLIENT_URL: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "WebClientUrl");
pub const AUTHENTICATION_METHODS: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "AuthenticationMethods");
pub const URL: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Url");
pub const PROTOCOL_CONNECTIONS: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "ProtocolConnections");
pub const PROTOCOL_CONNECTION: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "ProtocolConnection");
pub const ENCRYPTION_METHOD: ExpandedName =
    ExpandedName::from_static(AUTODISCOVER, "EncryptionMethod");
pub const HOSTNAME: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Hostname");
pub const PORT: ExpandedName = ExpandedName::from_static(AUTODISCOVER, "Port");

pub const XSI_TYPE: ExpandedName = ExpandedName::from_static(XSI, "type");
pub const XSI_NIL: ExpandedName = ExpandedName::from_static(XSI, "nil");
