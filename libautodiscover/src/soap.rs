// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Envelopes for the SOAP autodiscover service.

use std::collections::BTreeMap;

use http::Uri;
use roxmltree::{Document, ExpandedName, Node};

use crate::{
    names::{self, ACTION_BASE, AUTODISCOVER, SOAP11, WSA, XSI},
    settings::{
        AutodiscoverErrorCode, DomainSettingName, ExchangeVersion, ProtocolConnection,
        ServerVersionInfo, SettingError, SettingName, SettingValue, SettingsResponse,
        SettingsResponseCollection, UserSettingName, WebClientUrl,
    },
    xmlutils::{child, child_text, children, render_prefixed, soap_child, text_of},
    ParseError,
};

/// Operations exposed by the SOAP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapAction {
    GetUserSettings,
    GetDomainSettings,
}

impl SoapAction {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SoapAction::GetUserSettings => "GetUserSettings",
            SoapAction::GetDomainSettings => "GetDomainSettings",
        }
    }

    /// Value for the WS-Addressing `Action` header.
    #[must_use]
    pub fn uri(self) -> String {
        format!("{ACTION_BASE}/{}", self.name())
    }
}

/// Wraps a request body into a SOAP envelope addressed to `to`.
pub(crate) fn render_envelope(
    action: SoapAction,
    version: ExchangeVersion,
    to: &Uri,
    security_header: Option<&str>,
    body: &str,
) -> String {
    let mut header = String::new();
    header.push_str(&render_prefixed("a", "RequestedServerVersion", version.as_str()));
    header.push_str(&render_prefixed("wsa", "Action", action.uri()));
    header.push_str(&render_prefixed("wsa", "To", to.to_string()));
    if let Some(security) = security_header {
        header.push_str(security);
    }

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:a="{AUTODISCOVER}" xmlns:wsa="{WSA}" xmlns:xsi="{XSI}" xmlns:soap="{SOAP11}">
<soap:Header>{header}</soap:Header>
<soap:Body>{body}</soap:Body>
</soap:Envelope>"#
    )
}

/// Renders the body of a `GetUserSettings` request.
pub(crate) fn render_user_settings_body(addresses: &[String], settings: &[UserSettingName]) -> String {
    let users: String = addresses
        .iter()
        .map(|address| format!("<a:User>{}</a:User>", render_prefixed("a", "Mailbox", address)))
        .collect();
    let settings: String = settings
        .iter()
        .map(|s| render_prefixed("a", "Setting", s.as_str()))
        .collect();
    format!(
        "<a:GetUserSettingsRequestMessage><a:Request>\
         <a:Users>{users}</a:Users>\
         <a:RequestedSettings>{settings}</a:RequestedSettings>\
         </a:Request></a:GetUserSettingsRequestMessage>"
    )
}

/// Renders the body of a `GetDomainSettings` request.
pub(crate) fn render_domain_settings_body(
    domains: &[String],
    settings: &[DomainSettingName],
    requested_version: Option<ExchangeVersion>,
) -> String {
    let domains: String = domains
        .iter()
        .map(|domain| render_prefixed("a", "Domain", domain))
        .collect();
    let settings: String = settings
        .iter()
        .map(|s| render_prefixed("a", "Setting", s.as_str()))
        .collect();
    let version = requested_version
        .map(|v| render_prefixed("a", "RequestedVersion", v.as_str()))
        .unwrap_or_default();
    format!(
        "<a:GetDomainSettingsRequestMessage><a:Request>\
         <a:Domains>{domains}</a:Domains>\
         <a:RequestedSettings>{settings}</a:RequestedSettings>\
         {version}\
         </a:Request></a:GetDomainSettingsRequestMessage>"
    )
}

/// Element names which differ between user and domain responses.
pub(crate) struct ResponseNames {
    message: ExpandedName<'static, 'static>,
    responses: ExpandedName<'static, 'static>,
    response: ExpandedName<'static, 'static>,
    settings: ExpandedName<'static, 'static>,
    setting: ExpandedName<'static, 'static>,
    errors: ExpandedName<'static, 'static>,
    error: ExpandedName<'static, 'static>,
}

pub(crate) const USER_RESPONSE_NAMES: ResponseNames = ResponseNames {
    message: names::GET_USER_SETTINGS_RESPONSE_MESSAGE,
    responses: names::USER_RESPONSES,
    response: names::USER_RESPONSE,
    settings: names::USER_SETTINGS,
    setting: names::USER_SETTING,
    errors: names::USER_SETTING_ERRORS,
    error: names::USER_SETTING_ERROR,
};

pub(crate) const DOMAIN_RESPONSE_NAMES: ResponseNames = ResponseNames {
    message: names::GET_DOMAIN_SETTINGS_RESPONSE_MESSAGE,
    responses: names::DOMAIN_RESPONSES,
    response: names::DOMAIN_RESPONSE,
    settings: names::DOMAIN_SETTINGS,
    setting: names::DOMAIN_SETTING,
    errors: names::DOMAIN_SETTING_ERRORS,
    error: names::DOMAIN_SETTING_ERROR,
};

/// Parses a SOAP response into a settings collection.
///
/// Identities of individual responses are left empty; the server returns them in the same order
/// as they were requested.
///
/// # Errors
///
/// If the body is not a valid envelope, or if it contains a SOAP fault.
pub(crate) fn parse_settings_response<N: SettingName>(
    raw: &[u8],
    layout: &ResponseNames,
) -> Result<SettingsResponseCollection<N>, ParseError> {
    let text = std::str::from_utf8(raw)?;
    let doc = Document::parse(text)?;
    let envelope = doc.root_element();
    if !is_soap_envelope(envelope) {
        return Err(ParseError::MissingData("Envelope"));
    }

    let mut collection = SettingsResponseCollection::empty();

    if let Some(header) = soap_child(envelope, "Header") {
        if let Some(info) = child(header, &names::SERVER_VERSION_INFO) {
            collection.server_info = Some(parse_server_info(info)?);
        }
        collection.partner_token = child_text(header, &names::PARTNER_TOKEN).map(String::from);
        collection.partner_token_reference =
            child_text(header, &names::PARTNER_TOKEN_REFERENCE).map(String::from);
    }

    let body = soap_child(envelope, "Body").ok_or(ParseError::MissingData("Body"))?;
    if let Some(fault) = soap_child(body, "Fault") {
        return Err(parse_fault(fault));
    }

    let message = child(body, &layout.message).ok_or(ParseError::MissingData("ResponseMessage"))?;
    let response = child(message, &names::RESPONSE).ok_or(ParseError::MissingData("Response"))?;

    collection.error_code = child_text(response, &names::ERROR_CODE)
        .map_or(AutodiscoverErrorCode::NoError, AutodiscoverErrorCode::from_wire);
    collection.error_message = child_text(response, &names::ERROR_MESSAGE).map(String::from);

    if let Some(responses) = child(response, &layout.responses) {
        for node in children(responses, layout.response) {
            collection.responses.push(parse_single_response(node, layout)?);
        }
    }

    Ok(collection)
}

fn is_soap_envelope(node: Node) -> bool {
    node.tag_name().name() == "Envelope"
        && matches!(node.tag_name().namespace(), Some(names::SOAP11 | names::SOAP12))
}

fn parse_single_response<N: SettingName>(
    node: Node,
    layout: &ResponseNames,
) -> Result<SettingsResponse<N>, ParseError> {
    let mut response = SettingsResponse::new(String::new());
    response.error_code = child_text(node, &names::ERROR_CODE)
        .map_or(AutodiscoverErrorCode::NoError, AutodiscoverErrorCode::from_wire);
    response.error_message = child_text(node, &names::ERROR_MESSAGE).map(String::from);
    response.redirect_target = child_text(node, &names::REDIRECT_TARGET).map(String::from);

    if let Some(settings) = child(node, &layout.settings) {
        response.settings = parse_settings(settings, layout)?;
    }

    if let Some(errors) = child(node, &layout.errors) {
        for error in children(errors, layout.error) {
            response.setting_errors.push(SettingError {
                error_code: child_text(error, &names::ERROR_CODE)
                    .map_or(AutodiscoverErrorCode::NoError, AutodiscoverErrorCode::from_wire),
                error_message: child_text(error, &names::ERROR_MESSAGE).map(String::from),
                setting_name: child_text(error, &names::SETTING_NAME)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
    }

    Ok(response)
}

fn parse_settings<N: SettingName>(
    node: Node,
    layout: &ResponseNames,
) -> Result<BTreeMap<N, SettingValue>, ParseError> {
    let mut settings = BTreeMap::new();
    for setting in children(node, layout.setting) {
        let raw_name = child_text(setting, &names::NAME).ok_or(ParseError::MissingData("Name"))?;
        let Ok(name) = raw_name.parse::<N>() else {
            log::warn!("ignoring unknown setting in response: {raw_name}");
            continue;
        };

        // Types may be prefixed (e.g.: `a:StringSetting`).
        let kind = setting
            .attribute(names::XSI_TYPE)
            .map(|t| t.rsplit(':').next().unwrap_or(t));
        let value = match kind {
            Some("WebClientUrlCollectionSetting") => {
                SettingValue::WebClientUrls(parse_web_client_urls(setting))
            }
            Some("ProtocolConnectionCollectionSetting") => {
                SettingValue::ProtocolConnections(parse_protocol_connections(setting)?)
            }
            _ => match child(setting, &names::VALUE).and_then(text_of) {
                Some(value) => SettingValue::from(value),
                None if child(setting, &names::VALUE).is_some() => SettingValue::from(""),
                None => {
                    log::warn!("ignoring setting {raw_name} of unknown type {kind:?}");
                    continue;
                }
            },
        };
        settings.insert(name, value);
    }
    Ok(settings)
}

fn parse_web_client_urls(setting: Node) -> Vec<WebClientUrl> {
    let Some(urls) = child(setting, &names::WEB_CLIENT_URLS) else {
        return Vec::new();
    };
    children(urls, names::WEB_CLIENT_URL)
        .filter_map(|url| {
            Some(WebClientUrl {
                authentication_methods: child_text(url, &names::AUTHENTICATION_METHODS)
                    .unwrap_or_default()
                    .to_string(),
                url: child_text(url, &names::URL)?.to_string(),
            })
        })
        .collect()
}

fn parse_protocol_connections(setting: Node) -> Result<Vec<ProtocolConnection>, ParseError> {
    let Some(connections) = child(setting, &names::PROTOCOL_CONNECTIONS) else {
        return Ok(Vec::new());
    };
    children(connections, names::PROTOCOL_CONNECTION)
        .map(|connection| {
            let port = child_text(connection, &names::PORT)
                .map(|p| {
                    p.parse::<u16>().map_err(|_| ParseError::InvalidValue {
                        element: "Port",
                        value: p.to_string(),
                    })
                })
                .transpose()?;
            Ok(ProtocolConnection {
                encryption_method: child_text(connection, &names::ENCRYPTION_METHOD)
                    .map(String::from),
                hostname: child_text(connection, &names::HOSTNAME)
                    .ok_or(ParseError::MissingData("Hostname"))?
                    .to_string(),
                port,
            })
        })
        .collect()
}

fn parse_server_info(node: Node) -> Result<ServerVersionInfo, ParseError> {
    let number = |name: &ExpandedName<'static, 'static>, element: &'static str| {
        child_text(node, name)
            .map(|raw| {
                raw.parse::<u16>().map_err(|_| ParseError::InvalidValue {
                    element,
                    value: raw.to_string(),
                })
            })
            .transpose()
            .map(Option::unwrap_or_default)
    };
    Ok(ServerVersionInfo {
        major_version: number(&names::MAJOR_VERSION, "MajorVersion")?,
        minor_version: number(&names::MINOR_VERSION, "MinorVersion")?,
        major_build_number: number(&names::MAJOR_BUILD_NUMBER, "MajorBuildNumber")?,
        minor_build_number: number(&names::MINOR_BUILD_NUMBER, "MinorBuildNumber")?,
        version: child_text(node, &names::VERSION).map(String::from),
    })
}

/// Extracts code and reason from a SOAP 1.1 or 1.2 fault.
fn parse_fault(fault: Node) -> ParseError {
    let text = |node: Option<Node>| node.and_then(text_of).unwrap_or_default().to_string();

    // SOAP 1.1 uses unqualified children.
    let code11 = fault
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "faultcode");
    if code11.is_some() {
        let reason = fault
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "faultstring");
        return ParseError::SoapFault {
            code: text(code11),
            reason: text(reason),
        };
    }

    let code = soap_child(fault, "Code").and_then(|c| soap_child(c, "Value"));
    let reason = soap_child(fault, "Reason").and_then(|r| soap_child(r, "Text"));
    ParseError::SoapFault {
        code: text(code),
        reason: text(reason),
    }
}
