// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Legacy "plain old XML" autodiscover requests and responses.
//!
//! Only used when talking to servers older than Exchange 2010, which do not expose the SOAP
//! service.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};

use crate::{
    names::{POX_REQUEST, POX_RESPONSE},
    settings::{
        AutodiscoverErrorCode, GetUserSettingsResponse, SettingError, SettingValue,
        UserSettingName, WebClientUrl,
    },
    xmlutils::{escape_text, local_child, local_child_text, text_of},
    ParseError,
};

/// Outcome of a single discovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryResponse<T> {
    Success(T),
    /// Retry the same request at another URL.
    RedirectUrl(String),
    /// Retry with another address.
    RedirectAddress(String),
    Error(LegacyError),
}

/// An error reported by a legacy service.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Default)]
#[error(
    "service returned error {}: {}",
    .code.as_deref().unwrap_or("(no code)"),
    .message.as_deref().unwrap_or("(no message)")
)]
pub struct LegacyError {
    pub time: Option<String>,
    pub id: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub debug_data: Option<String>,
}

/// Settings returned by a legacy service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutlookSettings {
    pub settings: BTreeMap<UserSettingName, SettingValue>,
}

/// Mapping of elements inside each protocol block to user settings.
const PROTOCOL_SETTINGS: &[(&str, &str, UserSettingName)] = &[
    ("EXCH", "Server", UserSettingName::InternalMailboxServer),
    ("EXCH", "ServerDN", UserSettingName::InternalMailboxServerDN),
    ("EXCH", "MdbDN", UserSettingName::MailboxDN),
    ("EXCH", "PublicFolderServer", UserSettingName::PublicFolderServer),
    ("EXCH", "AD", UserSettingName::ActiveDirectoryServer),
    ("EXCH", "EwsUrl", UserSettingName::InternalEwsUrl),
    ("EXCH", "EcpUrl", UserSettingName::InternalEcpUrl),
    ("EXCH", "UMUrl", UserSettingName::InternalUMUrl),
    ("EXCH", "OABUrl", UserSettingName::InternalOABUrl),
    ("EXPR", "Server", UserSettingName::ExternalMailboxServer),
    (
        "EXPR",
        "AuthPackage",
        UserSettingName::ExternalMailboxServerAuthenticationMethods,
    ),
    ("EXPR", "EwsUrl", UserSettingName::ExternalEwsUrl),
    ("EXPR", "EcpUrl", UserSettingName::ExternalEcpUrl),
    ("EXPR", "UMUrl", UserSettingName::ExternalUMUrl),
    ("EXPR", "OABUrl", UserSettingName::ExternalOABUrl),
];

const USER_SETTINGS: &[(&str, UserSettingName)] = &[
    ("DisplayName", UserSettingName::UserDisplayName),
    ("LegacyDN", UserSettingName::UserDN),
    ("DeploymentId", UserSettingName::UserDeploymentId),
    (
        "AutoDiscoverSMTPAddress",
        UserSettingName::AutoDiscoverSMTPAddress,
    ),
];

/// Renders the body for a legacy request for `email`.
#[must_use]
pub fn render_request(email: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Autodiscover xmlns="{POX_REQUEST}">
<Request>
<EMailAddress>{}</EMailAddress>
<AcceptableResponseSchema>{POX_RESPONSE}</AcceptableResponseSchema>
</Request>
</Autodiscover>"#,
        escape_text(email)
    )
}

/// Parses the body of a legacy response.
///
/// # Errors
///
/// If the body is not valid XML or lacks the mandatory elements.
pub fn parse_response(raw: &[u8]) -> Result<DiscoveryResponse<OutlookSettings>, ParseError> {
    let text = std::str::from_utf8(raw)?;
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if !root.tag_name().name().eq_ignore_ascii_case("Autodiscover") {
        return Err(ParseError::MissingData("Autodiscover"));
    }
    let response = local_child(root, "Response").ok_or(ParseError::MissingData("Response"))?;

    if let Some(error) = local_child(response, "Error") {
        return Ok(DiscoveryResponse::Error(parse_error(error)));
    }

    let account = local_child(response, "Account").ok_or(ParseError::MissingData("Account"))?;
    if let Some(error) = local_child(account, "Error") {
        return Ok(DiscoveryResponse::Error(parse_error(error)));
    }

    let action = local_child_text(account, "Action").unwrap_or("settings");
    match action.to_ascii_lowercase().as_str() {
        "settings" => Ok(DiscoveryResponse::Success(parse_settings(
            response, account,
        ))),
        "redirecturl" => local_child_text(account, "RedirectUrl")
            .map(|url| DiscoveryResponse::RedirectUrl(url.to_string()))
            .ok_or(ParseError::MissingData("RedirectUrl")),
        "redirectaddr" => local_child_text(account, "RedirectAddr")
            .map(|addr| DiscoveryResponse::RedirectAddress(addr.to_string()))
            .ok_or(ParseError::MissingData("RedirectAddr")),
        other => Err(ParseError::InvalidValue {
            element: "Action",
            value: other.to_string(),
        }),
    }
}

fn parse_error(node: Node) -> LegacyError {
    LegacyError {
        time: node.attribute("Time").map(String::from),
        id: node.attribute("Id").map(String::from),
        code: local_child_text(node, "ErrorCode").map(String::from),
        message: local_child_text(node, "Message").map(String::from),
        debug_data: local_child_text(node, "DebugData").map(String::from),
    }
}

fn parse_settings(response: Node, account: Node) -> OutlookSettings {
    let mut settings = BTreeMap::new();

    if let Some(user) = local_child(response, "User") {
        for (element, name) in USER_SETTINGS {
            if let Some(value) = local_child_text(user, element) {
                settings.insert(*name, SettingValue::from(value));
            }
        }
    }

    for protocol in account
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Protocol")
    {
        let Some(kind) = local_child_text(protocol, "Type") else {
            log::warn!("ignoring legacy protocol block without a type");
            continue;
        };
        let kind = kind.to_ascii_uppercase();

        for (block, element, name) in PROTOCOL_SETTINGS {
            if *block == kind {
                if let Some(value) = local_child_text(protocol, element) {
                    settings.insert(*name, SettingValue::from(value));
                }
            }
        }

        match kind.as_str() {
            "EXPR" => {
                if let Some(ssl) = local_child_text(protocol, "SSL") {
                    let requires_ssl = if ssl.eq_ignore_ascii_case("on") {
                        "True"
                    } else {
                        "False"
                    };
                    settings.insert(
                        UserSettingName::ExternalMailboxServerRequiresSSL,
                        SettingValue::from(requires_ssl),
                    );
                }
            }
            "WEB" => {
                for (block, name) in [
                    ("Internal", UserSettingName::InternalWebClientUrls),
                    ("External", UserSettingName::ExternalWebClientUrls),
                ] {
                    let urls = local_child(protocol, block)
                        .map(parse_owa_urls)
                        .unwrap_or_default();
                    if !urls.is_empty() {
                        settings.insert(name, SettingValue::WebClientUrls(urls));
                    }
                }
            }
            _ => {}
        }
    }

    OutlookSettings { settings }
}

fn parse_owa_urls(node: Node) -> Vec<WebClientUrl> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "OWAUrl")
        .filter_map(|n| {
            Some(WebClientUrl {
                authentication_methods: n.attribute("AuthenticationMethod")?.to_string(),
                url: text_of(n)?.to_string(),
            })
        })
        .collect()
}

impl DiscoveryResponse<OutlookSettings> {
    /// Converts a legacy response into a response for the requested settings.
    ///
    /// Requested settings which the server did not return are reported as setting errors.
    #[must_use]
    pub fn into_user_settings_response(
        self,
        email: &str,
        requested: &[UserSettingName],
    ) -> GetUserSettingsResponse {
        let mut response = GetUserSettingsResponse::new(email.to_string());
        match self {
            DiscoveryResponse::Success(mut outlook) => {
                for name in requested {
                    if let Some(value) = outlook.settings.remove(name) {
                        response.settings.insert(*name, value);
                    } else {
                        response.setting_errors.push(SettingError {
                            error_code: AutodiscoverErrorCode::SettingIsNotAvailable,
                            error_message: Some(format!("{name} is not available.")),
                            setting_name: name.to_string(),
                        });
                    }
                }
            }
            DiscoveryResponse::RedirectUrl(url) => {
                response.error_code = AutodiscoverErrorCode::RedirectUrl;
                response.redirect_target = Some(url);
            }
            DiscoveryResponse::RedirectAddress(address) => {
                response.error_code = AutodiscoverErrorCode::RedirectAddress;
                response.redirect_target = Some(address);
            }
            DiscoveryResponse::Error(error) => {
                response.error_code = AutodiscoverErrorCode::InternalServerError;
                response.error_message = error.message;
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use crate::pox::{parse_response, render_request, DiscoveryResponse, LegacyError};
    use crate::settings::{AutodiscoverErrorCode, SettingValue, UserSettingName};

    #[test]
    fn test_render_request() {
        let body = render_request("a&b@example.com");
        assert!(body.contains("<EMailAddress>a&amp;b@example.com</EMailAddress>"));
        roxmltree::Document::parse(&body).unwrap();
    }

    #[test]
    fn test_parse_settings() {
        let raw = br#"<?xml version="1.0" encoding="utf-8"?>
<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response xmlns="http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a">
    <User>
      <DisplayName>Jane Doe</DisplayName>
      <LegacyDN>/o=Example/cn=jane</LegacyDN>
    </User>
    <Account>
      <AccountType>email</AccountType>
      <Action>settings</Action>
      <Protocol>
        <Type>EXCH</Type>
        <Server>mbx.example.com</Server>
        <EwsUrl>https://mbx.example.com/EWS/Exchange.asmx</EwsUrl>
      </Protocol>
      <Protocol>
        <Type>EXPR</Type>
        <Server>mail.example.com</Server>
        <SSL>On</SSL>
        <EwsUrl>https://mail.example.com/EWS/Exchange.asmx</EwsUrl>
      </Protocol>
      <Protocol>
        <Type>WEB</Type>
        <External>
          <OWAUrl AuthenticationMethod="Fba">https://mail.example.com/owa/</OWAUrl>
        </External>
      </Protocol>
    </Account>
  </Response>
</Autodiscover>"#;
        let DiscoveryResponse::Success(outlook) = parse_response(raw).unwrap() else {
            panic!("expected successful response");
        };
        let settings = &outlook.settings;
        assert_eq!(
            settings[&UserSettingName::UserDisplayName],
            SettingValue::from("Jane Doe")
        );
        assert_eq!(
            settings[&UserSettingName::InternalEwsUrl],
            SettingValue::from("https://mbx.example.com/EWS/Exchange.asmx")
        );
        assert_eq!(
            settings[&UserSettingName::ExternalEwsUrl],
            SettingValue::from("https://mail.example.com/EWS/Exchange.asmx")
        );
        assert_eq!(
            settings[&UserSettingName::ExternalMailboxServerRequiresSSL],
            SettingValue::from("True")
        );
        match &settings[&UserSettingName::ExternalWebClientUrls] {
            SettingValue::WebClientUrls(urls) => {
                assert_eq!(urls.len(), 1);
                assert_eq!(urls[0].authentication_methods, "Fba");
            }
            other => panic!("unexpected value: {other:?}"),
        }

        let response = DiscoveryResponse::Success(outlook).into_user_settings_response(
            "jane@example.com",
            &[UserSettingName::ExternalEwsUrl, UserSettingName::CasVersion],
        );
        assert_eq!(response.error_code, AutodiscoverErrorCode::NoError);
        assert_eq!(response.settings.len(), 1);
        assert_eq!(response.setting_errors.len(), 1);
        assert_eq!(
            response.setting_errors[0].error_code,
            AutodiscoverErrorCode::SettingIsNotAvailable
        );
    }

    #[test]
    fn test_parse_redirects() {
        let raw = br#"<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response xmlns="http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a">
    <Account>
      <Action>redirectAddr</Action>
      <RedirectAddr>other@example.com</RedirectAddr>
    </Account>
  </Response>
</Autodiscover>"#;
        assert_eq!(
            parse_response(raw).unwrap(),
            DiscoveryResponse::RedirectAddress("other@example.com".to_string())
        );

        let raw = br#"<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response xmlns="http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a">
    <Account>
      <Action>redirectUrl</Action>
      <RedirectUrl>https://other.example.com/autodiscover/autodiscover.xml</RedirectUrl>
    </Account>
  </Response>
</Autodiscover>"#;
        assert_eq!(
            parse_response(raw).unwrap(),
            DiscoveryResponse::RedirectUrl(
                "https://other.example.com/autodiscover/autodiscover.xml".to_string()
            )
        );
    }

    #[test]
    fn test_parse_error() {
        let raw = br#"<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response>
    <Error Time="16:56:32.6164027" Id="1054084152">
      <ErrorCode>600</ErrorCode>
      <Message>Invalid Request</Message>
      <DebugData />
    </Error>
  </Response>
</Autodiscover>"#;
        let expected = LegacyError {
            time: Some("16:56:32.6164027".to_string()),
            id: Some("1054084152".to_string()),
            code: Some("600".to_string()),
            message: Some("Invalid Request".to_string()),
            debug_data: None,
        };
        assert_eq!(
            parse_response(raw).unwrap(),
            DiscoveryResponse::Error(expected)
        );
    }

    #[test]
    fn test_parse_garbage() {
        parse_response(b"<html><body>Not found</body></html>").unwrap_err();
        parse_response(b"not xml at all").unwrap_err();
    }
}
