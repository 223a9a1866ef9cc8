// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Scripted transport and fixtures shared by integration tests.
#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use http::{Method, Request, Response, StatusCode, Uri};
use hyper::body::Bytes;
use libautodiscover::{
    dns::{DnsError, SrvResolver},
    transport::{Transport, TransportError},
};

pub fn init() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// A request as seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub uri: Uri,
    pub body: String,
}

type Handler = Box<dyn Fn(&Seen) -> Result<Response<Bytes>, TransportError> + Send + Sync>;

/// Transport which answers requests via a closure and records every request.
pub struct ScriptedTransport {
    handler: Handler,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Arc<ScriptedTransport>
    where
        F: Fn(&Seen) -> Result<Response<Bytes>, TransportError> + Send + Sync + 'static,
    {
        Arc::new(ScriptedTransport {
            handler: Box::new(handler),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Requests sent with `method`, as URL strings.
    pub fn urls(&self, method: &Method) -> Vec<String> {
        self.seen()
            .into_iter()
            .filter(|s| &s.method == method)
            .map(|s| s.uri.to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: Request<String>,
        _timeout: Duration,
    ) -> Result<Response<Bytes>, TransportError> {
        let seen = Seen {
            method: request.method().clone(),
            uri: request.uri().clone(),
            body: request.body().clone(),
        };
        self.seen.lock().unwrap().push(seen.clone());
        (self.handler)(&seen)
    }
}

/// SRV resolver with a fixed answer.
pub struct FixedSrvResolver(pub Option<String>);

#[async_trait]
impl SrvResolver for FixedSrvResolver {
    async fn autodiscover_host(&self, _domain: &str) -> Result<Option<String>, DnsError> {
        Ok(self.0.clone())
    }
}

pub fn unreachable() -> Result<Response<Bytes>, TransportError> {
    Err(TransportError::Timeout(Duration::from_secs(1)))
}

pub fn ok(body: String) -> Result<Response<Bytes>, TransportError> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .body(Bytes::from(body))
        .unwrap())
}

pub fn redirect(location: &str) -> Result<Response<Bytes>, TransportError> {
    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header("location", location)
        .body(Bytes::new())
        .unwrap())
}

/// An unauthorised answer to a probe, advertising the given endpoint headers.
pub fn probe_answer(headers: &[&str]) -> Result<Response<Bytes>, TransportError> {
    let mut builder = Response::builder().status(StatusCode::UNAUTHORIZED);
    for header in headers {
        builder = builder.header(*header, "On");
    }
    Ok(builder.body(Bytes::new()).unwrap())
}

pub fn pox_settings(ews_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response xmlns="http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a">
    <User>
      <DisplayName>Jane Doe</DisplayName>
    </User>
    <Account>
      <AccountType>email</AccountType>
      <Action>settings</Action>
      <Protocol>
        <Type>EXPR</Type>
        <EwsUrl>{ews_url}</EwsUrl>
      </Protocol>
    </Account>
  </Response>
</Autodiscover>"#
    )
}

pub fn pox_redirect_url(url: &str) -> String {
    format!(
        r#"<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response xmlns="http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a">
    <Account>
      <Action>redirectUrl</Action>
      <RedirectUrl>{url}</RedirectUrl>
    </Account>
  </Response>
</Autodiscover>"#
    )
}

pub fn pox_redirect_address(address: &str) -> String {
    format!(
        r#"<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response xmlns="http://schemas.microsoft.com/exchange/autodiscover/outlook/responseschema/2006a">
    <Account>
      <Action>redirectAddr</Action>
      <RedirectAddr>{address}</RedirectAddr>
    </Account>
  </Response>
</Autodiscover>"#
    )
}

pub fn pox_error(code: &str, message: &str) -> String {
    format!(
        r#"<Autodiscover xmlns="http://schemas.microsoft.com/exchange/autodiscover/responseschema/2006">
  <Response>
    <Error Time="16:56:32.6164027" Id="1054084152">
      <ErrorCode>{code}</ErrorCode>
      <Message>{message}</Message>
    </Error>
  </Response>
</Autodiscover>"#
    )
}

/// A single `UserResponse` element.
pub fn user_response(error_code: &str, ews_url: Option<&str>) -> String {
    let settings = ews_url.map_or_else(String::new, |url| {
        format!(
            r#"<UserSettings>
              <UserSetting i:type="StringSetting">
                <Name>ExternalEwsUrl</Name>
                <Value>{url}</Value>
              </UserSetting>
            </UserSettings>"#
        )
    });
    format!(
        r#"<UserResponse>
            <ErrorCode>{error_code}</ErrorCode>
            <ErrorMessage>{error_code}</ErrorMessage>
            {settings}
          </UserResponse>"#
    )
}

/// A `UserResponse` element redirecting to another address or URL.
pub fn user_redirect(error_code: &str, target: &str) -> String {
    format!(
        r#"<UserResponse>
            <ErrorCode>{error_code}</ErrorCode>
            <ErrorMessage>Redirection.</ErrorMessage>
            <RedirectTarget>{target}</RedirectTarget>
          </UserResponse>"#
    )
}

/// A `GetUserSettings` response rejecting the whole request.
pub fn soap_request_error(error_code: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <GetUserSettingsResponseMessage xmlns="http://schemas.microsoft.com/exchange/2010/Autodiscover">
      <Response xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
        <ErrorCode>{error_code}</ErrorCode>
        <ErrorMessage>The request is invalid.</ErrorMessage>
        <UserResponses/>
      </Response>
    </GetUserSettingsResponseMessage>
  </s:Body>
</s:Envelope>"#
    )
}

/// A `GetUserSettings` response envelope with the given `UserResponse` elements.
pub fn soap_user_settings(responses: &[String], header: &str) -> String {
    let responses = responses.concat();
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>{header}</s:Header>
  <s:Body>
    <GetUserSettingsResponseMessage xmlns="http://schemas.microsoft.com/exchange/2010/Autodiscover">
      <Response xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
        <ErrorCode>NoError</ErrorCode>
        <ErrorMessage/>
        <UserResponses>
          {responses}
        </UserResponses>
      </Response>
    </GetUserSettingsResponseMessage>
  </s:Body>
</s:Envelope>"#
    )
}

pub fn soap_domain_settings(ews_url: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <GetDomainSettingsResponseMessage xmlns="http://schemas.microsoft.com/exchange/2010/Autodiscover">
      <Response xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
        <ErrorCode>NoError</ErrorCode>
        <DomainResponses>
          <DomainResponse>
            <ErrorCode>NoError</ErrorCode>
            <DomainSettings>
              <DomainSetting i:type="DomainStringSetting">
                <Name>ExternalEwsUrl</Name>
                <Value>{ews_url}</Value>
              </DomainSetting>
            </DomainSettings>
          </DomainResponse>
        </DomainResponses>
      </Response>
    </GetDomainSettingsResponseMessage>
  </s:Body>
</s:Envelope>"#
    )
}
