// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! A client for Exchange's autodiscover services.
//!
//! Given an email address (or a domain), this library locates the autodiscover service
//! responsible for it and retrieves settings such as the URL of the Exchange Web Services
//! endpoint. Both the SOAP service (Exchange 2010 and later) and the legacy POX service are
//! supported.
//!
//! See [`AutodiscoverService`] as a useful entry point.
use http::{StatusCode, Uri};

use endpoints::InvalidLocation;
use pox::LegacyError;
use redirection::MaxHopsExceeded;
use settings::{AutodiscoverErrorCode, ExchangeVersion};

pub mod auth;
pub mod builder;
pub mod callbacks;
pub mod dns;
pub mod endpoints;
pub mod pox;
pub mod redirection;
pub mod request;
pub mod settings;
pub mod transport;

mod legacy;
mod names;
mod probe;
mod service;
mod soap;
mod xmlutils;

pub use builder::Config;
pub use service::{AutodiscoverService, PartnerAccess, ServiceLocator};
pub use soap::SoapAction;

/// Error parsing a response from an autodiscover service.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("response body is not valid utf-8")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("response body is not valid xml")]
    Xml(#[from] roxmltree::Error),

    #[error("missing field in response: {0}")]
    MissingData(&'static str),

    #[error("invalid value for {element}: {value}")]
    InvalidValue {
        element: &'static str,
        value: String,
    },

    #[error("service returned a fault ({code}): {reason}")]
    SoapFault { code: String, reason: String },
}

/// Error resolving or querying an autodiscover service.
#[derive(thiserror::Error, Debug)]
pub enum AutodiscoverError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("invalid email address")]
    InvalidEmail(#[from] email_address::Error),

    #[error("{operation} requires at least {minimum}, but {requested} was requested")]
    VersionIncompatible {
        operation: &'static str,
        minimum: ExchangeVersion,
        requested: ExchangeVersion,
    },

    #[error("maximum number of redirections exceeded")]
    MaxRedirectionHopsExceeded(#[from] MaxHopsExceeded),

    #[error("legacy autodiscover service returned an error")]
    LegacyService(#[source] LegacyError),

    /// All candidates failed, and at least one from the directory returned an error.
    #[error("autodiscover endpoint from the directory returned an error")]
    ScpEndpointError(#[source] LegacyError),

    /// Every candidate failed. Holds the error from the last one tried, if any.
    #[error("autodiscover service could not be located")]
    NotLocated(#[source] Option<Box<AutodiscoverError>>),

    #[error("host {0} advertises no usable autodiscover endpoint")]
    NoUsableEndpoint(String),

    #[error("autodiscover service returned error {code}")]
    ServiceError {
        code: AutodiscoverErrorCode,
        message: Option<String>,
    },

    #[error("redirection to {0} rejected")]
    RedirectionRejected(Uri),

    #[error("redirection response without a location")]
    MissingLocation,

    #[error(transparent)]
    InvalidLocation(#[from] InvalidLocation),

    #[error("unexpected http status: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("error sending request")]
    Transport(#[from] transport::TransportError),

    #[error("error parsing response")]
    Parse(#[from] ParseError),

    #[error("error authenticating request")]
    Auth(#[from] auth::AuthError),

    #[error("failed to build request")]
    InvalidInput(#[from] http::Error),

    #[error("invalid url")]
    InvalidUri(#[from] http::uri::InvalidUri),

    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),
}

impl AutodiscoverError {
    /// Whether discovery must stop, rather than try the next candidate.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(self, AutodiscoverError::MaxRedirectionHopsExceeded(_))
    }

    pub(crate) fn not_located(last: Option<AutodiscoverError>) -> AutodiscoverError {
        AutodiscoverError::NotLocated(last.map(Box::new))
    }
}
