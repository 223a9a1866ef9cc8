// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! HTTP transport used to reach autodiscover services.

use std::time::Duration;

use async_trait::async_trait;
use http::{Request, Response};
use hyper::{body::Bytes, client::HttpConnector, Body, Client};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use once_cell::sync::OnceCell;

/// Error sending a request or receiving its response.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("http error executing request")]
    Network(#[from] hyper::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to build request")]
    InvalidRequest(#[from] http::Error),
}

/// Sends requests and returns fully buffered responses.
///
/// Implementations MUST NOT follow redirections; these are returned as-is, since whether a
/// redirection is followed depends on where it leads.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a single request, failing if no response arrives within `timeout`.
    async fn send(
        &self,
        request: Request<String>,
        timeout: Duration,
    ) -> Result<Response<Bytes>, TransportError>;
}

/// Default transport based on `hyper`.
///
/// Plain-text HTTP is enabled, since unauthenticated redirection probes use it. The underlying
/// client (and its root certificate store) is initialised on first use.
#[derive(Debug, Default)]
pub struct HyperTransport {
    http_client: OnceCell<Client<HttpsConnector<HttpConnector>>>,
}

impl HyperTransport {
    #[must_use]
    pub fn new() -> HyperTransport {
        HyperTransport::default()
    }

    fn client(&self) -> &Client<HttpsConnector<HttpConnector>> {
        self.http_client.get_or_init(|| {
            let https = HttpsConnectorBuilder::new()
                .with_native_roots()
                .https_or_http()
                .enable_http1()
                .build();
            Client::builder().build(https)
        })
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(
        &self,
        request: Request<String>,
        timeout: Duration,
    ) -> Result<Response<Bytes>, TransportError> {
        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts, Body::from(body));

        let exchange = async {
            let response = self.client().request(request).await?;
            let (head, body) = response.into_parts();
            let body = hyper::body::to_bytes(body).await?;

            log::debug!("Response ({}): {:?}", head.status, body);
            Ok::<_, hyper::Error>(Response::from_parts(head, body))
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(TransportError::from)
    }
}
