// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Unauthenticated probes used while discovering a service.

use http::{
    header::{LOCATION, USER_AGENT},
    Method, Request, Response, Uri,
};
use hyper::body::Bytes;

use crate::{
    endpoints::{legacy_http_url, legacy_https_url, resolve_location, Endpoints},
    redirection::{MaxHopsExceeded, MAX_REDIRECTION_HOPS},
    request::AutodiscoverRequest,
    AutodiscoverError, AutodiscoverService,
};

impl AutodiscoverService {
    /// Sends an unauthenticated `GET` to the legacy service at `url`.
    ///
    /// Returns `None` if the request failed.
    async fn probe(&self, url: &Uri) -> Option<Response<Bytes>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(url.clone())
            .header(USER_AGENT, &self.config.user_agent)
            .body(String::new());
        let request = match request {
            Ok(r) => r,
            Err(err) => {
                log::warn!("cannot build probe for {url}: {err}");
                return None;
            }
        };
        match self.transport.send(request, self.config.probe_timeout).await {
            Ok(response) => Some(response),
            Err(err) => {
                log::debug!("probe of {url} failed: {err}");
                None
            }
        }
    }

    /// Determines which endpoints `host` advertises.
    ///
    /// Host-level redirections are followed. Returns the host that answered and its endpoints, or
    /// `None` if the host cannot be reached or advertises no SOAP endpoints.
    ///
    /// # Errors
    ///
    /// If redirections exceed [`MAX_REDIRECTION_HOPS`].
    pub(crate) async fn probe_endpoints(
        &self,
        host: &str,
    ) -> Result<Option<(String, Endpoints)>, AutodiscoverError> {
        let mut host = host.to_string();
        let mut hops = 0;
        loop {
            let url = match legacy_https_url(&host) {
                Ok(url) => url,
                Err(err) => {
                    log::warn!("cannot probe invalid host {host}: {err}");
                    return Ok(None);
                }
            };
            log::debug!("probing endpoints of {host}");
            let Some(response) = self.probe(&url).await else {
                return Ok(None);
            };

            if response.status().is_redirection() {
                let next = redirect_target(&url, &response)
                    .and_then(|target| target.host().map(String::from));
                let Some(next) = next else {
                    return Ok(None);
                };
                if hops >= MAX_REDIRECTION_HOPS {
                    return Err(MaxHopsExceeded.into());
                }
                hops += 1;
                log::debug!("{host} redirected probe to {next}");
                host = next;
                continue;
            }

            // Services usually reject unauthenticated requests, but still advertise endpoints.
            let endpoints = Endpoints::from_headers(response.headers());
            log::debug!("{host} advertises {endpoints:?}");
            if !endpoints.has_soap_variant() {
                return Ok(None);
            }
            return Ok(Some((host, endpoints)));
        }
    }

    /// Asks `http://autodiscover.<domain>` for a redirection to the real service.
    ///
    /// Returns the redirection target if it is valid for `request` and the caller approved it.
    pub(crate) async fn redirect_probe(
        &self,
        domain: &str,
        request: &AutodiscoverRequest<'_>,
    ) -> Option<Uri> {
        let url = match legacy_http_url(&format!("autodiscover.{domain}")) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("cannot build redirect probe for {domain}: {err}");
                return None;
            }
        };
        log::debug!("trying unauthenticated redirection via {url}");
        let response = self.probe(&url).await?;
        if !response.status().is_redirection() {
            log::debug!("{url} did not redirect ({})", response.status());
            return None;
        }
        let target = redirect_target(&url, &response)?;
        if !request.accepts_redirect(&target) {
            log::debug!("redirection to {target} is not usable");
            return None;
        }
        self.approve(target)
    }

    /// Looks up the autodiscover host for `domain` via DNS SRV records.
    ///
    /// Returns the legacy URL on that host if the caller approved it.
    pub(crate) async fn srv_candidate(&self, domain: &str) -> Option<Uri> {
        let host = match self.srv_resolver.autodiscover_host(domain).await {
            Ok(Some(host)) => host,
            Ok(None) => {
                log::debug!("no usable SRV records for {domain}");
                return None;
            }
            Err(err) => {
                log::debug!("SRV lookup for {domain} failed: {err}");
                return None;
            }
        };
        match legacy_https_url(&host) {
            Ok(url) => self.approve(url),
            Err(err) => {
                log::warn!("SRV record for {domain} points to invalid host {host}: {err}");
                None
            }
        }
    }

    /// Asks the caller's validator whether an unauthenticated redirection may be followed.
    fn approve(&self, url: Uri) -> Option<Uri> {
        if (self.redirect_validator)(&url.to_string()) {
            Some(url)
        } else {
            log::debug!("redirection to {url} was not approved");
            None
        }
    }
}

fn redirect_target(url: &Uri, response: &Response<Bytes>) -> Option<Uri> {
    let location = response.headers().get(LOCATION)?;
    match resolve_location(url, location.as_bytes()) {
        Ok(target) => Some(target),
        Err(err) => {
            log::debug!("ignoring redirection from {url}: {err}");
            None
        }
    }
}
