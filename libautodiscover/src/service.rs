// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! The autodiscover resolution engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::{
    header::{CONTENT_TYPE, LOCATION, USER_AGENT},
    Method, Request, Uri,
};

use crate::{
    auth::{AuthExt, Credentials},
    builder::{NeedsAuth, ServiceBuilder},
    callbacks::{RedirectValidator, ScpLookup},
    dns::SrvResolver,
    endpoints::{legacy_https_url, resolve_location, select_endpoint},
    redirection::RedirectionState,
    request::{AutodiscoverRequest, Classification, ParsedResponse},
    settings::{
        AutodiscoverErrorCode, DomainSettingName, ExchangeVersion, GetDomainSettingsResponse,
        GetDomainSettingsResponseCollection, GetUserSettingsResponse,
        GetUserSettingsResponseCollection, SettingName, SettingsResponseCollection,
        UserSettingName,
    },
    transport::Transport,
    AutodiscoverError, Config, ParseError,
};

/// Mailbox used to request partner tokens for a tenant.
const PARTNER_MAILBOX: &str = "SystemMailbox{e0dc1c29-89c3-4034-b678-e6c29d823ed9}";

/// How the autodiscover service is located.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceLocator {
    /// Discover the service from the domain of each request.
    #[default]
    Undetermined,
    /// Use a known URL. The domain is that of the URL's host.
    ExplicitUrl { url: Uri, domain: String },
    /// Only look for the service at this domain.
    ExplicitDomain(String),
}

impl ServiceLocator {
    /// Creates a locator for a known URL.
    ///
    /// # Errors
    ///
    /// If the URL has no host.
    pub fn from_url(url: Uri) -> Result<ServiceLocator, AutodiscoverError> {
        let domain = url
            .host()
            .ok_or(AutodiscoverError::InvalidArgument("url has no host"))?
            .to_string();
        Ok(ServiceLocator::ExplicitUrl { url, domain })
    }

    #[must_use]
    pub fn url(&self) -> Option<&Uri> {
        match self {
            ServiceLocator::ExplicitUrl { url, .. } => Some(url),
            _ => None,
        }
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match self {
            ServiceLocator::ExplicitUrl { domain, .. } | ServiceLocator::ExplicitDomain(domain) => {
                Some(domain)
            }
            ServiceLocator::Undetermined => None,
        }
    }
}

/// Where a candidate endpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateOrigin {
    Scp,
    DomainGuess,
    DnsSrv,
    HttpRedirect,
}

/// A URL (or host) worth trying.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<T> {
    pub(crate) target: T,
    pub(crate) origin: CandidateOrigin,
}

/// Result of trying a single candidate.
pub(crate) enum AttemptOutcome<T> {
    Success(T),
    /// This candidate failed; others may still succeed.
    Inconclusive(AutodiscoverError),
    /// No other candidate should be tried.
    Fatal(AutodiscoverError),
}

impl<T> From<Result<T, AutodiscoverError>> for AttemptOutcome<T> {
    fn from(value: Result<T, AutodiscoverError>) -> Self {
        match value {
            Ok(v) => AttemptOutcome::Success(v),
            Err(err) if err.is_fatal() => AttemptOutcome::Fatal(err),
            Err(err) => AttemptOutcome::Inconclusive(err),
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    locator: ServiceLocator,
    is_external: Option<bool>,
}

/// Credentials for accessing a partner tenant.
#[derive(Debug, Clone)]
pub struct PartnerAccess {
    /// Partner token credentials (see [`Credentials::PartnerToken`]).
    pub credentials: Credentials,
    /// URL of the autodiscover service, adjusted for partner token credentials.
    pub autodiscover_url: Uri,
}

/// A client for Exchange's autodiscover services.
///
/// Given an email address or domain, locates the autodiscover service responsible for it and
/// queries it for settings. Once a service has been located, subsequent calls use it directly.
///
/// Use [`AutodiscoverService::builder`] to create a new instance.
pub struct AutodiscoverService {
    pub(crate) config: Config,
    pub(crate) credentials: Credentials,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) srv_resolver: Arc<dyn SrvResolver>,
    pub(crate) scp_lookup: ScpLookup,
    pub(crate) redirect_validator: RedirectValidator,
    shared: Mutex<SharedState>,
}

impl std::fmt::Debug for AutodiscoverService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutodiscoverService")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("locator", &self.locator())
            .finish_non_exhaustive()
    }
}

impl AutodiscoverService {
    /// Returns a builder for a new service.
    #[must_use]
    pub fn builder() -> ServiceBuilder<NeedsAuth> {
        ServiceBuilder::new()
    }

    pub(crate) fn new(
        config: Config,
        credentials: Credentials,
        locator: ServiceLocator,
        transport: Arc<dyn Transport>,
        srv_resolver: Arc<dyn SrvResolver>,
        scp_lookup: ScpLookup,
        redirect_validator: RedirectValidator,
    ) -> AutodiscoverService {
        AutodiscoverService {
            config,
            credentials,
            transport,
            srv_resolver,
            scp_lookup,
            redirect_validator,
            shared: Mutex::new(SharedState {
                locator,
                is_external: None,
            }),
        }
    }

    fn shared(&self) -> MutexGuard<'_, SharedState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns how the service is currently located.
    #[must_use]
    pub fn locator(&self) -> ServiceLocator {
        self.shared().locator.clone()
    }

    pub fn set_locator(&self, locator: ServiceLocator) {
        self.shared().locator = locator;
    }

    /// The URL of the autodiscover service, if known.
    #[must_use]
    pub fn url(&self) -> Option<Uri> {
        self.shared().locator.url().cloned()
    }

    /// Uses a known URL for subsequent requests.
    ///
    /// # Errors
    ///
    /// If the URL has no host.
    pub fn set_url(&self, url: Uri) -> Result<(), AutodiscoverError> {
        self.set_locator(ServiceLocator::from_url(url)?);
        Ok(())
    }

    /// The domain where the autodiscover service is located, if known.
    #[must_use]
    pub fn domain(&self) -> Option<String> {
        self.shared().locator.domain().map(String::from)
    }

    pub fn set_domain<S: Into<String>>(&self, domain: S) {
        self.set_locator(ServiceLocator::ExplicitDomain(domain.into()));
    }

    /// Whether the service was located outside of the directory (i.e.: not via SCP).
    ///
    /// Returns `None` until a service has been discovered.
    #[must_use]
    pub fn is_external(&self) -> Option<bool> {
        self.shared().is_external
    }

    pub(crate) fn set_is_external(&self, is_external: bool) {
        self.shared().is_external = Some(is_external);
    }

    /// Remembers a URL that successfully served a request.
    fn adopt_url(&self, url: Uri) {
        match ServiceLocator::from_url(url) {
            Ok(locator) => self.set_locator(locator),
            Err(err) => log::warn!("not remembering autodiscover url: {err}"),
        }
    }

    fn check_version(&self, operation: &'static str, minimum: ExchangeVersion) -> Result<(), AutodiscoverError> {
        let requested = self.config.requested_server_version;
        if requested < minimum {
            return Err(AutodiscoverError::VersionIncompatible {
                operation,
                minimum,
                requested,
            });
        }
        Ok(())
    }

    /// Retrieves settings for a single user.
    ///
    /// Services older than Exchange 2010 are queried via the legacy service. Redirections to other
    /// addresses or URLs are followed, up to a limit.
    ///
    /// # Errors
    ///
    /// - If the address is blank or no settings are requested.
    /// - If no autodiscover service could be located.
    /// - If the maximum amount of redirections is exceeded.
    /// - If a service explicitly reported an error.
    pub async fn get_user_settings(
        &self,
        email: &str,
        settings: &[UserSettingName],
    ) -> Result<GetUserSettingsResponse, AutodiscoverError> {
        if email.trim().is_empty() {
            return Err(AutodiscoverError::InvalidArgument(
                "email address must not be blank",
            ));
        }
        if settings.is_empty() {
            return Err(AutodiscoverError::InvalidArgument(
                "at least one setting must be requested",
            ));
        }

        if !self.config.requested_server_version.supports_soap() {
            return self.legacy_get_user_settings(email, settings).await;
        }

        let mut state = RedirectionState::new(Some(email), self.config.enable_scp_lookup);
        let mut address = email.to_string();
        loop {
            let domain = crate::endpoints::domain_from_email(&address)?;
            let addresses = [address.clone()];
            let request = AutodiscoverRequest::UserSettings {
                addresses: &addresses,
                settings,
            };
            let mut collection: GetUserSettingsResponseCollection = self
                .resolve_settings(&request, &domain, &mut state)
                .await?
                .try_into()?;
            check_collection(&collection)?;
            assign_identities(&mut collection, &addresses)?;

            let response = collection
                .responses
                .into_iter()
                .next()
                .ok_or(AutodiscoverError::InvalidResponse("no user response returned"))?;

            match response.error_code {
                AutodiscoverErrorCode::RedirectAddress => {
                    state.hop()?;
                    let target = response
                        .redirect_target
                        .ok_or(AutodiscoverError::InvalidResponse("missing redirect target"))?;
                    address = state.redirect_address(&target);
                    log::debug!("redirected to address {address}");
                    self.set_locator(ServiceLocator::Undetermined);
                }
                AutodiscoverErrorCode::RedirectUrl => {
                    state.hop()?;
                    let target = response
                        .redirect_target
                        .ok_or(AutodiscoverError::InvalidResponse("missing redirect target"))?
                        .parse::<Uri>()?;
                    let url = self.credentials.adjust_url(&target)?;
                    log::debug!("redirected to url {url}");
                    self.set_url(url)?;
                }
                _ => return Ok(response),
            }
        }
    }

    /// Retrieves settings for several users with a single request.
    ///
    /// Failures for individual users are reported in their respective responses.
    ///
    /// # Errors
    ///
    /// - If no addresses or settings are given.
    /// - If the requested server version predates the SOAP service.
    /// - If no autodiscover service could be located.
    pub async fn get_users_settings(
        &self,
        emails: &[String],
        settings: &[UserSettingName],
    ) -> Result<GetUserSettingsResponseCollection, AutodiscoverError> {
        self.check_version("GetUsersSettings", ExchangeVersion::MINIMUM_FOR_SOAP)?;
        if emails.is_empty() {
            return Err(AutodiscoverError::InvalidArgument(
                "at least one email address is required",
            ));
        }
        if settings.is_empty() {
            return Err(AutodiscoverError::InvalidArgument(
                "at least one setting must be requested",
            ));
        }

        // Any valid address will do to locate the service.
        let domain = emails
            .iter()
            .find_map(|e| crate::endpoints::domain_from_email(e).ok())
            .ok_or(AutodiscoverError::InvalidArgument(
                "no valid email address provided",
            ))?;

        let mut state = RedirectionState::new(None, self.config.enable_scp_lookup);
        let request = AutodiscoverRequest::UserSettings {
            addresses: emails,
            settings,
        };
        let mut collection: GetUserSettingsResponseCollection = self
            .resolve_settings(&request, &domain, &mut state)
            .await?
            .try_into()?;
        assign_identities(&mut collection, emails)?;
        Ok(collection)
    }

    /// Retrieves settings for several domains with a single request.
    ///
    /// # Errors
    ///
    /// - If no domains or settings are given.
    /// - If the requested server version predates the SOAP service.
    /// - If no autodiscover service could be located.
    pub async fn get_domain_settings(
        &self,
        domains: &[String],
        requested_version: Option<ExchangeVersion>,
        settings: &[DomainSettingName],
    ) -> Result<GetDomainSettingsResponseCollection, AutodiscoverError> {
        self.check_version("GetDomainSettings", ExchangeVersion::MINIMUM_FOR_SOAP)?;
        let Some(first) = domains.first() else {
            return Err(AutodiscoverError::InvalidArgument("at least one domain is required"));
        };
        if domains.iter().any(|d| d.trim().is_empty()) {
            return Err(AutodiscoverError::InvalidArgument("domain must not be blank"));
        }
        if settings.is_empty() {
            return Err(AutodiscoverError::InvalidArgument(
                "at least one setting must be requested",
            ));
        }

        let mut state = RedirectionState::new(None, self.config.enable_scp_lookup);
        let request = AutodiscoverRequest::DomainSettings {
            domains,
            settings,
            requested_version,
        };
        let mut collection: GetDomainSettingsResponseCollection = self
            .resolve_settings(&request, first, &mut state)
            .await?
            .try_into()?;
        assign_identities(&mut collection, domains)?;
        Ok(collection)
    }

    /// Retrieves settings for a single domain.
    ///
    /// # Errors
    ///
    /// See [`AutodiscoverService::get_domain_settings`].
    pub async fn get_domain_setting(
        &self,
        domain: &str,
        requested_version: Option<ExchangeVersion>,
        settings: &[DomainSettingName],
    ) -> Result<GetDomainSettingsResponse, AutodiscoverError> {
        let collection = self
            .get_domain_settings(&[domain.to_string()], requested_version, settings)
            .await?;
        check_collection(&collection)?;
        collection
            .responses
            .into_iter()
            .next()
            .ok_or(AutodiscoverError::InvalidResponse("no domain response returned"))
    }

    /// Tries to obtain a partner token for accessing another tenant.
    ///
    /// Requires a known autodiscover URL and X.509 certificate credentials. Returns `None` if the
    /// service did not issue a token.
    ///
    /// # Errors
    ///
    /// If the preconditions above are not met, or if the requested server version predates
    /// partner tokens.
    pub async fn try_get_partner_access(
        &self,
        target_tenant_domain: &str,
    ) -> Result<Option<PartnerAccess>, AutodiscoverError> {
        self.check_version(
            "TryGetPartnerAccess",
            ExchangeVersion::MINIMUM_FOR_PARTNER_TOKEN,
        )?;
        if !matches!(self.credentials, Credentials::X509 { .. }) {
            return Err(AutodiscoverError::InvalidArgument(
                "partner access requires X.509 certificate credentials",
            ));
        }
        if self.url().is_none() {
            return Err(AutodiscoverError::InvalidArgument(
                "partner access requires a known autodiscover url",
            ));
        }
        if target_tenant_domain.trim().is_empty() {
            return Err(AutodiscoverError::InvalidArgument("domain must not be blank"));
        }

        let address = format!("{PARTNER_MAILBOX}@{target_tenant_domain}");
        let addresses = [address.clone()];
        let request = AutodiscoverRequest::UserSettings {
            addresses: &addresses,
            settings: &[UserSettingName::ExternalEwsUrl],
        };
        let mut state = RedirectionState::new(Some(&address), false);

        let collection: GetUserSettingsResponseCollection = match self
            .resolve_settings(&request, target_tenant_domain, &mut state)
            .await
            .and_then(GetUserSettingsResponseCollection::try_from)
        {
            Ok(collection) => collection,
            Err(err) => {
                log::debug!("partner token request failed: {err}");
                return Ok(None);
            }
        };

        let (Some(token), Some(reference)) = (
            collection.partner_token,
            collection.partner_token_reference,
        ) else {
            log::debug!("no partner token returned");
            return Ok(None);
        };
        let usable = collection.responses.first().map_or(false, |r| {
            matches!(
                r.error_code,
                AutodiscoverErrorCode::NoError | AutodiscoverErrorCode::RedirectUrl
            )
        });
        if !usable {
            return Ok(None);
        }

        let credentials = Credentials::PartnerToken { token, reference };
        let url = self
            .url()
            .ok_or(AutodiscoverError::InvalidArgument("autodiscover url is unknown"))?;
        Ok(Some(PartnerAccess {
            autodiscover_url: credentials.adjust_url(&url)?,
            credentials,
        }))
    }

    /// Locates the SOAP service and sends `request` to it.
    async fn resolve_settings(
        &self,
        request: &AutodiscoverRequest<'_>,
        domain: &str,
        state: &mut RedirectionState,
    ) -> Result<ParsedResponse, AutodiscoverError> {
        match self.locator() {
            ServiceLocator::ExplicitUrl { url, .. } => {
                let (response, final_url) =
                    self.call_following_redirects(request, url, state).await?;
                self.adopt_url(final_url);
                Ok(response)
            }
            ServiceLocator::ExplicitDomain(domain) => {
                let url = self
                    .gated_endpoint(&domain)
                    .await?
                    .ok_or_else(|| {
                        AutodiscoverError::not_located(Some(AutodiscoverError::NoUsableEndpoint(
                            domain.clone(),
                        )))
                    })?;
                let (response, final_url) =
                    self.call_following_redirects(request, url, state).await?;
                self.adopt_url(final_url);
                Ok(response)
            }
            ServiceLocator::Undetermined => self.discover_settings(request, domain, state).await,
        }
    }

    /// Tries every candidate host for `domain` in turn.
    async fn discover_settings(
        &self,
        request: &AutodiscoverRequest<'_>,
        domain: &str,
        state: &mut RedirectionState,
    ) -> Result<ParsedResponse, AutodiscoverError> {
        let mut hosts = Vec::new();
        if state.scp_enabled() {
            for url in (self.scp_lookup)(domain) {
                match url.parse::<Uri>().ok().and_then(|u| u.host().map(String::from)) {
                    Some(host) => hosts.push(Candidate {
                        target: host,
                        origin: CandidateOrigin::Scp,
                    }),
                    None => log::warn!("ignoring invalid SCP url: {url}"),
                }
            }
        }
        hosts.extend(domain_guesses(domain).into_iter().map(|host| Candidate {
            target: host,
            origin: CandidateOrigin::DomainGuess,
        }));

        let mut last_error = None;
        for candidate in hosts {
            match self.attempt_host(request, &candidate.target, state).await {
                AttemptOutcome::Success((response, url)) => {
                    self.adopt_url(url);
                    self.set_is_external(candidate.origin != CandidateOrigin::Scp);
                    return Ok(response);
                }
                AttemptOutcome::Inconclusive(err) => {
                    log::debug!("{:?} candidate {} failed: {err}", candidate.origin, candidate.target);
                    last_error = Some(err);
                }
                AttemptOutcome::Fatal(err) => return Err(err),
            }
        }

        // Last resorts. Unauthenticated answers are only trusted if the caller approves them.
        for origin in [CandidateOrigin::HttpRedirect, CandidateOrigin::DnsSrv] {
            let url = if origin == CandidateOrigin::HttpRedirect {
                self.redirect_probe(domain, request).await
            } else {
                self.srv_candidate(domain).await
            };
            let Some(host) = url.as_ref().and_then(Uri::host) else {
                continue;
            };
            match self.attempt_host(request, host, state).await {
                AttemptOutcome::Success((response, url)) => {
                    self.adopt_url(url);
                    self.set_is_external(true);
                    return Ok(response);
                }
                AttemptOutcome::Inconclusive(err) => {
                    log::debug!("{origin:?} candidate {host} failed: {err}");
                    last_error = Some(err);
                }
                AttemptOutcome::Fatal(err) => return Err(err),
            }
        }

        Err(AutodiscoverError::not_located(last_error))
    }

    /// Sends `request` to the SOAP endpoint on `host`, if it advertises a usable one.
    async fn attempt_host(
        &self,
        request: &AutodiscoverRequest<'_>,
        host: &str,
        state: &mut RedirectionState,
    ) -> AttemptOutcome<(ParsedResponse, Uri)> {
        let url = match self.gated_endpoint(host).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                return AttemptOutcome::Inconclusive(AutodiscoverError::NoUsableEndpoint(
                    host.to_string(),
                ))
            }
            Err(err) if err.is_fatal() => return AttemptOutcome::Fatal(err),
            Err(err) => return AttemptOutcome::Inconclusive(err),
        };
        // Errors for the request as a whole move discovery on to the next host.
        self.call_following_redirects(request, url, state)
            .await
            .and_then(|(response, url)| {
                request_error(&response)?;
                Ok((response, url))
            })
            .into()
    }

    /// Probes `host` and returns the endpoint for this service's credentials, if advertised.
    async fn gated_endpoint(&self, host: &str) -> Result<Option<Uri>, AutodiscoverError> {
        let Some((host, endpoints)) = self.probe_endpoints(host).await? else {
            return Ok(None);
        };
        Ok(select_endpoint(&host, endpoints, &self.credentials))
    }

    /// Sends `request`, following redirections to other URLs.
    ///
    /// Returns the response and the URL that finally served it.
    async fn call_following_redirects(
        &self,
        request: &AutodiscoverRequest<'_>,
        url: Uri,
        state: &mut RedirectionState,
    ) -> Result<(ParsedResponse, Uri), AutodiscoverError> {
        let mut url = url;
        loop {
            let response = self.call(request, &url).await?;
            match response.classify() {
                Classification::RedirectUrl(target) => {
                    state.hop()?;
                    url = target.parse()?;
                    log::debug!("following redirection to {url}");
                }
                _ => return Ok((response, url)),
            }
        }
    }

    /// Sends a single request to `url`.
    ///
    /// Redirections are not followed, but returned as a response of the matching kind.
    pub(crate) async fn call(
        &self,
        request: &AutodiscoverRequest<'_>,
        url: &Uri,
    ) -> Result<ParsedResponse, AutodiscoverError> {
        log::debug!("sending autodiscover request to {url}");
        let body = request.render(url, self.config.requested_server_version, &self.credentials);
        let http_request = Request::builder()
            .authenticate(&self.credentials)?
            .method(Method::POST)
            .uri(url.clone())
            .header(CONTENT_TYPE, request.content_type())
            .header(USER_AGENT, &self.config.user_agent)
            .body(body)?;

        let response = self
            .transport
            .send(http_request, self.config.request_timeout)
            .await?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .ok_or(AutodiscoverError::MissingLocation)?;
            let target = resolve_location(url, location.as_bytes())?;
            if !request.accepts_redirect(&target) {
                return Err(AutodiscoverError::RedirectionRejected(target));
            }
            log::debug!("{url} redirected to {target}");
            return Ok(request.redirection_response(target));
        }

        if !status.is_success() {
            // SOAP services report faults with error statuses.
            if request.is_soap() {
                if let Err(fault @ ParseError::SoapFault { .. }) = request.parse(response.body()) {
                    return Err(fault.into());
                }
            }
            return Err(AutodiscoverError::UnexpectedStatus(status));
        }

        Ok(request.parse(response.body())?)
    }
}

/// Hosts where an autodiscover service for `domain` commonly lives.
pub(crate) fn domain_guesses(domain: &str) -> [String; 2] {
    [domain.to_string(), format!("autodiscover.{domain}")]
}

/// Legacy URLs where an autodiscover service for `domain` commonly lives.
pub(crate) fn legacy_domain_guesses(domain: &str) -> Vec<Uri> {
    domain_guesses(domain)
        .iter()
        .filter_map(|host| match legacy_https_url(host) {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("cannot build legacy url for {host}: {err}");
                None
            }
        })
        .collect()
}

/// Fails if a collection reports an error for the request as a whole.
fn check_collection<N: SettingName>(
    collection: &SettingsResponseCollection<N>,
) -> Result<(), AutodiscoverError> {
    match collection.error_code {
        AutodiscoverErrorCode::NoError => Ok(()),
        code => Err(AutodiscoverError::ServiceError {
            code,
            message: collection.error_message.clone(),
        }),
    }
}

/// Fails if a SOAP response reports an error for the request as a whole.
fn request_error(response: &ParsedResponse) -> Result<(), AutodiscoverError> {
    match response {
        ParsedResponse::UserSettings(collection) => check_collection(collection),
        ParsedResponse::DomainSettings(collection) => check_collection(collection),
        ParsedResponse::Legacy(_) => Ok(()),
    }
}

/// Assigns the requested identities to the responses, which are returned in the same order.
fn assign_identities<N: SettingName>(
    collection: &mut SettingsResponseCollection<N>,
    identities: &[String],
) -> Result<(), AutodiscoverError> {
    if collection.error_code == AutodiscoverErrorCode::NoError
        && collection.responses.len() != identities.len()
    {
        return Err(AutodiscoverError::InvalidResponse(
            "number of responses does not match the request",
        ));
    }
    for (response, identity) in collection.responses.iter_mut().zip(identities) {
        response.identity = identity.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use http::Uri;

    use crate::service::{domain_guesses, legacy_domain_guesses, ServiceLocator};

    #[test]
    fn test_locator_from_url() {
        let locator = ServiceLocator::from_url(Uri::from_static(
            "https://mail.example.com/autodiscover/autodiscover.svc",
        ))
        .unwrap();
        assert_eq!(locator.domain(), Some("mail.example.com"));
        assert!(locator.url().is_some());
        assert_eq!(ServiceLocator::ExplicitDomain("example.com".into()).url(), None);
    }

    #[test]
    fn test_domain_guesses() {
        assert_eq!(
            domain_guesses("example.com"),
            ["example.com".to_string(), "autodiscover.example.com".to_string()]
        );
        assert_eq!(
            legacy_domain_guesses("example.com"),
            [
                Uri::from_static("https://example.com/autodiscover/autodiscover.xml"),
                Uri::from_static("https://autodiscover.example.com/autodiscover/autodiscover.xml"),
            ]
        );
    }
}
