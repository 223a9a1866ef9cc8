// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Builder for [`AutodiscoverService`].

use std::{sync::Arc, time::Duration};

use http::Uri;

use crate::{
    auth::Credentials,
    callbacks::{default_scp_lookup, reject_all_redirects, RedirectValidator, ScpLookup},
    dns::{SrvResolver, StubSrvResolver},
    settings::ExchangeVersion,
    transport::{HyperTransport, Transport},
    AutodiscoverError, AutodiscoverService, ServiceLocator,
};

/// Plain configuration values for an [`AutodiscoverService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server version targeted by requests. Versions older than Exchange 2010 use the legacy
    /// service.
    pub requested_server_version: ExchangeVersion,
    /// Timeout for each request sent to an autodiscover service.
    pub request_timeout: Duration,
    /// Timeout for each unauthenticated probe. Should be shorter than `request_timeout`.
    pub probe_timeout: Duration,
    pub user_agent: String,
    /// Whether to query the directory for candidate endpoints.
    pub enable_scp_lookup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            requested_server_version: ExchangeVersion::default(),
            request_timeout: Duration::from_secs(100),
            probe_timeout: Duration::from_secs(20),
            user_agent: concat!("libautodiscover/", env!("CARGO_PKG_VERSION")).to_string(),
            enable_scp_lookup: true,
        }
    }
}

pub struct NeedsAuth(pub(crate) ());
pub struct Ready {
    pub(crate) credentials: Credentials,
}

/// Builder for an [`AutodiscoverService`].
///
/// Credentials are mandatory; everything else has a sensible default.
///
/// # Example
///
/// ```
/// # use libautodiscover::{AutodiscoverService, auth::Credentials};
/// let service = AutodiscoverService::builder()
///     .with_credentials(Credentials::Basic {
///         username: "jane@example.com".to_string(),
///         password: Some("secret".into()),
///     })
///     .with_domain("example.com")
///     .build();
/// assert_eq!(service.domain().as_deref(), Some("example.com"));
/// ```
pub struct ServiceBuilder<State> {
    pub(crate) state: State,
    config: Config,
    locator: ServiceLocator,
    transport: Option<Arc<dyn Transport>>,
    srv_resolver: Option<Arc<dyn SrvResolver>>,
    scp_lookup: Option<ScpLookup>,
    redirect_validator: Option<RedirectValidator>,
}

impl ServiceBuilder<NeedsAuth> {
    pub(crate) fn new() -> ServiceBuilder<NeedsAuth> {
        ServiceBuilder {
            state: NeedsAuth(()),
            config: Config::default(),
            locator: ServiceLocator::Undetermined,
            transport: None,
            srv_resolver: None,
            scp_lookup: None,
            redirect_validator: None,
        }
    }

    /// Sets the credentials used for all requests.
    pub fn with_credentials(self, credentials: Credentials) -> ServiceBuilder<Ready> {
        ServiceBuilder {
            state: Ready { credentials },
            config: self.config,
            locator: self.locator,
            transport: self.transport,
            srv_resolver: self.srv_resolver,
            scp_lookup: self.scp_lookup,
            redirect_validator: self.redirect_validator,
        }
    }
}

impl ServiceBuilder<Ready> {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_server_version(mut self, version: ExchangeVersion) -> Self {
        self.config.requested_server_version = version;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn with_scp_lookup_enabled(mut self, enabled: bool) -> Self {
        self.config.enable_scp_lookup = enabled;
        self
    }

    /// Sets the directory lookup used to find candidate endpoints.
    #[must_use]
    pub fn with_scp_lookup(mut self, lookup: ScpLookup) -> Self {
        self.scp_lookup = Some(lookup);
        self
    }

    /// Sets the callback which approves unauthenticated redirections.
    ///
    /// By default, all such redirections are rejected.
    #[must_use]
    pub fn with_redirect_validator(mut self, validator: RedirectValidator) -> Self {
        self.redirect_validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_srv_resolver(mut self, resolver: Arc<dyn SrvResolver>) -> Self {
        self.srv_resolver = Some(resolver);
        self
    }

    /// Uses a known autodiscover URL, skipping discovery.
    ///
    /// # Errors
    ///
    /// If the URL has no host.
    pub fn with_url(mut self, url: Uri) -> Result<Self, AutodiscoverError> {
        self.locator = ServiceLocator::from_url(url)?;
        Ok(self)
    }

    /// Uses a known domain, skipping directory lookups and guesses.
    #[must_use]
    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.locator = ServiceLocator::ExplicitDomain(domain.into());
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> AutodiscoverService {
        AutodiscoverService::new(
            self.config,
            self.state.credentials,
            self.locator,
            self.transport
                .unwrap_or_else(|| Arc::new(HyperTransport::new())),
            self.srv_resolver
                .unwrap_or_else(|| Arc::new(StubSrvResolver)),
            self.scp_lookup.unwrap_or_else(default_scp_lookup),
            self.redirect_validator
                .unwrap_or_else(reject_all_redirects),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Uri;

    use crate::{auth::Credentials, settings::ExchangeVersion, AutodiscoverService, Config};

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(
            config.requested_server_version,
            ExchangeVersion::Exchange2013Sp1
        );
        assert_eq!(config.request_timeout, Duration::from_secs(100));
        assert!(config.probe_timeout < config.request_timeout);
        assert!(config.enable_scp_lookup);
    }

    #[test]
    fn test_builder_with_url() {
        let service = AutodiscoverService::builder()
            .with_credentials(Credentials::None)
            .with_url(Uri::from_static(
                "https://mail.example.com/autodiscover/autodiscover.svc",
            ))
            .unwrap()
            .build();
        assert_eq!(service.domain().as_deref(), Some("mail.example.com"));
        assert!(service.url().is_some());
        assert_eq!(service.is_external(), None);

        assert!(AutodiscoverService::builder()
            .with_credentials(Credentials::None)
            .with_url(Uri::from_static("/relative/path"))
            .is_err());
    }
}
