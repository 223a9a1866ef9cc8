// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Discovery via the legacy (POX) service.

use http::Uri;

use crate::{
    endpoints::{domain_from_email, legacy_https_url, with_legacy_path},
    pox::{DiscoveryResponse, LegacyError, OutlookSettings},
    redirection::RedirectionState,
    request::AutodiscoverRequest,
    service::{legacy_domain_guesses, Candidate, CandidateOrigin},
    settings::{GetUserSettingsResponse, UserSettingName},
    AutodiscoverError, AutodiscoverService, ServiceLocator,
};

/// Failures seen while resolving a single address.
#[derive(Default)]
struct Failures {
    /// Only the first error from a directory-provided candidate is kept.
    scp_error: Option<LegacyError>,
    last_error: Option<AutodiscoverError>,
}

/// Result of trying a list of legacy candidates.
enum LegacyStep {
    Found(OutlookSettings),
    /// Start over with another address.
    Restart(String),
    Exhausted,
}

impl AutodiscoverService {
    pub(crate) async fn legacy_get_user_settings(
        &self,
        email: &str,
        settings: &[UserSettingName],
    ) -> Result<GetUserSettingsResponse, AutodiscoverError> {
        let url = match self.locator() {
            ServiceLocator::ExplicitUrl { url, .. } => with_legacy_path(&url)?,
            ServiceLocator::ExplicitDomain(domain) => legacy_https_url(&domain)?,
            ServiceLocator::Undetermined => {
                let outlook = self.legacy_discover(email).await?;
                return Ok(DiscoveryResponse::Success(outlook)
                    .into_user_settings_response(email, settings));
            }
        };

        let request = AutodiscoverRequest::LegacyPox { email };
        let response: DiscoveryResponse<OutlookSettings> =
            self.call(&request, &url).await?.try_into()?;
        Ok(response.into_user_settings_response(email, settings))
    }

    /// Finds a legacy service for `email` and returns its settings.
    async fn legacy_discover(&self, email: &str) -> Result<OutlookSettings, AutodiscoverError> {
        let mut state = RedirectionState::new(Some(email), self.config.enable_scp_lookup);
        let mut email = email.to_string();

        'restart: loop {
            let mut failures = Failures::default();
            let domain = domain_from_email(&email)?;

            let mut candidates = Vec::new();
            if state.scp_enabled() {
                for raw in (self.scp_lookup)(&domain) {
                    match raw.parse::<Uri>() {
                        Ok(url) => candidates.push(Candidate {
                            target: url,
                            origin: CandidateOrigin::Scp,
                        }),
                        Err(err) => log::warn!("ignoring invalid SCP url {raw}: {err}"),
                    }
                }
            }
            candidates.extend(legacy_domain_guesses(&domain).into_iter().map(|url| Candidate {
                target: url,
                origin: CandidateOrigin::DomainGuess,
            }));

            match self
                .try_legacy_candidates(&email, candidates, &mut state, &mut failures)
                .await?
            {
                LegacyStep::Found(settings) => return Ok(settings),
                LegacyStep::Restart(address) => {
                    email = address;
                    continue 'restart;
                }
                LegacyStep::Exhausted => {}
            }

            // Last resorts. Unauthenticated answers are only trusted if the caller approves them.
            for origin in [CandidateOrigin::HttpRedirect, CandidateOrigin::DnsSrv] {
                let url = if origin == CandidateOrigin::HttpRedirect {
                    let request = AutodiscoverRequest::LegacyPox { email: &email };
                    self.redirect_probe(&domain, &request).await
                } else {
                    self.srv_candidate(&domain).await
                };
                let Some(url) = url else { continue };
                let candidates = vec![Candidate {
                    target: url,
                    origin,
                }];
                match self
                    .try_legacy_candidates(&email, candidates, &mut state, &mut failures)
                    .await?
                {
                    LegacyStep::Found(settings) => return Ok(settings),
                    LegacyStep::Restart(address) => {
                        email = address;
                        continue 'restart;
                    }
                    LegacyStep::Exhausted => {}
                }
            }

            return Err(match failures.scp_error {
                Some(err) => AutodiscoverError::ScpEndpointError(err),
                None => AutodiscoverError::not_located(failures.last_error),
            });
        }
    }

    /// Tries each candidate in turn, following redirections.
    ///
    /// Errors from directory-provided candidates are recorded in `failures` and the next candidate
    /// is tried.
    async fn try_legacy_candidates(
        &self,
        email: &str,
        mut candidates: Vec<Candidate<Uri>>,
        state: &mut RedirectionState,
        failures: &mut Failures,
    ) -> Result<LegacyStep, AutodiscoverError> {
        let request = AutodiscoverRequest::LegacyPox { email };
        let mut index = 0;
        while let Some(candidate) = candidates.get(index) {
            let is_scp = candidate.origin == CandidateOrigin::Scp;
            let response = match self.call(&request, &candidate.target).await {
                Ok(response) => DiscoveryResponse::<OutlookSettings>::try_from(response)?,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    log::debug!("legacy candidate {} failed: {err}", candidate.target);
                    failures.last_error = Some(err);
                    index += 1;
                    continue;
                }
            };

            match response {
                DiscoveryResponse::Success(settings) => {
                    self.set_is_external(!is_scp);
                    return Ok(LegacyStep::Found(settings));
                }
                DiscoveryResponse::RedirectUrl(target) => {
                    state.hop()?;
                    match target.parse::<Uri>() {
                        Ok(url) => {
                            log::debug!("{} redirected to {url}", candidate.target);
                            candidates[index].target = url;
                        }
                        Err(err) => {
                            log::debug!("ignoring invalid redirection to {target}: {err}");
                            index += 1;
                        }
                    }
                }
                DiscoveryResponse::RedirectAddress(target) => {
                    state.hop()?;
                    let address = state.redirect_address(&target);
                    log::debug!("redirected to address {address}");
                    return Ok(LegacyStep::Restart(address));
                }
                DiscoveryResponse::Error(err) if is_scp => {
                    log::debug!("SCP candidate {} failed: {err}", candidate.target);
                    failures.scp_error.get_or_insert(err);
                    index += 1;
                }
                DiscoveryResponse::Error(err) => {
                    return Err(AutodiscoverError::LegacyService(err));
                }
            }
        }
        Ok(LegacyStep::Exhausted)
    }
}
