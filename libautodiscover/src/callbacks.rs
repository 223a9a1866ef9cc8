// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Hooks through which callers take part in discovery.

use std::sync::Arc;

/// Looks up autodiscover URLs for a domain in a directory service (Active Directory SCP records).
///
/// Returns URLs in the order in which they should be tried.
pub type ScpLookup = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Decides whether an unauthenticated redirection to a URL may be followed.
///
/// Unauthenticated redirections can be forged by anyone between the client and the server, so
/// they are only followed with the caller's approval.
pub type RedirectValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Directory lookup used when none is configured.
///
/// No directory service is reachable from this library, so this yields no URLs.
#[must_use]
pub fn default_scp_lookup() -> ScpLookup {
    Arc::new(|domain| {
        log::debug!("no directory lookup configured; no SCP candidates for {domain}");
        Vec::new()
    })
}

/// Redirect validator used when none is configured: rejects every redirection.
#[must_use]
pub fn reject_all_redirects() -> RedirectValidator {
    Arc::new(|url| {
        log::debug!("rejecting unauthenticated redirection to {url}");
        false
    })
}

#[cfg(test)]
mod tests {
    use crate::callbacks::{default_scp_lookup, reject_all_redirects};

    #[test]
    fn test_defaults() {
        assert!(default_scp_lookup()("example.com").is_empty());
        assert!(!reject_all_redirects()(
            "https://mail.example.com/autodiscover/autodiscover.xml"
        ));
    }
}
