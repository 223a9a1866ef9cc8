// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Bookkeeping for redirections during a single resolution.

use std::collections::HashSet;

/// Maximum amount of redirections followed during a single call.
pub const MAX_REDIRECTION_HOPS: usize = 10;

/// The hop budget for a single call has been consumed.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("maximum amount of redirection hops ({MAX_REDIRECTION_HOPS}) exceeded")]
pub struct MaxHopsExceeded;

/// Tracks redirections followed while resolving a single request.
///
/// A fresh state is created for each call into the service and never shared.
#[derive(Debug)]
pub struct RedirectionState {
    hops: usize,
    tried_addresses: HashSet<String>,
    scp_enabled: bool,
}

impl RedirectionState {
    /// Creates a new state for resolving `address`.
    pub fn new(address: Option<&str>, scp_enabled: bool) -> RedirectionState {
        let mut tried_addresses = HashSet::new();
        if let Some(address) = address {
            tried_addresses.insert(address.to_lowercase());
        }
        RedirectionState {
            hops: 0,
            tried_addresses,
            scp_enabled,
        }
    }

    /// Records a redirection hop.
    ///
    /// # Errors
    ///
    /// If the maximum amount of hops has already been taken.
    pub fn hop(&mut self) -> Result<(), MaxHopsExceeded> {
        if self.hops >= MAX_REDIRECTION_HOPS {
            return Err(MaxHopsExceeded);
        }
        self.hops += 1;
        Ok(())
    }

    /// Records a redirection to another address, returning the lower-cased address.
    ///
    /// If the address was already tried during this call, directory lookups are disabled for the
    /// remainder of the call.
    pub fn redirect_address(&mut self, address: &str) -> String {
        let address = address.to_lowercase();
        if !self.tried_addresses.insert(address.clone()) {
            log::debug!("redirection loop detected for {address}; disabling SCP lookups");
            self.scp_enabled = false;
        }
        address
    }

    #[must_use]
    pub fn scp_enabled(&self) -> bool {
        self.scp_enabled
    }

    #[must_use]
    pub fn hops(&self) -> usize {
        self.hops
    }
}

#[cfg(test)]
mod tests {
    use crate::redirection::{MaxHopsExceeded, RedirectionState, MAX_REDIRECTION_HOPS};

    #[test]
    fn test_hop_bound() {
        let mut state = RedirectionState::new(None, true);
        for _ in 0..MAX_REDIRECTION_HOPS {
            state.hop().unwrap();
        }
        assert_eq!(state.hop(), Err(MaxHopsExceeded));
        assert_eq!(state.hops(), MAX_REDIRECTION_HOPS);
    }

    #[test]
    fn test_loop_disables_scp() {
        let mut state = RedirectionState::new(Some("A@x.com"), true);
        assert_eq!(state.redirect_address("b@x.com"), "b@x.com");
        assert!(state.scp_enabled());
        assert_eq!(state.redirect_address("a@X.COM"), "a@x.com");
        assert!(!state.scp_enabled());
    }
}
