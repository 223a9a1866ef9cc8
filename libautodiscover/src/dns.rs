// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Helpers for DNS-based discovery.

use std::cmp::Ordering;
use std::io;

use async_trait::async_trait;
use domain::base::name::LongChainError;
use domain::base::octets::ParseError;
use domain::base::ToRelativeDname;
use domain::{
    base::{Dname, Question, RelativeDname, Rtype},
    rdata::Srv,
    resolv::StubResolver,
};

/// Port on which autodiscover services are expected. Records for other ports are ignored.
pub const AUTODISCOVER_PORT: u16 = 443;

/// Error returned when resolving SRV records.
#[derive(thiserror::Error, Debug)]
pub enum DnsError {
    #[error("I/O error performing DNS request")]
    Network(#[from] io::Error),

    #[error("the input is not a valid domain name")]
    InvalidDomain,

    #[error("the domain name is too long and cannot be queried")]
    DomainTooLong(#[from] LongChainError),

    #[error("error parsing DNS response")]
    ParseError(#[from] ParseError),
}

/// Resolves the host of an autodiscover service for a domain.
#[async_trait]
pub trait SrvResolver: Send + Sync {
    /// Returns the preferred host for `domain`, or `None` if no usable record exists.
    async fn autodiscover_host(&self, domain: &str) -> Result<Option<String>, DnsError>;
}

/// Resolves `_autodiscover._tcp` records using the system's stub resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubSrvResolver;

/// The relevant fields of an SRV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

fn relative_domain() -> &'static RelativeDname<[u8]> {
    RelativeDname::from_slice(b"\x0d_autodiscover\x04_tcp")
        .expect("well known relative prefix is valid")
}

/// Queries SRV records for the autodiscover service of `domain`.
///
/// # Errors
///
/// If the DNS request fails, or the response cannot be parsed.
pub async fn query_srv_records(domain: &str) -> Result<Vec<SrvRecord>, DnsError> {
    let dname = Dname::bytes_from_str(domain).map_err(|_| DnsError::InvalidDomain)?;
    let full_domain = relative_domain().chain(&dname)?;
    let question = Question::new_in(full_domain, Rtype::Srv);

    let response = StubResolver::new().query(question).await?;
    let mut records = Vec::new();
    for record in response.answer()? {
        let Some(parsed) = record?.into_record::<Srv<_>>()? else { continue };
        let srv = parsed.data();
        records.push(SrvRecord {
            priority: srv.priority(),
            weight: srv.weight(),
            port: srv.port(),
            target: srv.target().to_string(),
        });
    }
    Ok(records)
}

/// Picks the host to use out of a set of SRV records.
///
/// Only records for [`AUTODISCOVER_PORT`] are considered. Of those, the lowest priority wins, and
/// within equal priorities the highest weight. Ties keep the order in which records were
/// returned, so the choice is deterministic.
#[must_use]
pub fn select_srv_target(records: &[SrvRecord]) -> Option<String> {
    let mut candidates: Vec<_> = records
        .iter()
        .filter(|r| r.port == AUTODISCOVER_PORT)
        .filter(|r| !r.target.is_empty() && r.target != ".")
        .collect();

    candidates.sort_by(|s1, s2| {
        match s1.priority.cmp(&s2.priority) {
            Ordering::Less => Ordering::Less,
            Ordering::Equal => s2.weight.cmp(&s1.weight), // Hint: in reverse order!
            Ordering::Greater => Ordering::Greater,
        }
    });

    candidates
        .first()
        .map(|r| r.target.trim_end_matches('.').to_string())
}

#[async_trait]
impl SrvResolver for StubSrvResolver {
    async fn autodiscover_host(&self, domain: &str) -> Result<Option<String>, DnsError> {
        let records = query_srv_records(domain).await?;
        log::debug!("SRV records for {domain}: {records:?}");
        Ok(select_srv_target(&records))
    }
}

#[cfg(test)]
mod tests {
    use crate::dns::{select_srv_target, SrvRecord};

    fn record(priority: u16, weight: u16, port: u16, target: &str) -> SrvRecord {
        SrvRecord {
            priority,
            weight,
            port,
            target: target.to_string(),
        }
    }

    #[test]
    fn test_select_srv_target() {
        let records = [
            record(0, 0, 80, "plain.example.com."),
            record(10, 5, 443, "backup.example.com."),
            record(5, 10, 443, "low-weight.example.com."),
            record(5, 20, 443, "high-weight.example.com."),
            record(5, 20, 443, "second.example.com."),
        ];
        assert_eq!(
            select_srv_target(&records).as_deref(),
            Some("high-weight.example.com")
        );
    }

    #[test]
    fn test_select_srv_target_none() {
        assert_eq!(select_srv_target(&[]), None);
        assert_eq!(select_srv_target(&[record(0, 0, 8443, "x.example.com.")]), None);
        assert_eq!(select_srv_target(&[record(0, 0, 443, ".")]), None);
    }
}
