// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use http::Uri;
use libautodiscover::{
    auth::Credentials,
    settings::{DomainSettingName, ExchangeVersion, UserSettingName},
    AutodiscoverService,
};

/// Environment variable holding the password (or OAuth token).
const PASSWORD_VAR: &str = "ADCLI_PASSWORD";

#[derive(Clone, ValueEnum)]
enum Verbosity {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub(crate) enum AuthMethod {
    None,
    #[default]
    Basic,
    #[value(name = "oauth")]
    OAuth,
}

#[derive(Args)]
pub(crate) struct ServiceDetails {
    /// Known URL of the autodiscover service. Skips discovery.
    ///
    /// Example: `https://mail.example.com/autodiscover/autodiscover.svc`.
    #[arg(long, conflicts_with = "domain")]
    pub(crate) url: Option<Uri>,

    /// Only look for the autodiscover service at this domain.
    #[arg(long)]
    pub(crate) domain: Option<String>,

    /// Server version to request (e.g.: `Exchange2010_SP2`).
    ///
    /// Versions older than `Exchange2010` use the legacy service.
    #[arg(long, default_value_t = ExchangeVersion::default())]
    pub(crate) server_version: ExchangeVersion,

    /// Authentication method. The password or token is read from `ADCLI_PASSWORD`.
    #[arg(long, value_enum, default_value_t)]
    pub(crate) auth: AuthMethod,

    /// Username for basic authentication.
    #[arg(long, required_if_eq("auth", "basic"))]
    pub(crate) username: Option<String>,

    /// Follow unauthenticated redirections without asking.
    #[arg(long)]
    pub(crate) accept_redirects: bool,

    /// Do not query the directory for candidate endpoints.
    #[arg(long)]
    pub(crate) no_scp: bool,
}

impl ServiceDetails {
    fn credentials(&self) -> anyhow::Result<Credentials> {
        Ok(match self.auth {
            AuthMethod::None => Credentials::None,
            AuthMethod::Basic => Credentials::Basic {
                username: self.username.clone().context("username is required")?,
                password: std::env::var(PASSWORD_VAR).ok().map(Into::into),
            },
            AuthMethod::OAuth => Credentials::OAuth {
                token: std::env::var(PASSWORD_VAR)
                    .context("failed to determine oauth token")?
                    .into(),
            },
        })
    }

    pub(crate) fn build_service(&self) -> anyhow::Result<AutodiscoverService> {
        let mut builder = AutodiscoverService::builder()
            .with_credentials(self.credentials()?)
            .with_server_version(self.server_version)
            .with_scp_lookup_enabled(!self.no_scp);
        if self.accept_redirects {
            builder = builder.with_redirect_validator(Arc::new(|url: &str| {
                log::info!("Following redirection to {url}");
                true
            }));
        }
        if let Some(url) = &self.url {
            builder = builder.with_url(url.clone())?;
        } else if let Some(domain) = &self.domain {
            builder = builder.with_domain(domain.as_str());
        }
        Ok(builder.build())
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Retrieve settings for a single user.
    UserSettings {
        email: String,

        /// Setting to request. May be repeated.
        #[arg(long = "setting", default_values_t = [
            UserSettingName::UserDisplayName,
            UserSettingName::InternalEwsUrl,
            UserSettingName::ExternalEwsUrl,
        ])]
        settings: Vec<UserSettingName>,
    },
    /// Retrieve settings for one or more domains.
    DomainSettings {
        #[arg(required = true)]
        domains: Vec<String>,

        /// Setting to request. May be repeated.
        #[arg(long = "setting", default_values_t = [
            DomainSettingName::ExternalEwsUrl,
            DomainSettingName::ExternalEwsVersion,
        ])]
        settings: Vec<DomainSettingName>,
    },
}

#[derive(Parser)]
#[clap(author, version = env!("ADCLI_VERSION"), about, long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) service: ServiceDetails,

    #[command(subcommand)]
    pub(crate) command: Command,

    /// Change logging verbosity
    #[clap(short, long)]
    verbose: Option<Verbosity>,
}

impl Cli {
    /// Returns the desired log level. The default log level is WARN.
    pub(crate) fn log_level(&self) -> log::Level {
        match self.verbose {
            Some(Verbosity::Error) => log::Level::Error,
            Some(Verbosity::Warn) => log::Level::Warn,
            Some(Verbosity::Info) => log::Level::Info,
            Some(Verbosity::Debug) => log::Level::Debug,
            Some(Verbosity::Trace) => log::Level::Trace,
            None => log::Level::Warn,
        }
    }
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert()
}
