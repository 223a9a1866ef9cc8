// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

use clap::Parser;
use libautodiscover::{
    settings::{SettingName, SettingsResponse},
    AutodiscoverService,
};

mod cli;

fn print_response<N: SettingName>(response: &SettingsResponse<N>) {
    println!("{} ({})", response.identity, response.error_code);
    if let Some(message) = &response.error_message {
        println!("  Message: {message}");
    }
    if let Some(target) = &response.redirect_target {
        println!("  Redirect target: {target}");
    }
    for (name, value) in &response.settings {
        println!("  {name}: {value}");
    }
    for error in &response.setting_errors {
        println!("  {} unavailable: {}", error.setting_name, error.error_code);
    }
}

fn print_service(service: &AutodiscoverService) {
    if let Some(url) = service.url() {
        println!("Autodiscover URL: {url}");
    }
    if let Some(external) = service.is_external() {
        println!("Located externally: {external}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    simple_logger::init_with_level(cli.log_level()).expect("logger configuration is valid");

    let service = cli.service.build_service()?;

    match cli.command {
        cli::Command::UserSettings { email, settings } => {
            let response = service.get_user_settings(&email, &settings).await?;
            print_response(&response);
        }
        cli::Command::DomainSettings { domains, settings } => {
            let collection = service.get_domain_settings(&domains, None, &settings).await?;
            if let Some(message) = &collection.error_message {
                log::warn!("Service reported: {message}");
            }
            for response in &collection.responses {
                print_response(response);
            }
        }
    }
    print_service(&service);

    Ok(())
}
