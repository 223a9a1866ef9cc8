// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

use std::process::Command;

/// Version reported by `adcli --version`: `git describe` output, or the crate version when
/// building outside of a git checkout.
fn describe_version() -> String {
    let crate_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    match Command::new("git").args(["describe", "--tags"]).output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_owned()
        }
        Ok(_) => format!("{crate_version}-unversioned"),
        Err(_) => crate_version,
    }
}

fn main() {
    println!("cargo:rerun-if-env-changed=ADCLI_VERSION");
    if std::env::var("ADCLI_VERSION").is_err() {
        println!("cargo:rustc-env=ADCLI_VERSION={}", describe_version());
    }
}
