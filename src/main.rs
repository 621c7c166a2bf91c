mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use wgbootstrap::config::{self, ProvisionConfig};
use wgbootstrap::platform::Platform;
use wgbootstrap::provision;
use wgbootstrap::registrar::{self, linux::SystemdScope};
use wgbootstrap::runner::SystemRunner;
use wgbootstrap::tools::probe::PathProbe;

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = real_main() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let args = cli::Args::parse();
    let config = config::load_or_init(args.config.as_deref())?;
    let platform = Platform::detect();

    match args.sub.unwrap_or(cli::Cmd::Provision) {
        cli::Cmd::Provision => run_provision(&config, platform),
        cli::Cmd::Status => handle_status(&config, platform),
        cli::Cmd::Unregister => handle_unregister(&config, platform),
    }
}

fn run_provision(config: &ProvisionConfig, platform: Platform) -> Result<()> {
    let location = config.resolve_location()?;
    let scope = SystemdScope::detect()?;
    provision::run(
        config,
        &location,
        platform,
        &PathProbe,
        &SystemRunner,
        &scope,
    )
    .context("provisioning failed")?;
    Ok(())
}

/// Check whether the registered service is running.
fn handle_status(config: &ProvisionConfig, platform: Platform) -> Result<()> {
    let scope = SystemdScope::detect()?;
    match registrar::status(platform, &SystemRunner, &config.service_name, &scope) {
        Ok(true) => {
            println!("{} is running", config.service_name);
            std::process::exit(0);
        }
        Ok(false) => {
            println!("{} is stopped", config.service_name);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error checking status: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Stop the service and remove its registration.
fn handle_unregister(config: &ProvisionConfig, platform: Platform) -> Result<()> {
    let scope = SystemdScope::detect()?;
    registrar::unregister(platform, &SystemRunner, &config.service_name, &scope)
        .context("unregistration failed")?;
    println!("{} unregistered", config.service_name);
    Ok(())
}
