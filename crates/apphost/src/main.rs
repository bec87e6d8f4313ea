mod cli;
mod greeting;
mod settings;
mod startup;

use std::error::Error as StdError;
use std::path::PathBuf;
use std::process::ExitCode;

use apphost_core::http::HttpClientFactory;
use apphost_core::{globals, Host, HostBuilder};
use clap::Parser;

use crate::settings::Settings;
use crate::startup::DemoStartup;

/// Apphost: runs the console session under the application host
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Build the host, validate settings, print a summary and exit
    #[arg(long)]
    check_config: bool,

    /// Directory holding HostSettings.json and AppSettings*.json (defaults to the executable's directory)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Configuration overrides, e.g. Application:Timeout=60 or --Application:Title=Demo
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "OVERRIDES")]
    overrides: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let overrides = args.overrides.clone();
    let config_dir = args.config_dir.clone();
    let installed = globals::install(move || {
        let mut builder = HostBuilder::new().args(overrides.clone());
        if let Some(dir) = &config_dir {
            builder = builder.base_path(dir.clone());
        }
        builder.startup(DemoStartup).build()
    });
    if let Err(e) = installed {
        report("Failed to install host", &e);
        return ExitCode::FAILURE;
    }

    let host = match globals::host() {
        Ok(host) => host,
        Err(e) => {
            report("Failed to build host", &e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        return check_config(host);
    }

    match host.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report("Host failed", &e);
            ExitCode::FAILURE
        }
    }
}

/// Print the host summary after validating every registered service check.
fn check_config(host: &Host) -> ExitCode {
    if let Err(e) = host.services().validate() {
        report("Configuration check failed", &e);
        return ExitCode::FAILURE;
    }
    let settings = match globals::settings::<Settings>() {
        Ok(settings) => settings,
        Err(e) => {
            report("Configuration check failed", &e);
            return ExitCode::FAILURE;
        }
    };

    let environment = host.environment();
    println!("Environment: {}", environment.environment_name());
    println!("Application: {}", environment.application_name());
    println!("Content root: {}", environment.content_root().display());
    println!("Configuration keys: {}", host.configuration().len());
    println!("Title: {}", settings.title);
    println!("Timeout: {}s", settings.timeout);
    if let Some(factory) = host.services().get::<HttpClientFactory>() {
        println!("HTTP profiles: {}", factory.profile_names().join(", "));
    }
    println!("Configuration OK");
    ExitCode::SUCCESS
}

fn report(context: &str, err: &dyn StdError) {
    eprintln!("Fatal: {}: {}", context, err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}
