//! `upm-auth` logs a build agent in to a package registry and records the
//! resulting token in `~/.upmconfig.toml`, where the package manager picks it
//! up in later steps.
//!
//! ```text
//! upm-auth login --registry-url https://registry.example.com --username ci --password ...
//! upm-auth login --registry-url https://registry.example.com --auth-token ...
//! upm-auth verify --registry-url https://registry.example.com --auth-token ...
//! ```
//!
//! Every flag can also be given as a CI step input (`INPUT_REGISTRY-URL`,
//! ...), as a `UPM_AUTH_*` environment variable, or in a TOML config file.

use std::path::PathBuf;

use async_trait::async_trait;
use clap::{ArgMatches, CommandFactory, FromArgMatches as _, Parser, Subcommand};
use directories::ProjectDirs;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};
use upm_client::Secrets;
use upm_config::{UpmConfig, UpmConfigLayer, UpmConfigOptions};

use commands::login::LoginCmd;
use commands::verify::VerifyCmd;
use commands::UpmCommand;
use logging::RedactingMakeWriter;

mod commands;
mod error;
mod logging;

pub use error::UpmAuthError;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct UpmAuth {
    /// File to read configuration values from.
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Log output level/directive. Supports plain loglevels (off, error,
    /// warn, info, debug, trace) as well as more advanced directives in the
    /// format `target[span{field=value}]=level`.
    #[arg(global = true, long, default_value = "warn")]
    loglevel: String,

    /// Disable all output
    #[arg(global = true, long, short)]
    quiet: bool,

    #[command(subcommand)]
    subcommand: UpmCmd,
}

impl UpmAuth {
    fn setup_logging(&self, secrets: &Secrets) -> Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(RedactingMakeWriter::stderr(secrets.clone())))
            .with(
                EnvFilter::builder()
                    .with_default_directive(if self.quiet {
                        LevelFilter::OFF.into()
                    } else {
                        self.loglevel.parse().into_diagnostic()?
                    })
                    .from_env_lossy(),
            )
            .init();
        Ok(())
    }

    pub async fn load() -> Result<()> {
        let start = std::time::Instant::now();
        let matches = UpmAuth::command().get_matches();
        let mut upm = UpmAuth::from_arg_matches(&matches).into_diagnostic()?;
        let cfg = UpmConfigOptions::new()
            .config_file(upm.config.clone().or_else(|| {
                ProjectDirs::from("", "", "upm-auth")
                    .map(|d| d.config_dir().to_owned().join("upm-auth.toml"))
            }))
            .load()?;
        upm.layer_config(&matches, &cfg)?;

        let secrets = Secrets::new()
            .with_workflow_commands(std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true"));
        upm.setup_logging(&secrets)?;
        upm.subcommand.share_secrets(&secrets);

        upm.execute().await?;
        tracing::info!("Ran in {}s", start.elapsed().as_millis() as f32 / 1000.0);
        Ok(())
    }
}

#[derive(Debug, Subcommand)]
pub enum UpmCmd {
    /// Log in to a registry and record the token in ~/.upmconfig.toml.
    Login(LoginCmd),

    /// Check that an auth token is accepted by a registry.
    Verify(VerifyCmd),
}

impl UpmCmd {
    fn share_secrets(&mut self, secrets: &Secrets) {
        match self {
            UpmCmd::Login(login) => login.secrets = secrets.clone(),
            UpmCmd::Verify(verify) => verify.secrets = secrets.clone(),
        }
    }
}

#[async_trait]
impl UpmCommand for UpmAuth {
    async fn execute(self) -> Result<()> {
        tracing::debug!("Running command: {:#?}", self.subcommand);
        match self.subcommand {
            UpmCmd::Login(login) => login.execute().await,
            UpmCmd::Verify(verify) => verify.execute().await,
        }
    }
}

impl UpmConfigLayer for UpmAuth {
    fn layer_config(&mut self, args: &ArgMatches, conf: &UpmConfig) -> Result<()> {
        match self.subcommand {
            UpmCmd::Login(ref mut login) => {
                if let Some(matches) = args.subcommand_matches("login") {
                    login.layer_config(matches, conf)?;
                }
            }
            UpmCmd::Verify(ref mut verify) => {
                if let Some(matches) = args.subcommand_matches("verify") {
                    verify.layer_config(matches, conf)?;
                }
            }
        }
        Ok(())
    }
}
