use std::fmt::Debug;

use async_trait::async_trait;
use clap::Args;
use miette::Result;
use upm_account::inputs::AuthInputs;
use upm_account::login::{verify, LoginOptions};
use upm_client::Secrets;
use upm_config::{layer_value, ArgMatches, UpmConfig, UpmConfigLayer};

use crate::commands::UpmCommand;

/// Check that an auth token is accepted by a registry. Nothing is written.
#[derive(Args)]
pub struct VerifyCmd {
    /// Base URL of the package registry.
    #[arg(long)]
    registry_url: Option<String>,

    /// Auth token to check.
    #[arg(long)]
    auth_token: Option<String>,

    #[arg(skip)]
    pub(crate) secrets: Secrets,
}

impl Debug for VerifyCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyCmd")
            .field("registry_url", &self.registry_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[async_trait]
impl UpmCommand for VerifyCmd {
    async fn execute(self) -> Result<()> {
        let inputs = AuthInputs {
            registry_url: self.registry_url,
            auth_token: self.auth_token,
            ..Default::default()
        };
        verify(inputs, &LoginOptions::new(self.secrets)).await?;
        Ok(())
    }
}

impl UpmConfigLayer for VerifyCmd {
    fn layer_config(&mut self, matches: &ArgMatches, config: &UpmConfig) -> Result<()> {
        layer_value(
            &mut self.registry_url,
            matches,
            "registry_url",
            config,
            "verify",
            &["registry_url"],
        );
        layer_value(
            &mut self.auth_token,
            matches,
            "auth_token",
            config,
            "verify",
            &["auth_token"],
        );
        Ok(())
    }
}
