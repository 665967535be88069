use std::fmt::Debug;

use async_trait::async_trait;
use clap::Args;
use miette::Result;
use upm_account::inputs::AuthInputs;
use upm_account::login::{login, LoginOptions};
use upm_account::upmconfig::{SaveOutcome, DEFAULT_FILE_MODE};
use upm_client::Secrets;
use upm_config::{from_command_line, layer_value, lookup, ArgMatches, UpmConfig, UpmConfigLayer};

use crate::commands::UpmCommand;
use crate::error::UpmAuthError;

/// Log in to a registry and record the token in ~/.upmconfig.toml.
#[derive(Args)]
pub struct LoginCmd {
    /// Base URL of the package registry.
    #[arg(long)]
    registry_url: Option<String>,

    /// Pre-issued auth token. When given, no username/password exchange
    /// happens.
    #[arg(long)]
    auth_token: Option<String>,

    /// Registry username. Required when no auth token is given.
    #[arg(long)]
    username: Option<String>,

    /// Registry password. Required when no auth token is given.
    #[arg(long)]
    password: Option<String>,

    /// Have the package manager send credentials on every request to this
    /// registry.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    always_auth: Option<String>,

    /// Permissions for ~/.upmconfig.toml on non-Windows platforms, in octal.
    #[arg(long, default_value = "666", value_parser = parse_file_mode)]
    file_mode: u32,

    #[arg(skip)]
    pub(crate) secrets: Secrets,
}

impl Debug for LoginCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCmd")
            .field("registry_url", &self.registry_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("always_auth", &self.always_auth)
            .field("file_mode", &format_args!("{:o}", self.file_mode))
            .finish()
    }
}

#[async_trait]
impl UpmCommand for LoginCmd {
    async fn execute(self) -> Result<()> {
        let inputs = AuthInputs {
            registry_url: self.registry_url,
            auth_token: self.auth_token,
            username: self.username,
            password: self.password,
            always_auth: self.always_auth,
        };
        let options = LoginOptions::new(self.secrets).file_mode(self.file_mode);
        match login(inputs, &options).await? {
            SaveOutcome::Appended => tracing::info!("Saved auth token"),
            SaveOutcome::AlreadyPresent => {
                tracing::info!("Registry already configured, leaving the config file as it is")
            }
        }
        Ok(())
    }
}

impl UpmConfigLayer for LoginCmd {
    fn layer_config(&mut self, matches: &ArgMatches, config: &UpmConfig) -> Result<()> {
        let cmd = "login";
        layer_value(
            &mut self.registry_url,
            matches,
            "registry_url",
            config,
            cmd,
            &["registry_url"],
        );
        layer_value(
            &mut self.auth_token,
            matches,
            "auth_token",
            config,
            cmd,
            &["auth_token"],
        );
        layer_value(&mut self.username, matches, "username", config, cmd, &["username"]);
        layer_value(&mut self.password, matches, "password", config, cmd, &["password"]);
        layer_value(
            &mut self.always_auth,
            matches,
            "always_auth",
            config,
            cmd,
            &["always_auth", "alwaysauth"],
        );
        if !from_command_line(matches, "file_mode") {
            if let Some(mode) = lookup(config, cmd, &["file_mode"]) {
                self.file_mode = parse_file_mode(&mode)?;
            }
        }
        Ok(())
    }
}

fn parse_file_mode(mode: &str) -> Result<u32, UpmAuthError> {
    let digits = mode.trim().trim_start_matches("0o");
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| UpmAuthError::InvalidFileMode(mode.to_owned()))
}

impl Default for LoginCmd {
    fn default() -> Self {
        Self {
            registry_url: None,
            auth_token: None,
            username: None,
            password: None,
            always_auth: None,
            file_mode: DEFAULT_FILE_MODE,
            secrets: Secrets::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::{CommandFactory, FromArgMatches};
    use pretty_assertions::assert_eq;

    #[test]
    fn file_modes() {
        assert_eq!(parse_file_mode("666").unwrap(), 0o666);
        assert_eq!(parse_file_mode("0600").unwrap(), 0o600);
        assert_eq!(parse_file_mode("0o644").unwrap(), 0o644);
        assert!(parse_file_mode("rw-rw-rw-").is_err());
        assert!(parse_file_mode("17777").is_err());
    }

    #[test]
    fn debug_masks_secrets() {
        let cmd = LoginCmd {
            auth_token: Some("XXXXXX".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let debug = format!("{cmd:?}");
        assert!(!debug.contains("XXXXXX"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn always_auth_flag_without_value() {
        #[derive(clap::Parser)]
        struct Wrapper {
            #[command(flatten)]
            login: LoginCmd,
        }
        let matches = Wrapper::command()
            .try_get_matches_from(["login", "--always-auth", "--registry-url", "https://a.example.com"])
            .unwrap();
        let wrapper = Wrapper::from_arg_matches(&matches).unwrap();
        assert_eq!(wrapper.login.always_auth.as_deref(), Some("true"));
        assert_eq!(wrapper.login.file_mode, 0o666);
    }
}
