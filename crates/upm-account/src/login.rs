use std::sync::Arc;

use upm_client::{Secrets, UpmClient};

use crate::error::UpmAccountError;
use crate::inputs::{AuthInputs, AuthMethod};
use crate::upmconfig::{
    HostInfo, SaveOutcome, SystemHost, UpmConfigFile, UpmRecord, DEFAULT_FILE_MODE,
};

#[derive(Clone)]
pub struct LoginOptions {
    pub secrets: Secrets,
    pub host: Arc<dyn HostInfo>,
    pub file_mode: u32,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            secrets: Secrets::default(),
            host: Arc::new(SystemHost),
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

impl LoginOptions {
    pub fn new(secrets: Secrets) -> Self {
        Self {
            secrets,
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl HostInfo + 'static) -> Self {
        self.host = Arc::new(host);
        self
    }

    pub fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }
}

/// Logs in to the registry and records the token in the UPM config file.
///
/// Inputs are resolved first, so a missing registry or credential fails
/// before any request is made. Then a token is obtained (unless one was
/// given), validated against the registry's search endpoint, and saved.
/// Any failure aborts the whole run.
pub async fn login(
    inputs: AuthInputs,
    options: &LoginOptions,
) -> Result<SaveOutcome, UpmAccountError> {
    let resolved = inputs.resolve()?;
    if let AuthMethod::Token(token) = &resolved.method {
        options.secrets.register(token);
    }
    tracing::debug!("Logging in with {:?}", resolved);

    let client = UpmClient::new(resolved.registry.clone())?.with_secrets(options.secrets.clone());
    let token = obtain_token(&client, &resolved.method).await?;
    client.validate_token(&token).await?;
    tracing::info!("Auth token for {} is valid", resolved.registry_url);

    UpmConfigFile::locate(options.host.as_ref())?
        .mode(options.file_mode)
        .save(&UpmRecord {
            registry_url: &resolved.registry_url,
            auth_token: &token,
            always_auth: resolved.always_auth,
        })
        .await
}

/// Checks a pre-issued token against the registry without writing anything.
pub async fn verify(inputs: AuthInputs, options: &LoginOptions) -> Result<(), UpmAccountError> {
    let (registry, token) = inputs.resolve_token()?;
    options.secrets.register(&token);
    let client = UpmClient::new(registry)?.with_secrets(options.secrets.clone());
    client.validate_token(&token).await?;
    tracing::info!("Auth token for {} is valid", client.registry());
    Ok(())
}

pub async fn obtain_token(
    client: &UpmClient,
    method: &AuthMethod,
) -> Result<String, UpmAccountError> {
    match method {
        AuthMethod::Token(token) => {
            tracing::debug!("Using the supplied auth token");
            Ok(token.clone())
        }
        AuthMethod::Credentials { username, password } => {
            tracing::info!("Authenticating as {username}");
            Ok(client.login_couch(username, password).await?)
        }
    }
}
