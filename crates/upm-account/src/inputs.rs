use std::fmt::Debug;

use url::Url;

use crate::error::UpmAccountError;

/// Raw step inputs, as handed over by the invoking environment. Empty strings
/// count as absent.
#[derive(Clone, Default)]
pub struct AuthInputs {
    pub registry_url: Option<String>,
    pub auth_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub always_auth: Option<String>,
}

impl Debug for AuthInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInputs")
            .field("registry_url", &self.registry_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("always_auth", &self.always_auth)
            .finish()
    }
}

/// How the token for the registry is obtained.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// A pre-issued token, used as-is.
    Token(String),
    /// Credentials to exchange for a token.
    Credentials { username: String, password: String },
}

impl Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Credentials { username, .. } => {
                f.write_fmt(format_args!("Credentials(username={username},password=***)"))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedInputs {
    /// The registry URL exactly as given. This is what gets written to the
    /// config file.
    pub registry_url: String,
    pub registry: Url,
    pub method: AuthMethod,
    pub always_auth: bool,
}

impl AuthInputs {
    /// Validates the inputs for a full login. Nothing here touches the
    /// network.
    pub fn resolve(self) -> Result<ResolvedInputs, UpmAccountError> {
        let (registry_url, registry) = Self::registry(self.registry_url)?;
        let method = match present(self.auth_token) {
            Some(token) => AuthMethod::Token(token),
            None => AuthMethod::Credentials {
                username: present(self.username)
                    .ok_or(UpmAccountError::MissingInputError("username"))?,
                password: present(self.password)
                    .ok_or(UpmAccountError::MissingInputError("password"))?,
            },
        };
        let always_auth = parse_bool("always-auth", self.always_auth)?;
        Ok(ResolvedInputs {
            registry_url,
            registry,
            method,
            always_auth,
        })
    }

    /// Validates the inputs needed to check an existing token: a registry
    /// and the token itself.
    pub fn resolve_token(self) -> Result<(Url, String), UpmAccountError> {
        let (_, registry) = Self::registry(self.registry_url)?;
        let token =
            present(self.auth_token).ok_or(UpmAccountError::MissingInputError("auth-token"))?;
        Ok((registry, token))
    }

    fn registry(registry_url: Option<String>) -> Result<(String, Url), UpmAccountError> {
        let registry_url =
            present(registry_url).ok_or(UpmAccountError::MissingInputError("registry-url"))?;
        let invalid = || UpmAccountError::InvalidInputError {
            name: "registry-url",
            value: registry_url.clone(),
        };
        // Written verbatim into a quoted value in the UPM config file.
        if registry_url.contains(['"', '\\']) {
            return Err(invalid());
        }
        let registry = Url::parse(&registry_url).map_err(|_| invalid())?;
        Ok((registry_url, registry))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_bool(name: &'static str, value: Option<String>) -> Result<bool, UpmAccountError> {
    match present(value) {
        None => Ok(false),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(UpmAccountError::InvalidInputError { name, value }),
        },
    }
}
