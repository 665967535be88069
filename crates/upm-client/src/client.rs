use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::{Secrets, UpmClientError};

#[derive(Clone, Debug)]
pub struct UpmClient {
    pub(crate) registry: Arc<Url>,
    pub(crate) client: Client,
    pub(crate) secrets: Secrets,
}

impl UpmClient {
    pub fn new(registry: Url) -> Result<Self, UpmClientError> {
        Ok(Self {
            registry: Arc::new(registry),
            client: ClientBuilder::new().user_agent("upm-auth").build()?,
            secrets: Secrets::default(),
        })
    }

    /// Share a secret registry with the caller, so that anything this client
    /// learns (passwords, tokens) is masked in the caller's diagnostics too.
    pub fn with_secrets(mut self, secrets: Secrets) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn registry(&self) -> &Url {
        &self.registry
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    /// Registry URLs are used as a plain prefix: `<registry>/<path>`. Unlike
    /// `Url::join`, this keeps any path the registry URL already has.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, UpmClientError> {
        let base = self.registry.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    pub(crate) fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_keeps_registry_path() -> Result<()> {
        let client =
            UpmClient::new("https://example.com/api/npm/upm".parse().into_diagnostic()?)?;
        assert_eq!(
            client.endpoint("-/v1/search")?.as_str(),
            "https://example.com/api/npm/upm/-/v1/search"
        );
        Ok(())
    }

    #[test]
    fn endpoint_ignores_trailing_slash() -> Result<()> {
        let client = UpmClient::new("https://example.com/".parse().into_diagnostic()?)?;
        assert_eq!(
            client.endpoint("-/v1/search")?.as_str(),
            "https://example.com/-/v1/search"
        );
        Ok(())
    }
}
