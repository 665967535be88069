use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::Value;

use crate::notify::Notify;
use crate::{UpmClient, UpmClientError};

impl UpmClient {
    /// Checks that `token` is usable by running an authenticated search
    /// (`GET <registry>/-/v1/search`).
    ///
    /// The token is rejected when the response carries a truthy `error` field
    /// (`null`, `false`, `0` and `""` count as no error), when
    /// the body is not JSON, or when the status is a 4xx/5xx.
    pub async fn validate_token(&self, token: &str) -> Result<(), UpmClientError> {
        self.secrets.register(token);

        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))?;
        authorization.set_sensitive(true);

        let url = self.endpoint("-/v1/search")?;
        tracing::debug!("Validating auth token against {url}");

        let response = self
            .client
            .get(url)
            .headers(Self::json_headers())
            .header(AUTHORIZATION, authorization)
            .send()
            .await?
            .notify();
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("{}", self.secrets.redact(&text));

        let json = serde_json::from_str::<Value>(&text).map_err(|_| {
            UpmClientError::TokenValidationError {
                message: self
                    .secrets
                    .redact(&format!("registry responded with {status}: {text}")),
            }
        })?;

        if let Some(error) = json.get("error").filter(|error| is_truthy(error)) {
            return Err(UpmClientError::TokenValidationError {
                message: self
                    .secrets
                    .redact(&describe_error(error, json.get("reason"))),
            });
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(UpmClientError::TokenValidationError {
                message: format!("registry responded with {status}"),
            });
        }

        Ok(())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(value) => *value,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(value) => !value.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn describe_error(error: &Value, reason: Option<&Value>) -> String {
    let error = match error {
        Value::String(error) => error.clone(),
        other => other.to_string(),
    };
    match reason.and_then(Value::as_str) {
        Some(reason) if !reason.is_empty() => format!("{error}: {reason}"),
        _ => error,
    }
}
