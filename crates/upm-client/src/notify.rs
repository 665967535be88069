use reqwest::Response;

/// Surfaces registry notices (the `npm-notice` header) in the log.
pub(crate) trait Notify {
    fn notify(self) -> Self;
}

impl Notify for Response {
    fn notify(self) -> Self {
        if let Some(notice) = self
            .headers()
            .get("npm-notice")
            .and_then(|notice| notice.to_str().ok())
        {
            tracing::info!("registry notice: {notice}");
        }
        self
    }
}
