use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

const MASK: &str = "***";

/// Values that must never show up in diagnostic output.
///
/// Anything that produces a sensitive value (a password, an encoded Basic
/// header, a token) calls [`Secrets::register`] right away. Anything that
/// emits text derived from untrusted sources, such as log lines or registry
/// response bodies copied into errors, runs it through [`Secrets::redact`].
///
/// Clones share the same underlying set.
#[derive(Clone, Default)]
pub struct Secrets {
    inner: Arc<RwLock<Vec<String>>>,
    workflow_commands: bool,
}

impl Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.write_fmt(format_args!("Secrets({count} registered)"))
    }
}

impl Secrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also announce each registered secret to a GitHub Actions runner with
    /// an `::add-mask::` workflow command, so the runner masks it in the job
    /// log as well.
    pub fn with_workflow_commands(mut self, enabled: bool) -> Self {
        self.workflow_commands = enabled;
        self
    }

    pub fn register(&self, secret: impl AsRef<str>) {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return;
        }
        let mut secrets = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if secrets.iter().any(|known| known == secret) {
            return;
        }
        if self.workflow_commands {
            println!("::add-mask::{secret}");
        }
        secrets.push(secret.to_owned());
        // Longest first, so a secret containing another is masked whole.
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    pub fn redact(&self, text: &str) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .fold(text.to_owned(), |text, secret| {
                text.replace(secret.as_str(), MASK)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
