use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum UpmConfigError {
    #[error(transparent)]
    #[diagnostic(code(upm_config::config_error), url(docsrs))]
    ConfigError(#[from] config::ConfigError),
}
