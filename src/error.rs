use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum UpmAuthError {
    /// File modes are given in octal, like `chmod` takes them.
    #[error("{0:?} is not a valid file mode.")]
    #[diagnostic(
        code(upm_auth::invalid_file_mode),
        url(docsrs),
        help("Use an octal mode such as 666 or 600.")
    )]
    InvalidFileMode(String),
}
