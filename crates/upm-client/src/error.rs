use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum UpmClientError {
    /// Failed to build a registry endpoint URL.
    #[error(transparent)]
    #[diagnostic(code(upm_client::url_parse_error), url(docsrs))]
    UrlParseError(#[from] url::ParseError),

    /// The HTTP request itself failed: connection refused, TLS failure,
    /// unreadable body, and so on.
    #[error(transparent)]
    #[diagnostic(code(upm_client::request_error), url(docsrs))]
    RequestError(#[from] reqwest::Error),

    /// A credential could not be turned into an HTTP header.
    #[error(transparent)]
    #[diagnostic(code(upm_client::invalid_header_value), url(docsrs))]
    InvalidHeaderValueError(#[from] reqwest::header::InvalidHeaderValue),

    /// The registry did not hand out a token for the given username and
    /// password. `detail` is the registry's response body, with any known
    /// secrets masked.
    #[error("Authentication failed: {detail}")]
    #[diagnostic(
        code(upm_client::authentication_error),
        url(docsrs),
        help("Check the username and password for this registry.")
    )]
    AuthenticationError { detail: String },

    /// The registry rejected the token when it was used for a search.
    #[error("Token validation failed: {message}")]
    #[diagnostic(
        code(upm_client::token_validation_error),
        url(docsrs),
        help("The token may be expired, revoked, or issued by a different registry.")
    )]
    TokenValidationError { message: String },
}
