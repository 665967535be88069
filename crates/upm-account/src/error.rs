use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum UpmAccountError {
    /// A required input was not given, either on the command line, as a CI
    /// input, or in the environment.
    #[error("Missing required input: {0}")]
    #[diagnostic(
        code(upm_account::missing_input_error),
        url(docsrs),
        help("Pass it as a command line flag, a step input, or a UPM_AUTH_* environment variable.")
    )]
    MissingInputError(&'static str),

    /// An input was given but could not be understood.
    #[error("Invalid value for {name}: {value:?}")]
    #[diagnostic(code(upm_account::invalid_input_error), url(docsrs))]
    InvalidInputError { name: &'static str, value: String },

    /// Authentication or token validation failed, or the registry could not
    /// be reached.
    #[error(transparent)]
    #[diagnostic(transparent)]
    ClientError(#[from] upm_client::UpmClientError),

    /// Creating, reading, or writing the UPM config file failed.
    #[error("Failed to {action} {}", .path.display())]
    #[diagnostic(code(upm_account::filesystem_error), url(docsrs))]
    FilesystemError {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// There is no home directory to put the UPM config file in.
    #[error("Could not find a home directory: {var} is not set")]
    #[diagnostic(code(upm_account::home_directory_error), url(docsrs))]
    HomeDirectoryError { var: &'static str },
}
