use thiserror::Error;

/// Failures reported by the remote services beyond transport errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Rejected `--year` values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum YearParseError {
    #[error("year selector must be \"last\" or a four digit year, got {0:?}")]
    Invalid(String),
}

/// Rejected theme names.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("theme must be \"light\" or \"dark\", got {0:?}")]
pub struct ThemeParseError(pub String);

/// Errors that can occur while reading or writing the preference file.
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("failed to read preferences: {0}")]
    Read(std::io::Error),

    #[error("failed to write preferences: {0}")]
    Write(std::io::Error),

    #[error("failed to parse preferences: {0}")]
    Parse(serde_json::Error),

    #[error("could not determine a config directory")]
    NoConfigDir,
}
