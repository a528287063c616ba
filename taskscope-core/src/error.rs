use thiserror::Error;

/// Failures of one archive-processing operation.
///
/// Loading is all-or-nothing: any of these aborts the load and no partial
/// trace or image map is produced.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("No JSON file found in the archive")]
    NoJsonEntry,

    #[error("Invalid JSON file: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Invalid zip archive: {0}")]
    InvalidArchive(#[from] zip::result::ZipError),

    #[error("Archive source rejected the access token")]
    Unauthorized,

    #[error("Archive source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Folder is empty")]
    EmptyFolder,

    #[error("Invalid Drive folder link")]
    InvalidFolderLink,

    #[error("You must login first to access Drive")]
    NotLoggedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Whether the caller should re-authenticate rather than show a generic error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ArchiveError::Unauthorized | ArchiveError::NotLoggedIn)
    }
}

impl From<reqwest::Error> for ArchiveError {
    fn from(e: reqwest::Error) -> Self {
        if e.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            ArchiveError::Unauthorized
        } else {
            ArchiveError::SourceUnavailable(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum TaskscopeError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Login rejected: {0}")]
    Login(String),
}
