use crate::directory::DirectoryError;
use folio_core::{AppError, ConfigError, GitHubError, NetworkError, ReqwestErrorExt};

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Status { status, message } => {
                AppError::GitHub(GitHubError::from_status(status, message))
            }
            DirectoryError::Transport(e) => AppError::Network(e.into_network_error()),
            DirectoryError::InvalidUrl(s) => AppError::Config(ConfigError::Invalid(s)),
            DirectoryError::Decode(s) => AppError::Network(NetworkError::InvalidResponse(s)),
        }
    }
}
