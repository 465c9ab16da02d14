use thiserror::Error;

use crate::{
    application::{
        page::PageError, repos::RepoError, settings::SettingsError, spam::SpamError,
    },
    infra::error::InfraError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Spam(#[from] SpamError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the operator CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound => 2,
            AppError::Validation(_) => 64,
            AppError::Page(PageError::InvalidId(_)) => 64,
            AppError::Infra(InfraError::StoreUnavailable { .. })
            | AppError::Settings(SettingsError::Repo(RepoError::StoreUnavailable(_)))
            | AppError::Page(PageError::Repo(RepoError::StoreUnavailable(_))) => 69,
            AppError::Infra(InfraError::Configuration { .. }) => 78,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(AppError::NotFound.exit_code(), 2);
        assert_eq!(AppError::validation("bad json").exit_code(), 64);
        assert_eq!(
            AppError::from(InfraError::store_unavailable("connection refused")).exit_code(),
            69
        );
        assert_eq!(
            AppError::from(InfraError::configuration("missing url")).exit_code(),
            78
        );
        assert_eq!(
            AppError::from(SettingsError::from(RepoError::unavailable("pool closed"))).exit_code(),
            69
        );
        assert_eq!(AppError::unexpected("boom").exit_code(), 1);
    }
}
