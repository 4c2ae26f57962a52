use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    /// Anything raised by the data-access layer, passed through unchanged.
    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("invalid order clause: {0}")]
    InvalidOrder(String),

    #[error("invalid field name: {0:?}")]
    InvalidField(String),

    /// Preload whose relation may yield more than one row per parent.
    #[error("preload of {0:?} is not a to-one relation")]
    InvalidPreload(String),
}

pub type ListResult<T> = Result<T, ListError>;

impl ListError {
    /// True for errors caused by the request or by the field names it is
    /// filtered on. Database failures and preload misconfiguration are not.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidOrder(_) | Self::InvalidField(_))
    }
}
