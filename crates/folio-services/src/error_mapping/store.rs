use crate::store::StoreError;
use folio_core::{AppError, DatabaseError, NetworkError};

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } => {
                AppError::Service(format!("{collection} record not found: {id}"))
            }
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Api { status, message } => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            StoreError::Network(e) => AppError::Network(e),
            StoreError::InvalidData(s) => AppError::Database(DatabaseError::Corruption(s)),
            StoreError::Task(s) => AppError::Service(s),
        }
    }
}
