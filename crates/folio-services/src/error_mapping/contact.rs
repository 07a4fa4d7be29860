use crate::email::EmailError;
use crate::error::ContactError;
use folio_core::{AppError, DeliveryError, ReqwestErrorExt};

impl From<ContactError> for AppError {
    fn from(e: ContactError) -> Self {
        match e {
            ContactError::Invalid(v) => AppError::Validation(v.error_summary()),
            ContactError::Store(e) => e.into(),
            ContactError::Delivery { message_id, source } => {
                AppError::Delivery(DeliveryError::SavedNotDelivered {
                    message_id,
                    reason: source.to_string(),
                })
            }
        }
    }
}

impl From<EmailError> for AppError {
    fn from(e: EmailError) -> Self {
        match e {
            EmailError::Rejected { status, message } => {
                AppError::Delivery(DeliveryError::Rejected { status, message })
            }
            EmailError::Transport(e) => {
                AppError::Delivery(DeliveryError::Unreachable(e.into_network_error().to_string()))
            }
        }
    }
}
