use messenger_core::MessengerError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    #[error("messenger: {0}")]
    Messenger(#[from] MessengerError),

    #[error("namespace mismatch: expected={expected}, found={found}")]
    NamespaceMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("invalid descriptor: controller={controller}, type={message_type}")]
    InvalidDescriptor {
        controller: &'static str,
        message_type: &'static str,
    },
}

pub type ControllerResult<T> = Result<T, ControllerError>;
