use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors raised by the [`ApplicationContext`](crate::context::ApplicationContext) itself.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Bean not found: {type_name}")]
    BeanNotFound { type_name: String },

    #[error("Failed to downcast bean: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Illegal context state: {message}")]
    IllegalState { message: String },
}

impl ContextError {
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }
}
