use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidOwnerId(String),
    InvalidMarketCard(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidOwnerId(raw) => {
                write!(f, "invalid owner id: {raw:?}")
            }
            ModelError::InvalidMarketCard(msg) => {
                write!(f, "invalid market card: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
