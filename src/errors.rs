use thiserror::Error;

use crate::decimal::Money;
use crate::types::AssetId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("loan does not amortize: payment {payment} does not exceed monthly interest {monthly_interest} on balance {balance}")]
    NonAmortizing {
        balance: Money,
        payment: Money,
        monthly_interest: Money,
    },

    #[error("asset not found: {id}")]
    AssetNotFound {
        id: AssetId,
    },

    #[error("asset already in portfolio: {id}")]
    DuplicateAsset {
        id: AssetId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
