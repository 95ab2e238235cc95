use thiserror::Error;

use crate::lifecycle::FormMode;

/// Local validation failure. Blocks a save; never touches persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("an order needs at least one line item")]
    NoLines,

    #[error("select a supplier before saving")]
    MissingSupplier,

    #[error("'{0}' is not a valid supplier email address")]
    InvalidSupplierEmail(String),

    #[error("line {index}: a designation is required")]
    MissingDesignation { index: usize },

    #[error("line {index}: quantity must be at least 1")]
    ZeroQuantity { index: usize },

    #[error("line {index}: unit price cannot be negative")]
    NegativeUnitPrice { index: usize },

    #[error("line {index}: tax rate cannot be negative")]
    NegativeTaxRate { index: usize },
}

/// Errors surfaced by the order lifecycle manager and the backend client.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend answered with a non-success status.
    #[error("backend rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from backend: {0}")]
    Decode(String),

    #[error("line items can only be edited in create or edit mode (current mode: {0})")]
    FormMode(FormMode),

    #[error("no line at index {index} (order has {len} lines)")]
    LineIndex { index: usize, len: usize },

    #[error("order has no identifier; save it first")]
    MissingId,

    #[error("order {0} could not be loaded")]
    Placeholder(i64),

    /// Only a reduced representation without line items was retrievable.
    #[error("order {0} was loaded without its line items and cannot be edited")]
    Incomplete(i64),

    #[error("export failed: {0}")]
    Export(String),

    #[error("the view was dismissed before the request completed")]
    Dismissed,
}

impl OrderError {
    /// Whether the failure came from the network or the backend, as opposed
    /// to local input or form state.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            OrderError::Api { .. } | OrderError::Transport(_) | OrderError::Decode(_)
        )
    }
}
