use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::order::OrderStatus;

/// Remote status transitions the client can request.
///
/// The backend decides whether a transition is legal from the order's
/// current status; the client sends the request regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTransition {
    Confirm,
    Deliver,
    Cancel,
}

impl fmt::Display for StatusTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTransition::Confirm => write!(f, "confirm"),
            StatusTransition::Deliver => write!(f, "deliver"),
            StatusTransition::Cancel => write!(f, "cancel"),
        }
    }
}

impl StatusTransition {
    /// Path segment of the backend action endpoint.
    pub fn path_segment(&self) -> &'static str {
        match self {
            StatusTransition::Confirm => "confirm",
            StatusTransition::Deliver => "deliver",
            StatusTransition::Cancel => "cancel",
        }
    }

    /// Status the reloaded order is expected to carry after the backend
    /// accepted the request. Only used to flag surprising reloads.
    pub fn expected_status(&self) -> OrderStatus {
        match self {
            StatusTransition::Confirm => OrderStatus::Confirmed,
            StatusTransition::Deliver => OrderStatus::Delivered,
            StatusTransition::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Whether a successful transition moves goods into stock.
    pub fn affects_stock(&self) -> bool {
        matches!(self, StatusTransition::Deliver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segments() {
        assert_eq!(StatusTransition::Confirm.path_segment(), "confirm");
        assert_eq!(StatusTransition::Deliver.path_segment(), "deliver");
        assert_eq!(StatusTransition::Cancel.path_segment(), "cancel");
    }

    #[test]
    fn test_expected_status() {
        assert_eq!(StatusTransition::Cancel.expected_status(), OrderStatus::Cancelled);
        assert!(StatusTransition::Deliver.affects_stock());
        assert!(!StatusTransition::Cancel.affects_stock());
    }
}
