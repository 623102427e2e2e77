use super::value_objects::OrderStatus;
use crate::document_store::StoreError;

// ============================================================================
// Order Errors
// ============================================================================

/// Closed taxonomy callers branch on to render a specific message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidTransition,
    NotFound,
    Persistence,
    Forbidden,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Forbidden => "forbidden",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot {action} order in status {status}: {detail}")]
    InvalidTransition {
        action: &'static str,
        status: OrderStatus,
        detail: &'static str,
    },

    #[error("order {0} not found")]
    NotFound(String),

    #[error("{action} not permitted: {detail}")]
    Forbidden {
        action: &'static str,
        detail: &'static str,
    },

    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Validation(_) => ErrorKind::Validation,
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::Forbidden { .. } => ErrorKind::Forbidden,
            OrderError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => OrderError::NotFound(id),
            other => OrderError::Persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_onto_taxonomy() {
        let missing: OrderError = StoreError::NotFound {
            collection: "orders",
            id: "o1".into(),
        }
        .into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let lost_race: OrderError = StoreError::VersionConflict {
            collection: "orders",
            id: "o1".into(),
            expected: 3,
            actual: Some(4),
        }
        .into();
        assert_eq!(lost_race.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_transition_error_message() {
        let err = OrderError::InvalidTransition {
            action: "approve",
            status: OrderStatus::Shipped,
            detail: "order is not pending approval",
        };
        assert_eq!(
            err.to_string(),
            "cannot approve order in status shipped: order is not pending approval"
        );
    }
}
